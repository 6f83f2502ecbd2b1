//! Diffusion Toolkit companion commands (`DTB_*`).
//!
//! These tools are not self-describing: their outputs are written next to
//! the `--dsi` base path under fixed names, reproduced by the namers below.

use std::collections::BTreeMap;

use crate::error::{FlowError, FlowResult};
use crate::graph::{ArtifactKind, FlowNode, Port};
use crate::paths::{join, split_filename};

use super::registry::{input_value, Bindings};

pub const GFA_COMMAND: &str = "DTB_gfa";
pub const P0_COMMAND: &str = "DTB_P0";
pub const DTK2DIR_COMMAND: &str = "DTB_dtk2dir";
pub const STREAMLINE_COMMAND: &str = "DTB_streamline";

/// Track file written by `DTB_streamline`.
pub const STREAMLINE_TRACK_FILE: &str = "streamline.trk";

/// `DTB_gfa`: generalized moment `moment` (2 = gFA, 3 = skewness, 4 = kurtosis).
pub fn gfa(id: &str, moment: u8) -> FlowNode {
    FlowNode::command(
        id,
        GFA_COMMAND,
        vec![
            Port::positional("dsi_basepath", ArtifactKind::Prefix, 1, Some("--dsi")),
            Port::positional("moment", ArtifactKind::Any, 2, Some("--m")),
        ],
        vec![Port::new("out_file", ArtifactKind::ScalarMap)],
    )
    .with_param("moment", moment)
}

/// `DTB_P0`: zero-order signal from an ODF base path and the raw DWI.
pub fn p0(id: &str) -> FlowNode {
    FlowNode::command(
        id,
        P0_COMMAND,
        vec![
            Port::positional("dsi_basepath", ArtifactKind::Prefix, 1, Some("--dsi")),
            Port::positional("dwi_file", ArtifactKind::Volume, 2, Some("--dwi")),
        ],
        vec![Port::new("out_file", ArtifactKind::ScalarMap)],
    )
}

/// `DTB_dtk2dir`: principal directions from a DTK reconstruction prefix.
///
/// `recon_type` is the reconstruction prefix (`dti`, `hardi`, `dsi`);
/// `flip` lists the axes to flip.
pub fn dtk2dir(id: &str, recon_type: &str, dirlist: &str, flip: &[&str]) -> FlowNode {
    let mut node = FlowNode::command(
        id,
        DTK2DIR_COMMAND,
        vec![
            Port::positional("prefix", ArtifactKind::Prefix, 1, Some("--prefix")),
            Port::positional("type", ArtifactKind::Any, 2, Some("--type")),
            Port::positional("dirlist", ArtifactKind::Directions, 3, Some("--dirlist")),
        ],
        vec![Port::new("out_file", ArtifactKind::Directions)],
    )
    .with_param("type", recon_type)
    .with_param("dirlist", dirlist);
    for axis in flip {
        node.set_param(&format!("invert_{}", axis), true);
    }
    node
}

/// `DTB_streamline`: deterministic tracking over a direction field.
pub fn streamline(id: &str, angle: f64, seeds: u32) -> FlowNode {
    FlowNode::command(
        id,
        STREAMLINE_COMMAND,
        vec![
            Port::positional("dir_file", ArtifactKind::Directions, 1, Some("--dir")),
            Port::positional("wm_mask", ArtifactKind::Mask, 2, Some("--wm")),
            Port::positional("angle", ArtifactKind::Any, 3, Some("--angle")),
            Port::positional("seeds", ArtifactKind::Any, 4, Some("--seeds")),
        ],
        vec![Port::positional("out_file", ArtifactKind::Tracks, 5, Some("--out"))],
    )
    .with_param("angle", angle)
    .with_param("seeds", seeds)
    .with_param("out_file", STREAMLINE_TRACK_FILE)
}

/// Output of `DTB_gfa` for a base path and moment; `None` for an unknown moment.
///
/// `dtb_gfa_output("/work/dsi_", 2)` is `/work/dsi_gfa.nii`.
pub fn dtb_gfa_output(dsi_basepath: &str, moment: u8) -> Option<String> {
    let suffix = match moment {
        2 => "gfa",
        3 => "skewness",
        4 => "kurtosis",
        _ => return None,
    };
    let (dir, base, _) = split_filename(dsi_basepath);
    Some(join(&dir, &format!("{}{}.nii", base, suffix)))
}

pub fn dtb_p0_output(dsi_basepath: &str) -> String {
    let (dir, base, _) = split_filename(dsi_basepath);
    join(&dir, &format!("{}P0.nii", base))
}

pub fn dtb_dir_output(prefix: &str) -> String {
    let (dir, base, _) = split_filename(prefix);
    join(&dir, &format!("{}dir.nii", base))
}

pub(crate) fn name_gfa_outputs(node: &FlowNode, bindings: &Bindings) -> FlowResult<BTreeMap<String, String>> {
    let base = input_value(node, bindings, "dsi_basepath")?;
    let moment = input_value(node, bindings, "moment")?;
    let out = moment
        .parse::<u8>()
        .ok()
        .and_then(|m| dtb_gfa_output(&base, m))
        .ok_or_else(|| FlowError::MissingArgument {
            node: node.id.clone(),
            port: "moment".to_string(),
        })?;
    Ok(BTreeMap::from([("out_file".to_string(), out)]))
}

pub(crate) fn name_p0_outputs(node: &FlowNode, bindings: &Bindings) -> FlowResult<BTreeMap<String, String>> {
    let base = input_value(node, bindings, "dsi_basepath")?;
    Ok(BTreeMap::from([("out_file".to_string(), dtb_p0_output(&base))]))
}

pub(crate) fn name_dtk2dir_outputs(node: &FlowNode, bindings: &Bindings) -> FlowResult<BTreeMap<String, String>> {
    let prefix = input_value(node, bindings, "prefix")?;
    Ok(BTreeMap::from([("out_file".to_string(), dtb_dir_output(&prefix))]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gfa_output_naming() {
        assert_eq!(dtb_gfa_output("/work/recon/dsi_", 2).unwrap(), "/work/recon/dsi_gfa.nii");
        assert_eq!(dtb_gfa_output("/work/recon/dsi_", 3).unwrap(), "/work/recon/dsi_skewness.nii");
        assert_eq!(dtb_gfa_output("/work/recon/hardi_", 4).unwrap(), "/work/recon/hardi_kurtosis.nii");
        assert_eq!(dtb_gfa_output("/work/recon/dsi_", 5), None);
        assert_eq!(dtb_gfa_output("dsi_", 2).unwrap(), "dsi_gfa.nii");
    }

    #[test]
    fn test_p0_and_dir_naming() {
        assert_eq!(dtb_p0_output("/work/recon/dsi_"), "/work/recon/dsi_P0.nii");
        assert_eq!(dtb_dir_output("/work/recon/dti_"), "/work/recon/dti_dir.nii");
    }

    #[test]
    fn test_namer_rejects_bad_moment() {
        let mut node = gfa("dtb_gfa", 2);
        node.set_param("moment", 7);
        let bindings = Bindings::from([("dsi_basepath".to_string(), "/w/dsi_".to_string())]);
        assert!(matches!(
            name_gfa_outputs(&node, &bindings),
            Err(FlowError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_dtk2dir_params() {
        let node = dtk2dir("dtb_dtk2dir", "dsi", "/res/181_vecs.dat", &["x", "z"]);
        assert_eq!(node.param("type"), Some(&json!("dsi")));
        assert_eq!(node.param("invert_x"), Some(&json!(true)));
        assert_eq!(node.param("invert_z"), Some(&json!(true)));
        assert!(node.param("invert_y").is_none());
    }

    #[test]
    fn test_streamline_declares_track_output() {
        let node = streamline("dtb_streamline", 60.0, 32);
        assert_eq!(node.output("out_file").unwrap().kind, ArtifactKind::Tracks);
        assert_eq!(node.param("out_file"), Some(&json!("streamline.trk")));
        assert_eq!(node.param("seeds"), Some(&json!(32)));
    }
}
