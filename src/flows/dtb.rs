//! DTB streamline tracking over a DTK reconstruction.

use crate::config::{DtbTrackingConfig, ResourceConfig};
use crate::error::FlowResult;
use crate::graph::{ArtifactKind, Flow, FlowNode, PortTransform};
use crate::tools::dtb;

use super::{path_param, INPUT_NODE, OUTPUT_NODE, TRACKING_FLOW_NAME};

pub const INPUTS: &[(&str, ArtifactKind)] = &[
    ("DWI", ArtifactKind::Volume),
    ("wm_mask_registered", ArtifactKind::Mask),
];

pub const OUTPUTS: &[(&str, ArtifactKind)] = &[("track_file", ArtifactKind::Tracks)];

pub const TERMINAL_NODE: &str = "dtb_streamline";

const DTK2DIR: &str = "dtb_dtk2dir";

/// `dtk2dir` turns the reconstruction prefix into a direction field, which
/// `streamline` follows inside the registered white-matter mask.
pub fn build(config: &DtbTrackingConfig, resources: &ResourceConfig) -> FlowResult<Flow> {
    let mut flow = Flow::new(TRACKING_FLOW_NAME);
    flow.add_node(FlowNode::identity(INPUT_NODE, INPUTS))?;
    flow.add_node(FlowNode::identity(OUTPUT_NODE, OUTPUTS))?;

    let prefix = config.imaging_model().prefix();
    let dirlist = path_param(&resources.odf_directions_file);
    flow.add_node(dtb::dtk2dir(DTK2DIR, prefix, &dirlist, &config.flip_flags()))?;
    flow.add_node(dtb::streamline(TERMINAL_NODE, config.angle(), config.seeds()))?;

    flow.connect_via(INPUT_NODE, "DWI", PortTransform::strip_suffix(prefix), DTK2DIR, "prefix")?;
    flow.connect(DTK2DIR, "out_file", TERMINAL_NODE, "dir_file")?;
    flow.connect(INPUT_NODE, "wm_mask_registered", TERMINAL_NODE, "wm_mask")?;
    flow.connect(TERMINAL_NODE, "out_file", OUTPUT_NODE, "track_file")?;

    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Axis, ImagingModel};
    use crate::graph::validate_flow;
    use serde_json::json;
    use std::path::Path;

    #[test]
    fn test_tracking_flow() {
        let mut cfg = DtbTrackingConfig::default();
        cfg.set_imaging_model(ImagingModel::Dsi);
        cfg.flip_input = [Axis::X, Axis::Z].into_iter().collect();
        let resources = ResourceConfig::rooted_at(Path::new("/pkg"));
        let flow = build(&cfg, &resources).unwrap();

        let dir = flow.node(DTK2DIR).unwrap();
        assert_eq!(dir.param("type"), Some(&json!("dsi")));
        assert_eq!(
            dir.param("dirlist"),
            Some(&json!("/pkg/data/diffusion/odf_directions/181_vecs.dat"))
        );
        assert_eq!(dir.param("invert_x"), Some(&json!(true)));
        assert!(dir.param("invert_y").is_none());

        let incoming = flow.incoming(DTK2DIR).unwrap();
        assert_eq!(incoming[0].transform, Some(PortTransform::strip_suffix("dsi")));

        let streamline = flow.node(TERMINAL_NODE).unwrap();
        assert_eq!(streamline.param("angle"), Some(&json!(60.0)));
        assert_eq!(streamline.param("seeds"), Some(&json!(32)));
        assert!(validate_flow(&flow).is_valid);
    }
}
