//! MRtrix commands.

use std::collections::BTreeMap;

use crate::error::FlowResult;
use crate::graph::{ArtifactKind, FlowNode, Port};
use crate::paths::{join, split_filename};

use super::registry::{input_value, Bindings};

pub const MULTIPLY_COMMAND: &str = "mrmult";

/// Track file written by `tck2trk`.
pub const CONVERTED_TRACK_FILE: &str = "converted.trk";

/// `streamtrack` model for each tracking situation.
pub const DT_STREAM: &str = "DT_STREAM";
pub const SD_STREAM: &str = "SD_STREAM";
pub const SD_PROB: &str = "SD_PROB";

pub fn dwi_to_tensor(id: &str, encoding_file: &str) -> FlowNode {
    FlowNode::command(
        id,
        "dwi2tensor",
        vec![
            Port::positional("in_file", ArtifactKind::Volume, 1, None),
            Port::positional("encoding_file", ArtifactKind::GradientTable, 3, Some("-grad")),
        ],
        vec![Port::positional("tensor", ArtifactKind::Tensor, 2, None)],
    )
    .with_param("encoding_file", encoding_file)
    .with_param("tensor", "dt.mif")
}

pub fn tensor_to_fa(id: &str) -> FlowNode {
    FlowNode::command(
        id,
        "tensor2FA",
        vec![Port::positional("in_file", ArtifactKind::Tensor, 1, None)],
        vec![Port::positional("FA", ArtifactKind::ScalarMap, 2, None)],
    )
    .with_param("FA", "fa.mif")
}

pub fn tensor_to_vector(id: &str) -> FlowNode {
    FlowNode::command(
        id,
        "tensor2vector",
        vec![Port::positional("in_file", ArtifactKind::Tensor, 1, None)],
        vec![Port::positional("vector", ArtifactKind::Vectors, 2, None)],
    )
    .with_param("vector", "ev.mif")
}

pub fn erode(id: &str, number_of_passes: u32) -> FlowNode {
    FlowNode::command(
        id,
        "erode",
        vec![Port::positional("in_file", ArtifactKind::Mask, 1, None)],
        vec![Port::positional("out_file", ArtifactKind::Mask, 2, None)],
    )
    .with_param("number_of_passes", number_of_passes)
    .with_param("out_file", "wm_erode.mif")
}

/// `mrmult input1 input2 out`: the output lands next to `input1`.
pub fn multiply(id: &str) -> FlowNode {
    FlowNode::command(
        id,
        MULTIPLY_COMMAND,
        vec![
            Port::positional("input1", ArtifactKind::Volume, 1, None),
            Port::positional("input2", ArtifactKind::Volume, 2, None),
        ],
        vec![Port::positional("out_file", ArtifactKind::Volume, 3, None)],
    )
}

pub fn threshold(id: &str, absolute_threshold_value: f64) -> FlowNode {
    FlowNode::command(
        id,
        "threshold",
        vec![Port::positional("in_file", ArtifactKind::Volume, 1, None)],
        vec![Port::positional("out_file", ArtifactKind::Mask, 2, None)],
    )
    .with_param("absolute_threshold_value", absolute_threshold_value)
    .with_param("out_file", "sf.mif")
}

/// `estimate_response`; `lmax = None` lets MRtrix pick the order.
pub fn estimate_response(id: &str, encoding_file: &str, lmax: Option<u8>, normalise: bool) -> FlowNode {
    let mut node = FlowNode::command(
        id,
        "estimate_response",
        vec![
            Port::positional("in_file", ArtifactKind::Volume, 1, None),
            Port::positional("mask_image", ArtifactKind::Mask, 2, None),
            Port::positional("encoding_file", ArtifactKind::GradientTable, 4, Some("-grad")),
        ],
        vec![Port::positional("response", ArtifactKind::Response, 3, None)],
    )
    .with_param("encoding_file", encoding_file)
    .with_param("normalise", normalise)
    .with_param("response", "response.txt");
    if let Some(order) = lmax {
        node.set_param("maximum_harmonic_order", order);
    }
    node
}

pub fn csdeconv(id: &str, encoding_file: &str, normalise: bool) -> FlowNode {
    FlowNode::command(
        id,
        "csdeconv",
        vec![
            Port::positional("in_file", ArtifactKind::Volume, 1, None),
            Port::positional("response_file", ArtifactKind::Response, 2, None),
            Port::positional("mask_image", ArtifactKind::Mask, 4, Some("-mask")),
            Port::positional("encoding_file", ArtifactKind::GradientTable, 5, Some("-grad")),
        ],
        vec![Port::positional("spherical_harmonics_image", ArtifactKind::Volume, 3, None)],
    )
    .with_param("encoding_file", encoding_file)
    .with_param("normalise", normalise)
    .with_param("spherical_harmonics_image", "csd.mif")
}

/// `streamtrack` with the given model; the gradient table is only needed
/// for tensor tracking.
pub fn streamtrack(id: &str, model: &str, gradient_table: Option<&str>) -> FlowNode {
    let mut inputs = vec![
        Port::positional("inputmodel", ArtifactKind::Any, 1, None),
        Port::positional("in_file", ArtifactKind::Volume, 2, None),
        Port::positional("seed_file", ArtifactKind::Mask, 4, Some("-seed")),
        Port::positional("mask_file", ArtifactKind::Mask, 5, Some("-mask")),
    ];
    if gradient_table.is_some() {
        inputs.push(Port::positional(
            "gradient_encoding_file",
            ArtifactKind::GradientTable,
            6,
            Some("-grad"),
        ));
    }
    let mut node = FlowNode::command(
        id,
        "streamtrack",
        inputs,
        vec![Port::positional("tracked", ArtifactKind::Tracks, 3, None)],
    )
    .with_param("inputmodel", model)
    .with_param("tracked", "tracked.tck");
    if let Some(grad) = gradient_table {
        node.set_param("gradient_encoding_file", grad);
    }
    node
}

/// `tck2trk`: MRtrix tracks to TrackVis, using `image_file` as geometry.
pub fn tck_to_trk(id: &str) -> FlowNode {
    FlowNode::command(
        id,
        "tck2trk",
        vec![
            Port::positional("in_file", ArtifactKind::Tracks, 1, None),
            Port::positional("image_file", ArtifactKind::Volume, 2, None),
        ],
        vec![Port::positional("out_file", ArtifactKind::Tracks, 3, None)],
    )
    .with_param("out_file", CONVERTED_TRACK_FILE)
}

/// Output of `mrmult`: `<dir of input1>/<base of input1>_masked.mif`.
pub fn mrmult_output(input1: &str) -> String {
    let (dir, base, _) = split_filename(input1);
    join(&dir, &format!("{}_masked.mif", base))
}

pub(crate) fn name_mrmult_outputs(node: &FlowNode, bindings: &Bindings) -> FlowResult<BTreeMap<String, String>> {
    let input1 = input_value(node, bindings, "input1")?;
    Ok(BTreeMap::from([("out_file".to_string(), mrmult_output(&input1))]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mrmult_output() {
        assert_eq!(
            mrmult_output("/work/reconstruction/mrtrix_FA/diffusion_resampled_tensor_FA.mif"),
            "/work/reconstruction/mrtrix_FA/diffusion_resampled_tensor_FA_masked.mif"
        );
        assert_eq!(mrmult_output("fa.nii.gz"), "fa_masked.mif");
    }

    #[test]
    fn test_estimate_response_auto_lmax() {
        let auto = estimate_response("mrtrix_rf", "/g.txt", None, false);
        assert!(auto.param("maximum_harmonic_order").is_none());
        let fixed = estimate_response("mrtrix_rf", "/g.txt", Some(8), true);
        assert_eq!(fixed.param("maximum_harmonic_order"), Some(&json!(8)));
        assert_eq!(fixed.param("normalise"), Some(&json!(true)));
    }

    #[test]
    fn test_streamtrack_gradient_port_only_for_tensor() {
        let dt = streamtrack("mrtrix_streamtrack", DT_STREAM, Some("/g.txt"));
        assert!(dt.input("gradient_encoding_file").is_some());
        let sd = streamtrack("mrtrix_streamtrack", SD_PROB, None);
        assert!(sd.input("gradient_encoding_file").is_none());
        assert_eq!(sd.param("inputmodel"), Some(&json!("SD_PROB")));
    }
}
