//! FreeSurfer `mri_convert`, used for resampling.

use crate::graph::{ArtifactKind, FlowNode, Port};

/// Resample `in_file` to `vox_size`, writing a short-typed NIfTI.
///
/// `kind` is carried through unchanged so a resampled mask stays a mask.
pub fn mri_convert(id: &str, kind: ArtifactKind, out_file: &str, vox_size: (f64, f64, f64)) -> FlowNode {
    FlowNode::command(
        id,
        "mri_convert",
        vec![Port::positional("in_file", kind, 1, None)],
        vec![Port::positional("out_file", kind, 2, None)],
    )
    .with_param("out_type", "nii")
    .with_param("out_datatype", "short")
    .with_param("out_file", out_file)
    .with_param("vox_size", vec![vox_size.0, vox_size.1, vox_size.2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mri_convert_params() {
        let node = mri_convert("mask_resample", ArtifactKind::Mask, "wm_mask_resampled.nii", (2.0, 2.0, 1.5));
        assert_eq!(node.param("vox_size"), Some(&json!([2.0, 2.0, 1.5])));
        assert_eq!(node.param("out_datatype"), Some(&json!("short")));
        assert_eq!(node.output("out_file").unwrap().kind, ArtifactKind::Mask);
    }
}
