//! MRtrix reconstruction and tracking flows.

use std::path::Path;

use crate::config::{DiffusionModel, MrtrixReconConfig, MrtrixTrackingConfig};
use crate::error::FlowResult;
use crate::graph::{ArtifactKind, Flow, FlowNode};
use crate::tools::mrtrix;

use super::{path_param, INPUT_NODE, OUTPUT_NODE, RECON_FLOW_NAME, TRACKING_FLOW_NAME};

pub const INPUTS: &[(&str, ArtifactKind)] = &[
    ("diffusion", ArtifactKind::Volume),
    ("diffusion_resampled", ArtifactKind::Volume),
    ("wm_mask_resampled", ArtifactKind::Mask),
];

pub const OUTPUTS: &[(&str, ArtifactKind)] = &[
    ("DWI", ArtifactKind::Volume),
    ("FA", ArtifactKind::ScalarMap),
    ("eigVec", ArtifactKind::Vectors),
    ("RF", ArtifactKind::Response),
];

pub const TRACKING_INPUTS: &[(&str, ArtifactKind)] = &[
    ("DWI", ArtifactKind::Volume),
    ("wm_mask_resampled", ArtifactKind::Mask),
];

pub const TRACKING_OUTPUTS: &[(&str, ArtifactKind)] = &[("track_file", ArtifactKind::Tracks)];

pub const TERMINAL_NODE: &str = "mrtrix_tck2trk";

const STREAMTRACK: &str = "mrtrix_streamtrack";

/// Erosion passes applied to the white-matter mask before response estimation.
const ERODE_PASSES: u32 = 3;

/// Tensor fit with FA and eigenvectors; with CSD enabled, the response
/// function is estimated from single-fibre voxels and the deconvolved
/// image replaces the DWI output.
pub fn build_reconstruction(config: &MrtrixReconConfig) -> FlowResult<Flow> {
    let mut flow = Flow::new(RECON_FLOW_NAME);
    flow.add_node(FlowNode::identity(INPUT_NODE, INPUTS))?;
    flow.add_node(FlowNode::identity(OUTPUT_NODE, OUTPUTS))?;

    let gradient = path_param(config.gradient_table()?);

    flow.add_node(mrtrix::dwi_to_tensor("mrtrix_make_tensor", &gradient))?;
    flow.add_node(mrtrix::tensor_to_fa("mrtrix_FA"))?;
    flow.add_node(mrtrix::tensor_to_vector("mrtrix_eigenvectors"))?;
    flow.connect(INPUT_NODE, "diffusion_resampled", "mrtrix_make_tensor", "in_file")?;
    flow.connect("mrtrix_make_tensor", "tensor", "mrtrix_FA", "in_file")?;
    flow.connect("mrtrix_make_tensor", "tensor", "mrtrix_eigenvectors", "in_file")?;
    flow.connect("mrtrix_FA", "FA", OUTPUT_NODE, "FA")?;
    flow.connect("mrtrix_eigenvectors", "vector", OUTPUT_NODE, "eigVec")?;

    if !config.compute_csd() {
        flow.connect(INPUT_NODE, "diffusion_resampled", OUTPUT_NODE, "DWI")?;
        return Ok(flow);
    }

    flow.add_node(mrtrix::erode("mrtrix_erode", ERODE_PASSES))?;
    flow.add_node(mrtrix::multiply("mrtrix_mul_eroded_FA"))?;
    flow.add_node(mrtrix::threshold("mrtrix_thr", config.single_fib_thr()))?;
    flow.add_node(mrtrix::estimate_response(
        "mrtrix_rf",
        &gradient,
        config.lmax_order(),
        config.normalize_to_b0,
    ))?;
    flow.add_node(mrtrix::csdeconv("mrtrix_CSD", &gradient, config.normalize_to_b0))?;

    flow.connect(INPUT_NODE, "wm_mask_resampled", "mrtrix_erode", "in_file")?;
    flow.connect("mrtrix_FA", "FA", "mrtrix_mul_eroded_FA", "input1")?;
    flow.connect("mrtrix_erode", "out_file", "mrtrix_mul_eroded_FA", "input2")?;
    flow.connect("mrtrix_mul_eroded_FA", "out_file", "mrtrix_thr", "in_file")?;
    flow.connect(INPUT_NODE, "diffusion_resampled", "mrtrix_rf", "in_file")?;
    flow.connect("mrtrix_thr", "out_file", "mrtrix_rf", "mask_image")?;
    flow.connect(INPUT_NODE, "diffusion_resampled", "mrtrix_CSD", "in_file")?;
    flow.connect("mrtrix_rf", "response", "mrtrix_CSD", "response_file")?;
    flow.connect(INPUT_NODE, "wm_mask_resampled", "mrtrix_CSD", "mask_image")?;
    flow.connect("mrtrix_rf", "response", OUTPUT_NODE, "RF")?;
    flow.connect("mrtrix_CSD", "spherical_harmonics_image", OUTPUT_NODE, "DWI")?;

    Ok(flow)
}

/// `streamtrack` model for the reconstruction that produced the DWI input.
pub fn streamtrack_model(config: &MrtrixTrackingConfig, compute_csd: bool) -> &'static str {
    if !compute_csd {
        return mrtrix::DT_STREAM;
    }
    match config.tracking_mode() {
        DiffusionModel::Streamline => mrtrix::SD_STREAM,
        DiffusionModel::Probabilistic => mrtrix::SD_PROB,
    }
}

/// `streamtrack` seeded and bounded by the white-matter mask, then
/// converted to TrackVis.
pub fn build_tracking(
    config: &MrtrixTrackingConfig,
    gradient_table: &Path,
    compute_csd: bool,
) -> FlowResult<Flow> {
    let mut flow = Flow::new(TRACKING_FLOW_NAME);
    flow.add_node(FlowNode::identity(INPUT_NODE, TRACKING_INPUTS))?;
    flow.add_node(FlowNode::identity(OUTPUT_NODE, TRACKING_OUTPUTS))?;

    let model = streamtrack_model(config, compute_csd);
    let gradient = (!compute_csd).then(|| path_param(gradient_table));
    flow.add_node(
        mrtrix::streamtrack(STREAMTRACK, model, gradient.as_deref())
            .with_param("desired_number_of_tracks", config.desired_number_of_tracks())
            .with_param("maximum_number_of_tracks", config.max_number_of_tracks())
            .with_param("curvature", config.curvature())
            .with_param("step_size", config.step_size())
            .with_param("minimum_tract_length", config.min_length())
            .with_param("maximum_tract_length", config.max_length()),
    )?;
    flow.add_node(mrtrix::tck_to_trk(TERMINAL_NODE))?;

    flow.connect(INPUT_NODE, "DWI", STREAMTRACK, "in_file")?;
    flow.connect(INPUT_NODE, "wm_mask_resampled", STREAMTRACK, "seed_file")?;
    flow.connect(INPUT_NODE, "wm_mask_resampled", STREAMTRACK, "mask_file")?;
    flow.connect(STREAMTRACK, "tracked", TERMINAL_NODE, "in_file")?;
    flow.connect(INPUT_NODE, "wm_mask_resampled", TERMINAL_NODE, "image_file")?;
    flow.connect(TERMINAL_NODE, "out_file", OUTPUT_NODE, "track_file")?;

    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{topological_sort, validate_flow};
    use serde_json::json;

    fn recon() -> MrtrixReconConfig {
        MrtrixReconConfig::new(Path::new("/res"))
    }

    #[test]
    fn test_tensor_only_reconstruction() {
        let flow = build_reconstruction(&recon()).unwrap();
        assert!(!flow.contains_node("mrtrix_CSD"));
        assert!(!flow.contains_node("mrtrix_rf"));
        let dwi = flow
            .incoming(OUTPUT_NODE)
            .unwrap()
            .into_iter()
            .find(|c| c.target_port == "DWI")
            .unwrap();
        assert_eq!(dwi.source, INPUT_NODE);
        assert_eq!(
            flow.node("mrtrix_make_tensor").unwrap().param("encoding_file"),
            Some(&json!("/res/siemens_06.txt"))
        );
        assert!(validate_flow(&flow).is_valid);
    }

    #[test]
    fn test_csd_branch() {
        let mut cfg = recon();
        cfg.set_compute_csd(true).unwrap();
        cfg.set_lmax_order(Some(8)).unwrap();
        cfg.set_single_fib_thr(0.8).unwrap();
        let flow = build_reconstruction(&cfg).unwrap();

        assert_eq!(flow.node("mrtrix_thr").unwrap().param("absolute_threshold_value"), Some(&json!(0.8)));
        assert_eq!(flow.node("mrtrix_rf").unwrap().param("maximum_harmonic_order"), Some(&json!(8)));
        assert_eq!(flow.node("mrtrix_erode").unwrap().param("number_of_passes"), Some(&json!(3)));
        assert_eq!(
            flow.predecessors("mrtrix_mul_eroded_FA").unwrap(),
            vec!["mrtrix_FA", "mrtrix_erode"]
        );
        assert_eq!(flow.predecessors(OUTPUT_NODE).unwrap(), vec![
            "mrtrix_CSD",
            "mrtrix_FA",
            "mrtrix_eigenvectors",
            "mrtrix_rf",
        ]);

        let order = topological_sort(&flow).unwrap();
        let pos = |id: &str| order.iter().position(|n| n == id).unwrap();
        assert!(pos("mrtrix_thr") < pos("mrtrix_rf"));
        assert!(pos("mrtrix_rf") < pos("mrtrix_CSD"));
        assert!(validate_flow(&flow).is_valid);
    }

    #[test]
    fn test_tracking_model_follows_reconstruction() {
        let mut cfg = MrtrixTrackingConfig::default();
        assert_eq!(streamtrack_model(&cfg, false), mrtrix::DT_STREAM);
        assert_eq!(streamtrack_model(&cfg, true), mrtrix::SD_STREAM);
        cfg.set_tracking_mode(DiffusionModel::Probabilistic);
        assert_eq!(streamtrack_model(&cfg, true), mrtrix::SD_PROB);
        assert_eq!(streamtrack_model(&cfg, false), mrtrix::DT_STREAM);
    }

    #[test]
    fn test_tracking_flow() {
        let cfg = MrtrixTrackingConfig::default();
        let flow = build_tracking(&cfg, Path::new("/res/siemens_06.txt"), false).unwrap();
        let track = flow.node(STREAMTRACK).unwrap();
        assert_eq!(track.param("gradient_encoding_file"), Some(&json!("/res/siemens_06.txt")));
        assert_eq!(track.param("desired_number_of_tracks"), Some(&json!(1000)));
        assert_eq!(track.param("maximum_tract_length"), Some(&json!(200.0)));
        assert_eq!(flow.successors(TERMINAL_NODE).unwrap(), vec![OUTPUT_NODE]);
        assert!(validate_flow(&flow).is_valid);

        let flow = build_tracking(&cfg, Path::new("/res/siemens_06.txt"), true).unwrap();
        let track = flow.node(STREAMTRACK).unwrap();
        assert!(track.input("gradient_encoding_file").is_none());
        assert_eq!(track.param("inputmodel"), Some(&json!("SD_STREAM")));
    }
}
