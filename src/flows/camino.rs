//! Camino reconstruction and tracking flows.

use crate::config::{CaminoReconConfig, CaminoTrackingConfig, DiffusionModel, NumberOfTensors};
use crate::error::FlowResult;
use crate::graph::{ArtifactKind, Flow, FlowNode};
use crate::tools::camino;

use super::{path_param, INPUT_NODE, OUTPUT_NODE, RECON_FLOW_NAME, TRACKING_FLOW_NAME};

pub const INPUTS: &[(&str, ArtifactKind)] = &[
    ("diffusion", ArtifactKind::Volume),
    ("diffusion_resampled", ArtifactKind::Volume),
    ("wm_mask_resampled", ArtifactKind::Mask),
];

pub const OUTPUTS: &[(&str, ArtifactKind)] = &[
    ("DWI", ArtifactKind::Tensor),
    ("FA", ArtifactKind::ScalarMap),
    ("MD", ArtifactKind::ScalarMap),
    ("eigVec", ArtifactKind::Vectors),
];

pub const TRACKING_INPUTS: &[(&str, ArtifactKind)] = &[
    ("DWI", ArtifactKind::Tensor),
    ("wm_mask_resampled", ArtifactKind::Mask),
];

pub const TRACKING_OUTPUTS: &[(&str, ArtifactKind)] = &[("track_file", ArtifactKind::Tracks)];

pub const TERMINAL_NODE: &str = "camino_vtk2trk";

const MODEL_FIT: &str = "camino_ModelFit";
const PICO_PDFS: &str = "camino_picopdfs";
const TRACK: &str = "camino_track";

/// `inputmodel` given to `track` for PICo tracking.
const PICO_MODEL: &str = "pico";

/// Voxel-order conversion, model fit inside the white-matter mask, then FA,
/// MD and the eigensystem of the fitted data.
pub fn build_reconstruction(config: &CaminoReconConfig) -> FlowResult<Flow> {
    let mut flow = Flow::new(RECON_FLOW_NAME);
    flow.add_node(FlowNode::identity(INPUT_NODE, INPUTS))?;
    flow.add_node(FlowNode::identity(OUTPUT_NODE, OUTPUTS))?;

    let tensors = config.number_of_tensors();
    let scheme = path_param(config.gradient_table()?);

    flow.add_node(camino::image_to_voxel("camino_convert"))?;
    flow.add_node(camino::model_fit(MODEL_FIT, config.diffusion_model(), &scheme))?;
    flow.add_node(camino::fractional_anisotropy("camino_FA", tensors.fitted_model()))?;
    flow.add_node(camino::mean_diffusivity("camino_MD", tensors.fitted_model()))?;
    flow.add_node(camino::eigensystem(
        "camino_eigenvectors",
        tensors.eigen_model(),
        config.max_components(),
    ))?;

    flow.connect(INPUT_NODE, "diffusion_resampled", "camino_convert", "in_file")?;
    flow.connect("camino_convert", "voxel_order", MODEL_FIT, "in_file")?;
    flow.connect(INPUT_NODE, "wm_mask_resampled", MODEL_FIT, "bgmask")?;
    for map in ["camino_FA", "camino_MD", "camino_eigenvectors"] {
        flow.connect(MODEL_FIT, "fitted_data", map, "in_file")?;
    }
    flow.connect(MODEL_FIT, "fitted_data", OUTPUT_NODE, "DWI")?;
    flow.connect("camino_FA", "fa", OUTPUT_NODE, "FA")?;
    flow.connect("camino_MD", "md", OUTPUT_NODE, "MD")?;
    flow.connect("camino_eigenvectors", "eigen", OUTPUT_NODE, "eigVec")?;

    Ok(flow)
}

/// Streamline tracking straight on the fitted data, or PICo tracking over
/// the probability density functions computed from it.
pub fn build_tracking(config: &CaminoTrackingConfig, number_of_tensors: NumberOfTensors) -> FlowResult<Flow> {
    let mut flow = Flow::new(TRACKING_FLOW_NAME);
    flow.add_node(FlowNode::identity(INPUT_NODE, TRACKING_INPUTS))?;
    flow.add_node(FlowNode::identity(OUTPUT_NODE, TRACKING_OUTPUTS))?;

    let model = number_of_tensors.eigen_model();
    let mut track = match config.tracking_mode() {
        DiffusionModel::Streamline => camino::track(TRACK, model),
        DiffusionModel::Probabilistic => {
            camino::track(TRACK, PICO_MODEL).with_param("iterations", config.iterations())
        }
    }
    .with_param("step_length", config.step_length())
    .with_param("curvethresh", config.curve_threshold());
    if let Some(threshold) = config.anisotropy_threshold() {
        track.set_param("anisthresh", threshold);
    }
    flow.add_node(track)?;
    flow.add_node(camino::vtk_to_trk(TERMINAL_NODE))?;

    match config.tracking_mode() {
        DiffusionModel::Streamline => {
            flow.connect(INPUT_NODE, "DWI", TRACK, "in_file")?;
        }
        DiffusionModel::Probabilistic => {
            flow.add_node(camino::pico_pdfs(PICO_PDFS, model))?;
            flow.connect(INPUT_NODE, "DWI", PICO_PDFS, "in_file")?;
            flow.connect(PICO_PDFS, "pdfs", TRACK, "in_file")?;
        }
    }
    flow.connect(INPUT_NODE, "wm_mask_resampled", TRACK, "seed_file")?;
    flow.connect(TRACK, "tracked", TERMINAL_NODE, "in_file")?;
    flow.connect(INPUT_NODE, "wm_mask_resampled", TERMINAL_NODE, "nifti_file")?;
    flow.connect(TERMINAL_NODE, "out_file", OUTPUT_NODE, "track_file")?;

    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::validate_flow;
    use serde_json::json;
    use std::path::Path;

    #[test]
    fn test_reconstruction_models() {
        let mut cfg = CaminoReconConfig::new(Path::new("/res"));
        cfg.set_number_of_tensors(NumberOfTensors::Two);
        cfg.set_max_components(2).unwrap();
        let flow = build_reconstruction(&cfg).unwrap();

        let fit = flow.node(MODEL_FIT).unwrap();
        assert_eq!(fit.param("model"), Some(&json!("cylcyl")));
        assert_eq!(fit.param("scheme_file"), Some(&json!("/res/siemens_06.txt")));
        assert_eq!(flow.node("camino_FA").unwrap().param("inputmodel"), Some(&json!("twotensor")));
        let eig = flow.node("camino_eigenvectors").unwrap();
        assert_eq!(eig.param("inputmodel"), Some(&json!("multitensor")));
        assert_eq!(eig.param("maxcomponents"), Some(&json!(2)));
        assert_eq!(
            flow.predecessors(OUTPUT_NODE).unwrap(),
            vec!["camino_FA", "camino_MD", MODEL_FIT, "camino_eigenvectors"]
        );
        assert!(validate_flow(&flow).is_valid);
    }

    #[test]
    fn test_streamline_tracking() {
        let cfg = CaminoTrackingConfig::default();
        let flow = build_tracking(&cfg, NumberOfTensors::One).unwrap();
        assert!(!flow.contains_node(PICO_PDFS));
        let track = flow.node(TRACK).unwrap();
        assert_eq!(track.param("inputmodel"), Some(&json!("dt")));
        assert_eq!(track.param("curvethresh"), Some(&json!(60.0)));
        assert!(track.param("anisthresh").is_none());
        assert!(track.param("iterations").is_none());
        assert!(validate_flow(&flow).is_valid);
    }

    #[test]
    fn test_probabilistic_tracking_goes_through_pico() {
        let mut cfg = CaminoTrackingConfig::default();
        cfg.set_tracking_mode(DiffusionModel::Probabilistic);
        cfg.set_anisotropy_threshold(Some(0.2)).unwrap();
        let flow = build_tracking(&cfg, NumberOfTensors::Three).unwrap();

        assert_eq!(flow.predecessors(TRACK).unwrap(), vec![PICO_PDFS, INPUT_NODE]);
        assert_eq!(flow.node(PICO_PDFS).unwrap().param("inputmodel"), Some(&json!("multitensor")));
        let track = flow.node(TRACK).unwrap();
        assert_eq!(track.param("inputmodel"), Some(&json!("pico")));
        assert_eq!(track.param("iterations"), Some(&json!(5000)));
        assert_eq!(track.param("anisthresh"), Some(&json!(0.2)));
        assert!(validate_flow(&flow).is_valid);
    }
}
