//! The diffusion stage: resampling, one reconstruction and one tracking
//! subflow, wired behind a single `inputnode` / `outputnode` pair.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{DiffusionConfig, ToolEnvironment, TrackingBackend};
use crate::error::FlowResult;
use crate::flows::{
    self, ReconstructionConfig, TrackingConfig, INPUT_NODE, OUTPUT_NODE, RECON_FLOW_NAME,
    TRACKING_FLOW_NAME,
};
use crate::graph::{ensure_valid, qualified, ArtifactKind, Flow, FlowNode};
use crate::tools::freesurfer;

pub const STAGE_NAME: &str = "diffusion_stage";

pub const INPUTS: &[(&str, ArtifactKind)] = &[
    ("diffusion", ArtifactKind::Volume),
    ("wm_mask_registered", ArtifactKind::Mask),
    ("roi_volumes", ArtifactKind::Any),
];

pub const OUTPUTS: &[(&str, ArtifactKind)] = &[
    ("track_file", ArtifactKind::Tracks),
    ("gFA", ArtifactKind::ScalarMap),
    ("skewness", ArtifactKind::ScalarMap),
    ("kurtosis", ArtifactKind::ScalarMap),
    ("P0", ArtifactKind::ScalarMap),
    ("FA", ArtifactKind::ScalarMap),
    ("MD", ArtifactKind::ScalarMap),
];

pub const DIFFUSION_RESAMPLE: &str = "diffusion_resample";
pub const MASK_RESAMPLE: &str = "mask_resample";

const DIFFUSION_RESAMPLED_FILE: &str = "diffusion_resampled.nii";
const MASK_RESAMPLED_FILE: &str = "wm_mask_resampled.nii";

/// Viewer able to display an inspected output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewer {
    Trackvis,
}

/// An output ready for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectOutput {
    pub viewer: Viewer,
    pub path: PathBuf,
}

/// Diffusion stage of a connectome pipeline.
///
/// Holds the stage configuration and the directory the execution engine
/// writes this stage's results to.
#[derive(Debug, Clone)]
pub struct DiffusionStage {
    pub config: DiffusionConfig,
    pub stage_dir: PathBuf,
}

impl DiffusionStage {
    pub fn new(config: DiffusionConfig, stage_dir: impl Into<PathBuf>) -> Self {
        DiffusionStage {
            config,
            stage_dir: stage_dir.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        STAGE_NAME
    }

    /// Assemble and validate the stage graph.
    pub fn create_workflow(&self, env: &ToolEnvironment) -> FlowResult<Flow> {
        self.config.validate()?;
        let (recon_config, tracking_config) = flows::select(&self.config)?;
        let recon = flows::build_reconstruction(&recon_config, env)?;
        let tracking = flows::build_tracking(&tracking_config)?;

        let mut flow = Flow::new(STAGE_NAME);
        flow.add_node(FlowNode::identity(INPUT_NODE, INPUTS))?;
        flow.add_node(FlowNode::identity(OUTPUT_NODE, OUTPUTS))?;

        let resampling = self.config.resampling();
        flow.add_node(freesurfer::mri_convert(
            DIFFUSION_RESAMPLE,
            ArtifactKind::Volume,
            DIFFUSION_RESAMPLED_FILE,
            resampling,
        ))?;
        flow.add_node(freesurfer::mri_convert(
            MASK_RESAMPLE,
            ArtifactKind::Mask,
            MASK_RESAMPLED_FILE,
            resampling,
        ))?;
        flow.connect(INPUT_NODE, "diffusion", DIFFUSION_RESAMPLE, "in_file")?;
        flow.connect(INPUT_NODE, "wm_mask_registered", MASK_RESAMPLE, "in_file")?;

        // recon outputnode fields the builder actually drives
        let driven: Vec<&str> = recon_config
            .outputs()
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| recon.is_input_connected(OUTPUT_NODE, name))
            .collect();

        flow.add_subflow(recon)?;
        flow.add_subflow(tracking)?;

        let recon_in = qualified(RECON_FLOW_NAME, INPUT_NODE);
        let recon_out = qualified(RECON_FLOW_NAME, OUTPUT_NODE);
        let tracking_in = qualified(TRACKING_FLOW_NAME, INPUT_NODE);
        let tracking_out = qualified(TRACKING_FLOW_NAME, OUTPUT_NODE);

        self.connect_reconstruction_inputs(&mut flow, &recon_config, &recon_in)?;
        self.connect_tracking_inputs(&mut flow, &tracking_config, &tracking_in)?;
        flow.connect(&recon_out, "DWI", &tracking_in, "DWI")?;

        for (name, _) in OUTPUTS {
            if driven.contains(name) {
                flow.connect(&recon_out, name, OUTPUT_NODE, name)?;
            }
        }
        flow.connect(&tracking_out, "track_file", OUTPUT_NODE, "track_file")?;

        ensure_valid(&flow)?;
        info!(
            stage = STAGE_NAME,
            reconstruction = %recon_config.backend(),
            tracking = %tracking_config.backend(),
            nodes = flow.node_count(),
            connections = flow.connection_count(),
            "assembled stage graph"
        );
        Ok(flow)
    }

    fn connect_reconstruction_inputs(
        &self,
        flow: &mut Flow,
        recon: &ReconstructionConfig<'_>,
        recon_in: &str,
    ) -> FlowResult<()> {
        flow.connect(INPUT_NODE, "diffusion", recon_in, "diffusion")?;
        flow.connect(DIFFUSION_RESAMPLE, "out_file", recon_in, "diffusion_resampled")?;
        if recon.inputs().iter().any(|(name, _)| *name == "wm_mask_resampled") {
            flow.connect(MASK_RESAMPLE, "out_file", recon_in, "wm_mask_resampled")?;
        }
        Ok(())
    }

    fn connect_tracking_inputs(
        &self,
        flow: &mut Flow,
        tracking: &TrackingConfig<'_>,
        tracking_in: &str,
    ) -> FlowResult<()> {
        match tracking {
            TrackingConfig::Dtb { .. } => {
                flow.connect(INPUT_NODE, "wm_mask_registered", tracking_in, "wm_mask_registered")
            }
            TrackingConfig::Mrtrix { .. } | TrackingConfig::Camino { .. } => {
                flow.connect(MASK_RESAMPLE, "out_file", tracking_in, "wm_mask_resampled")
            }
        }
    }

    /// Directory the engine uses for the tracking flow's terminal node.
    pub fn terminal_dir(&self) -> PathBuf {
        let terminal = flows::terminal_node(self.config.tracking_software());
        self.stage_dir.join(TRACKING_FLOW_NAME).join(terminal)
    }

    /// Whether the terminal tracking node has left its result file behind.
    pub fn has_run(&self) -> bool {
        let terminal = flows::terminal_node(self.config.tracking_software());
        let marker = self.terminal_dir().join(format!("result_{}.pklz", terminal));
        debug!(marker = %marker.display(), "checking stage result");
        marker.exists()
    }

    /// Outputs worth opening in a viewer; empty until the stage has run.
    pub fn inspect_outputs(&self) -> BTreeMap<String, InspectOutput> {
        let mut outputs = BTreeMap::new();
        if !self.has_run() {
            return outputs;
        }
        let backend = self.config.tracking_software();
        let label = match backend {
            TrackingBackend::Dtb => "streamline",
            TrackingBackend::Mrtrix | TrackingBackend::Camino => "tracks",
        };
        outputs.insert(
            label.to_string(),
            InspectOutput {
                viewer: Viewer::Trackvis,
                path: self.terminal_dir().join(flows::track_file_name(backend)),
            },
        );
        outputs
    }

    pub fn stage_dir(&self) -> &Path {
        &self.stage_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImagingModel, ReconstructionBackend};

    fn env() -> ToolEnvironment {
        ToolEnvironment {
            dsi_path: Some("/opt/dtk/matrices".into()),
        }
    }

    fn stage(recon: ReconstructionBackend) -> DiffusionStage {
        let mut config = DiffusionConfig::default();
        config.set_reconstruction_software(recon).unwrap();
        DiffusionStage::new(config, "/work/diffusion_stage")
    }

    fn output_sources(flow: &Flow) -> Vec<String> {
        let mut ports: Vec<String> = flow
            .incoming(OUTPUT_NODE)
            .unwrap()
            .into_iter()
            .map(|c| c.target_port.clone())
            .collect();
        ports.sort();
        ports
    }

    #[test]
    fn test_dtk_stage_wiring() {
        let mut stage = stage(ReconstructionBackend::Dtk);
        stage.config.set_imaging_model(ImagingModel::Hardi).unwrap();
        let flow = stage.create_workflow(&env()).unwrap();
        assert_eq!(flow.name(), STAGE_NAME);
        assert!(flow.contains_node("reconstruction.dtk_odfrecon"));
        assert!(flow.contains_node("tracking.dtb_streamline"));
        assert_eq!(
            output_sources(&flow),
            vec!["P0", "gFA", "kurtosis", "skewness", "track_file"]
        );
        assert_eq!(
            flow.predecessors("tracking.inputnode").unwrap(),
            vec![INPUT_NODE, "reconstruction.outputnode"]
        );
        assert!(!flow.is_input_connected("reconstruction.inputnode", "wm_mask_resampled"));
    }

    #[test]
    fn test_mrtrix_and_camino_use_resampled_mask() {
        let flow = stage(ReconstructionBackend::Mrtrix).create_workflow(&env()).unwrap();
        assert_eq!(flow.successors(MASK_RESAMPLE).unwrap(), vec![
            "reconstruction.inputnode",
            "tracking.inputnode",
        ]);
        assert_eq!(output_sources(&flow), vec!["FA", "track_file"]);

        let flow = stage(ReconstructionBackend::Camino).create_workflow(&env()).unwrap();
        assert_eq!(output_sources(&flow), vec!["FA", "MD", "track_file"]);
    }

    #[test]
    fn test_resampling_parameters() {
        let mut stage = stage(ReconstructionBackend::Camino);
        stage.config.set_resampling((2.0, 2.0, 2.5)).unwrap();
        let flow = stage.create_workflow(&env()).unwrap();
        let node = flow.node(DIFFUSION_RESAMPLE).unwrap();
        assert_eq!(node.param("vox_size"), Some(&serde_json::json!([2.0, 2.0, 2.5])));
        assert_eq!(node.param("out_file"), Some(&serde_json::json!("diffusion_resampled.nii")));
    }

    #[test]
    fn test_inspect_requires_result() {
        let stage = stage(ReconstructionBackend::Mrtrix);
        assert!(!stage.has_run());
        assert!(stage.inspect_outputs().is_empty());
        assert_eq!(
            stage.terminal_dir(),
            PathBuf::from("/work/diffusion_stage/tracking/mrtrix_tck2trk")
        );
    }
}
