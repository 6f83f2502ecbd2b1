//! Reconstruction and tracking flow builders.
//!
//! Every builder returns a fresh [`Flow`] named [`RECON_FLOW_NAME`] or
//! [`TRACKING_FLOW_NAME`] that exposes its interface through two identity
//! nodes, [`INPUT_NODE`] and [`OUTPUT_NODE`]. Dispatch is over the closed
//! enums [`ReconstructionConfig`] and [`TrackingConfig`], each variant
//! carrying only what its builder needs.

pub mod camino;
pub mod dtb;
pub mod dtk;
pub mod mrtrix;

use std::path::Path;

use tracing::debug;

use crate::config::{
    CaminoReconConfig, CaminoTrackingConfig, DiffusionConfig, DtbTrackingConfig, DtkReconConfig,
    MrtrixReconConfig, MrtrixTrackingConfig, NumberOfTensors, ReconstructionBackend,
    ResourceConfig, ToolEnvironment, TrackingBackend,
};
use crate::error::{ConfigResult, FlowError, FlowResult};
use crate::graph::{ArtifactKind, Flow};

pub const RECON_FLOW_NAME: &str = "reconstruction";
pub const TRACKING_FLOW_NAME: &str = "tracking";
pub const INPUT_NODE: &str = "inputnode";
pub const OUTPUT_NODE: &str = "outputnode";

/// Reconstruction back end with its configuration.
#[derive(Debug, Clone, Copy)]
pub enum ReconstructionConfig<'a> {
    Dtk(&'a DtkReconConfig),
    Mrtrix(&'a MrtrixReconConfig),
    Camino(&'a CaminoReconConfig),
}

impl<'a> ReconstructionConfig<'a> {
    /// The reconstruction selected by a stage configuration.
    pub fn from_stage(config: &'a DiffusionConfig) -> Self {
        match config.reconstruction_software() {
            ReconstructionBackend::Dtk => ReconstructionConfig::Dtk(&config.dtk_recon),
            ReconstructionBackend::Mrtrix => ReconstructionConfig::Mrtrix(&config.mrtrix_recon),
            ReconstructionBackend::Camino => ReconstructionConfig::Camino(&config.camino_recon),
        }
    }

    pub fn backend(&self) -> ReconstructionBackend {
        match self {
            ReconstructionConfig::Dtk(_) => ReconstructionBackend::Dtk,
            ReconstructionConfig::Mrtrix(_) => ReconstructionBackend::Mrtrix,
            ReconstructionConfig::Camino(_) => ReconstructionBackend::Camino,
        }
    }

    /// Input fields of the built flow's `inputnode`.
    pub fn inputs(&self) -> &'static [(&'static str, ArtifactKind)] {
        match self {
            ReconstructionConfig::Dtk(_) => dtk::INPUTS,
            ReconstructionConfig::Mrtrix(_) => mrtrix::INPUTS,
            ReconstructionConfig::Camino(_) => camino::INPUTS,
        }
    }

    /// Output fields of the built flow's `outputnode`.
    pub fn outputs(&self) -> &'static [(&'static str, ArtifactKind)] {
        match self {
            ReconstructionConfig::Dtk(_) => dtk::OUTPUTS,
            ReconstructionConfig::Mrtrix(_) => mrtrix::OUTPUTS,
            ReconstructionConfig::Camino(_) => camino::OUTPUTS,
        }
    }
}

/// Tracking back end with its configuration and the upstream values it needs.
#[derive(Debug, Clone, Copy)]
pub enum TrackingConfig<'a> {
    Dtb {
        config: &'a DtbTrackingConfig,
        resources: &'a ResourceConfig,
    },
    Mrtrix {
        config: &'a MrtrixTrackingConfig,
        gradient_table: &'a Path,
        compute_csd: bool,
    },
    Camino {
        config: &'a CaminoTrackingConfig,
        number_of_tensors: NumberOfTensors,
    },
}

impl<'a> TrackingConfig<'a> {
    /// The tracking selected by a stage configuration.
    ///
    /// MRtrix tracking reads the MRtrix reconstruction's gradient table, so a
    /// custom table without a file is reported here.
    pub fn from_stage(config: &'a DiffusionConfig) -> ConfigResult<Self> {
        Ok(match config.tracking_software() {
            TrackingBackend::Dtb => TrackingConfig::Dtb {
                config: &config.dtb_tracking,
                resources: config.resources(),
            },
            TrackingBackend::Mrtrix => TrackingConfig::Mrtrix {
                config: &config.mrtrix_tracking,
                gradient_table: config.mrtrix_recon.gradient_table()?,
                compute_csd: config.mrtrix_recon.compute_csd(),
            },
            TrackingBackend::Camino => TrackingConfig::Camino {
                config: &config.camino_tracking,
                number_of_tensors: config.camino_recon.number_of_tensors(),
            },
        })
    }

    pub fn backend(&self) -> TrackingBackend {
        match self {
            TrackingConfig::Dtb { .. } => TrackingBackend::Dtb,
            TrackingConfig::Mrtrix { .. } => TrackingBackend::Mrtrix,
            TrackingConfig::Camino { .. } => TrackingBackend::Camino,
        }
    }

    pub fn inputs(&self) -> &'static [(&'static str, ArtifactKind)] {
        match self {
            TrackingConfig::Dtb { .. } => dtb::INPUTS,
            TrackingConfig::Mrtrix { .. } => mrtrix::TRACKING_INPUTS,
            TrackingConfig::Camino { .. } => camino::TRACKING_INPUTS,
        }
    }

    /// Last node of the tracking flow; its result marks the stage as done.
    pub fn terminal_node(&self) -> &'static str {
        terminal_node(self.backend())
    }

    /// Track file name written by the terminal node.
    pub fn track_file_name(&self) -> &'static str {
        track_file_name(self.backend())
    }
}

/// Last node of the tracking flow for `backend`.
pub fn terminal_node(backend: TrackingBackend) -> &'static str {
    match backend {
        TrackingBackend::Dtb => dtb::TERMINAL_NODE,
        TrackingBackend::Mrtrix => mrtrix::TERMINAL_NODE,
        TrackingBackend::Camino => camino::TERMINAL_NODE,
    }
}

/// Track file written by the terminal node of `backend`.
pub fn track_file_name(backend: TrackingBackend) -> &'static str {
    match backend {
        TrackingBackend::Dtb => crate::tools::dtb::STREAMLINE_TRACK_FILE,
        TrackingBackend::Mrtrix => crate::tools::mrtrix::CONVERTED_TRACK_FILE,
        TrackingBackend::Camino => crate::tools::camino::TRACKVIS_TRACK_FILE,
    }
}

/// Build the reconstruction flow.
pub fn build_reconstruction(config: &ReconstructionConfig<'_>, env: &ToolEnvironment) -> FlowResult<Flow> {
    let flow = match config {
        ReconstructionConfig::Dtk(c) => dtk::build(c, env)?,
        ReconstructionConfig::Mrtrix(c) => mrtrix::build_reconstruction(c)?,
        ReconstructionConfig::Camino(c) => camino::build_reconstruction(c)?,
    };
    debug!(backend = %config.backend(), nodes = flow.node_count(), "built reconstruction flow");
    Ok(flow)
}

/// Build the tracking flow.
pub fn build_tracking(config: &TrackingConfig<'_>) -> FlowResult<Flow> {
    let flow = match config {
        TrackingConfig::Dtb { config, resources } => dtb::build(config, resources)?,
        TrackingConfig::Mrtrix {
            config,
            gradient_table,
            compute_csd,
        } => mrtrix::build_tracking(config, gradient_table, *compute_csd)?,
        TrackingConfig::Camino {
            config,
            number_of_tensors,
        } => camino::build_tracking(config, *number_of_tensors)?,
    };
    debug!(backend = %config.backend(), nodes = flow.node_count(), "built tracking flow");
    Ok(flow)
}

/// Pick the builders for a stage configuration.
///
/// Fails with [`FlowError::NoBuilder`] when the back ends are not a
/// supported pair.
pub fn select(config: &DiffusionConfig) -> FlowResult<(ReconstructionConfig<'_>, TrackingConfig<'_>)> {
    let recon = config.reconstruction_software();
    let tracking = config.tracking_software();
    if TrackingBackend::paired_with(recon) != tracking {
        return Err(FlowError::NoBuilder {
            reconstruction: recon.to_string(),
            tracking: tracking.to_string(),
        });
    }
    Ok((
        ReconstructionConfig::from_stage(config),
        TrackingConfig::from_stage(config)?,
    ))
}

/// Path as a node parameter value.
pub(crate) fn path_param(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
