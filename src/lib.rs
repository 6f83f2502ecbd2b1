//! # dwiflow: diffusion-MRI stage configuration and wiring
//!
//! `dwiflow` configures the diffusion stage of a connectome pipeline and
//! describes it as a directed acyclic graph of external command-line tools.
//! It does not run anything: the exported [`FlowSchema`] is handed to an
//! execution engine.
//!
//! - **Configuration**: typed per-back-end configs for reconstruction
//!   (DTK, MRtrix, Camino) and tracking (DTB, MRtrix, Camino), kept
//!   consistent by [`DiffusionConfig`] after every edit.
//! - **Flow builders**: one reconstruction and one tracking builder per
//!   back end, each returning a small [`Flow`] with `inputnode` /
//!   `outputnode` interface nodes.
//! - **Stage assembly**: [`DiffusionStage`] resamples the inputs, merges
//!   the chosen subflows and validates the result.
//! - **Settings**: stage configuration loaded from YAML, JSON or TOML.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dwiflow::{load_settings, DiffusionStage, SettingsFormat, ToolEnvironment};
//!
//! let yaml = std::fs::read_to_string("diffusion.yaml").unwrap();
//! let config = load_settings(&yaml, SettingsFormat::Yaml)
//!     .unwrap()
//!     .into_config()
//!     .unwrap();
//! let stage = DiffusionStage::new(config, "/data/subject01/diffusion_stage");
//! let flow = stage.create_workflow(&ToolEnvironment::from_env()).unwrap();
//! println!("{}", serde_json::to_string_pretty(&flow.to_schema().unwrap()).unwrap());
//! ```

pub mod config;
pub mod error;
pub mod flows;
pub mod graph;
pub mod paths;
pub mod stage;
pub mod tools;

pub use crate::config::{
    load_settings, load_settings_file, DiffusionConfig, DiffusionModel, ImagingModel,
    ReconstructionBackend, ResourceConfig, SettingsFormat, StageSettings, ToolEnvironment,
    TrackingBackend,
};
pub use crate::error::{ConfigError, ConfigResult, FlowError, FlowResult};
pub use crate::flows::{ReconstructionConfig, TrackingConfig};
pub use crate::graph::{
    validate_flow, ArtifactKind, Diagnostic, DiagnosticLevel, Flow, FlowNode, FlowSchema,
    ValidationReport,
};
pub use crate::stage::{DiffusionStage, InspectOutput, Viewer};
pub use crate::tools::{create_default_registry, ToolRegistry};
