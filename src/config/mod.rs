//! Stage configuration: choice enums, per-back-end configs, the stage
//! aggregator and the settings loader.

pub mod diffusion;
pub mod environment;
pub mod gradient;
pub mod recon;
pub mod settings;
pub mod tracking;
pub mod types;

pub use diffusion::{
    diffusion_model_choices_for, reconstruction_choices_for, tracking_choices_for,
    DiffusionConfig, DEFAULT_RESAMPLING,
};
pub use environment::{ResourceConfig, ToolEnvironment, DSI_PATH_VAR};
pub use gradient::{
    parse_direction_count, preset_path, GradientTableConfig, GradientTableSelection,
    GRADIENT_TABLE_PRESETS,
};
pub use recon::{
    recon_matrix_file, CaminoReconConfig, DtkReconConfig, MrtrixReconConfig,
    DSI_DIRECTION_CHOICES,
};
pub use settings::{load_settings, load_settings_file, SettingsFormat, StageSettings};
pub use tracking::{
    CaminoTrackingConfig, DtbTrackingConfig, DtkTrackingConfig, MrtrixTrackingConfig,
};
pub use types::*;
