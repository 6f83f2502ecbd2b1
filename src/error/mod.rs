//! Error types for stage configuration and flow assembly.
//!
//! - [`ConfigError`]: Illegal selections, malformed presets, missing inputs.
//! - [`FlowError`]: Graph-construction failures (ports, kinds, cycles, builders).

pub mod config_error;
pub mod flow_error;

pub use config_error::ConfigError;
pub use flow_error::FlowError;

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
/// Convenience alias for flow-assembly results.
pub type FlowResult<T> = Result<T, FlowError>;
