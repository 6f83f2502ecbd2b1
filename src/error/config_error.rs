use thiserror::Error;

/// Configuration-level errors
///
/// Raised while editing or resolving a stage configuration. Everything in
/// here is detectable from the configuration alone, before any graph is
/// handed to the execution engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Unknown {field}: {value}")]
    UnknownChoice { field: &'static str, value: String },
    #[error("Illegal {field} '{value}', allowed: {allowed}")]
    IllegalChoice {
        field: &'static str,
        value: String,
        allowed: String,
    },
    #[error("Malformed gradient table preset (no direction count): {0}")]
    MalformedPreset(String),
    #[error("Custom gradient table selected for {backend} but no file supplied")]
    MissingCustomGradientTable { backend: &'static str },
    #[error("Environment variable not set: {0}")]
    MissingEnvironment(String),
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Settings parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn illegal<T: std::fmt::Display>(
        field: &'static str,
        value: impl std::fmt::Display,
        allowed: &[T],
    ) -> Self {
        ConfigError::IllegalChoice {
            field,
            value: value.to_string(),
            allowed: allowed
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
