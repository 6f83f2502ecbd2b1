//! Flow-level error types.

use super::ConfigError;
use crate::graph::{ArtifactKind, PortDirection, ValidationReport};
use thiserror::Error;

/// Errors raised while assembling or exporting a flow graph
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Duplicate node ID: {0}")]
    DuplicateNode(String),
    #[error("Node not found: {0}")]
    NodeNotFound(String),
    #[error("Port not found: {node}.{port} ({direction})")]
    PortNotFound {
        node: String,
        port: String,
        direction: PortDirection,
    },
    #[error("Kind mismatch: {from_node}.{from_port} ({found}) cannot feed {to_node}.{to_port} ({expected})")]
    KindMismatch {
        from_node: String,
        from_port: String,
        to_node: String,
        to_port: String,
        found: ArtifactKind,
        expected: ArtifactKind,
    },
    #[error("Input already connected: {node}.{port}")]
    InputAlreadyConnected { node: String, port: String },
    #[error("Cycle detected in flow")]
    CycleDetected,
    #[error("No builder for reconstruction={reconstruction}, tracking={tracking}")]
    NoBuilder {
        reconstruction: String,
        tracking: String,
    },
    #[error("Missing argument for {node}: {port}")]
    MissingArgument { node: String, port: String },
    #[error("Flow validation failed")]
    ValidationFailed(Box<ValidationReport>),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
