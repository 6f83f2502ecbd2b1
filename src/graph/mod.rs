//! Flow graph construction and representation.
//!
//! A [`Flow`] is a DAG of tool invocations with typed ports. Builders in
//! [`crate::flows`] produce small flows per back end; the stage merges them
//! with [`Flow::add_subflow`] and exports the result as a [`FlowSchema`].

pub mod builder;
pub mod diagnostics;
pub mod export;
pub mod traversal;
pub mod types;
pub mod validator;

pub use builder::*;
pub use diagnostics::{Diagnostic, DiagnosticLevel, ValidationReport};
pub use export::{EdgeSchema, FlowSchema, NodeSchema, FLOW_SCHEMA_VERSION};
pub use traversal::{roots, topological_sort, upstream_of};
pub use types::*;
pub use validator::{ensure_valid, validate_flow};
