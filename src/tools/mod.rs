//! Catalogue of the external commands the stage wires together.
//!
//! Each constructor returns a [`FlowNode`](crate::graph::FlowNode) with the
//! command's typed ports and fixed parameters; the flow builders only pick
//! ids and connect them. [`ToolRegistry`] knows the output naming rules of
//! the in-house commands and renders argument vectors.

pub mod camino;
pub mod dtb;
pub mod dtk;
pub mod freesurfer;
pub mod mrtrix;
pub mod registry;

pub use dtb::{dtb_dir_output, dtb_gfa_output, dtb_p0_output};
pub use mrtrix::mrmult_output;
pub use registry::{create_default_registry, Bindings, OutputNamer, ToolRegistry};
