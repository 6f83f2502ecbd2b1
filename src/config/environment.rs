//! Filesystem locations the stage depends on.
//!
//! Both structs are passed explicitly to the code that needs them; nothing
//! below the binary reads process state on its own.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable naming the DTK installation that ships the DSI matrices.
pub const DSI_PATH_VAR: &str = "DSI_PATH";

/// Packaged data files (gradient tables, ODF direction list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub gradient_table_dir: PathBuf,
    pub odf_directions_file: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        ResourceConfig {
            gradient_table_dir: PathBuf::from("data/diffusion/gradient_tables"),
            odf_directions_file: PathBuf::from("data/diffusion/odf_directions/181_vecs.dat"),
        }
    }
}

impl ResourceConfig {
    /// Resources rooted at `root` instead of the working directory.
    pub fn rooted_at(root: &Path) -> Self {
        let defaults = ResourceConfig::default();
        ResourceConfig {
            gradient_table_dir: root.join(defaults.gradient_table_dir),
            odf_directions_file: root.join(defaults.odf_directions_file),
        }
    }
}

/// External tool installation paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEnvironment {
    pub dsi_path: Option<PathBuf>,
}

impl ToolEnvironment {
    pub fn from_env() -> Self {
        ToolEnvironment {
            dsi_path: std::env::var_os(DSI_PATH_VAR).map(PathBuf::from),
        }
    }

    /// Full path of a DSI reconstruction matrix.
    pub fn dsi_matrix(&self, file: &str) -> ConfigResult<PathBuf> {
        self.dsi_path
            .as_ref()
            .map(|dir| dir.join(file))
            .ok_or_else(|| ConfigError::MissingEnvironment(DSI_PATH_VAR.to_string()))
    }
}
