//! Gradient table selection shared by the reconstruction back ends.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Gradient tables shipped with the package.
pub const GRADIENT_TABLE_PRESETS: &[&str] = &[
    "mgh_dti_006",
    "mgh_dti_018",
    "mgh_dti_030",
    "mgh_dti_042",
    "mgh_dti_060",
    "mgh_dti_072",
    "mgh_dti_090",
    "mgh_dti_120",
    "mgh_dti_144",
    "siemens_06",
    "siemens_12",
    "siemens_20",
    "siemens_30",
    "siemens_64",
    "siemens_256",
];

pub const DEFAULT_PRESET: &str = "siemens_06";

/// Label of the user-supplied table in selection lists.
pub const CUSTOM_LABEL: &str = "Custom...";

/// A named preset or a user-supplied file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GradientTableSelection {
    Preset(String),
    Custom,
}

impl GradientTableSelection {
    pub fn preset(name: &str) -> ConfigResult<Self> {
        name.parse()
    }

    /// Every selectable entry, presets first.
    pub fn choices() -> Vec<GradientTableSelection> {
        GRADIENT_TABLE_PRESETS
            .iter()
            .map(|p| GradientTableSelection::Preset(p.to_string()))
            .chain(std::iter::once(GradientTableSelection::Custom))
            .collect()
    }
}

impl Default for GradientTableSelection {
    fn default() -> Self {
        GradientTableSelection::Preset(DEFAULT_PRESET.to_string())
    }
}

impl fmt::Display for GradientTableSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradientTableSelection::Preset(name) => f.write_str(name),
            GradientTableSelection::Custom => f.write_str(CUSTOM_LABEL),
        }
    }
}

impl FromStr for GradientTableSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == CUSTOM_LABEL || s.eq_ignore_ascii_case("custom") {
            return Ok(GradientTableSelection::Custom);
        }
        if GRADIENT_TABLE_PRESETS.contains(&s) {
            return Ok(GradientTableSelection::Preset(s.to_string()));
        }
        Err(ConfigError::UnknownChoice {
            field: "gradient table",
            value: s.to_string(),
        })
    }
}

impl TryFrom<String> for GradientTableSelection {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GradientTableSelection> for String {
    fn from(value: GradientTableSelection) -> Self {
        value.to_string()
    }
}

/// Number of diffusion directions encoded in a preset name.
///
/// The first run of decimal digits wins: `siemens_64` is 64, `mgh_dti_006` is 6.
pub fn parse_direction_count(preset: &str) -> ConfigResult<u32> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("static regex"));
    re.find(preset)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| ConfigError::MalformedPreset(preset.to_string()))
}

/// File path of a packaged preset.
pub fn preset_path(resource_dir: &Path, preset: &str) -> PathBuf {
    resource_dir.join(format!("{}.txt", preset))
}

/// Gradient-table selector with its derived path and direction count.
///
/// The derived fields always follow the last selection: a preset resolves
/// against the packaged resource directory, `Custom` takes the supplied file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientTableConfig {
    selection: GradientTableSelection,
    custom_gradient_table: Option<PathBuf>,
    gradient_table: Option<PathBuf>,
    number_of_directions: u32,
    #[serde(skip)]
    resource_dir: PathBuf,
}

impl GradientTableConfig {
    pub fn new(resource_dir: &Path) -> Self {
        GradientTableConfig {
            selection: GradientTableSelection::default(),
            custom_gradient_table: None,
            gradient_table: Some(preset_path(resource_dir, DEFAULT_PRESET)),
            number_of_directions: parse_direction_count(DEFAULT_PRESET).unwrap_or_default(),
            resource_dir: resource_dir.to_path_buf(),
        }
    }

    pub fn selection(&self) -> &GradientTableSelection {
        &self.selection
    }

    pub fn custom_gradient_table(&self) -> Option<&Path> {
        self.custom_gradient_table.as_deref()
    }

    pub fn number_of_directions(&self) -> u32 {
        self.number_of_directions
    }

    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    /// Derived gradient table path.
    pub fn gradient_table(&self, backend: &'static str) -> ConfigResult<&Path> {
        self.gradient_table
            .as_deref()
            .ok_or(ConfigError::MissingCustomGradientTable { backend })
    }

    pub fn select(&mut self, selection: GradientTableSelection) -> ConfigResult<()> {
        let mut next = self.clone();
        next.selection = selection;
        next.refresh()?;
        *self = next;
        Ok(())
    }

    pub fn set_custom_gradient_table(&mut self, path: impl Into<PathBuf>) {
        self.custom_gradient_table = Some(path.into());
        if self.selection == GradientTableSelection::Custom {
            self.gradient_table = self.custom_gradient_table.clone();
        }
    }

    /// Direction count of a custom table. Presets carry their own count.
    pub fn set_number_of_directions(&mut self, n: u32) -> ConfigResult<()> {
        if self.selection != GradientTableSelection::Custom {
            return Err(ConfigError::IllegalChoice {
                field: "number of directions",
                value: n.to_string(),
                allowed: format!("derived from preset {}", self.selection),
            });
        }
        self.number_of_directions = n;
        Ok(())
    }

    pub fn set_resource_dir(&mut self, resource_dir: &Path) -> ConfigResult<()> {
        self.resource_dir = resource_dir.to_path_buf();
        self.refresh()
    }

    /// Re-derive path and direction count from the current selection.
    pub fn refresh(&mut self) -> ConfigResult<()> {
        match &self.selection {
            GradientTableSelection::Preset(name) => {
                let count = parse_direction_count(name)?;
                self.gradient_table = Some(preset_path(&self.resource_dir, name));
                self.number_of_directions = count;
            }
            GradientTableSelection::Custom => {
                self.gradient_table = self.custom_gradient_table.clone();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_count_from_every_preset() {
        for preset in GRADIENT_TABLE_PRESETS {
            let digits: String = preset.chars().filter(|c| c.is_ascii_digit()).collect();
            assert_eq!(parse_direction_count(preset).unwrap(), digits.parse::<u32>().unwrap());
        }
        assert_eq!(parse_direction_count("mgh_dti_006").unwrap(), 6);
        assert_eq!(parse_direction_count("siemens_256").unwrap(), 256);
    }

    #[test]
    fn test_direction_count_requires_digits() {
        assert_eq!(
            parse_direction_count("siemens").unwrap_err(),
            ConfigError::MalformedPreset("siemens".into())
        );
    }

    #[test]
    fn test_preset_path_and_count() {
        let mut cfg = GradientTableConfig::new(Path::new("/res/gradient_tables"));
        assert_eq!(cfg.gradient_table("DTK").unwrap(), Path::new("/res/gradient_tables/siemens_06.txt"));
        cfg.select(GradientTableSelection::preset("mgh_dti_090").unwrap())
            .unwrap();
        assert_eq!(cfg.number_of_directions(), 90);
        assert_eq!(
            cfg.gradient_table("DTK").unwrap(),
            Path::new("/res/gradient_tables/mgh_dti_090.txt")
        );
    }

    #[test]
    fn test_custom_overrides_preset() {
        let mut cfg = GradientTableConfig::new(Path::new("/res"));
        cfg.select(GradientTableSelection::preset("siemens_64").unwrap())
            .unwrap();
        cfg.select(GradientTableSelection::Custom).unwrap();
        assert_eq!(
            cfg.gradient_table("MRtrix").unwrap_err(),
            ConfigError::MissingCustomGradientTable { backend: "MRtrix" }
        );
        cfg.set_custom_gradient_table("/home/me/grad.txt");
        assert_eq!(cfg.gradient_table("MRtrix").unwrap(), Path::new("/home/me/grad.txt"));
        cfg.set_number_of_directions(33).unwrap();
        assert_eq!(cfg.number_of_directions(), 33);
    }

    #[test]
    fn test_custom_path_set_before_selection() {
        let mut cfg = GradientTableConfig::new(Path::new("/res"));
        cfg.set_custom_gradient_table("/tmp/g.txt");
        assert_eq!(cfg.gradient_table("Camino").unwrap(), Path::new("/res/siemens_06.txt"));
        cfg.select(GradientTableSelection::Custom).unwrap();
        assert_eq!(cfg.gradient_table("Camino").unwrap(), Path::new("/tmp/g.txt"));
        cfg.select(GradientTableSelection::preset("siemens_12").unwrap())
            .unwrap();
        assert_eq!(cfg.gradient_table("Camino").unwrap(), Path::new("/res/siemens_12.txt"));
    }

    #[test]
    fn test_preset_direction_count_is_read_only() {
        let mut cfg = GradientTableConfig::new(Path::new("/res"));
        assert!(matches!(
            cfg.set_number_of_directions(12),
            Err(ConfigError::IllegalChoice { .. })
        ));
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!(
            "Custom...".parse::<GradientTableSelection>().unwrap(),
            GradientTableSelection::Custom
        );
        assert_eq!(
            "custom".parse::<GradientTableSelection>().unwrap(),
            GradientTableSelection::Custom
        );
        assert!(matches!(
            "philips_32".parse::<GradientTableSelection>(),
            Err(ConfigError::UnknownChoice { .. })
        ));
        let sel: GradientTableSelection = serde_json::from_str("\"siemens_30\"").unwrap();
        assert_eq!(sel.to_string(), "siemens_30");
        assert_eq!(GradientTableSelection::choices().len(), GRADIENT_TABLE_PRESETS.len() + 1);
    }
}
