//! Stage settings files.
//!
//! A settings document is a sparse overlay on [`DiffusionConfig`]: every
//! field is optional and applied through the same setters an interactive
//! edit would use, so cascades fire and illegal values are rejected.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::diffusion::DiffusionConfig;
use super::environment::ResourceConfig;
use super::gradient::{GradientTableConfig, GradientTableSelection};
use super::types::{
    AdditionalMap, Axis, DiffusionModel, ImagingModel, Mask1Input, NumberOfTensors,
    ReconstructionBackend, TrackingBackend,
};
use crate::error::{ConfigError, ConfigResult};

/// Supported settings formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// YAML format (`.yaml` / `.yml`).
    Yaml,
    /// JSON format (`.json`).
    Json,
    /// TOML format (`.toml`).
    Toml,
}

impl SettingsFormat {
    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(SettingsFormat::Yaml),
            "json" => Ok(SettingsFormat::Json),
            "toml" => Ok(SettingsFormat::Toml),
            _ => Err(ConfigError::UnknownChoice {
                field: "settings format",
                value: path.display().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradientSettings {
    pub gradient_table: Option<GradientTableSelection>,
    pub custom_gradient_table: Option<PathBuf>,
    pub number_of_directions: Option<u32>,
}

/// `lmax_order` is either `Auto` or an even order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LmaxOrderSetting {
    Order(u8),
    Named(String),
}

impl LmaxOrderSetting {
    fn resolve(&self) -> ConfigResult<Option<u8>> {
        match self {
            LmaxOrderSetting::Order(n) => Ok(Some(*n)),
            LmaxOrderSetting::Named(s) if s.eq_ignore_ascii_case("auto") => Ok(None),
            LmaxOrderSetting::Named(s) => Err(ConfigError::UnknownChoice {
                field: "lmax order",
                value: s.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DtkReconSettings {
    pub gradient: Option<GradientSettings>,
    pub maximum_b_value: Option<u32>,
    pub dsi_number_of_directions: Option<u32>,
    pub number_of_output_directions: Option<u32>,
    pub apply_gradient_orientation_correction: Option<bool>,
    pub number_of_averages: Option<u32>,
    pub multiple_high_b_values: Option<bool>,
    pub number_of_b0_volumes: Option<u32>,
    pub compute_additional_maps: Option<BTreeSet<AdditionalMap>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MrtrixReconSettings {
    pub gradient: Option<GradientSettings>,
    pub compute_csd: Option<bool>,
    pub lmax_order: Option<LmaxOrderSetting>,
    pub normalize_to_b0: Option<bool>,
    pub single_fib_thr: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaminoReconSettings {
    pub gradient: Option<GradientSettings>,
    pub number_of_tensors: Option<NumberOfTensors>,
    pub diffusion_model: Option<String>,
    pub max_components: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DtkTrackingSettings {
    pub angle_threshold: Option<f64>,
    pub mask1_input: Option<Mask1Input>,
    pub mask1_threshold: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DtbTrackingSettings {
    pub flip_input: Option<BTreeSet<Axis>>,
    pub angle: Option<f64>,
    pub seeds: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MrtrixTrackingSettings {
    pub desired_number_of_tracks: Option<u32>,
    pub max_number_of_tracks: Option<u32>,
    pub curvature: Option<f64>,
    pub step_size: Option<f64>,
    pub min_length: Option<f64>,
    pub max_length: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaminoTrackingSettings {
    pub step_length: Option<f64>,
    pub curve_threshold: Option<f64>,
    pub anisotropy_threshold: Option<f64>,
    pub iterations: Option<u32>,
}

/// Sparse stage settings as read from a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageSettings {
    pub imaging_model: Option<ImagingModel>,
    pub diffusion_model: Option<DiffusionModel>,
    pub reconstruction_software: Option<ReconstructionBackend>,
    pub tracking_software: Option<TrackingBackend>,
    pub resampling: Option<[f64; 3]>,
    pub resources: Option<ResourceConfig>,
    pub dtk_recon: Option<DtkReconSettings>,
    pub mrtrix_recon: Option<MrtrixReconSettings>,
    pub camino_recon: Option<CaminoReconSettings>,
    pub dtk_tracking: Option<DtkTrackingSettings>,
    pub dtb_tracking: Option<DtbTrackingSettings>,
    pub mrtrix_tracking: Option<MrtrixTrackingSettings>,
    pub camino_tracking: Option<CaminoTrackingSettings>,
}

/// Parse settings content.
pub fn load_settings(content: &str, format: SettingsFormat) -> ConfigResult<StageSettings> {
    match format {
        SettingsFormat::Yaml => {
            serde_saphyr::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        SettingsFormat::Json => Ok(serde_json::from_str(content)?),
        SettingsFormat::Toml => {
            // TOML goes through serde_json::Value so untagged settings see
            // the same value shapes as the other two formats.
            let toml_val: toml::Value =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            Ok(serde_json::from_value(toml_value_to_json(toml_val))?)
        }
    }
}

/// Read and parse a settings file, picking the format from its extension.
pub fn load_settings_file(path: &Path) -> ConfigResult<StageSettings> {
    let format = SettingsFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
    load_settings(&content, format)
}

fn toml_value_to_json(val: toml::Value) -> serde_json::Value {
    match val {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_value_to_json).collect())
        }
        toml::Value::Table(tbl) => serde_json::Value::Object(
            tbl.into_iter()
                .map(|(k, v)| (k, toml_value_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
    }
}

fn apply_gradient(cfg: &mut GradientTableConfig, settings: &GradientSettings) -> ConfigResult<()> {
    if let Some(path) = &settings.custom_gradient_table {
        cfg.set_custom_gradient_table(path.clone());
    }
    if let Some(selection) = &settings.gradient_table {
        cfg.select(selection.clone())?;
    }
    if let Some(n) = settings.number_of_directions {
        cfg.set_number_of_directions(n)?;
    }
    Ok(())
}

impl StageSettings {
    /// Apply these settings on top of the defaults.
    pub fn into_config(self) -> ConfigResult<DiffusionConfig> {
        let mut cfg = DiffusionConfig::default();
        self.apply_to(&mut cfg)?;
        Ok(cfg)
    }

    /// Apply these settings to an existing configuration.
    ///
    /// All or nothing: on error `cfg` is left as it was.
    pub fn apply_to(&self, cfg: &mut DiffusionConfig) -> ConfigResult<()> {
        let mut next = cfg.clone();
        self.apply_each(&mut next)?;
        *cfg = next.resolved()?;
        Ok(())
    }

    /// Stage-wide choices go first so that the per-back-end values are
    /// checked against the final imaging and diffusion models.
    fn apply_each(&self, cfg: &mut DiffusionConfig) -> ConfigResult<()> {
        if let Some(resources) = &self.resources {
            cfg.set_resources(resources.clone())?;
        }
        if let Some(model) = self.imaging_model {
            cfg.set_imaging_model(model)?;
        }
        if let Some(model) = self.diffusion_model {
            cfg.set_diffusion_model(model)?;
        }
        match (self.reconstruction_software, self.tracking_software) {
            (Some(recon), Some(tracking)) if TrackingBackend::paired_with(recon) != tracking => {
                return Err(ConfigError::IllegalChoice {
                    field: "tracking software",
                    value: tracking.to_string(),
                    allowed: TrackingBackend::paired_with(recon).to_string(),
                });
            }
            (Some(recon), _) => cfg.set_reconstruction_software(recon)?,
            (None, Some(tracking)) => cfg.set_tracking_software(tracking)?,
            (None, None) => {}
        }
        if let Some([x, y, z]) = self.resampling {
            cfg.set_resampling((x, y, z))?;
        }

        if let Some(s) = &self.dtk_recon {
            let dtk = &mut cfg.dtk_recon;
            if let Some(g) = &s.gradient {
                apply_gradient(&mut dtk.gradient, g)?;
            }
            if let Some(v) = s.maximum_b_value {
                dtk.maximum_b_value = v;
            }
            if let Some(v) = s.dsi_number_of_directions {
                dtk.set_dsi_number_of_directions(v)?;
            }
            if let Some(v) = s.number_of_output_directions {
                dtk.number_of_output_directions = v;
            }
            if let Some(v) = s.apply_gradient_orientation_correction {
                dtk.apply_gradient_orientation_correction = v;
            }
            if let Some(v) = s.number_of_averages {
                dtk.number_of_averages = v;
            }
            if let Some(v) = s.multiple_high_b_values {
                dtk.multiple_high_b_values = v;
            }
            if let Some(v) = s.number_of_b0_volumes {
                dtk.number_of_b0_volumes = v;
            }
            if let Some(maps) = &s.compute_additional_maps {
                dtk.compute_additional_maps = maps.clone();
            }
        }

        if let Some(s) = &self.mrtrix_recon {
            let mrtrix = &mut cfg.mrtrix_recon;
            if let Some(g) = &s.gradient {
                apply_gradient(&mut mrtrix.gradient, g)?;
            }
            if let Some(v) = s.compute_csd {
                mrtrix.set_compute_csd(v)?;
            }
            if let Some(v) = &s.lmax_order {
                mrtrix.set_lmax_order(v.resolve()?)?;
            }
            if let Some(v) = s.normalize_to_b0 {
                mrtrix.normalize_to_b0 = v;
            }
            if let Some(v) = s.single_fib_thr {
                mrtrix.set_single_fib_thr(v)?;
            }
        }

        if let Some(s) = &self.camino_recon {
            let camino = &mut cfg.camino_recon;
            if let Some(g) = &s.gradient {
                apply_gradient(&mut camino.gradient, g)?;
            }
            if let Some(n) = s.number_of_tensors {
                camino.set_number_of_tensors(n);
            }
            if let Some(model) = &s.diffusion_model {
                camino.set_diffusion_model(model)?;
            }
            if let Some(n) = s.max_components {
                camino.set_max_components(n)?;
            }
        }

        if let Some(s) = &self.dtk_tracking {
            let dtk = &mut cfg.dtk_tracking;
            if let Some(v) = s.angle_threshold {
                dtk.set_angle_threshold(v)?;
            }
            if let Some(v) = s.mask1_input {
                dtk.mask1_input = v;
            }
            if let Some([low, high]) = s.mask1_threshold {
                dtk.set_mask1_threshold(Some((low, high)))?;
            }
        }

        if let Some(s) = &self.dtb_tracking {
            let dtb = &mut cfg.dtb_tracking;
            if let Some(axes) = &s.flip_input {
                dtb.flip_input = axes.clone();
            }
            if let Some(v) = s.angle {
                dtb.set_angle(v)?;
            }
            if let Some(v) = s.seeds {
                dtb.set_seeds(v)?;
            }
        }

        if let Some(s) = &self.mrtrix_tracking {
            let mrtrix = &mut cfg.mrtrix_tracking;
            if s.desired_number_of_tracks.is_some() || s.max_number_of_tracks.is_some() {
                let desired = s
                    .desired_number_of_tracks
                    .unwrap_or(mrtrix.desired_number_of_tracks());
                let max = s.max_number_of_tracks.unwrap_or(mrtrix.max_number_of_tracks());
                mrtrix.set_number_of_tracks(desired, max)?;
            }
            if let Some(v) = s.curvature {
                mrtrix.set_curvature(v)?;
            }
            if let Some(v) = s.step_size {
                mrtrix.set_step_size(v)?;
            }
            if s.min_length.is_some() || s.max_length.is_some() {
                let min = s.min_length.unwrap_or(mrtrix.min_length());
                let max = s.max_length.unwrap_or(mrtrix.max_length());
                mrtrix.set_length_range(min, max)?;
            }
        }

        if let Some(s) = &self.camino_tracking {
            let camino = &mut cfg.camino_tracking;
            if let Some(v) = s.step_length {
                camino.set_step_length(v)?;
            }
            if let Some(v) = s.curve_threshold {
                camino.set_curve_threshold(v)?;
            }
            if s.anisotropy_threshold.is_some() {
                camino.set_anisotropy_threshold(s.anisotropy_threshold)?;
            }
            if let Some(v) = s.iterations {
                camino.set_iterations(v)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(SettingsFormat::from_path(Path::new("a/stage.yml")).unwrap(), SettingsFormat::Yaml);
        assert_eq!(SettingsFormat::from_path(Path::new("stage.JSON")).unwrap(), SettingsFormat::Json);
        assert_eq!(SettingsFormat::from_path(Path::new("stage.toml")).unwrap(), SettingsFormat::Toml);
        assert!(SettingsFormat::from_path(Path::new("stage.ini")).is_err());
        assert!(SettingsFormat::from_path(Path::new("stage")).is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
imaging_model: HARDI
reconstruction_software: MRtrix
mrtrix_recon:
  compute_csd: true
  gradient:
    gradient_table: siemens_64
"#;
        let settings = load_settings(yaml, SettingsFormat::Yaml).unwrap();
        assert_eq!(settings.imaging_model, Some(ImagingModel::Hardi));
        let cfg = settings.into_config().unwrap();
        assert_eq!(cfg.tracking_software(), TrackingBackend::Mrtrix);
        assert!(cfg.mrtrix_recon.compute_csd());
        assert_eq!(cfg.mrtrix_recon.gradient.number_of_directions(), 64);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"diffusion_model":"Probabilistic","mrtrix_recon":{"lmax_order":8},"camino_recon":{"number_of_tensors":"2","diffusion_model":"pospos"}}"#;
        let cfg = load_settings(json, SettingsFormat::Json)
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(cfg.reconstruction_software(), ReconstructionBackend::Mrtrix);
        assert_eq!(cfg.camino_recon.diffusion_model(), "pospos");
        assert_eq!(cfg.mrtrix_recon.lmax_order(), Some(8));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
imaging_model = "DSI"
resampling = [1.0, 1.0, 1.5]

[dtk_recon]
dsi_number_of_directions = 257
compute_additional_maps = ["gFA", "P0"]

[mrtrix_recon]
lmax_order = "Auto"
"#;
        let cfg = load_settings(toml_str, SettingsFormat::Toml)
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(cfg.imaging_model(), ImagingModel::Dsi);
        assert_eq!(cfg.resampling(), (1.0, 1.0, 1.5));
        assert_eq!(cfg.dtk_recon.recon_matrix_file(), "DSI_matrix_258x181.dat");
        assert_eq!(cfg.dtk_recon.compute_additional_maps.len(), 2);
        assert_eq!(cfg.mrtrix_recon.lmax_order(), None);
    }

    #[test]
    fn test_unknown_names_are_errors() {
        assert!(matches!(
            load_settings("reconstruction_software: FSL\n", SettingsFormat::Yaml),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            load_settings(r#"{"colour":"red"}"#, SettingsFormat::Json),
            Err(ConfigError::Parse(_))
        ));
        assert!(load_settings("[[[bad", SettingsFormat::Toml).is_err());
    }

    #[test]
    fn test_mismatched_backends_rejected() {
        let settings = StageSettings {
            reconstruction_software: Some(ReconstructionBackend::Camino),
            tracking_software: Some(TrackingBackend::Mrtrix),
            ..Default::default()
        };
        assert!(matches!(
            settings.into_config(),
            Err(ConfigError::IllegalChoice { field: "tracking software", .. })
        ));
    }

    #[test]
    fn test_failed_apply_leaves_config_untouched() {
        let settings = load_settings(
            r#"{"imaging_model": "HARDI", "reconstruction_software": "MRtrix",
                "mrtrix_recon": {"single_fib_thr": 2.0}}"#,
            SettingsFormat::Json,
        )
        .unwrap();
        let mut cfg = DiffusionConfig::default();
        let before = cfg.clone();

        assert!(matches!(
            settings.apply_to(&mut cfg),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert_eq!(cfg, before);
        assert_eq!(cfg.imaging_model(), ImagingModel::Dti);
        assert_eq!(cfg.reconstruction_software(), ReconstructionBackend::Dtk);
    }

    #[test]
    fn test_setters_enforce_cascade() {
        let settings = StageSettings {
            diffusion_model: Some(DiffusionModel::Probabilistic),
            mrtrix_recon: Some(MrtrixReconSettings {
                compute_csd: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            settings.into_config(),
            Err(ConfigError::IllegalChoice { field: "compute CSD", .. })
        ));
    }

    #[test]
    fn test_lmax_named_must_be_auto() {
        let json = r#"{"mrtrix_recon":{"lmax_order":"high"}}"#;
        let settings = load_settings(json, SettingsFormat::Json).unwrap();
        assert!(matches!(
            settings.into_config(),
            Err(ConfigError::UnknownChoice { field: "lmax order", .. })
        ));
    }
}
