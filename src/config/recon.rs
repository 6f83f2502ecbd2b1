//! Reconstruction back-end configurations.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use super::gradient::GradientTableConfig;
use super::types::{AdditionalMap, DiffusionModel, ImagingModel, NumberOfTensors};
use crate::error::{ConfigError, ConfigResult};

/// DSI direction counts with a shipped reconstruction matrix.
pub const DSI_DIRECTION_CHOICES: &[u32] = &[514, 257, 124];

/// Output directions of every DTK ODF reconstruction.
pub const ODF_OUTPUT_DIRECTIONS: u32 = 181;

/// Name of the DSI reconstruction matrix for `directions` sampled directions.
///
/// The matrix also covers the b0 volume, hence `directions + 1`.
pub fn recon_matrix_file(directions: u32) -> String {
    format!("DSI_matrix_{}x181.dat", directions + 1)
}

/// Diffusion Toolkit reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DtkReconConfig {
    imaging_model: ImagingModel,
    pub maximum_b_value: u32,
    pub gradient: GradientTableConfig,
    dsi_number_of_directions: u32,
    pub number_of_output_directions: u32,
    pub apply_gradient_orientation_correction: bool,
    pub number_of_averages: u32,
    pub multiple_high_b_values: bool,
    pub number_of_b0_volumes: u32,
    pub compute_additional_maps: BTreeSet<AdditionalMap>,
}

impl DtkReconConfig {
    pub const BACKEND: &'static str = "DTK";

    pub fn new(resource_dir: &Path) -> Self {
        DtkReconConfig {
            imaging_model: ImagingModel::default(),
            maximum_b_value: 1000,
            gradient: GradientTableConfig::new(resource_dir),
            dsi_number_of_directions: DSI_DIRECTION_CHOICES[0],
            number_of_output_directions: ODF_OUTPUT_DIRECTIONS,
            apply_gradient_orientation_correction: true,
            number_of_averages: 1,
            multiple_high_b_values: false,
            number_of_b0_volumes: 1,
            compute_additional_maps: AdditionalMap::ALL.iter().copied().collect(),
        }
    }

    pub fn imaging_model(&self) -> ImagingModel {
        self.imaging_model
    }

    pub fn dsi_number_of_directions(&self) -> u32 {
        self.dsi_number_of_directions
    }

    /// Direction count fed to the reconstruction: the DSI choice under DSI,
    /// otherwise the gradient table's.
    pub fn number_of_directions(&self) -> u32 {
        match self.imaging_model {
            ImagingModel::Dsi => self.dsi_number_of_directions,
            _ => self.gradient.number_of_directions(),
        }
    }

    pub fn recon_matrix_file(&self) -> String {
        recon_matrix_file(self.dsi_number_of_directions)
    }

    pub fn set_dsi_number_of_directions(&mut self, n: u32) -> ConfigResult<()> {
        if !DSI_DIRECTION_CHOICES.contains(&n) {
            return Err(ConfigError::illegal("DSI number of directions", n, DSI_DIRECTION_CHOICES));
        }
        self.dsi_number_of_directions = n;
        Ok(())
    }

    pub fn wants(&self, map: AdditionalMap) -> bool {
        self.compute_additional_maps.contains(&map)
    }

    pub(crate) fn set_imaging_model(&mut self, model: ImagingModel) -> ConfigResult<()> {
        self.imaging_model = model;
        if model != ImagingModel::Dsi {
            self.gradient.refresh()?;
        }
        Ok(())
    }

    /// Gradient table used by DTI/HARDI reconstruction.
    pub fn gradient_table(&self) -> ConfigResult<&Path> {
        self.gradient.gradient_table(Self::BACKEND)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.imaging_model != ImagingModel::Dsi {
            self.gradient_table()?;
        }
        Ok(())
    }
}

/// MRtrix reconstruction (tensor, optionally constrained spherical deconvolution).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MrtrixReconConfig {
    imaging_model: ImagingModel,
    pub gradient: GradientTableConfig,
    compute_csd: bool,
    lmax_order: Option<u8>,
    pub normalize_to_b0: bool,
    single_fib_thr: f64,
    recon_mode: DiffusionModel,
}

impl MrtrixReconConfig {
    pub const BACKEND: &'static str = "MRtrix";

    pub fn new(resource_dir: &Path) -> Self {
        MrtrixReconConfig {
            imaging_model: ImagingModel::default(),
            gradient: GradientTableConfig::new(resource_dir),
            compute_csd: false,
            lmax_order: None,
            normalize_to_b0: false,
            single_fib_thr: 0.7,
            recon_mode: DiffusionModel::default(),
        }
    }

    pub fn imaging_model(&self) -> ImagingModel {
        self.imaging_model
    }

    pub fn compute_csd(&self) -> bool {
        self.compute_csd
    }

    /// Maximum harmonic order, `None` meaning automatic.
    pub fn lmax_order(&self) -> Option<u8> {
        self.lmax_order
    }

    /// FA threshold selecting single-fibre voxels.
    pub fn single_fib_thr(&self) -> f64 {
        self.single_fib_thr
    }

    pub fn recon_mode(&self) -> DiffusionModel {
        self.recon_mode
    }

    /// Legal values of `compute_csd`; probabilistic tracking needs CSD.
    pub fn compute_csd_choices(&self) -> &'static [bool] {
        match self.recon_mode {
            DiffusionModel::Probabilistic => &[true],
            DiffusionModel::Streamline => &[false, true],
        }
    }

    pub fn set_compute_csd(&mut self, value: bool) -> ConfigResult<()> {
        let choices = self.compute_csd_choices();
        if !choices.contains(&value) {
            return Err(ConfigError::illegal("compute CSD", value, choices));
        }
        self.compute_csd = value;
        Ok(())
    }

    pub fn set_lmax_order(&mut self, order: Option<u8>) -> ConfigResult<()> {
        if let Some(n) = order {
            if n < 2 || n > 16 || n % 2 != 0 {
                return Err(ConfigError::illegal(
                    "lmax order",
                    n,
                    &["Auto", "2", "4", "6", "8", "10", "12", "14", "16"],
                ));
            }
        }
        self.lmax_order = order;
        Ok(())
    }

    pub fn set_single_fib_thr(&mut self, value: f64) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::OutOfRange {
                field: "single fibre threshold",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        self.single_fib_thr = value;
        Ok(())
    }

    pub(crate) fn set_imaging_model(&mut self, model: ImagingModel) -> ConfigResult<()> {
        self.imaging_model = model;
        if model != ImagingModel::Dsi {
            self.gradient.refresh()?;
        }
        Ok(())
    }

    pub(crate) fn set_recon_mode(&mut self, mode: DiffusionModel) {
        self.recon_mode = mode;
        if mode == DiffusionModel::Probabilistic {
            self.compute_csd = true;
        }
    }

    pub fn gradient_table(&self) -> ConfigResult<&Path> {
        self.gradient.gradient_table(Self::BACKEND)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.gradient_table().map(|_| ())
    }
}

/// Camino model fitting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaminoReconConfig {
    imaging_model: ImagingModel,
    pub gradient: GradientTableConfig,
    number_of_tensors: NumberOfTensors,
    max_components: u32,
    diffusion_model: String,
}

impl CaminoReconConfig {
    pub const BACKEND: &'static str = "Camino";

    pub fn new(resource_dir: &Path) -> Self {
        CaminoReconConfig {
            imaging_model: ImagingModel::default(),
            gradient: GradientTableConfig::new(resource_dir),
            number_of_tensors: NumberOfTensors::One,
            max_components: 1,
            diffusion_model: NumberOfTensors::One.default_model().to_string(),
        }
    }

    pub fn imaging_model(&self) -> ImagingModel {
        self.imaging_model
    }

    pub fn number_of_tensors(&self) -> NumberOfTensors {
        self.number_of_tensors
    }

    pub fn max_components(&self) -> u32 {
        self.max_components
    }

    pub fn diffusion_model(&self) -> &str {
        &self.diffusion_model
    }

    pub fn diffusion_model_choices(&self) -> &'static [&'static str] {
        self.number_of_tensors.models()
    }

    /// Switch the compartment count; the model snaps to that count's default.
    pub fn set_number_of_tensors(&mut self, n: NumberOfTensors) {
        self.number_of_tensors = n;
        self.diffusion_model = n.default_model().to_string();
        if n == NumberOfTensors::One {
            self.max_components = 1;
        }
    }

    pub fn set_diffusion_model(&mut self, model: &str) -> ConfigResult<()> {
        let choices = self.diffusion_model_choices();
        if !choices.contains(&model) {
            return Err(ConfigError::illegal("Camino diffusion model", model, choices));
        }
        self.diffusion_model = model.to_string();
        Ok(())
    }

    /// Maximum fitted components; fixed at 1 for a single tensor.
    pub fn set_max_components(&mut self, n: u32) -> ConfigResult<()> {
        if self.number_of_tensors == NumberOfTensors::One && n != 1 {
            return Err(ConfigError::illegal("max components", n, &[1]));
        }
        if n == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max components",
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        self.max_components = n;
        Ok(())
    }

    pub(crate) fn set_imaging_model(&mut self, model: ImagingModel) -> ConfigResult<()> {
        self.imaging_model = model;
        if model != ImagingModel::Dsi {
            self.gradient.refresh()?;
        }
        Ok(())
    }

    pub fn gradient_table(&self) -> ConfigResult<&Path> {
        self.gradient.gradient_table(Self::BACKEND)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.gradient_table().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::gradient::GradientTableSelection;

    fn res() -> &'static Path {
        Path::new("/res")
    }

    #[test]
    fn test_recon_matrix_file() {
        assert_eq!(recon_matrix_file(514), "DSI_matrix_515x181.dat");
        assert_eq!(recon_matrix_file(257), "DSI_matrix_258x181.dat");
        assert_eq!(recon_matrix_file(124), "DSI_matrix_125x181.dat");
    }

    #[test]
    fn test_dtk_defaults() {
        let cfg = DtkReconConfig::new(res());
        assert_eq!(cfg.recon_matrix_file(), "DSI_matrix_515x181.dat");
        assert_eq!(cfg.number_of_output_directions, 181);
        assert_eq!(cfg.compute_additional_maps.len(), 4);
        assert_eq!(cfg.number_of_directions(), 6);
    }

    #[test]
    fn test_dtk_dsi_directions_drive_matrix() {
        let mut cfg = DtkReconConfig::new(res());
        cfg.set_imaging_model(ImagingModel::Dsi).unwrap();
        cfg.set_dsi_number_of_directions(257).unwrap();
        assert_eq!(cfg.number_of_directions(), 257);
        assert_eq!(cfg.recon_matrix_file(), "DSI_matrix_258x181.dat");
        assert!(matches!(
            cfg.set_dsi_number_of_directions(300),
            Err(ConfigError::IllegalChoice { .. })
        ));
    }

    #[test]
    fn test_dtk_imaging_model_switch_rederives_count() {
        let mut cfg = DtkReconConfig::new(res());
        cfg.gradient
            .select(GradientTableSelection::preset("siemens_64").unwrap())
            .unwrap();
        cfg.set_imaging_model(ImagingModel::Dsi).unwrap();
        assert_eq!(cfg.number_of_directions(), 514);
        cfg.set_imaging_model(ImagingModel::Hardi).unwrap();
        assert_eq!(cfg.number_of_directions(), 64);
    }

    #[test]
    fn test_dtk_validate_requires_custom_path() {
        let mut cfg = DtkReconConfig::new(res());
        cfg.gradient.select(GradientTableSelection::Custom).unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingCustomGradientTable { backend: "DTK" })
        ));
        cfg.set_imaging_model(ImagingModel::Dsi).unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_mrtrix_probabilistic_forces_csd() {
        let mut cfg = MrtrixReconConfig::new(res());
        assert_eq!(cfg.compute_csd_choices(), &[false, true]);
        cfg.set_recon_mode(DiffusionModel::Probabilistic);
        assert!(cfg.compute_csd());
        assert_eq!(cfg.compute_csd_choices(), &[true]);
        assert!(cfg.set_compute_csd(false).is_err());
        cfg.set_recon_mode(DiffusionModel::Streamline);
        assert!(cfg.compute_csd());
        cfg.set_compute_csd(false).unwrap();
        assert!(!cfg.compute_csd());
    }

    #[test]
    fn test_mrtrix_ranges() {
        let mut cfg = MrtrixReconConfig::new(res());
        assert!(cfg.set_single_fib_thr(1.5).is_err());
        cfg.set_single_fib_thr(0.5).unwrap();
        assert_eq!(cfg.single_fib_thr(), 0.5);
        assert!(cfg.set_lmax_order(Some(5)).is_err());
        assert!(cfg.set_lmax_order(Some(18)).is_err());
        cfg.set_lmax_order(Some(8)).unwrap();
        assert_eq!(cfg.lmax_order(), Some(8));
        cfg.set_lmax_order(None).unwrap();
        assert_eq!(cfg.lmax_order(), None);
    }

    #[test]
    fn test_camino_tensor_count_cascades() {
        let mut cfg = CaminoReconConfig::new(res());
        assert_eq!(cfg.diffusion_model(), "dt");
        cfg.set_number_of_tensors(NumberOfTensors::Two);
        assert_eq!(cfg.diffusion_model(), "cylcyl");
        cfg.set_max_components(2).unwrap();
        cfg.set_diffusion_model("pospos_eq").unwrap();
        assert!(cfg.set_diffusion_model("dt").is_err());

        cfg.set_number_of_tensors(NumberOfTensors::Three);
        assert_eq!(cfg.diffusion_model(), "cylcylcyl");
        assert_eq!(cfg.max_components(), 2);

        cfg.set_number_of_tensors(NumberOfTensors::Multitensor);
        assert_eq!(cfg.diffusion_model(), "adc");

        cfg.set_number_of_tensors(NumberOfTensors::One);
        assert_eq!(cfg.diffusion_model(), "dt");
        assert_eq!(cfg.max_components(), 1);
        assert!(cfg.set_max_components(3).is_err());
    }
}
