//! Stage-level configuration aggregating every back end.
//!
//! Edits go through the setters below. Each setter works on a copy, applies
//! the change, runs [`DiffusionConfig::resolved`] and only then commits, so
//! a failed edit leaves the configuration untouched and a successful one
//! always leaves it consistent.

use serde::Serialize;
use tracing::warn;

use super::environment::ResourceConfig;
use super::recon::{CaminoReconConfig, DtkReconConfig, MrtrixReconConfig};
use super::tracking::{
    CaminoTrackingConfig, DtbTrackingConfig, DtkTrackingConfig, MrtrixTrackingConfig,
};
use super::types::{DiffusionModel, ImagingModel, ReconstructionBackend, TrackingBackend};
use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_RESAMPLING: (f64, f64, f64) = (2.0, 2.0, 2.0);

/// Legal reconstruction back ends for an imaging/diffusion model pair.
pub fn reconstruction_choices_for(
    imaging: ImagingModel,
    diffusion: DiffusionModel,
) -> &'static [ReconstructionBackend] {
    use ReconstructionBackend::*;
    match (imaging, diffusion) {
        (ImagingModel::Dsi, _) => &[Dtk],
        (_, DiffusionModel::Streamline) => &[Dtk, Mrtrix, Camino],
        (_, DiffusionModel::Probabilistic) => &[Mrtrix, Camino],
    }
}

/// Legal tracking back ends for an imaging/diffusion model pair.
pub fn tracking_choices_for(
    imaging: ImagingModel,
    diffusion: DiffusionModel,
) -> &'static [TrackingBackend] {
    use TrackingBackend::*;
    match (imaging, diffusion) {
        (ImagingModel::Dsi, _) => &[Dtb],
        (_, DiffusionModel::Streamline) => &[Dtb, Mrtrix, Camino],
        (_, DiffusionModel::Probabilistic) => &[Mrtrix, Camino],
    }
}

/// Legal diffusion models for an imaging model.
pub fn diffusion_model_choices_for(imaging: ImagingModel) -> &'static [DiffusionModel] {
    if imaging.is_restrictive() {
        &[DiffusionModel::Streamline]
    } else {
        DiffusionModel::ALL
    }
}

/// Configuration of the diffusion stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffusionConfig {
    imaging_model: ImagingModel,
    resampling: (f64, f64, f64),
    diffusion_model: DiffusionModel,
    reconstruction_software: ReconstructionBackend,
    tracking_software: TrackingBackend,
    pub dtk_recon: DtkReconConfig,
    pub mrtrix_recon: MrtrixReconConfig,
    pub camino_recon: CaminoReconConfig,
    pub dtk_tracking: DtkTrackingConfig,
    pub dtb_tracking: DtbTrackingConfig,
    pub mrtrix_tracking: MrtrixTrackingConfig,
    pub camino_tracking: CaminoTrackingConfig,
    resources: ResourceConfig,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        DiffusionConfig::new(ResourceConfig::default())
    }
}

impl DiffusionConfig {
    pub fn new(resources: ResourceConfig) -> Self {
        let dir = resources.gradient_table_dir.clone();
        DiffusionConfig {
            imaging_model: ImagingModel::default(),
            resampling: DEFAULT_RESAMPLING,
            diffusion_model: DiffusionModel::default(),
            reconstruction_software: ReconstructionBackend::default(),
            tracking_software: TrackingBackend::default(),
            dtk_recon: DtkReconConfig::new(&dir),
            mrtrix_recon: MrtrixReconConfig::new(&dir),
            camino_recon: CaminoReconConfig::new(&dir),
            dtk_tracking: DtkTrackingConfig::default(),
            dtb_tracking: DtbTrackingConfig::default(),
            mrtrix_tracking: MrtrixTrackingConfig::default(),
            camino_tracking: CaminoTrackingConfig::default(),
            resources,
        }
    }

    pub fn imaging_model(&self) -> ImagingModel {
        self.imaging_model
    }

    pub fn resampling(&self) -> (f64, f64, f64) {
        self.resampling
    }

    pub fn diffusion_model(&self) -> DiffusionModel {
        self.diffusion_model
    }

    pub fn reconstruction_software(&self) -> ReconstructionBackend {
        self.reconstruction_software
    }

    pub fn tracking_software(&self) -> TrackingBackend {
        self.tracking_software
    }

    pub fn resources(&self) -> &ResourceConfig {
        &self.resources
    }

    pub fn reconstruction_choices(&self) -> &'static [ReconstructionBackend] {
        reconstruction_choices_for(self.imaging_model, self.diffusion_model)
    }

    pub fn tracking_choices(&self) -> &'static [TrackingBackend] {
        tracking_choices_for(self.imaging_model, self.diffusion_model)
    }

    pub fn diffusion_model_choices(&self) -> &'static [DiffusionModel] {
        diffusion_model_choices_for(self.imaging_model)
    }

    /// A fully consistent copy of this configuration.
    ///
    /// Forces the diffusion model under DSI, snaps back ends outside their
    /// legal sets to the first legal entry, pairs tracking with
    /// reconstruction and pushes the stage-wide models into the sub-configs.
    /// Idempotent.
    pub fn resolved(&self) -> ConfigResult<Self> {
        let mut next = self.clone();

        let models = next.diffusion_model_choices();
        if !models.contains(&next.diffusion_model) {
            warn!(
                imaging_model = %next.imaging_model,
                from = %next.diffusion_model,
                to = %models[0],
                "Diffusion model not available, falling back"
            );
            next.diffusion_model = models[0];
        }

        let recon = next.reconstruction_choices();
        if !recon.contains(&next.reconstruction_software) {
            warn!(
                from = %next.reconstruction_software,
                to = %recon[0],
                "Reconstruction software not available, falling back"
            );
            next.reconstruction_software = recon[0];
        }
        next.tracking_software = TrackingBackend::paired_with(next.reconstruction_software);

        let imaging = next.imaging_model;
        next.dtk_recon.set_imaging_model(imaging)?;
        next.mrtrix_recon.set_imaging_model(imaging)?;
        next.camino_recon.set_imaging_model(imaging)?;
        next.dtk_tracking.set_imaging_model(imaging);
        next.dtb_tracking.set_imaging_model(imaging);
        next.mrtrix_tracking.set_imaging_model(imaging);
        next.camino_tracking.set_imaging_model(imaging);

        let mode = next.diffusion_model;
        next.mrtrix_recon.set_recon_mode(mode);
        next.mrtrix_tracking.set_tracking_mode(mode);
        next.camino_tracking.set_tracking_mode(mode);

        Ok(next)
    }

    fn commit(&mut self, edited: DiffusionConfig) -> ConfigResult<()> {
        *self = edited.resolved()?;
        Ok(())
    }

    pub fn set_imaging_model(&mut self, model: ImagingModel) -> ConfigResult<()> {
        let mut next = self.clone();
        next.imaging_model = model;
        self.commit(next)
    }

    pub fn set_diffusion_model(&mut self, model: DiffusionModel) -> ConfigResult<()> {
        let choices = self.diffusion_model_choices();
        if !choices.contains(&model) {
            return Err(ConfigError::illegal("diffusion model", model, choices));
        }
        let mut next = self.clone();
        next.diffusion_model = model;
        self.commit(next)
    }

    pub fn set_reconstruction_software(&mut self, backend: ReconstructionBackend) -> ConfigResult<()> {
        let choices = self.reconstruction_choices();
        if !choices.contains(&backend) {
            return Err(ConfigError::illegal("reconstruction software", backend, choices));
        }
        let mut next = self.clone();
        next.reconstruction_software = backend;
        next.tracking_software = TrackingBackend::paired_with(backend);
        self.commit(next)
    }

    pub fn set_tracking_software(&mut self, backend: TrackingBackend) -> ConfigResult<()> {
        let choices = self.tracking_choices();
        if !choices.contains(&backend) {
            return Err(ConfigError::illegal("tracking software", backend, choices));
        }
        let mut next = self.clone();
        next.tracking_software = backend;
        next.reconstruction_software = ReconstructionBackend::paired_with(backend);
        self.commit(next)
    }

    pub fn set_resampling(&mut self, resampling: (f64, f64, f64)) -> ConfigResult<()> {
        for value in [resampling.0, resampling.1, resampling.2] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::OutOfRange {
                    field: "resampling",
                    value,
                    min: f64::MIN_POSITIVE,
                    max: f64::MAX,
                });
            }
        }
        self.resampling = resampling;
        Ok(())
    }

    /// Point every gradient table at a new resource tree.
    pub fn set_resources(&mut self, resources: ResourceConfig) -> ConfigResult<()> {
        let mut next = self.clone();
        let dir = resources.gradient_table_dir.clone();
        next.dtk_recon.gradient.set_resource_dir(&dir)?;
        next.mrtrix_recon.gradient.set_resource_dir(&dir)?;
        next.camino_recon.gradient.set_resource_dir(&dir)?;
        next.resources = resources;
        self.commit(next)
    }

    /// Check the active back ends for problems that would only surface when
    /// the graph is built.
    pub fn validate(&self) -> ConfigResult<()> {
        match self.reconstruction_software {
            ReconstructionBackend::Dtk => self.dtk_recon.validate(),
            ReconstructionBackend::Mrtrix => self.mrtrix_recon.validate(),
            ReconstructionBackend::Camino => self.camino_recon.validate(),
        }
    }
}
