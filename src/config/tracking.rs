//! Tracking back-end configurations.

use std::collections::BTreeSet;

use serde::Serialize;

use super::types::{Axis, DiffusionModel, ImagingModel, Mask1Input};
use crate::error::{ConfigError, ConfigResult};

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> ConfigResult<()> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// DTK's own tracker. Kept so every back end has a config; no tracking
/// flow selects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DtkTrackingConfig {
    imaging_model: ImagingModel,
    angle_threshold: f64,
    pub mask1_input: Mask1Input,
    mask1_threshold: Option<(f64, f64)>,
}

impl Default for DtkTrackingConfig {
    fn default() -> Self {
        DtkTrackingConfig {
            imaging_model: ImagingModel::default(),
            angle_threshold: 35.0,
            mask1_input: Mask1Input::default(),
            mask1_threshold: None,
        }
    }
}

impl DtkTrackingConfig {
    pub fn imaging_model(&self) -> ImagingModel {
        self.imaging_model
    }

    pub fn angle_threshold(&self) -> f64 {
        self.angle_threshold
    }

    pub fn mask1_threshold(&self) -> Option<(f64, f64)> {
        self.mask1_threshold
    }

    pub fn set_angle_threshold(&mut self, degrees: f64) -> ConfigResult<()> {
        check_range("angle threshold", degrees, 0.0, 90.0)?;
        self.angle_threshold = degrees;
        Ok(())
    }

    pub fn set_mask1_threshold(&mut self, threshold: Option<(f64, f64)>) -> ConfigResult<()> {
        if let Some((low, high)) = threshold {
            if low > high {
                return Err(ConfigError::OutOfRange {
                    field: "mask1 threshold",
                    value: low,
                    min: f64::NEG_INFINITY,
                    max: high,
                });
            }
        }
        self.mask1_threshold = threshold;
        Ok(())
    }

    pub(crate) fn set_imaging_model(&mut self, model: ImagingModel) {
        self.imaging_model = model;
    }
}

/// Diffusion Toolkit streamline tracking (`dtk2dir` + `streamline`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DtbTrackingConfig {
    imaging_model: ImagingModel,
    pub flip_input: BTreeSet<Axis>,
    angle: f64,
    seeds: u32,
}

impl Default for DtbTrackingConfig {
    fn default() -> Self {
        DtbTrackingConfig {
            imaging_model: ImagingModel::default(),
            flip_input: BTreeSet::new(),
            angle: 60.0,
            seeds: 32,
        }
    }
}

impl DtbTrackingConfig {
    pub fn imaging_model(&self) -> ImagingModel {
        self.imaging_model
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn seeds(&self) -> u32 {
        self.seeds
    }

    pub fn set_angle(&mut self, degrees: f64) -> ConfigResult<()> {
        check_range("tracking angle", degrees, 0.0, 90.0)?;
        self.angle = degrees;
        Ok(())
    }

    pub fn set_seeds(&mut self, seeds: u32) -> ConfigResult<()> {
        if seeds == 0 {
            return Err(ConfigError::OutOfRange {
                field: "seeds",
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        self.seeds = seeds;
        Ok(())
    }

    /// `dtk2dir` flip flags, in axis order.
    pub fn flip_flags(&self) -> Vec<&'static str> {
        self.flip_input.iter().map(|a| a.name()).collect()
    }

    pub(crate) fn set_imaging_model(&mut self, model: ImagingModel) {
        self.imaging_model = model;
    }
}

/// MRtrix `streamtrack` parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MrtrixTrackingConfig {
    imaging_model: ImagingModel,
    tracking_mode: DiffusionModel,
    desired_number_of_tracks: u32,
    max_number_of_tracks: u32,
    curvature: f64,
    step_size: f64,
    min_length: f64,
    max_length: f64,
}

impl Default for MrtrixTrackingConfig {
    fn default() -> Self {
        MrtrixTrackingConfig {
            imaging_model: ImagingModel::default(),
            tracking_mode: DiffusionModel::default(),
            desired_number_of_tracks: 1000,
            max_number_of_tracks: 1000,
            curvature: 2.0,
            step_size: 0.2,
            min_length: 10.0,
            max_length: 200.0,
        }
    }
}

impl MrtrixTrackingConfig {
    pub fn imaging_model(&self) -> ImagingModel {
        self.imaging_model
    }

    pub fn tracking_mode(&self) -> DiffusionModel {
        self.tracking_mode
    }

    pub fn desired_number_of_tracks(&self) -> u32 {
        self.desired_number_of_tracks
    }

    pub fn max_number_of_tracks(&self) -> u32 {
        self.max_number_of_tracks
    }

    pub fn curvature(&self) -> f64 {
        self.curvature
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn min_length(&self) -> f64 {
        self.min_length
    }

    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    /// Set the desired and maximum track counts together; the maximum may not
    /// undercut the desired count.
    pub fn set_number_of_tracks(&mut self, desired: u32, max: u32) -> ConfigResult<()> {
        if desired == 0 || max < desired {
            return Err(ConfigError::OutOfRange {
                field: "desired number of tracks",
                value: f64::from(desired),
                min: 1.0,
                max: f64::from(max),
            });
        }
        self.desired_number_of_tracks = desired;
        self.max_number_of_tracks = max;
        Ok(())
    }

    pub fn set_curvature(&mut self, value: f64) -> ConfigResult<()> {
        check_range("curvature", value, 0.0, f64::MAX)?;
        self.curvature = value;
        Ok(())
    }

    pub fn set_step_size(&mut self, value: f64) -> ConfigResult<()> {
        check_range("step size", value, f64::MIN_POSITIVE, f64::MAX)?;
        self.step_size = value;
        Ok(())
    }

    pub fn set_length_range(&mut self, min: f64, max: f64) -> ConfigResult<()> {
        check_range("minimum length", min, 0.0, max)?;
        self.min_length = min;
        self.max_length = max;
        Ok(())
    }

    pub(crate) fn set_imaging_model(&mut self, model: ImagingModel) {
        self.imaging_model = model;
    }

    pub(crate) fn set_tracking_mode(&mut self, mode: DiffusionModel) {
        self.tracking_mode = mode;
    }
}

/// Camino `track` parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaminoTrackingConfig {
    imaging_model: ImagingModel,
    tracking_mode: DiffusionModel,
    step_length: f64,
    curve_threshold: f64,
    anisotropy_threshold: Option<f64>,
    iterations: u32,
}

impl Default for CaminoTrackingConfig {
    fn default() -> Self {
        CaminoTrackingConfig {
            imaging_model: ImagingModel::default(),
            tracking_mode: DiffusionModel::default(),
            step_length: 0.5,
            curve_threshold: 60.0,
            anisotropy_threshold: None,
            iterations: 5000,
        }
    }
}

impl CaminoTrackingConfig {
    pub fn imaging_model(&self) -> ImagingModel {
        self.imaging_model
    }

    pub fn tracking_mode(&self) -> DiffusionModel {
        self.tracking_mode
    }

    pub fn step_length(&self) -> f64 {
        self.step_length
    }

    pub fn curve_threshold(&self) -> f64 {
        self.curve_threshold
    }

    pub fn anisotropy_threshold(&self) -> Option<f64> {
        self.anisotropy_threshold
    }

    /// PICo Monte-Carlo iterations; unused by streamline tracking.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn set_step_length(&mut self, value: f64) -> ConfigResult<()> {
        check_range("step length", value, f64::MIN_POSITIVE, f64::MAX)?;
        self.step_length = value;
        Ok(())
    }

    pub fn set_curve_threshold(&mut self, degrees: f64) -> ConfigResult<()> {
        check_range("curve threshold", degrees, 0.0, 180.0)?;
        self.curve_threshold = degrees;
        Ok(())
    }

    pub fn set_anisotropy_threshold(&mut self, value: Option<f64>) -> ConfigResult<()> {
        if let Some(v) = value {
            check_range("anisotropy threshold", v, 0.0, 1.0)?;
        }
        self.anisotropy_threshold = value;
        Ok(())
    }

    pub fn set_iterations(&mut self, n: u32) -> ConfigResult<()> {
        if n == 0 {
            return Err(ConfigError::OutOfRange {
                field: "iterations",
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        self.iterations = n;
        Ok(())
    }

    pub(crate) fn set_imaging_model(&mut self, model: ImagingModel) {
        self.imaging_model = model;
    }

    pub(crate) fn set_tracking_mode(&mut self, mode: DiffusionModel) {
        self.tracking_mode = mode;
    }
}
