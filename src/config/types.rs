//! Closed choice sets used across the stage configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

macro_rules! named_choice {
    ($ty:ident, $field:literal, [$($variant:ident => $name:literal),+ $(,)?]) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err(ConfigError::UnknownChoice {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Diffusion acquisition scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImagingModel {
    #[default]
    #[serde(rename = "DTI")]
    Dti,
    #[serde(rename = "HARDI")]
    Hardi,
    #[serde(rename = "DSI")]
    Dsi,
}

named_choice!(ImagingModel, "imaging model", [Dti => "DTI", Hardi => "HARDI", Dsi => "DSI"]);

impl ImagingModel {
    /// Output prefix used by the DTK reconstruction tools.
    pub fn prefix(self) -> &'static str {
        match self {
            ImagingModel::Dti => "dti",
            ImagingModel::Hardi => "hardi",
            ImagingModel::Dsi => "dsi",
        }
    }

    /// DSI supports only one back end per side and deterministic tracking.
    pub fn is_restrictive(self) -> bool {
        self == ImagingModel::Dsi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiffusionModel {
    #[default]
    Streamline,
    Probabilistic,
}

named_choice!(DiffusionModel, "diffusion model", [
    Streamline => "Streamline",
    Probabilistic => "Probabilistic",
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReconstructionBackend {
    #[default]
    #[serde(rename = "DTK")]
    Dtk,
    #[serde(rename = "MRtrix")]
    Mrtrix,
    Camino,
}

named_choice!(ReconstructionBackend, "reconstruction software", [
    Dtk => "DTK",
    Mrtrix => "MRtrix",
    Camino => "Camino",
]);

impl ReconstructionBackend {
    /// Reconstruction back end coupled to a tracking back end.
    pub fn paired_with(tracking: TrackingBackend) -> Self {
        match tracking {
            TrackingBackend::Dtb => ReconstructionBackend::Dtk,
            TrackingBackend::Mrtrix => ReconstructionBackend::Mrtrix,
            TrackingBackend::Camino => ReconstructionBackend::Camino,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackingBackend {
    #[default]
    #[serde(rename = "DTB")]
    Dtb,
    #[serde(rename = "MRtrix")]
    Mrtrix,
    Camino,
}

named_choice!(TrackingBackend, "tracking software", [
    Dtb => "DTB",
    Mrtrix => "MRtrix",
    Camino => "Camino",
]);

impl TrackingBackend {
    /// Tracking back end coupled to a reconstruction back end.
    pub fn paired_with(recon: ReconstructionBackend) -> Self {
        match recon {
            ReconstructionBackend::Dtk => TrackingBackend::Dtb,
            ReconstructionBackend::Mrtrix => TrackingBackend::Mrtrix,
            ReconstructionBackend::Camino => TrackingBackend::Camino,
        }
    }
}

/// Scalar maps the DTB tools can derive from an ODF reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdditionalMap {
    #[serde(rename = "gFA")]
    Gfa,
    #[serde(rename = "skewness")]
    Skewness,
    #[serde(rename = "kurtosis")]
    Kurtosis,
    P0,
}

named_choice!(AdditionalMap, "additional map", [
    Gfa => "gFA",
    Skewness => "skewness",
    Kurtosis => "kurtosis",
    P0 => "P0",
]);

/// Number of fibre compartments fitted by Camino.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NumberOfTensors {
    #[default]
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    Multitensor,
}

named_choice!(NumberOfTensors, "number of tensors", [
    One => "1",
    Two => "2",
    Three => "3",
    Multitensor => "Multitensor",
]);

impl NumberOfTensors {
    /// Model identifiers legal for this compartment count.
    pub fn models(self) -> &'static [&'static str] {
        match self {
            NumberOfTensors::One => &["dt", "nldt_pos", "nldt", "ldt_wtd"],
            NumberOfTensors::Two => &[
                "cylcyl",
                "cylcyl_eq",
                "pospos",
                "pospos_eq",
                "poscyl",
                "poscyl_eq",
            ],
            NumberOfTensors::Three => &[
                "cylcylcyl",
                "cylcylcyl_eq",
                "pospospos",
                "pospospos_eq",
                "posposcyl",
                "posposcyl_eq",
                "poscylcyl",
                "poscylcyl_eq",
            ],
            NumberOfTensors::Multitensor => &["adc", "ball_stick"],
        }
    }

    pub fn default_model(self) -> &'static str {
        self.models()[0]
    }

    /// Model name of the fitted data consumed by the FA and MD tools.
    pub fn fitted_model(self) -> &'static str {
        match self {
            NumberOfTensors::One => "dt",
            NumberOfTensors::Two => "twotensor",
            NumberOfTensors::Three => "threetensor",
            NumberOfTensors::Multitensor => "multitensor",
        }
    }

    /// Model name used by eigen-decomposition and tracking.
    pub fn eigen_model(self) -> &'static str {
        match self {
            NumberOfTensors::One => "dt",
            _ => "multitensor",
        }
    }
}

/// Image used to build DTK's first tracking mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mask1Input {
    #[default]
    #[serde(rename = "DWI")]
    Dwi,
    B0,
}

named_choice!(Mask1Input, "mask1 input", [Dwi => "DWI", B0 => "B0"]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

named_choice!(Axis, "axis", [X => "x", Y => "y", Z => "z"]);
