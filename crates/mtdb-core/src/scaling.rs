//! Froude scaling between model scale and full scale
//!
//! With length scale `λ = L_full / L_model`, Froude similarity scales time by
//! `λ^0.5` and each measured quantity by `λ^k` for a kind-specific exponent
//! `k`. Quantities involving mass are further multiplied by the fluid density
//! ratio (e.g. 1.025 for sea water over fresh basin water).

use crate::models::SensorKind;

/// Froude similarity parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FroudeScale {
    /// Length scale factor λ
    pub lambda: f64,
    /// Full-scale over model-scale fluid density
    pub density_ratio: f64,
}

impl FroudeScale {
    pub fn new(lambda: f64) -> Self {
        Self {
            lambda,
            density_ratio: 1.0,
        }
    }

    pub fn with_density_ratio(mut self, density_ratio: f64) -> Self {
        self.density_ratio = density_ratio;
        self
    }

    /// Factor applied to time stamps
    pub fn time_factor(&self) -> f64 {
        self.lambda.sqrt()
    }

    /// Factor applied to values of the given kind
    pub fn factor(&self, kind: SensorKind) -> f64 {
        let factor = self.lambda.powf(exponent(kind));
        if involves_mass(kind) {
            factor * self.density_ratio
        } else {
            factor
        }
    }
}

/// Exponent `k` of λ for a measured quantity
pub fn exponent(kind: SensorKind) -> f64 {
    match kind {
        SensorKind::Length => 1.0,
        SensorKind::Velocity => 0.5,
        SensorKind::Acceleration => 0.0,
        SensorKind::Force | SensorKind::SlammingForce => 3.0,
        SensorKind::Pressure | SensorKind::SlammingPressure => 1.0,
        SensorKind::Volume => 3.0,
        SensorKind::Mass => 3.0,
        SensorKind::Moment => 4.0,
        SensorKind::Angle => 0.0,
        SensorKind::AngularVelocity | SensorKind::Rate => -0.5,
        SensorKind::AngularAcceleration => -1.0,
        SensorKind::ControlSignal => 0.0,
    }
}

fn involves_mass(kind: SensorKind) -> bool {
    matches!(
        kind,
        SensorKind::Force
            | SensorKind::SlammingForce
            | SensorKind::Pressure
            | SensorKind::SlammingPressure
            | SensorKind::Mass
            | SensorKind::Moment
    )
}
