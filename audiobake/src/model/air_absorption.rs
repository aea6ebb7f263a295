//! Frequency-dependent attenuation of sound over distance.

use crate::NUM_BANDS;
use crate::callback::AirAbsorptionCallback;

/// Exponential falloff coefficients (per meter) derived from physical properties of air.
pub const DEFAULT_AIR_ABSORPTION_COEFFICIENTS: [f32; NUM_BANDS] = [0.0002, 0.0017, 0.0182];

/// An air absorption model that can be used for modeling frequency-dependent attenuation of sound over distance.
///
/// Evaluating a model has no side effects, so one model can be shared by every probe of a bake.
#[derive(Debug, Clone, Default)]
pub enum AirAbsorptionModel {
    /// The default air absorption model.
    /// This is an exponential falloff, with decay rates derived from physical properties of air.
    #[default]
    Default,

    /// An exponential falloff.
    /// You can configure the decay rates for each frequency band.
    Exponential {
        /// The exponential falloff coefficients to use.
        coefficients: [f32; NUM_BANDS],
    },

    /// An arbitrary air absorption model, defined by a callback function.
    Callback(AirAbsorptionCallback),
}

impl AirAbsorptionModel {
    /// Returns the fraction of energy in `band` that survives traveling `distance` meters, between 0.0 and 1.0.
    ///
    /// # Panics
    ///
    /// Panics if `band` is not less than [`NUM_BANDS`].
    pub fn evaluate(&self, distance: f32, band: usize) -> f32 {
        assert!(band < NUM_BANDS, "band index out of bounds");

        match self {
            Self::Default => (-DEFAULT_AIR_ABSORPTION_COEFFICIENTS[band] * distance).exp(),
            Self::Exponential { coefficients } => (-coefficients[band] * distance).exp(),
            Self::Callback(callback) => callback.call(distance, band).clamp(0.0, 1.0),
        }
    }

    /// Evaluates the model for every band.
    pub fn evaluate_bands(&self, distance: f32) -> [f32; NUM_BANDS] {
        std::array::from_fn(|band| self.evaluate(distance, band))
    }
}
