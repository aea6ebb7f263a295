//! Directivity patterns for modeling sound intensity as a function of the source's orientation.

use crate::callback::DirectivityCallback;
use crate::geometry::{CoordinateSystem, Point, Vector3};

/// A directivity pattern that can be used to model changes in sound intensity as a function of the source’s orientation.
#[derive(Debug, Clone)]
pub enum Directivity {
    /// The default directivity model is a weighted dipole.
    /// This is a linear blend between an omnidirectional source (which emits sound with equal intensity in all directions), and a dipole oriented along the source's ahead axis (which focuses sound along that axis).
    WeightedDipole {
        /// How much of the dipole to blend into the directivity pattern.
        /// 0.0 = pure omnidirectional, 1.0 = pure dipole.
        /// 0.5 results in a cardioid directivity pattern.
        weight: f32,

        /// How “sharp” the dipole is.
        /// Higher values result in sound being focused within a narrower range of directions.
        power: f32,
    },

    /// A callback function to implement any other arbitrary directivity pattern.
    Callback(DirectivityCallback),
}

impl Directivity {
    /// An omnidirectional source.
    pub const OMNIDIRECTIONAL: Self = Self::WeightedDipole {
        weight: 0.0,
        power: 0.0,
    };

    /// Calculates the attenuation of a source due to its directivity pattern and orientation relative to a listener.
    pub fn attenuation(&self, source: &CoordinateSystem, listener: Point) -> f32 {
        let direction = (listener - source.origin).normalized();

        match self {
            Self::WeightedDipole { weight, power } => {
                let cosine = direction.dot(&source.ahead);
                ((1.0 - weight) + weight * cosine).abs().powf(*power)
            }
            Self::Callback(callback) => {
                let local = Vector3::new(
                    direction.dot(&source.right),
                    direction.dot(&source.up),
                    direction.dot(&source.ahead),
                );
                callback.call(local).clamp(0.0, 1.0)
            }
        }
    }
}

impl Default for Directivity {
    fn default() -> Self {
        Self::OMNIDIRECTIONAL
    }
}
