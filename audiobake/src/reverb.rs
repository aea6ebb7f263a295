//! Parametric reverb estimation from energy fields.

use crate::energy_field::{BIN_DURATION, EnergyField};
use crate::model::AirAbsorptionModel;
use crate::{NUM_BANDS, SPEED_OF_SOUND};

/// Parametric description of a reverb tail.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Reverb {
    /// Time (in seconds) for the energy in each frequency band to decay by 60 dB.
    pub reverb_times: [f32; NUM_BANDS],
}

/// Reduces an energy field to a [`Reverb`].
///
/// Implementations must be pure: the same inputs always produce the same reverb.
pub trait ReverbEstimator {
    fn estimate(&self, energy_field: &EnergyField, air_absorption: &AirAbsorptionModel) -> Reverb;
}

/// Estimates reverb times by fitting a line to the Schroeder energy decay curve of the omnidirectional channel.
///
/// Air absorption is applied to each bin according to the distance sound travels in the bin's arrival time.
/// The fit spans the decay from `-5 dB` to `-5 dB - fit_range_db`, or to the end of the field if the decay never gets that far.
#[derive(Copy, Clone, Debug)]
pub struct SchroederReverbEstimator {
    /// Decay range (in dB) used for the fit. 30 dB yields the classic T30 estimate.
    pub fit_range_db: f32,
}

impl Default for SchroederReverbEstimator {
    fn default() -> Self {
        Self { fit_range_db: 30.0 }
    }
}

impl ReverbEstimator for SchroederReverbEstimator {
    fn estimate(&self, energy_field: &EnergyField, air_absorption: &AirAbsorptionModel) -> Reverb {
        if energy_field.num_channels() == 0 {
            return Reverb::default();
        }

        let reverb_times = std::array::from_fn(|band| {
            let Ok(histogram) = energy_field.band(0, band) else {
                return 0.0;
            };

            let absorbed = histogram.iter().enumerate().map(|(bin, &energy)| {
                let distance = bin as f32 * BIN_DURATION * SPEED_OF_SOUND;
                energy.max(0.0) * air_absorption.evaluate(distance, band)
            });

            self.fit_decay(&energy_decay_curve(absorbed))
        });

        Reverb { reverb_times }
    }
}

impl SchroederReverbEstimator {
    fn fit_decay(&self, decay_curve: &[f32]) -> f32 {
        let Some(&total) = decay_curve.first() else {
            return 0.0;
        };
        if total <= 0.0 {
            return 0.0;
        }

        let start_db = -5.0;
        let end_db = start_db - self.fit_range_db;

        let points = decay_curve
            .iter()
            .enumerate()
            .take_while(|&(_, &energy)| energy > 0.0)
            .map(|(bin, &energy)| (bin as f32 * BIN_DURATION, 10.0 * (energy / total).log10()))
            .skip_while(|&(_, level)| level > start_db)
            .take_while(|&(_, level)| level >= end_db)
            .collect::<Vec<_>>();

        match linear_slope(&points) {
            Some(slope) if slope < 0.0 => -60.0 / slope,
            _ => 0.0,
        }
    }
}

/// Backward-integrated energy: entry `i` holds the energy arriving at or after bin `i`.
fn energy_decay_curve(energy: impl DoubleEndedIterator<Item = f32>) -> Vec<f32> {
    let mut remaining = 0.0;
    let mut curve = energy
        .rev()
        .map(|value| {
            remaining += value;
            remaining
        })
        .collect::<Vec<_>>();
    curve.reverse();
    curve
}

/// Least-squares slope of `(x, y)` points, or `None` with fewer than two distinct abscissae.
fn linear_slope(points: &[(f32, f32)]) -> Option<f32> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f32;
    let mean_x = points.iter().map(|&(x, _)| x).sum::<f32>() / n;
    let mean_y = points.iter().map(|&(_, y)| y).sum::<f32>() / n;

    let (covariance, variance) = points.iter().fold((0.0, 0.0), |(cov, var), &(x, y)| {
        (cov + (x - mean_x) * (y - mean_y), var + (x - mean_x) * (x - mean_x))
    });

    (variance > 0.0).then(|| covariance / variance)
}
