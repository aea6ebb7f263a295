use super::{EndpointPair, ReflectionSimulationInputs, ReflectionSimulator};
use crate::energy_field::{BIN_DURATION, SimulationEnergyField};
use crate::geometry::Vector3;
use crate::job_graph::JobGraph;
use crate::{NUM_BANDS, SPEED_OF_SOUND};

/// An empty rectangular room with uniformly absorbing walls.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShoeboxScene {
    /// Room extents (in meters) along each axis.
    pub dimensions: Vector3,

    /// Mean absorption coefficient of the walls in each frequency band, between 0.0 and 1.0.
    pub absorption: [f32; NUM_BANDS],
}

impl Default for ShoeboxScene {
    /// A 10 m x 3 m x 8 m room with moderately absorbing walls.
    fn default() -> Self {
        Self {
            dimensions: Vector3::new(10.0, 3.0, 8.0),
            absorption: [0.1, 0.2, 0.3],
        }
    }
}

impl ShoeboxScene {
    pub fn volume(&self) -> f32 {
        self.dimensions.x * self.dimensions.y * self.dimensions.z
    }

    pub fn surface_area(&self) -> f32 {
        let Vector3 { x, y, z } = self.dimensions;
        2.0 * (x * y + y * z + z * x)
    }

    /// Mean distance (in meters) traveled between two reflections.
    pub fn mean_free_path(&self) -> f32 {
        4.0 * self.volume() / self.surface_area()
    }

    /// Eyring reverberation time (in seconds) of each band.
    pub fn reverb_times(&self) -> [f32; NUM_BANDS] {
        std::array::from_fn(|band| {
            let absorption = self.absorption[band].clamp(1e-4, 0.9999);
            0.161 * self.volume() / (-self.surface_area() * (1.0 - absorption).ln())
        })
    }
}

/// A noise-free statistical reflection model of a [`ShoeboxScene`].
///
/// Each query gets a direct arrival in the bin reached at `distance / SPEED_OF_SOUND`, followed one mean free path later
/// by a diffuse exponential decay that stops after `num_bounces` reflections.
/// Both are scaled by the source directivity and the inverse-square distance between the endpoints.
/// Only the omnidirectional channel is written: a diffuse field carries no directional energy.
/// `num_rays` is ignored since no rays are traced.
#[derive(Copy, Clone, Debug, Default)]
pub struct StatisticalSimulator;

impl ReflectionSimulator for StatisticalSimulator {
    type Scene = ShoeboxScene;

    fn simulate<'a>(
        &'a self,
        scene: &'a ShoeboxScene,
        inputs: ReflectionSimulationInputs<'a>,
        energy_fields: &'a mut [SimulationEnergyField],
        job_graph: &mut JobGraph<'a>,
    ) {
        let num_queries = inputs.num_queries().min(energy_fields.len());

        for (index, energy_field) in energy_fields.iter_mut().take(num_queries).enumerate() {
            let endpoints = inputs.endpoints(index);
            job_graph.add_job(move || fill_energy_field(scene, &inputs, endpoints, energy_field));
        }
    }
}

fn fill_energy_field(
    scene: &ShoeboxScene,
    inputs: &ReflectionSimulationInputs<'_>,
    endpoints: EndpointPair<'_>,
    energy_field: &mut SimulationEnergyField,
) {
    let separation = endpoints.source.origin.distance(&endpoints.listener.origin);
    let distance = separation
        .max(inputs.irradiance_min_distance)
        .max(f32::EPSILON);
    let gain = endpoints
        .directivity
        .attenuation(&endpoints.source, endpoints.listener.origin)
        / (distance * distance);

    let direct_arrival = separation / SPEED_OF_SOUND;
    let direct_bin = (direct_arrival / BIN_DURATION) as usize;
    let reflection_interval = scene.mean_free_path() / SPEED_OF_SOUND;
    let first_reflection = direct_arrival + reflection_interval;
    let last_reflection = direct_arrival + reflection_interval * inputs.num_bounces as f32;
    let reverb_times = scene.reverb_times();

    energy_field.target_mut().fill(0.0);

    for (band, reverb_time) in reverb_times.into_iter().enumerate() {
        let decay_rate = 6.0 * std::f32::consts::LN_10 / reverb_time;
        let reflected = gain * (1.0 - scene.absorption[band]);

        let Ok(histogram) = energy_field.band_target_mut(0, band) else {
            return;
        };

        for (bin, value) in histogram.iter_mut().enumerate() {
            let time = bin as f32 * BIN_DURATION;
            if time >= first_reflection && time <= last_reflection {
                *value = reflected * (-decay_rate * (time - first_reflection)).exp();
            }
        }

        if let Some(value) = histogram.get_mut(direct_bin) {
            *value += gain;
        }
    }
}
