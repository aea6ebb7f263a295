//! Ray tracing implementations and the batching capabilities of each.

use crate::Sealed;
use crate::baking::BakedDataVariation;

/// The built-in CPU ray tracer.
///
/// Supports multi-threading. Evaluates one listener against many sources efficiently, and nothing else in batches.
#[derive(Debug)]
pub struct DefaultRayTracer;

/// The Intel Embree ray tracer.
///
/// Supports multi-threading.
/// Shares the batching constraints of [`DefaultRayTracer`].
#[derive(Debug)]
pub struct Embree;

/// The AMD Radeon Rays ray tracer.
///
/// This is an OpenCL implementation that supports arbitrary batched many-to-many queries.
/// Simulation results stay in device memory until explicitly copied back to the host.
#[derive(Debug)]
pub struct RadeonRays;

/// Allows you to specify callbacks to your own ray tracer.
#[derive(Debug)]
pub struct CustomRayTracer;

impl Sealed for DefaultRayTracer {}
impl Sealed for Embree {}
impl Sealed for RadeonRays {}
impl Sealed for CustomRayTracer {}

/// Ray tracer implementation. Can be:
/// - [`DefaultRayTracer`]: the built-in ray tracer
/// - [`Embree`]: The Intel Embree ray tracer
/// - [`RadeonRays`]: The AMD Radeon Rays ray tracer
/// - [`CustomRayTracer`]: Allows you to specify callbacks to your own ray tracer
pub trait RayTracer: Sealed {
    /// Returns the scene type for this ray tracer implementation.
    fn scene_type() -> SceneType;
}

impl RayTracer for DefaultRayTracer {
    fn scene_type() -> SceneType {
        SceneType::Default
    }
}

impl RayTracer for Embree {
    fn scene_type() -> SceneType {
        SceneType::Embree
    }
}

impl RayTracer for RadeonRays {
    fn scene_type() -> SceneType {
        SceneType::RadeonRays
    }
}

impl RayTracer for CustomRayTracer {
    fn scene_type() -> SceneType {
        SceneType::Custom
    }
}

/// Runtime tag of the ray tracer backing a scene.
///
/// Every backend-dependent decision made while baking goes through the methods of this type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SceneType {
    Default,
    Embree,
    RadeonRays,
    Custom,
}

/// Number of source and listener endpoints presented to the simulator in one call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EndpointShape {
    pub num_sources: usize,
    pub num_listeners: usize,
}

impl SceneType {
    /// Returns `true` if the backend evaluates arbitrary batched many-to-many queries.
    pub const fn supports_batched_many_to_many(self) -> bool {
        matches!(self, Self::RadeonRays)
    }

    /// Returns `true` if simulation results must be copied from device to host memory before they are read.
    pub const fn keeps_results_on_device(self) -> bool {
        matches!(self, Self::RadeonRays)
    }

    /// Number of probes folded into one simulator call.
    ///
    /// Backends without batched many-to-many support only batch the one-listener-to-many-sources
    /// shape that [`BakedDataVariation::StaticListener`] produces, and evaluate everything else one probe at a time.
    /// A requested size of zero is treated as one.
    pub fn effective_batch_size(self, variation: &BakedDataVariation, requested: usize) -> usize {
        let batched = self.supports_batched_many_to_many()
            || matches!(variation, BakedDataVariation::StaticListener { .. });

        if batched { requested.max(1) } else { 1 }
    }

    /// Endpoint cardinality for a batch of `batch_len` eligible probes.
    ///
    /// The default is one-to-many (`batch_len` sources, one listener), which every backend evaluates.
    /// Backends with batched many-to-many support use their native shape instead:
    /// a reciprocal one-to-many for static sources, and `batch_len` paired queries for reverb.
    pub fn native_endpoint_shape(
        self,
        variation: &BakedDataVariation,
        batch_len: usize,
    ) -> EndpointShape {
        let (num_sources, num_listeners) = if self.supports_batched_many_to_many() {
            match variation {
                BakedDataVariation::StaticSource { .. } => (1, batch_len),
                BakedDataVariation::StaticListener { .. } => (batch_len, 1),
                BakedDataVariation::Reverb => (batch_len, batch_len),
                BakedDataVariation::Dynamic => (batch_len, 1),
            }
        } else {
            (batch_len, 1)
        };

        EndpointShape {
            num_sources,
            num_listeners,
        }
    }
}
