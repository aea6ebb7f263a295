//! Reflections baking.

use super::batch::{BatchArena, probe_endpoints};
use super::{
    BakeError, BakedDataIdentifier, BakedDataVariation, BakedReflectionsData, ImpulseResponseDump,
};
use crate::callback::ProgressCallback;
use crate::device::OpenClDevice;
use crate::energy_field::{
    EnergyField, EnergyFieldSettings, FinalizedEnergyField, create_energy_field,
    finalize_energy_field,
};
use crate::job_graph::{JobGraph, ThreadPool};
use crate::model::AirAbsorptionModel;
use crate::probe::ProbeBatch;
use crate::ray_tracing::{CustomRayTracer, DefaultRayTracer, Embree, RadeonRays, RayTracer};
use crate::reverb::{ReverbEstimator, SchroederReverbEstimator};
use crate::simulator::{ReflectionSimulationInputs, ReflectionSimulator};
use log::{debug, info, trace, warn};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// A baker of reflections.
///
/// Simulating reflections in real-time is a very compute-intensive process.
/// [`ReflectionsBaker`] lets you bake, or precompute reflections throughout a scene (or part of a scene) beforehand.
///
/// Reflections are baked at several points that you specify.
/// Each of these points is called a probe and belong to a [`ProbeBatch`].
///
/// The ray tracer type parameter selects how probes are grouped into simulator calls:
/// [`RadeonRays`] evaluates batches of many-to-many queries on an OpenCL device,
/// every other ray tracer only batches [`BakedDataVariation::StaticListener`] probes.
pub struct ReflectionsBaker<'a, T: RayTracer> {
    open_cl_device: Option<&'a OpenClDevice>,
    session: Arc<BakeSession>,
    reverb_estimator: Box<dyn ReverbEstimator + Send + Sync>,
    impulse_response_dump: Option<ImpulseResponseDump>,
    _marker: PhantomData<T>,
}

impl ReflectionsBaker<'_, DefaultRayTracer> {
    /// Creates a new [`ReflectionsBaker`].
    pub fn new() -> Self {
        Self::with_device(None)
    }
}

impl Default for ReflectionsBaker<'_, DefaultRayTracer> {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflectionsBaker<'_, Embree> {
    /// Creates a new [`ReflectionsBaker`].
    pub fn new() -> Self {
        Self::with_device(None)
    }
}

impl<'a> ReflectionsBaker<'a, RadeonRays> {
    /// Creates a new [`ReflectionsBaker`] simulating into memory of `open_cl_device`.
    pub fn new(open_cl_device: &'a OpenClDevice) -> Self {
        Self::with_device(Some(open_cl_device))
    }
}

impl ReflectionsBaker<'_, CustomRayTracer> {
    /// Creates a new [`ReflectionsBaker`].
    pub fn new() -> Self {
        Self::with_device(None)
    }
}

impl<'a, T: RayTracer> ReflectionsBaker<'a, T> {
    fn with_device(open_cl_device: Option<&'a OpenClDevice>) -> Self {
        Self {
            open_cl_device,
            session: Arc::new(BakeSession::default()),
            reverb_estimator: Box::new(SchroederReverbEstimator::default()),
            impulse_response_dump: None,
            _marker: PhantomData,
        }
    }

    /// Replaces the estimator used to derive parametric reverb. Defaults to [`SchroederReverbEstimator`].
    pub fn with_reverb_estimator<E>(mut self, reverb_estimator: E) -> Self
    where
        E: ReverbEstimator + Send + Sync + 'static,
    {
        self.reverb_estimator = Box::new(reverb_estimator);
        self
    }

    /// Writes the impulse response of every baked energy field to disk.
    ///
    /// Only applies to convolution bakes. Failing to write a file does not fail the bake.
    pub fn with_impulse_response_dump(mut self, impulse_response_dump: ImpulseResponseDump) -> Self {
        self.impulse_response_dump = Some(impulse_response_dump);
        self
    }

    /// Bakes a single layer of reflections data in a probe batch.
    ///
    /// Only one bake can be in progress on a baker at any point in time.
    ///
    /// # Errors
    ///
    /// Returns [`BakeError`] if another bake operation is already in progress,
    /// or if the thread pool or energy fields cannot be created.
    ///
    /// # Panics
    ///
    /// Panics if `params.bake_flags` is empty, or if `params.identifier` is not
    /// [`BakedDataIdentifier::Reflections`] with a variation other than [`BakedDataVariation::Dynamic`].
    pub fn bake<S: ReflectionSimulator>(
        &self,
        probe_batch: &mut ProbeBatch,
        scene: &S::Scene,
        simulator: &S,
        params: &ReflectionsBakeParams,
    ) -> Result<(), BakeError> {
        self.bake_with_optional_progress_callback(probe_batch, scene, simulator, params, None)
    }

    /// Bakes a single layer of reflections data in a probe batch, with a progress callback.
    ///
    /// The callback receives the fraction of probes processed after every batch.
    ///
    /// # Errors
    ///
    /// Same as [`Self::bake`].
    ///
    /// # Panics
    ///
    /// Same as [`Self::bake`].
    pub fn bake_with_progress_callback<S: ReflectionSimulator>(
        &self,
        probe_batch: &mut ProbeBatch,
        scene: &S::Scene,
        simulator: &S,
        params: &ReflectionsBakeParams,
        progress_callback: ProgressCallback,
    ) -> Result<(), BakeError> {
        self.bake_with_optional_progress_callback(
            probe_batch,
            scene,
            simulator,
            params,
            Some(progress_callback),
        )
    }

    fn bake_with_optional_progress_callback<S: ReflectionSimulator>(
        &self,
        probe_batch: &mut ProbeBatch,
        scene: &S::Scene,
        simulator: &S,
        params: &ReflectionsBakeParams,
        mut progress_callback: Option<ProgressCallback>,
    ) -> Result<(), BakeError> {
        assert!(
            !params.bake_flags.is_empty(),
            "at least one of convolution or parametric data must be baked"
        );
        let BakedDataIdentifier::Reflections { variation } = params.identifier else {
            panic!("a reflections baker can only bake reflections data");
        };
        assert!(
            !matches!(variation, BakedDataVariation::Dynamic),
            "dynamic reflections data cannot be baked"
        );

        let _session = self.session.begin()?;
        let thread_pool = ThreadPool::try_new(params.num_threads as usize)?;

        let scene_type = T::scene_type();
        let batch_size =
            scene_type.effective_batch_size(&variation, params.bake_batch_size as usize);
        let num_probes = probe_batch.num_probes();

        let (probes, data) = probe_batch.probes_and_reflections_data_mut(params.identifier);
        data.add_capabilities(params.bake_flags);

        info!(
            "baking {:?} ({:?}) for {num_probes} probes on {scene_type:?}, batch size {batch_size}",
            params.identifier, params.bake_flags,
        );

        let settings = EnergyFieldSettings {
            duration: params.simulated_duration,
            order: params.order,
        };
        let mut arena = BatchArena::new(batch_size, num_probes);

        for (probe_index, probe) in probes.iter().enumerate() {
            if let Some(endpoints) = probe_endpoints(&variation, probe) {
                let energy_field = create_energy_field(scene_type, &settings, self.open_cl_device)?;
                arena.push(probe_index, endpoints, energy_field);
            }

            if !arena.is_full() && probe_index + 1 < num_probes {
                continue;
            }

            self.run_batch(scene, simulator, params, &variation, &thread_pool, &mut arena);
            for (index, energy_field) in arena.take_results() {
                self.store(index, energy_field, params, data);
            }

            if let Some(callback) = progress_callback.as_mut() {
                callback.call((probe_index + 1) as f32 / num_probes as f32);
            }

            if self.session.is_cancel_requested() {
                info!(
                    "bake of {:?} cancelled after {} of {num_probes} probes",
                    params.identifier,
                    probe_index + 1
                );
                return Ok(());
            }
        }

        info!("baked {:?} for {num_probes} probes", params.identifier);

        Ok(())
    }

    /// Simulates every probe in `arena` and leaves the results readable on the host.
    fn run_batch<S: ReflectionSimulator>(
        &self,
        scene: &S::Scene,
        simulator: &S,
        params: &ReflectionsBakeParams,
        variation: &BakedDataVariation,
        thread_pool: &ThreadPool,
        arena: &mut BatchArena,
    ) {
        let scene_type = T::scene_type();
        let (Some(&first), Some(&last)) = (arena.probe_indices.first(), arena.probe_indices.last())
        else {
            return;
        };

        let shape = scene_type.native_endpoint_shape(variation, arena.len());
        debug!(
            "simulating probes {first}..={last}: {} sources, {} listeners",
            shape.num_sources, shape.num_listeners
        );

        let inputs = ReflectionSimulationInputs {
            sources: &arena.sources[..shape.num_sources],
            listeners: &arena.listeners[..shape.num_listeners],
            directivities: &arena.directivities[..shape.num_sources],
            num_rays: params.num_rays,
            num_bounces: params.num_bounces,
            duration: params.simulated_duration,
            order: params.order,
            irradiance_min_distance: params.irradiance_min_distance,
        };

        let mut job_graph = JobGraph::new();
        simulator.simulate(scene, inputs, &mut arena.energy_fields, &mut job_graph);
        if job_graph.is_empty() {
            warn!("simulator produced no jobs for probes {first}..={last}");
        }
        thread_pool.process(job_graph);

        if scene_type.keeps_results_on_device() {
            for energy_field in &mut arena.energy_fields {
                energy_field.sync_to_host();
            }
        }
    }

    /// Writes the outputs derived from one simulated field at `probe_index`.
    fn store(
        &self,
        probe_index: usize,
        energy_field: EnergyField,
        params: &ReflectionsBakeParams,
        data: &mut BakedReflectionsData,
    ) {
        if params.bake_flags.contains(ReflectionsBakeFlags::BAKE_PARAMETRIC) {
            let reverb = self
                .reverb_estimator
                .estimate(&energy_field, &params.air_absorption);
            trace!("probe {probe_index}: reverb times {:?}", reverb.reverb_times);
            data.set_reverb(probe_index, reverb);
        }

        if params.bake_flags.contains(ReflectionsBakeFlags::BAKE_CONVOLUTION) {
            let finalized = finalize_energy_field(energy_field, params.saved_duration);
            trace!(
                "probe {probe_index}: energy field {}",
                match finalized {
                    FinalizedEnergyField::Moved(_) => "moved",
                    FinalizedEnergyField::Resampled(_) => "resampled",
                }
            );

            if let Some(dump) = &self.impulse_response_dump {
                if let Err(error) = dump.write(probe_index, finalized.energy_field()) {
                    warn!(
                        "failed to write {}: {error}",
                        dump.path_for(probe_index).display()
                    );
                }
            }

            data.set_energy_field(probe_index, finalized.into_inner());
        }
    }

    /// Requests cancellation of the bake running on this baker.
    ///
    /// The bake stops once the batch being simulated has been written back.
    /// Does nothing if no bake is in progress.
    pub fn cancel_bake(&self) {
        self.session.cancel();
    }

    /// Returns a handle that cancels bakes of this baker from other threads.
    pub fn canceller(&self) -> BakeCanceller {
        BakeCanceller {
            session: Arc::clone(&self.session),
        }
    }

    /// Returns `true` while a bake is running on this baker.
    pub fn is_bake_in_progress(&self) -> bool {
        self.session.is_in_progress()
    }
}

impl<T: RayTracer> std::fmt::Debug for ReflectionsBaker<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectionsBaker")
            .field("scene_type", &T::scene_type())
            .field("open_cl_device", &self.open_cl_device)
            .field("session", &self.session)
            .field("impulse_response_dump", &self.impulse_response_dump)
            .finish_non_exhaustive()
    }
}

/// Cancels bakes of the [`ReflectionsBaker`] it was created from.
///
/// Can be cloned and sent to other threads.
#[derive(Debug, Clone)]
pub struct BakeCanceller {
    session: Arc<BakeSession>,
}

impl BakeCanceller {
    /// Requests cancellation of the running bake. Does nothing if no bake is in progress.
    pub fn cancel(&self) {
        self.session.cancel();
    }

    /// Returns `true` while a bake is running on the baker this canceller belongs to.
    pub fn is_bake_in_progress(&self) -> bool {
        self.session.is_in_progress()
    }
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLING: u8 = 2;

/// Bake state shared by a baker and its cancellers.
#[derive(Debug, Default)]
struct BakeSession {
    state: AtomicU8,
}

impl BakeSession {
    fn begin(&self) -> Result<BakeSessionGuard<'_>, BakeError> {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BakeError::BakeInProgress)?;

        Ok(BakeSessionGuard { session: self })
    }

    fn cancel(&self) {
        // Only a running bake can be cancelled.
        let _ = self
            .state
            .compare_exchange(RUNNING, CANCELLING, Ordering::AcqRel, Ordering::Acquire);
    }

    fn is_cancel_requested(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLING
    }

    fn is_in_progress(&self) -> bool {
        self.state.load(Ordering::Acquire) != IDLE
    }
}

/// Marks the end of a bake, clearing any pending cancellation.
struct BakeSessionGuard<'a> {
    session: &'a BakeSession,
}

impl Drop for BakeSessionGuard<'_> {
    fn drop(&mut self) {
        self.session.state.store(IDLE, Ordering::Release);
    }
}

/// Parameters used to control how reflections data is baked.
#[derive(Debug, Clone)]
pub struct ReflectionsBakeParams {
    /// An identifier for the data layer that should be baked.
    /// The identifier determines what data is simulated and stored at each probe.
    /// If the probe batch already contains data with this identifier, it will be overwritten.
    pub identifier: BakedDataIdentifier,

    /// The types of data to save for each probe.
    pub bake_flags: ReflectionsBakeFlags,

    /// The number of rays to trace from each listener position when baking.
    /// Increasing this number results in improved accuracy, at the cost of increased bake times.
    pub num_rays: u32,

    /// The number of times each ray is reflected off of solid geometry.
    /// Increasing this number results in longer reverb tails and improved accuracy, at the cost of increased bake times.
    pub num_bounces: u32,

    /// The length (in seconds) of the impulse responses to simulate.
    /// Increasing this number allows the baked data to represent longer reverb tails (and hence larger spaces), at the cost of increased memory usage while baking.
    pub simulated_duration: f32,

    /// The length (in seconds) of the impulse responses to save at each probe.
    ///
    /// It may be useful to set [`Self::saved_duration`] to be less than [`Self::simulated_duration`], especially when baking parametric reverb as well.
    /// This way, the parametric reverb data is estimated using a longer IR, but only the early part of the IR is saved.
    pub saved_duration: f32,

    /// Ambisonic order of the baked IRs.
    pub order: u32,

    /// Number of threads to use for baking. Zero uses one thread per logical CPU.
    pub num_threads: u32,

    /// When calculating how much sound energy reaches a surface directly from a source, any source that is closer than [`Self::irradiance_min_distance`] to the surface is assumed to be at a distance of [`Self::irradiance_min_distance`], for the purposes of energy calculations.
    pub irradiance_min_distance: f32,

    /// If using Radeon Rays or if [`Self::identifier`] uses [`BakedDataVariation::StaticListener`], this is the number of probes for which data is baked simultaneously.
    /// Otherwise probes are baked one at a time. Zero is treated as one.
    pub bake_batch_size: u32,

    /// Air absorption applied when estimating parametric reverb.
    pub air_absorption: AirAbsorptionModel,
}

impl Default for ReflectionsBakeParams {
    fn default() -> Self {
        Self {
            identifier: BakedDataIdentifier::Reflections {
                variation: BakedDataVariation::Reverb,
            },
            bake_flags: ReflectionsBakeFlags::BAKE_CONVOLUTION
                | ReflectionsBakeFlags::BAKE_PARAMETRIC,
            num_rays: 16384,
            num_bounces: 16,
            simulated_duration: 1.0,
            saved_duration: 1.0,
            order: 1,
            num_threads: 0,
            irradiance_min_distance: 1.0,
            bake_batch_size: 1,
            air_absorption: AirAbsorptionModel::default(),
        }
    }
}

bitflags::bitflags! {
    /// Flags for specifying what types of reflections data to bake.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ReflectionsBakeFlags: u32 {
        /// Bake impulse responses for convolution reverb.
        const BAKE_CONVOLUTION = 1 << 0;

        /// Bake parametric reverb.
        const BAKE_PARAMETRIC = 1 << 1;
    }
}
