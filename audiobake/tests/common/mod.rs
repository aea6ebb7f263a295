use audiobake::*;
use std::sync::Mutex;

// Value a `RecordingSimulator` writes into every bin of a field, identifying its endpoints.
pub fn marker(source: Point, listener: Point) -> f32 {
    1.0 + 10.0 * source.x + listener.x
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Probes one meter apart along the x axis.
pub fn probe_row(num_probes: usize) -> ProbeBatch {
    let mut probe_batch = ProbeBatch::new();
    for i in 0..num_probes {
        probe_batch.add_probe(Sphere::new(Point::new(i as f32, 0.0, 0.0), 0.5));
    }
    probe_batch
}

pub fn test_params(variation: BakedDataVariation, bake_flags: ReflectionsBakeFlags) -> ReflectionsBakeParams {
    ReflectionsBakeParams {
        identifier: BakedDataIdentifier::Reflections { variation },
        bake_flags,
        num_rays: 32,
        num_bounces: 2,
        simulated_duration: 0.2,
        saved_duration: 0.2,
        order: 1,
        num_threads: 2,
        irradiance_min_distance: 1.0,
        bake_batch_size: 4,
        ..Default::default()
    }
}

/// Endpoints presented to one `simulate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulateCall {
    pub sources: Vec<Point>,
    pub listeners: Vec<Point>,
    pub num_energy_fields: usize,
}

/// Simulator that records its calls and fills each field with the `marker` of its endpoints.
#[derive(Default)]
pub struct RecordingSimulator {
    calls: Mutex<Vec<SimulateCall>>,
    on_simulate: Option<Box<dyn Fn() + Send + Sync>>,
}

impl RecordingSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `hook` on the baking thread at the start of every call.
    pub fn with_hook(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::default(),
            on_simulate: Some(Box::new(hook)),
        }
    }

    pub fn calls(&self) -> Vec<SimulateCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls().iter().map(|call| call.num_energy_fields).collect()
    }
}

impl ReflectionSimulator for RecordingSimulator {
    type Scene = ();

    fn simulate<'a>(
        &'a self,
        _scene: &'a (),
        inputs: ReflectionSimulationInputs<'a>,
        energy_fields: &'a mut [SimulationEnergyField],
        job_graph: &mut JobGraph<'a>,
    ) {
        self.calls.lock().unwrap().push(SimulateCall {
            sources: inputs.sources.iter().map(|source| source.origin).collect(),
            listeners: inputs.listeners.iter().map(|listener| listener.origin).collect(),
            num_energy_fields: energy_fields.len(),
        });

        if let Some(hook) = &self.on_simulate {
            hook();
        }

        for (index, energy_field) in energy_fields.iter_mut().enumerate() {
            let endpoints = inputs.endpoints(index);
            let value = marker(endpoints.source.origin, endpoints.listener.origin);
            job_graph.add_job(move || energy_field.target_mut().fill(value));
        }
    }
}
