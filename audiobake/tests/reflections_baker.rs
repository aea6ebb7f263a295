use assert_approx_eq::assert_approx_eq;
use audiobake::*;
use std::sync::{Arc, Mutex};

mod common;
use common::{RecordingSimulator, init_logger, marker, probe_row, test_params};

const STATIC_SOURCE: BakedDataVariation = BakedDataVariation::StaticSource {
    endpoint_influence: Sphere::new(Point::new(0.0, 0.0, 0.0), 2.5),
};

const STATIC_LISTENER: BakedDataVariation = BakedDataVariation::StaticListener {
    endpoint_influence: Sphere::new(Point::new(0.0, 0.0, 0.0), 100.0),
};

#[test]
fn test_reverb_probes_are_both_endpoints() {
    init_logger();

    let mut probe_batch = probe_row(5);
    let params = test_params(
        BakedDataVariation::Reverb,
        ReflectionsBakeFlags::BAKE_CONVOLUTION | ReflectionsBakeFlags::BAKE_PARAMETRIC,
    );
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    for call in simulator.calls() {
        assert_eq!(call.sources, call.listeners);
    }

    let data = probe_batch.reflections_data(&params.identifier).unwrap();
    for (index, probe) in probe_batch.probes().iter().enumerate() {
        let expected = marker(probe.center(), probe.center());
        let energy_field = data.energy_field(index).unwrap();

        assert!(energy_field.data().iter().all(|&value| value == expected));
        assert!(data.reverb(index).is_some());
    }
}

#[test]
fn test_static_source_skips_probes_outside_influence() {
    let mut probe_batch = probe_row(6);
    let params = test_params(STATIC_SOURCE, ReflectionsBakeFlags::BAKE_CONVOLUTION);
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    let data = probe_batch.reflections_data(&params.identifier).unwrap();
    assert_eq!(data.num_probes(), 6);
    assert_eq!(data.num_baked_energy_fields(), 3);

    for index in 0..3 {
        let expected = marker(Point::new(0.0, 0.0, 0.0), Point::new(index as f32, 0.0, 0.0));
        assert_eq!(data.energy_field(index).unwrap().data()[0], expected);
    }
    for index in 3..6 {
        assert!(data.energy_field(index).is_none());
        assert!(data.reverb(index).is_none());
    }

    for call in simulator.calls() {
        assert_eq!(call.sources, vec![Point::new(0.0, 0.0, 0.0)]);
    }
}

#[test]
fn test_static_listener_swaps_endpoints() {
    let mut probe_batch = probe_row(3);
    let params = test_params(STATIC_LISTENER, ReflectionsBakeFlags::BAKE_CONVOLUTION);
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    let calls = simulator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].listeners, vec![Point::new(0.0, 0.0, 0.0)]);
    assert_eq!(
        calls[0].sources,
        vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
        ]
    );

    let data = probe_batch.reflections_data(&params.identifier).unwrap();
    let expected = marker(Point::new(2.0, 0.0, 0.0), Point::new(0.0, 0.0, 0.0));
    assert_eq!(data.energy_field(2).unwrap().data()[0], expected);
}

#[test]
fn test_cpu_bakes_one_probe_per_call() {
    let mut probe_batch = probe_row(10);
    let params = test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_PARAMETRIC);
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    assert_eq!(simulator.batch_sizes(), vec![1; 10]);

    let data = probe_batch.reflections_data(&params.identifier).unwrap();
    assert_eq!(data.num_baked_reverbs(), 10);
    assert!(data.has_parametric());
    assert!(!data.has_convolution());
}

#[test]
fn test_cpu_static_source_is_not_batched() {
    let mut probe_batch = probe_row(6);
    let params = test_params(STATIC_SOURCE, ReflectionsBakeFlags::BAKE_PARAMETRIC);
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<Embree>::new()
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    assert_eq!(simulator.batch_sizes(), vec![1; 3]);
}

#[test]
fn test_cpu_batches_static_listener() {
    let mut probe_batch = probe_row(10);
    let params = test_params(STATIC_LISTENER, ReflectionsBakeFlags::BAKE_PARAMETRIC);
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    assert_eq!(simulator.batch_sizes(), vec![4, 4, 2]);
    for call in simulator.calls() {
        assert_eq!(call.sources.len(), call.num_energy_fields);
        assert_eq!(call.listeners.len(), 1);
    }
}

#[test]
fn test_gpu_batches_paired_reverb_queries() {
    let device = OpenClDevice::new("test device");
    let mut probe_batch = probe_row(10);
    let params = test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_PARAMETRIC);
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<RadeonRays>::new(&device)
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    assert_eq!(simulator.batch_sizes(), vec![4, 4, 2]);
    for call in simulator.calls() {
        assert_eq!(call.sources.len(), call.num_energy_fields);
        assert_eq!(call.listeners, call.sources);
    }

    let data = probe_batch.reflections_data(&params.identifier).unwrap();
    assert_eq!(data.num_baked_reverbs(), 10);
}

#[test]
fn test_huge_batch_size_bakes_every_probe_at_once() {
    let device = OpenClDevice::new("test device");
    let mut probe_batch = probe_row(3);
    let params = ReflectionsBakeParams {
        bake_batch_size: u32::MAX,
        ..test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_PARAMETRIC)
    };
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<RadeonRays>::new(&device)
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    assert_eq!(simulator.batch_sizes(), vec![3]);
    let data = probe_batch.reflections_data(&params.identifier).unwrap();
    assert_eq!(data.num_baked_reverbs(), 3);
}

#[test]
fn test_huge_batch_size_static_listener_on_cpu() {
    let mut probe_batch = probe_row(1);
    let params = ReflectionsBakeParams {
        bake_batch_size: u32::MAX,
        ..test_params(STATIC_LISTENER, ReflectionsBakeFlags::BAKE_CONVOLUTION)
    };
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    assert_eq!(simulator.batch_sizes(), vec![1]);
}

#[test]
fn test_gpu_static_source_is_one_to_many() {
    let device = OpenClDevice::new("test device");
    let mut probe_batch = probe_row(6);
    let params = test_params(STATIC_SOURCE, ReflectionsBakeFlags::BAKE_CONVOLUTION);
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<RadeonRays>::new(&device)
        .bake(&mut probe_batch, &(), &simulator, &params)
        .unwrap();

    let calls = simulator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].sources.len(), 1);
    assert_eq!(calls[0].listeners.len(), 3);
}

#[test]
fn test_gpu_results_are_copied_to_host() {
    let device = OpenClDevice::new("test device");
    let mut probe_batch = probe_row(3);
    let params = test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_CONVOLUTION);

    ReflectionsBaker::<RadeonRays>::new(&device)
        .bake(&mut probe_batch, &(), &RecordingSimulator::new(), &params)
        .unwrap();

    assert_eq!(device.num_allocated_buffers(), 3);

    let data = probe_batch.reflections_data(&params.identifier).unwrap();
    for (index, probe) in probe_batch.probes().iter().enumerate() {
        let expected = marker(probe.center(), probe.center());
        assert!(data.energy_field(index).unwrap().data().iter().all(|&value| value == expected));
    }
}

#[test]
fn test_capability_flags_accumulate() {
    let mut probe_batch = probe_row(2);
    let simulator = RecordingSimulator::new();
    let baker = ReflectionsBaker::<DefaultRayTracer>::new();

    let parametric = test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_PARAMETRIC);
    baker.bake(&mut probe_batch, &(), &simulator, &parametric).unwrap();
    baker.bake(&mut probe_batch, &(), &simulator, &parametric).unwrap();

    let data = probe_batch.reflections_data(&parametric.identifier).unwrap();
    assert!(data.has_parametric());
    assert!(!data.has_convolution());
    assert_eq!(data.num_baked_energy_fields(), 0);

    let convolution = test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_CONVOLUTION);
    baker.bake(&mut probe_batch, &(), &simulator, &convolution).unwrap();

    let data = probe_batch.reflections_data(&convolution.identifier).unwrap();
    assert!(data.has_parametric());
    assert!(data.has_convolution());
    assert_eq!(data.num_baked_reverbs(), 2);
    assert_eq!(data.num_baked_energy_fields(), 2);
    assert_eq!(probe_batch.identifiers().count(), 1);
}

#[test]
fn test_equal_durations_keep_simulated_field() {
    let mut probe_batch = probe_row(1);
    let params = test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_CONVOLUTION);

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &(), &RecordingSimulator::new(), &params)
        .unwrap();

    let energy_field = probe_batch
        .reflections_data(&params.identifier)
        .and_then(|data| data.energy_field(0))
        .unwrap();
    let mut expected = EnergyField::new(&EnergyFieldSettings {
        duration: params.simulated_duration,
        order: params.order,
    });
    expected.data_mut().fill(marker(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.0, 0.0)));

    assert_eq!(*energy_field, expected);
}

#[test]
fn test_shorter_saved_duration_truncates() {
    let mut probe_batch = probe_row(1);
    let params = ReflectionsBakeParams {
        simulated_duration: 0.5,
        saved_duration: 0.2,
        ..test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_CONVOLUTION)
    };

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &(), &RecordingSimulator::new(), &params)
        .unwrap();

    let energy_field = probe_batch
        .reflections_data(&params.identifier)
        .and_then(|data| data.energy_field(0))
        .unwrap();

    assert_eq!(energy_field.duration(), 0.2);
    assert_eq!(energy_field.num_bins(), num_bins_for_duration(0.2));
    assert!(energy_field.data().iter().all(|&value| value == 1.0));
}

#[test]
fn test_longer_saved_duration_extends_with_silence() {
    let mut probe_batch = probe_row(1);
    let params = ReflectionsBakeParams {
        simulated_duration: 0.1,
        saved_duration: 0.3,
        ..test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_CONVOLUTION)
    };

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &(), &RecordingSimulator::new(), &params)
        .unwrap();

    let energy_field = probe_batch
        .reflections_data(&params.identifier)
        .and_then(|data| data.energy_field(0))
        .unwrap();
    let simulated_bins = num_bins_for_duration(0.1);

    assert_eq!(energy_field.duration(), 0.3);
    let band = energy_field.band(0, 0).unwrap();
    assert!(band[..simulated_bins].iter().all(|&value| value == 1.0));
    assert!(band[simulated_bins..].iter().all(|&value| value == 0.0));
}

#[test]
fn test_progress_is_monotonic() {
    let mut probe_batch = probe_row(10);
    let params = test_params(STATIC_SOURCE, ReflectionsBakeFlags::BAKE_PARAMETRIC);
    let progress = Arc::new(Mutex::new(Vec::new()));

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake_with_progress_callback(
            &mut probe_batch,
            &(),
            &RecordingSimulator::new(),
            &params,
            ProgressCallback::new({
                let progress = Arc::clone(&progress);
                move |value| progress.lock().unwrap().push(value)
            }),
        )
        .unwrap();

    let progress = progress.lock().unwrap();
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_approx_eq!(progress[0], 0.1);
    assert_eq!(*progress.last().unwrap(), 1.0);
}

#[test]
fn test_no_probes_reports_nothing() {
    let mut probe_batch = ProbeBatch::new();
    let params = test_params(BakedDataVariation::Reverb, ReflectionsBakeFlags::BAKE_PARAMETRIC);
    let progress = Arc::new(Mutex::new(Vec::new()));
    let simulator = RecordingSimulator::new();

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake_with_progress_callback(
            &mut probe_batch,
            &(),
            &simulator,
            &params,
            ProgressCallback::new({
                let progress = Arc::clone(&progress);
                move |value| progress.lock().unwrap().push(value)
            }),
        )
        .unwrap();

    assert!(progress.lock().unwrap().is_empty());
    assert!(simulator.calls().is_empty());
    assert!(probe_batch.has_data(&params.identifier));
}

#[test]
fn test_statistical_room_reverb_times() {
    let scene = ShoeboxScene::default();
    let mut probe_batch = ProbeBatch::new();
    probe_batch.add_probe(Sphere::new(Point::new(3.0, 1.5, 4.0), 1.0));
    probe_batch.add_probe(Sphere::new(Point::new(7.0, 1.5, 2.0), 1.0));

    let params = ReflectionsBakeParams {
        identifier: BakedDataIdentifier::Reflections {
            variation: BakedDataVariation::Reverb,
        },
        bake_flags: ReflectionsBakeFlags::BAKE_PARAMETRIC,
        num_bounces: 1000,
        simulated_duration: 3.0,
        saved_duration: 3.0,
        num_threads: 2,
        air_absorption: AirAbsorptionModel::Exponential {
            coefficients: [0.0; NUM_BANDS],
        },
        ..Default::default()
    };

    ReflectionsBaker::<DefaultRayTracer>::new()
        .bake(&mut probe_batch, &scene, &StatisticalSimulator, &params)
        .unwrap();

    let expected = scene.reverb_times();
    let data = probe_batch.reflections_data(&params.identifier).unwrap();
    for index in 0..2 {
        let reverb = data.reverb(index).unwrap();
        for band in 0..NUM_BANDS {
            assert_approx_eq!(reverb.reverb_times[band], expected[band], 0.05 * expected[band]);
        }
    }
}
