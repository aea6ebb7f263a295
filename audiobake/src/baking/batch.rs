//! Probe eligibility and the per-batch endpoint arena.

use super::BakedDataVariation;
use crate::energy_field::{EnergyField, SimulationEnergyField};
use crate::geometry::CoordinateSystem;
use crate::model::Directivity;
use crate::probe::Probe;

/// Source and listener used to bake one probe.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Endpoints {
    pub source: CoordinateSystem,
    pub listener: CoordinateSystem,
}

/// Returns the endpoints a probe is baked with, or `None` if the variation excludes it.
///
/// - [`BakedDataVariation::Reverb`]: every probe, with its center as both source and listener.
/// - [`BakedDataVariation::StaticSource`]: probes whose center lies in the endpoint influence,
///   with the influence center as the source.
/// - [`BakedDataVariation::StaticListener`]: the same with source and listener swapped.
/// - [`BakedDataVariation::Dynamic`]: no probe.
pub fn probe_endpoints(variation: &BakedDataVariation, probe: &Probe) -> Option<Endpoints> {
    let center = probe.coordinate_system();

    match variation {
        BakedDataVariation::Reverb => Some(Endpoints {
            source: center,
            listener: center,
        }),
        BakedDataVariation::StaticSource { endpoint_influence } => endpoint_influence
            .contains(probe.center())
            .then(|| Endpoints {
                source: CoordinateSystem::at(endpoint_influence.center),
                listener: center,
            }),
        BakedDataVariation::StaticListener { endpoint_influence } => endpoint_influence
            .contains(probe.center())
            .then(|| Endpoints {
                source: center,
                listener: CoordinateSystem::at(endpoint_influence.center),
            }),
        BakedDataVariation::Dynamic => None,
    }
}

/// Fixed-capacity storage for the probes of the batch being assembled.
///
/// Slot `i` of every array belongs to the same probe, and `probe_indices[i]` maps it back
/// to its index in the probe batch.
#[derive(Debug)]
pub(crate) struct BatchArena {
    capacity: usize,
    pub(crate) probe_indices: Vec<usize>,
    pub(crate) sources: Vec<CoordinateSystem>,
    pub(crate) listeners: Vec<CoordinateSystem>,
    pub(crate) directivities: Vec<Directivity>,
    pub(crate) energy_fields: Vec<SimulationEnergyField>,
}

impl BatchArena {
    /// Creates an arena that closes batches at `capacity` probes.
    ///
    /// Storage is only reserved for `max_probes`, the most probes the arena will ever hold.
    pub(crate) fn new(capacity: usize, max_probes: usize) -> Self {
        let reserved = capacity.min(max_probes);

        Self {
            capacity,
            probe_indices: Vec::with_capacity(reserved),
            sources: Vec::with_capacity(reserved),
            listeners: Vec::with_capacity(reserved),
            directivities: Vec::with_capacity(reserved),
            energy_fields: Vec::with_capacity(reserved),
        }
    }

    #[cfg(test)]
    fn reserved(&self) -> usize {
        self.probe_indices.capacity()
    }

    pub(crate) fn len(&self) -> usize {
        self.probe_indices.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.probe_indices.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Appends a probe.
    ///
    /// # Panics
    ///
    /// Panics if the arena is full.
    pub(crate) fn push(
        &mut self,
        probe_index: usize,
        endpoints: Endpoints,
        energy_field: SimulationEnergyField,
    ) {
        assert!(!self.is_full(), "batch arena is full");

        self.probe_indices.push(probe_index);
        self.sources.push(endpoints.source);
        self.listeners.push(endpoints.listener);
        self.directivities.push(Directivity::OMNIDIRECTIONAL);
        self.energy_fields.push(energy_field);
    }

    /// Empties the arena, returning each simulated field with its probe index.
    pub(crate) fn take_results(&mut self) -> Vec<(usize, EnergyField)> {
        self.sources.clear();
        self.listeners.clear();
        self.directivities.clear();

        self.probe_indices
            .drain(..)
            .zip(self.energy_fields.drain(..))
            .map(|(probe_index, energy_field)| (probe_index, energy_field.into_host()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy_field::EnergyFieldSettings;
    use crate::geometry::{Point, Sphere};

    fn probe(x: f32) -> Probe {
        Probe::new(Sphere::new(Point::new(x, 0.0, 0.0), 1.0))
    }

    fn host_field() -> SimulationEnergyField {
        SimulationEnergyField::Host(EnergyField::new(&EnergyFieldSettings {
            duration: 0.1,
            order: 0,
        }))
    }

    #[test]
    fn test_reverb_uses_probe_center_twice() {
        let endpoints = probe_endpoints(&BakedDataVariation::Reverb, &probe(3.0)).unwrap();

        assert_eq!(endpoints.source.origin, Point::new(3.0, 0.0, 0.0));
        assert_eq!(endpoints.listener.origin, Point::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_static_source_eligibility() {
        let variation = BakedDataVariation::StaticSource {
            endpoint_influence: Sphere::new(Point::new(0.0, 0.0, 0.0), 2.0),
        };

        let inside = probe_endpoints(&variation, &probe(1.5)).unwrap();
        assert_eq!(inside.source.origin, Point::new(0.0, 0.0, 0.0));
        assert_eq!(inside.listener.origin, Point::new(1.5, 0.0, 0.0));

        assert!(probe_endpoints(&variation, &probe(2.5)).is_none());
    }

    #[test]
    fn test_static_listener_swaps_endpoints() {
        let variation = BakedDataVariation::StaticListener {
            endpoint_influence: Sphere::new(Point::new(0.0, 0.0, 0.0), 2.0),
        };

        let endpoints = probe_endpoints(&variation, &probe(1.0)).unwrap();
        assert_eq!(endpoints.source.origin, Point::new(1.0, 0.0, 0.0));
        assert_eq!(endpoints.listener.origin, Point::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_dynamic_excludes_everything() {
        assert!(probe_endpoints(&BakedDataVariation::Dynamic, &probe(0.0)).is_none());
    }

    #[test]
    fn test_arena_take_results() {
        let mut arena = BatchArena::new(2, 10);
        let endpoints = probe_endpoints(&BakedDataVariation::Reverb, &probe(0.0)).unwrap();

        arena.push(4, endpoints, host_field());
        assert!(!arena.is_full());
        arena.push(7, endpoints, host_field());
        assert!(arena.is_full());

        let results = arena.take_results();
        assert_eq!(
            results.iter().map(|(index, _)| *index).collect::<Vec<_>>(),
            [4, 7]
        );
        assert!(arena.is_empty());
        assert!(arena.sources.is_empty());
        assert!(arena.energy_fields.is_empty());
    }

    #[test]
    fn test_arena_reserves_at_most_probe_count() {
        let mut arena = BatchArena::new(usize::MAX, 2);
        assert!(arena.reserved() < 16);

        let endpoints = probe_endpoints(&BakedDataVariation::Reverb, &probe(0.0)).unwrap();
        arena.push(0, endpoints, host_field());
        arena.push(1, endpoints, host_field());
        assert!(!arena.is_full());
    }

    #[test]
    #[should_panic(expected = "batch arena is full")]
    fn test_arena_overflow() {
        let mut arena = BatchArena::new(1, 10);
        let endpoints = probe_endpoints(&BakedDataVariation::Reverb, &probe(0.0)).unwrap();

        arena.push(0, endpoints, host_field());
        arena.push(1, endpoints, host_field());
    }
}
