//! Baked data types.

use super::ReflectionsBakeFlags;
use crate::energy_field::EnergyField;
use crate::geometry::Sphere;
use crate::reverb::Reverb;

/// Identifies a “layer” of data stored in a probe batch.
/// Each probe batch may store multiple layers of data, such as reverb, static source reflections, or pathing.
/// Each layer can be accessed using an identifier.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BakedDataIdentifier {
    /// Reflections.
    /// The source and listener positions used to compute the reflections data stored at each probe depends on the [`BakedDataVariation`] selected.
    Reflections {
        /// The way in which source and listener positions depend on probe position.
        variation: BakedDataVariation,
    },

    /// Pathing.
    /// The probe batch stores data about the shortest paths between any pair of probes in the batch.
    Pathing {
        /// The way in which source and listener positions depend on probe position.
        variation: BakedDataVariation,
    },
}

impl BakedDataIdentifier {
    /// The kind of data stored in the layer.
    pub const fn data_type(&self) -> BakedDataType {
        match self {
            Self::Reflections { .. } => BakedDataType::Reflections,
            Self::Pathing { .. } => BakedDataType::Pathing,
        }
    }

    pub const fn variation(&self) -> &BakedDataVariation {
        match self {
            Self::Reflections { variation } | Self::Pathing { variation } => variation,
        }
    }
}

/// The types of baked data that can be stored in a probe batch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BakedDataType {
    Reflections,
    Pathing,
}

/// The different ways in which the source and listener positions used to generate baked data can vary as a function of probe position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BakedDataVariation {
    /// At each probe, baked data is calculated with both the source and the listener at the probe position.
    /// This is useful for modeling traditional reverbs, which depend only on the listener’s position (or only on the source’s position).
    Reverb,

    /// At each probe, baked data is calculated with the source at some fixed position (specified separately), and the listener at the probe position.
    /// This is used for modeling reflections from a static source to any point within the probe batch.
    StaticSource {
        /// The static source used to generate baked data.
        /// Baked data is only stored for probes that lie within the radius of this sphere.
        endpoint_influence: Sphere,
    },

    /// At each probe, baked data is calculated with the source at the probe position, and the listener at some fixed position (specified separately).
    /// This is used for modeling reflections from a moving source to a static listener.
    StaticListener {
        /// The static listener used to generate baked data.
        /// Baked data is only stored for probes that lie within the radius of this sphere.
        endpoint_influence: Sphere,
    },

    /// Baked data is calculated for each pair of probes.
    /// For example, this is used for calculating paths between every pair of probes in a batch.
    Dynamic,
}

/// Reflections data baked for every probe of a batch.
///
/// Created once per identifier, sized to the batch's probe count, and only mutated in place afterwards:
/// successive bakes of the same identifier refresh stored data and accumulate capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedReflectionsData {
    identifier: BakedDataIdentifier,
    reverbs: Vec<Option<Reverb>>,
    energy_fields: Vec<Option<EnergyField>>,
    has_convolution: bool,
    has_parametric: bool,
}

impl BakedReflectionsData {
    pub fn new(identifier: BakedDataIdentifier, num_probes: usize) -> Self {
        Self {
            identifier,
            reverbs: vec![None; num_probes],
            energy_fields: vec![None; num_probes],
            has_convolution: false,
            has_parametric: false,
        }
    }

    pub fn identifier(&self) -> &BakedDataIdentifier {
        &self.identifier
    }

    pub fn num_probes(&self) -> usize {
        self.reverbs.len()
    }

    /// Returns `true` once impulse responses have been baked into this layer.
    pub fn has_convolution(&self) -> bool {
        self.has_convolution
    }

    /// Returns `true` once parametric reverb has been baked into this layer.
    pub fn has_parametric(&self) -> bool {
        self.has_parametric
    }

    /// Records the outputs of a bake pass. Capabilities are never removed.
    pub fn add_capabilities(&mut self, bake_flags: ReflectionsBakeFlags) {
        self.has_convolution |= bake_flags.contains(ReflectionsBakeFlags::BAKE_CONVOLUTION);
        self.has_parametric |= bake_flags.contains(ReflectionsBakeFlags::BAKE_PARAMETRIC);
    }

    pub fn reverb(&self, probe_index: usize) -> Option<&Reverb> {
        self.reverbs.get(probe_index)?.as_ref()
    }

    pub fn energy_field(&self, probe_index: usize) -> Option<&EnergyField> {
        self.energy_fields.get(probe_index)?.as_ref()
    }

    /// Stores the reverb of a probe, replacing any previous one.
    ///
    /// # Panics
    ///
    /// Panics if `probe_index` is out of bounds.
    pub fn set_reverb(&mut self, probe_index: usize, reverb: Reverb) {
        self.reverbs[probe_index] = Some(reverb);
    }

    /// Stores the energy field of a probe, replacing any previous one.
    ///
    /// # Panics
    ///
    /// Panics if `probe_index` is out of bounds.
    pub fn set_energy_field(&mut self, probe_index: usize, energy_field: EnergyField) {
        self.energy_fields[probe_index] = Some(energy_field);
    }

    /// Number of probes holding a reverb.
    pub fn num_baked_reverbs(&self) -> usize {
        self.reverbs.iter().flatten().count()
    }

    /// Number of probes holding an energy field.
    pub fn num_baked_energy_fields(&self) -> usize {
        self.energy_fields.iter().flatten().count()
    }

    /// Makes room for a probe appended to the batch.
    pub(crate) fn push_probe(&mut self) {
        self.reverbs.push(None);
        self.energy_fields.push(None);
    }

    /// Drops the data of a probe removed from the batch.
    pub(crate) fn remove_probe(&mut self, probe_index: usize) {
        self.reverbs.remove(probe_index);
        self.energy_fields.remove(probe_index);
    }
}
