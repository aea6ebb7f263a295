//! Sound probes and the batches that store baked data for them.

use crate::baking::{BakedDataIdentifier, BakedReflectionsData};
use crate::geometry::{CoordinateSystem, Point, Sphere};
use slotmap::{DefaultKey, SlotMap};

/// A sound probe: a point at which baked data is computed, with a radius of influence.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Probe {
    /// The region this probe's data applies to.
    pub influence: Sphere,
}

impl Probe {
    pub const fn new(influence: Sphere) -> Self {
        Self { influence }
    }

    pub fn center(&self) -> Point {
        self.influence.center
    }

    /// The axis-aligned coordinate frame at the probe's center.
    pub fn coordinate_system(&self) -> CoordinateSystem {
        CoordinateSystem::at(self.influence.center)
    }
}

impl From<Sphere> for Probe {
    fn from(influence: Sphere) -> Self {
        Self::new(influence)
    }
}

/// An array of sound probes.
///
/// Each probe has a position and a radius of influence.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProbeArray {
    probes: Vec<Sphere>,
}

impl ProbeArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates probes and adds them to the probe array.
    pub fn generate_probes(&mut self, probe_params: &ProbeGenerationParams) {
        match *probe_params {
            ProbeGenerationParams::Centroid { min, max } => {
                let center = (min + max) * 0.5;
                let radius = (max - center).length();
                self.probes.push(Sphere::new(center, radius));
            }
            ProbeGenerationParams::UniformGrid {
                spacing,
                height,
                min,
                max,
            } => {
                if spacing <= 0.0 {
                    return;
                }

                let y = min.y + height;
                if y > max.y {
                    return;
                }

                let num_x = ((max.x - min.x) / spacing).floor() as usize + 1;
                let num_z = ((max.z - min.z) / spacing).floor() as usize + 1;

                for i in 0..num_x {
                    for k in 0..num_z {
                        let center =
                            Point::new(min.x + i as f32 * spacing, y, min.z + k as f32 * spacing);
                        self.probes.push(Sphere::new(center, spacing));
                    }
                }
            }
        }
    }

    /// Adds a single probe.
    pub fn push(&mut self, probe: Sphere) {
        self.probes.push(probe);
    }

    pub fn num_probes(&self) -> usize {
        self.probes.len()
    }

    pub fn probe(&self, index: usize) -> Option<&Sphere> {
        self.probes.get(index)
    }

    pub fn probes(&self) -> &[Sphere] {
        &self.probes
    }
}

/// Settings used to generate probes.
#[derive(Copy, Clone, Debug)]
pub enum ProbeGenerationParams {
    /// Generates a single probe at the center of the axis-aligned box spanning `min` to `max`,
    /// whose influence covers the whole box.
    Centroid { min: Point, max: Point },

    /// Generates probes uniformly spaced on a horizontal grid, a fixed height above the bottom of the axis-aligned box spanning `min` to `max`.
    /// Each probe's radius of influence equals the spacing.
    UniformGrid {
        /// Spacing (in meters) between two neighboring probes.
        spacing: f32,

        /// Height (in meters) above the bottom of the box at which probes will be generated.
        height: f32,

        min: Point,
        max: Point,
    },
}

/// A batch of sound probes, along with associated data.
///
/// The associated data is organized in layers, one per [`BakedDataIdentifier`].
/// A layer is created the first time its identifier is baked, sized to the probe count,
/// and is only mutated in place afterwards.
#[derive(Debug, Default)]
pub struct ProbeBatch {
    probes: Vec<Probe>,
    layers: SlotMap<DefaultKey, BakedReflectionsData>,
    identifiers: Vec<(BakedDataIdentifier, DefaultKey)>,
}

impl ProbeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a probe to a batch.
    /// The new probe will be added as the last probe in the batch.
    pub fn add_probe(&mut self, probe: impl Into<Probe>) {
        self.probes.push(probe.into());

        for data in self.layers.values_mut() {
            data.push_probe();
        }
    }

    /// Adds every probe in an array to a batch.
    /// The new probes will be added, in order, at the end of the batch.
    pub fn add_probe_array(&mut self, probe_array: &ProbeArray) {
        for &probe in probe_array.probes() {
            self.add_probe(probe);
        }
    }

    /// Removes the probe at `index`, along with its baked data.
    /// Probes after it shift down by one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_probe(&mut self, index: usize) -> Probe {
        let probe = self.probes.remove(index);

        for data in self.layers.values_mut() {
            data.remove_probe(index);
        }

        probe
    }

    pub fn num_probes(&self) -> usize {
        self.probes.len()
    }

    pub fn probe(&self, index: usize) -> Option<&Probe> {
        self.probes.get(index)
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// Returns `true` if a layer exists for `identifier`.
    pub fn has_data(&self, identifier: &BakedDataIdentifier) -> bool {
        self.key(identifier).is_some()
    }

    /// The reflections layer baked for `identifier`, if any.
    pub fn reflections_data(&self, identifier: &BakedDataIdentifier) -> Option<&BakedReflectionsData> {
        self.key(identifier).and_then(|key| self.layers.get(key))
    }

    /// A handle to the layer stored for `identifier`, if any.
    ///
    /// The handle stays valid while other layers are added or removed, and goes stale once its
    /// own layer is removed.
    pub fn layer_handle(&self, identifier: &BakedDataIdentifier) -> Option<BakedDataHandle> {
        self.key(identifier).map(BakedDataHandle)
    }

    /// The layer referenced by `handle`, or `None` if it has been removed.
    pub fn layer(&self, handle: BakedDataHandle) -> Option<&BakedReflectionsData> {
        self.layers.get(handle.0)
    }

    /// Removes the layer stored for `identifier`, returning it.
    pub fn remove_data(&mut self, identifier: &BakedDataIdentifier) -> Option<BakedReflectionsData> {
        let handle = self.layer_handle(identifier)?;
        self.remove_layer(handle)
    }

    /// Removes the layer referenced by `handle`, returning it.
    /// Returns `None` if the layer has already been removed.
    pub fn remove_layer(&mut self, handle: BakedDataHandle) -> Option<BakedReflectionsData> {
        let data = self.layers.remove(handle.0)?;
        self.identifiers.retain(|&(_, key)| key != handle.0);
        Some(data)
    }

    /// Identifiers of every stored layer, in creation order.
    pub fn identifiers(&self) -> impl Iterator<Item = &BakedDataIdentifier> {
        self.identifiers.iter().map(|(identifier, _)| identifier)
    }

    /// The probes, along with the layer for `identifier`, which is created if absent.
    pub(crate) fn probes_and_reflections_data_mut(
        &mut self,
        identifier: BakedDataIdentifier,
    ) -> (&[Probe], &mut BakedReflectionsData) {
        let key = match self.key(&identifier) {
            Some(key) => key,
            None => {
                let key = self
                    .layers
                    .insert(BakedReflectionsData::new(identifier, self.probes.len()));
                self.identifiers.push((identifier, key));
                key
            }
        };

        (&self.probes, &mut self.layers[key])
    }

    fn key(&self, identifier: &BakedDataIdentifier) -> Option<DefaultKey> {
        self.identifiers
            .iter()
            .find(|(existing, _)| existing == identifier)
            .map(|&(_, key)| key)
    }
}

/// A handle to a layer of baked data within a [`ProbeBatch`].
///
/// Returned by [`ProbeBatch::layer_handle`] once the layer's identifier has been baked.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BakedDataHandle(DefaultKey);
