//! Types and utilities for working with energy fields.

use crate::NUM_BANDS;
use crate::device::{DeviceBuffer, OpenClDevice};
use crate::ray_tracing::SceneType;

/// Duration (in seconds) of one histogram bin.
pub const BIN_DURATION: f32 = 0.01;

/// An energy field.
///
/// Energy fields represent a histogram of sound energy arriving at a point, as a function of incident direction, frequency band, and arrival time.
///
/// Time is subdivided into “bins” of the histogram, with each bin corresponding to 10ms.
/// For each bin, incident energy is stored separately for each frequency band.
/// For a given frequency band and time bin, we store an Ambisonic representation of the variation of incident energy as a function of direction.
///
/// Energy field data is stored as a 3D array of size #channels * #bands * #bins, in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyField {
    duration: f32,
    order: u32,
    num_channels: usize,
    num_bins: usize,
    data: Vec<f32>,
}

impl EnergyField {
    /// Creates a new, zero-initialized energy field.
    pub fn new(settings: &EnergyFieldSettings) -> Self {
        let num_channels = num_channels_for_order(settings.order);
        let num_bins = num_bins_for_duration(settings.duration);

        Self {
            duration: settings.duration,
            order: settings.order,
            num_channels,
            num_bins,
            data: vec![0.0; num_channels * NUM_BANDS * num_bins],
        }
    }

    /// Total duration (in seconds) the energy field was created with.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// The Ambisonic order.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Returns the number of channels in the energy field.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Returns the number of bins in the energy field.
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Returns the data stored in the energy field, in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the data stored in the energy field, in row-major order.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Returns the data stored in the energy field for the given channel, in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`EnergyFieldError::ChannelIndexOutOfBounds`] if `channel_index` is out of bounds.
    pub fn channel(&self, channel_index: usize) -> Result<&[f32], EnergyFieldError> {
        self.check_channel(channel_index)?;

        let len = NUM_BANDS * self.num_bins;
        let start = channel_index * len;
        Ok(&self.data[start..start + len])
    }

    /// Returns the data stored in the energy field for the given channel and band.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`EnergyFieldError::ChannelIndexOutOfBounds`] if `channel_index` is out of bounds.
    /// - [`EnergyFieldError::BandIndexOutOfBounds`] if `band_index` is out of bounds.
    pub fn band(&self, channel_index: usize, band_index: usize) -> Result<&[f32], EnergyFieldError> {
        let start = self.band_offset(channel_index, band_index)?;
        Ok(&self.data[start..start + self.num_bins])
    }

    /// Mutable variant of [`Self::band`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::band`].
    pub fn band_mut(
        &mut self,
        channel_index: usize,
        band_index: usize,
    ) -> Result<&mut [f32], EnergyFieldError> {
        let start = self.band_offset(channel_index, band_index)?;
        let num_bins = self.num_bins;
        Ok(&mut self.data[start..start + num_bins])
    }

    /// Resets all values stored in the energy field to zero.
    pub fn reset(&mut self) {
        self.data.fill(0.0);
    }

    /// Copies data from `self` into the `dst` energy field.
    ///
    /// If the source and destination energy fields have different numbers of channels, only the smaller of the two numbers of channels will be copied.
    ///
    /// If the source and destination energy fields have different numbers of bins, only the smaller of the two numbers of bins will be copied.
    /// Bins of `dst` past that point keep their values.
    pub fn copy_into(&self, dst: &mut Self) {
        let num_channels = self.num_channels.min(dst.num_channels);
        let num_bins = self.num_bins.min(dst.num_bins);

        for channel in 0..num_channels {
            for band in 0..NUM_BANDS {
                let src = (channel * NUM_BANDS + band) * self.num_bins;
                let dst_start = (channel * NUM_BANDS + band) * dst.num_bins;
                dst.data[dst_start..dst_start + num_bins]
                    .copy_from_slice(&self.data[src..src + num_bins]);
            }
        }
    }

    /// Adds the values stored in the `other` energy field to those in `self`.
    ///
    /// If the energy fields have different numbers of channels or bins, only the overlapping part is added.
    pub fn add(&mut self, other: &Self) {
        let num_channels = self.num_channels.min(other.num_channels);
        let num_bins = self.num_bins.min(other.num_bins);

        for channel in 0..num_channels {
            for band in 0..NUM_BANDS {
                let dst = (channel * NUM_BANDS + band) * self.num_bins;
                let src = (channel * NUM_BANDS + band) * other.num_bins;
                for bin in 0..num_bins {
                    self.data[dst + bin] += other.data[src + bin];
                }
            }
        }
    }

    /// Scales the values stored in the energy field by a scalar.
    pub fn scale(&mut self, scalar: f32) {
        self.data.iter_mut().for_each(|value| *value *= scalar);
    }

    /// Total energy of the omnidirectional channel in each bin, summed across bands.
    pub fn total_energy_per_bin(&self) -> Vec<f32> {
        let mut energy = vec![0.0; self.num_bins];
        for band in 0..NUM_BANDS {
            let start = band * self.num_bins;
            for (total, value) in energy.iter_mut().zip(&self.data[start..start + self.num_bins]) {
                *total += value;
            }
        }
        energy
    }

    /// Renders a single-channel amplitude envelope of the omnidirectional channel, sampled at `sampling_rate`.
    ///
    /// Each bin's energy (summed across bands) is spread evenly across the samples of that bin,
    /// so the sum of squared samples of a bin equals its energy.
    pub fn impulse_response(&self, sampling_rate: u32) -> Vec<f32> {
        let samples_per_bin = ((sampling_rate as f32 * BIN_DURATION).round() as usize).max(1);

        self.total_energy_per_bin()
            .into_iter()
            .flat_map(|energy| {
                let amplitude = (energy.max(0.0) / samples_per_bin as f32).sqrt();
                std::iter::repeat_n(amplitude, samples_per_bin)
            })
            .collect()
    }

    fn check_channel(&self, channel_index: usize) -> Result<(), EnergyFieldError> {
        if channel_index >= self.num_channels {
            return Err(EnergyFieldError::ChannelIndexOutOfBounds {
                channel_index,
                num_channels: self.num_channels,
            });
        }
        Ok(())
    }

    fn band_offset(&self, channel_index: usize, band_index: usize) -> Result<usize, EnergyFieldError> {
        self.check_channel(channel_index)?;

        if band_index >= NUM_BANDS {
            return Err(EnergyFieldError::BandIndexOutOfBounds {
                band_index,
                max_bands: NUM_BANDS,
            });
        }

        Ok((channel_index * NUM_BANDS + band_index) * self.num_bins)
    }
}

/// Settings used to create an [`EnergyField`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EnergyFieldSettings {
    /// Total duration (in seconds) of the energy field.
    ///
    /// This determines the number of bins in each channel and band.
    pub duration: f32,

    /// The Ambisonic order.
    ///
    /// This determines the number of channels.
    pub order: u32,
}

/// Number of Ambisonic channels for a given order.
pub const fn num_channels_for_order(order: u32) -> usize {
    ((order + 1) * (order + 1)) as usize
}

/// Number of 10ms bins needed to cover `duration` seconds.
pub fn num_bins_for_duration(duration: f32) -> usize {
    // Tolerance keeps exact multiples of the bin duration from rounding up.
    (duration / BIN_DURATION - 1e-3).ceil().max(0.0) as usize
}

/// [`EnergyField`] errors.
#[derive(Debug, PartialEq, Eq)]
pub enum EnergyFieldError {
    /// Channel index is out of bounds.
    ChannelIndexOutOfBounds {
        channel_index: usize,
        num_channels: usize,
    },

    /// Band index is out of bounds.
    BandIndexOutOfBounds { band_index: usize, max_bands: usize },

    /// A device-resident energy field was requested without an OpenCL device.
    MissingDevice { scene_type: SceneType },
}

impl std::error::Error for EnergyFieldError {}

impl std::fmt::Display for EnergyFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ChannelIndexOutOfBounds {
                channel_index,
                num_channels,
            } => write!(
                f,
                "channel index {channel_index} out of bounds (num_channels: {num_channels})"
            ),
            Self::BandIndexOutOfBounds {
                band_index,
                max_bands,
            } => write!(
                f,
                "band index {band_index} out of bounds (max_bands: {max_bands})"
            ),
            Self::MissingDevice { scene_type } => {
                write!(f, "scene type {scene_type:?} requires an OpenCL device")
            }
        }
    }
}

/// An energy field being filled by a simulator.
///
/// Backends that keep results on the device write into a [`DeviceBuffer`];
/// [`Self::sync_to_host`] must run before the host-side contents are read.
#[derive(Debug)]
pub enum SimulationEnergyField {
    /// Simulated directly into host memory.
    Host(EnergyField),

    /// Simulated into device memory, mirrored by a host-side field.
    Device {
        host: EnergyField,
        buffer: DeviceBuffer,
    },
}

impl SimulationEnergyField {
    /// The host-side energy field.
    pub fn host(&self) -> &EnergyField {
        match self {
            Self::Host(energy_field) | Self::Device { host: energy_field, .. } => energy_field,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.host().num_channels()
    }

    pub fn num_bins(&self) -> usize {
        self.host().num_bins()
    }

    /// The memory a simulator writes results into, laid out like [`EnergyField::data`].
    pub fn target_mut(&mut self) -> &mut [f32] {
        match self {
            Self::Host(energy_field) => energy_field.data_mut(),
            Self::Device { buffer, .. } => buffer.as_mut_slice(),
        }
    }

    /// The slice of [`Self::target_mut`] holding one channel and band.
    ///
    /// # Errors
    ///
    /// Same as [`EnergyField::band`].
    pub fn band_target_mut(
        &mut self,
        channel_index: usize,
        band_index: usize,
    ) -> Result<&mut [f32], EnergyFieldError> {
        let start = self.host().band_offset(channel_index, band_index)?;
        let num_bins = self.num_bins();
        Ok(&mut self.target_mut()[start..start + num_bins])
    }

    /// Copies device-resident results into the host-side field. Does nothing for host fields.
    pub fn sync_to_host(&mut self) {
        if let Self::Device { host, buffer } = self {
            buffer.read_into(host.data_mut());
        }
    }

    /// Releases any device memory and returns the host-side field.
    pub fn into_host(self) -> EnergyField {
        match self {
            Self::Host(energy_field) | Self::Device { host: energy_field, .. } => energy_field,
        }
    }
}

/// Creates the energy field variant matching `scene_type`.
///
/// # Errors
///
/// Returns [`EnergyFieldError::MissingDevice`] if `scene_type` keeps results on the device and no device is given.
pub fn create_energy_field(
    scene_type: SceneType,
    settings: &EnergyFieldSettings,
    device: Option<&OpenClDevice>,
) -> Result<SimulationEnergyField, EnergyFieldError> {
    let host = EnergyField::new(settings);

    if !scene_type.keeps_results_on_device() {
        return Ok(SimulationEnergyField::Host(host));
    }

    let device = device.ok_or(EnergyFieldError::MissingDevice { scene_type })?;
    let buffer = device.allocate(host.data().len());
    Ok(SimulationEnergyField::Device { host, buffer })
}

/// Outcome of preparing a simulated energy field for storage.
#[derive(Debug, PartialEq)]
pub enum FinalizedEnergyField {
    /// The simulated field already had the saved duration and was moved as is.
    Moved(EnergyField),

    /// The simulated field was copied into a new field of the saved duration, truncating or zero-extending it.
    Resampled(EnergyField),
}

impl FinalizedEnergyField {
    pub fn energy_field(&self) -> &EnergyField {
        match self {
            Self::Moved(energy_field) | Self::Resampled(energy_field) => energy_field,
        }
    }

    pub fn into_inner(self) -> EnergyField {
        match self {
            Self::Moved(energy_field) | Self::Resampled(energy_field) => energy_field,
        }
    }
}

/// Turns a field simulated at its own duration into one of `saved_duration`.
///
/// The simulated field is consumed: either moved into the result, or dropped after its content has been copied.
pub fn finalize_energy_field(simulated: EnergyField, saved_duration: f32) -> FinalizedEnergyField {
    if simulated.duration() == saved_duration {
        return FinalizedEnergyField::Moved(simulated);
    }

    let mut saved = EnergyField::new(&EnergyFieldSettings {
        duration: saved_duration,
        order: simulated.order(),
    });
    simulated.copy_into(&mut saved);
    FinalizedEnergyField::Resampled(saved)
}
