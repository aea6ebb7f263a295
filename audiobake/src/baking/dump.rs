//! Diagnostic dump of baked impulse responses.

use crate::energy_field::EnergyField;
use std::path::PathBuf;

/// Writes the impulse response of every baked energy field to a WAV file, for inspection.
///
/// Files are named `impulse_response_<probe index>.wav` and hold a single channel of 32-bit float samples.
/// The dump is not part of the baked data; the defaults write to `output/` at 44100 Hz.
///
/// The files use the `WAVE_FORMAT_EXTENSIBLE` header (a 40-byte `fmt ` chunk with format tag `0xFFFE`
/// and the IEEE float subformat) rather than the 16-byte `fmt ` chunk with format tag 3.
/// Both describe the same little-endian float samples, and common audio tools read either.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponseDump {
    /// Directory the files are written to. Created if missing.
    pub directory: PathBuf,

    /// Sampling rate of the written impulse responses.
    pub sampling_rate: u32,
}

impl Default for ImpulseResponseDump {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            sampling_rate: 44100,
        }
    }
}

impl ImpulseResponseDump {
    /// Path of the file written for the probe at `probe_index`.
    pub fn path_for(&self, probe_index: usize) -> PathBuf {
        self.directory
            .join(format!("impulse_response_{probe_index}.wav"))
    }

    /// Writes the impulse response of `energy_field`, returning the path written.
    ///
    /// # Errors
    ///
    /// Returns [`hound::Error`] if the directory or file cannot be written.
    pub fn write(
        &self,
        probe_index: usize,
        energy_field: &EnergyField,
    ) -> Result<PathBuf, hound::Error> {
        std::fs::create_dir_all(&self.directory)?;

        let path = self.path_for(probe_index);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sampling_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(&path, spec)?;
        for sample in energy_field.impulse_response(self.sampling_rate) {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        Ok(path)
    }
}
