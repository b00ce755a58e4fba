//! Headless capture: 16-bit mono WAV.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::Nes;

/// Writes console audio to a WAV file, pulling one display frame of
/// samples per emulated frame.
///
/// Draining at a fixed rate is what a sound card would do, so the
/// resampler sees the same occupancy feedback it would during playback.
/// The file starts with the ring's silent prefill.
pub struct WavCapture {
    writer: hound::WavWriter<BufWriter<File>>,
    samples_per_frame: f64,
    owed: f64,
    block: Vec<i16>,
}

impl WavCapture {
    /// Create `path` for `sample_rate` Hz output at `frame_rate` frames per
    /// second.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path, sample_rate: u32, frame_rate: f64) -> hound::Result<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        Ok(Self {
            writer: hound::WavWriter::create(path, spec)?,
            samples_per_frame: f64::from(sample_rate) / frame_rate,
            owed: 0.0,
            block: Vec::new(),
        })
    }

    /// Append the samples for one frame. Returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn capture_frame(&mut self, nes: &mut Nes) -> hound::Result<usize> {
        self.owed += self.samples_per_frame;
        let count = self.owed.floor() as usize;
        self.owed -= count as f64;

        self.block.resize(count, 0);
        nes.drain_audio(&mut self.block);
        for &sample in &self.block {
            self.writer.write_sample(sample)?;
        }
        Ok(count)
    }

    /// Samples written so far.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.writer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writer.len() == 0
    }

    /// Flush and close the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be rewritten.
    pub fn finish(self) -> hound::Result<()> {
        self.writer.finalize()
    }
}
