//! Live audio output through cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use ricoh_apu_2a03::AudioConsumer;
use tracing::{error, info};

/// Largest callback block we expect; larger requests are served in pieces.
const MAX_BLOCK: usize = 4096;

/// Plays an APU ring on the default output device.
///
/// The stream callback drains the consumer directly, so the emulation
/// thread never blocks on audio; the ring's divisor feedback keeps the
/// two clocks in step.
pub struct AudioOutput {
    _stream: Stream,
}

impl AudioOutput {
    /// Open the default device at `sample_rate` and start playing.
    ///
    /// Returns None if no audio device is available.
    pub fn new(mut consumer: AudioConsumer, sample_rate: u32) -> Option<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device()?;

        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut block = vec![0i16; MAX_BLOCK];
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for chunk in data.chunks_mut(MAX_BLOCK) {
                        let samples = &mut block[..chunk.len()];
                        consumer.drain(samples);
                        for (out, &sample) in chunk.iter_mut().zip(samples.iter()) {
                            *out = f32::from(sample) / f32::from(i16::MAX);
                        }
                    }
                },
                |err| error!("audio stream error: {err}"),
                None,
            )
            .ok()?;

        stream.play().ok()?;
        info!(sample_rate, "audio output started");

        Some(Self { _stream: stream })
    }
}
