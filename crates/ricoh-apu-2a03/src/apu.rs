//! Register file, clocking and resampling for the whole APU.

use emu_core::{Bus, Observable, Value};
use tracing::{debug, trace};

use crate::channel::Voice;
use crate::config::AudioConfig;
use crate::dmc::Dmc;
use crate::frame::{FrameSequencer, SequencerMode};
use crate::mixer::mix;
use crate::noise::Noise;
use crate::pulse::Pulse;
use crate::ring::{AudioConsumer, AudioProducer, AudioStats, audio_ring};
use crate::triangle::Triangle;

const PULSE1: u8 = 0x01;
const PULSE2: u8 = 0x02;
const TRIANGLE: u8 = 0x04;
const NOISE: u8 = 0x08;
const DMC: u8 = 0x10;

/// The 2A03 APU.
///
/// Tick once per CPU cycle. Samples are averaged over each divisor window
/// and pushed to the ring; the consumer half is available from
/// [`Apu::take_consumer`] or can be drained in place with
/// [`Apu::drain_audio`].
pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    frame: FrameSequencer,
    /// $4015 enable mask (bits 0-4).
    enabled: u8,
    even_cycle: bool,
    cycles: u64,
    sample_sum: f64,
    sample_count: u32,
    producer: AudioProducer,
    consumer: Option<AudioConsumer>,
}

impl Default for Apu {
    fn default() -> Self {
        Self::new(&AudioConfig::default())
    }
}

impl Apu {
    #[must_use]
    pub fn new(config: &AudioConfig) -> Self {
        let (producer, consumer) = audio_ring(config);
        Self {
            pulse1: Pulse::first(),
            pulse2: Pulse::second(),
            triangle: Triangle::new(),
            noise: Noise::new(),
            dmc: Dmc::new(),
            frame: FrameSequencer::new(),
            enabled: 0,
            even_cycle: true,
            cycles: 0,
            sample_sum: 0.0,
            sample_count: 0,
            producer,
            consumer: Some(consumer),
        }
    }

    /// Read an APU register. Only $4015 is readable; everything else is 0.
    pub fn read(&mut self, address: u16) -> u8 {
        if address != 0x4015 {
            return 0;
        }
        let mut status = 0;
        let voices: [(&dyn Voice, u8); 4] = [
            (&self.pulse1, PULSE1),
            (&self.pulse2, PULSE2),
            (&self.triangle, TRIANGLE),
            (&self.noise, NOISE),
        ];
        for (voice, bit) in voices {
            if voice.core().length != 0 && self.is_enabled(bit) {
                status |= bit;
            }
        }
        if self.dmc.bytes_remaining() > 0 && self.is_enabled(DMC) {
            status |= DMC;
        }
        if self.frame.take_irq_flag() {
            status |= 0x40;
        }
        if self.dmc.irq_flag() && self.is_enabled(DMC) {
            status |= 0x80;
        }
        status
    }

    /// Write an APU register ($4000-$4013, $4015, $4017).
    pub fn write(&mut self, address: u16, value: u8) {
        trace!(address, value, "APU write");
        let index = (address & 0x03) as u8;
        match address {
            0x4000..=0x4003 => self.pulse1.write_register(index, value),
            0x4004..=0x4007 => self.pulse2.write_register(index, value),
            0x4008..=0x400B => self.triangle.write_register(index, value),
            0x400C..=0x400F => self.noise.write_register(index, value),
            0x4010..=0x4013 => self.dmc.write_register(index, value),
            0x4015 => self.write_enable(value),
            0x4017 => self.frame.write_control(value, self.even_cycle),
            _ => {}
        }
    }

    fn write_enable(&mut self, value: u8) {
        self.enabled = value & 0x1F;
        let voices: [(&mut dyn Voice, u8); 4] = [
            (&mut self.pulse1, PULSE1),
            (&mut self.pulse2, PULSE2),
            (&mut self.triangle, TRIANGLE),
            (&mut self.noise, NOISE),
        ];
        for (voice, bit) in voices {
            if value & bit == 0 {
                voice.silence();
            }
        }
        if value & DMC == 0 {
            self.dmc.stop();
        } else if self.dmc.bytes_remaining() == 0 {
            self.dmc.restart();
        }
        self.dmc.clear_irq();
        debug!(enabled = self.enabled, "APU channel enable");
    }

    fn is_enabled(&self, bit: u8) -> bool {
        self.enabled & bit != 0
    }

    /// Advance one CPU cycle. `memory` serves DMC sample fetches.
    pub fn tick(&mut self, memory: &mut impl Bus) {
        if self.even_cycle {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
        }
        self.triangle.clock_timer();
        self.dmc.clock(memory);

        let clocks = self.frame.clock();
        if clocks.half {
            self.pulse1.half_frame();
            self.pulse2.half_frame();
            self.triangle.half_frame();
            self.noise.half_frame();
        }
        if clocks.quarter {
            self.pulse1.quarter_frame();
            self.pulse2.quarter_frame();
            self.triangle.quarter_frame();
            self.noise.quarter_frame();
        }

        self.resample();
        self.even_cycle = !self.even_cycle;
    }

    fn resample(&mut self) {
        self.sample_sum += self.output_value();
        self.sample_count += 1;

        let divisor = self.producer.divisor();
        let before = (self.cycles as f64 / divisor).floor();
        self.cycles += 1;
        let after = (self.cycles as f64 / divisor).floor();
        if before != after {
            let average = self.sample_sum / f64::from(self.sample_count);
            self.producer.push((average * 32767.0) as i16);
            self.sample_sum = 0.0;
            self.sample_count = 0;
        }
    }

    /// Instantaneous mixed output, 0.0 to just under 1.0.
    #[must_use]
    pub fn output_value(&self) -> f64 {
        let gate = |bit: u8, level: f64| if self.is_enabled(bit) { level } else { 0.0 };
        mix(
            gate(PULSE1, self.pulse1.output()),
            gate(PULSE2, self.pulse2.output()),
            gate(TRIANGLE, self.triangle.output()),
            gate(NOISE, self.noise.output()),
            gate(DMC, self.dmc.output()),
        )
    }

    /// Level-triggered IRQ output: frame interrupt or DMC end-of-sample.
    #[must_use]
    pub fn irq_line(&self) -> bool {
        self.frame.irq_asserted() || self.dmc.irq_flag()
    }

    /// Hand the consumer half of the ring to a playback thread. Returns
    /// `None` if it was already taken.
    pub fn take_consumer(&mut self) -> Option<AudioConsumer> {
        self.consumer.take()
    }

    /// Drain samples through the internal consumer. Returns 0 once the
    /// consumer has been taken.
    pub fn drain_audio(&mut self, out: &mut [i16]) -> usize {
        self.consumer.as_mut().map_or(0, |consumer| consumer.drain(out))
    }

    #[must_use]
    pub fn audio_stats(&self) -> AudioStats {
        self.producer.stats()
    }

    /// CPU cycles ticked since power-on.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    #[must_use]
    pub fn pulse1(&self) -> &Pulse {
        &self.pulse1
    }

    #[must_use]
    pub fn pulse2(&self) -> &Pulse {
        &self.pulse2
    }

    #[must_use]
    pub fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    #[must_use]
    pub fn noise(&self) -> &Noise {
        &self.noise
    }

    #[must_use]
    pub fn dmc(&self) -> &Dmc {
        &self.dmc
    }

    #[must_use]
    pub fn frame_sequencer(&self) -> &FrameSequencer {
        &self.frame
    }
}

const QUERY_PATHS: &[&str] = &[
    "pulse1.length",
    "pulse1.period",
    "pulse1.duty",
    "pulse1.envelope",
    "pulse2.length",
    "pulse2.period",
    "pulse2.duty",
    "pulse2.envelope",
    "triangle.length",
    "triangle.linear",
    "triangle.period",
    "noise.length",
    "noise.period",
    "noise.envelope",
    "dmc.level",
    "dmc.remaining",
    "dmc.address",
    "dmc.irq",
    "frame.mode",
    "frame.irq",
    "enabled",
    "output",
    "cycles",
    "audio.overruns",
    "audio.underruns",
    "audio.divisor",
    "audio.buffered",
];

impl Observable for Apu {
    fn query(&self, path: &str) -> Option<Value> {
        let value = match path {
            "pulse1.length" => self.pulse1.core().length.into(),
            "pulse1.period" => self.pulse1.core().period.into(),
            "pulse1.duty" => self.pulse1.duty().into(),
            "pulse1.envelope" => self.pulse1.envelope().volume().into(),
            "pulse2.length" => self.pulse2.core().length.into(),
            "pulse2.period" => self.pulse2.core().period.into(),
            "pulse2.duty" => self.pulse2.duty().into(),
            "pulse2.envelope" => self.pulse2.envelope().volume().into(),
            "triangle.length" => self.triangle.core().length.into(),
            "triangle.linear" => self.triangle.linear_counter().into(),
            "triangle.period" => self.triangle.core().period.into(),
            "noise.length" => self.noise.core().length.into(),
            "noise.period" => self.noise.core().period.into(),
            "noise.envelope" => self.noise.envelope().volume().into(),
            "dmc.level" => self.dmc.level().into(),
            "dmc.remaining" => self.dmc.bytes_remaining().into(),
            "dmc.address" => self.dmc.current_address().into(),
            "dmc.irq" => self.dmc.irq_flag().into(),
            "frame.mode" => match self.frame.mode() {
                SequencerMode::FourStep => "4-step".into(),
                SequencerMode::FiveStep => "5-step".into(),
            },
            "frame.irq" => self.frame.irq_flag().into(),
            "enabled" => self.enabled.into(),
            "output" => self.output_value().into(),
            "cycles" => self.cycles.into(),
            "audio.overruns" => self.audio_stats().overruns.into(),
            "audio.underruns" => self.audio_stats().underruns.into(),
            "audio.divisor" => self.audio_stats().divisor.into(),
            "audio.buffered" => (self.audio_stats().buffered as u64).into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
