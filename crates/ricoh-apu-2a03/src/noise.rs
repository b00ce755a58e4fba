//! Noise channel.

use crate::channel::{ChannelCore, Envelope, Voice};

/// Timer periods selected by the low 4 bits of $400E (NTSC).
const PERIOD_TABLE: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// Noise channel ($400C, $400E, $400F).
///
/// A 15-bit LFSR whose feedback is bit 0 XOR bit 1, or bit 0 XOR bit 6 in
/// short mode. The channel is silent while bit 0 is set.
#[derive(Debug, Clone)]
pub struct Noise {
    core: ChannelCore,
    envelope: Envelope,
    short_mode: bool,
    lfsr: u16,
}

impl Default for Noise {
    fn default() -> Self {
        Self::new()
    }
}

impl Noise {
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: ChannelCore::default(),
            envelope: Envelope::default(),
            short_mode: false,
            lfsr: 1,
        }
    }

    #[must_use]
    pub fn lfsr(&self) -> u16 {
        self.lfsr
    }

    #[must_use]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

impl Voice for Noise {
    fn write_register(&mut self, index: u8, value: u8) {
        match index {
            0 => {
                self.core.halt = value & 0x20 != 0;
                self.envelope.write_control(value);
            }
            2 => {
                self.short_mode = value & 0x80 != 0;
                self.core.period = PERIOD_TABLE[usize::from(value & 0x0F)];
            }
            3 => {
                self.core.load_length(value);
                self.envelope.restart();
            }
            _ => {}
        }
    }

    fn clock_timer(&mut self) {
        if self.core.clock_timer() {
            let tap = if self.short_mode { 6 } else { 1 };
            let feedback = (self.lfsr ^ (self.lfsr >> tap)) & 1;
            self.lfsr = (self.lfsr >> 1) | (feedback << 14);
        }
    }

    fn quarter_frame(&mut self) {
        self.envelope.clock();
    }

    fn output(&self) -> f64 {
        if self.core.length == 0 || self.lfsr & 1 != 0 {
            return 0.0;
        }
        f64::from(self.envelope.volume())
    }

    fn core(&self) -> &ChannelCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ChannelCore {
        &mut self.core
    }
}
