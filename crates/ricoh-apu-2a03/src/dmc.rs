//! Delta modulation channel.

use emu_core::Bus;
use tracing::trace;

/// CPU cycles per output bit, selected by the low 4 bits of $4010 (NTSC).
const RATE_TABLE: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// DMC ($4010-$4013).
///
/// Streams 1-bit deltas from CPU memory. Each fetched byte is shifted out
/// LSB first, one bit per timer expiry, moving the 7-bit output level up
/// or down by 2. Unlike the tone channels it reads memory, so it is ticked
/// with a bus rather than through [`crate::Voice`].
#[derive(Debug, Clone)]
pub struct Dmc {
    irq_enabled: bool,
    looping: bool,
    rate: u16,
    timer: u16,
    level: u8,
    /// $4012 value: sample starts at $C000 + 64 × this.
    address_reg: u8,
    /// $4013 value: sample is 16 × this + 1 bytes.
    length_reg: u8,
    current_address: u16,
    remaining: u16,
    shift: u8,
    bits_left: u8,
    irq_flag: bool,
}

impl Default for Dmc {
    fn default() -> Self {
        Self::new()
    }
}

impl Dmc {
    #[must_use]
    pub fn new() -> Self {
        Self {
            irq_enabled: false,
            looping: false,
            rate: RATE_TABLE[0],
            timer: RATE_TABLE[0],
            level: 0,
            address_reg: 0,
            length_reg: 0,
            current_address: 0xC000,
            remaining: 0,
            shift: 0,
            bits_left: 0,
            irq_flag: false,
        }
    }

    pub fn write_register(&mut self, index: u8, value: u8) {
        match index {
            0 => {
                self.irq_enabled = value & 0x80 != 0;
                if !self.irq_enabled {
                    self.irq_flag = false;
                }
                self.looping = value & 0x40 != 0;
                self.rate = RATE_TABLE[usize::from(value & 0x0F)];
                self.timer = self.rate;
            }
            1 => self.level = value & 0x7F,
            2 => {
                self.address_reg = value;
                self.current_address = self.start_address();
            }
            3 => self.length_reg = value,
            _ => {}
        }
    }

    fn start_address(&self) -> u16 {
        0xC000 | (u16::from(self.address_reg) << 6)
    }

    /// Start the sample again from $4012/$4013.
    pub fn restart(&mut self) {
        self.current_address = self.start_address();
        self.remaining = (u16::from(self.length_reg) << 4) | 1;
    }

    /// Abandon the rest of the sample ($4015 bit 4 cleared).
    pub fn stop(&mut self) {
        self.remaining = 0;
    }

    /// One CPU cycle: fetch a byte if the shifter is empty, then run the timer.
    pub fn clock(&mut self, memory: &mut impl Bus) {
        self.fetch(memory);
        if self.timer == 0 {
            self.timer = self.rate;
            self.shift_out();
        } else {
            self.timer -= 1;
        }
    }

    fn fetch(&mut self, memory: &mut impl Bus) {
        if self.remaining == 0 || self.bits_left != 0 {
            return;
        }
        self.shift = memory.read(self.current_address);
        self.bits_left = 8;
        trace!(address = self.current_address, byte = self.shift, "DMC fetch");
        self.current_address = if self.current_address == 0xFFFF {
            0x8000
        } else {
            self.current_address + 1
        };
        self.remaining -= 1;
        if self.remaining == 0 {
            if self.looping {
                self.restart();
            } else if self.irq_enabled {
                self.irq_flag = true;
            }
        }
    }

    fn shift_out(&mut self) {
        if self.bits_left == 0 {
            return;
        }
        if self.shift & 1 != 0 {
            if self.level < 126 {
                self.level += 2;
            }
        } else if self.level > 1 {
            self.level -= 2;
        }
        self.shift >>= 1;
        self.bits_left -= 1;
    }

    /// Output level, 0-127.
    #[must_use]
    pub fn output(&self) -> f64 {
        f64::from(self.level)
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn bytes_remaining(&self) -> u16 {
        self.remaining
    }

    #[must_use]
    pub fn current_address(&self) -> u16 {
        self.current_address
    }

    #[must_use]
    pub fn irq_flag(&self) -> bool {
        self.irq_flag
    }

    pub fn clear_irq(&mut self) {
        self.irq_flag = false;
    }
}
