//! Pieces shared by the tone channels.

/// Length counter load values, indexed by the top 5 bits of the
/// length/period-high register.
pub const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96,
    22, 192, 24, 72, 26, 16, 28, 32, 30,
];

/// Length counter and period timer common to pulse, triangle and noise.
#[derive(Debug, Clone, Default)]
pub struct ChannelCore {
    /// Remaining length; the channel is silent at 0.
    pub length: u8,
    /// Length counter halt (shares a bit with envelope loop / linear control).
    pub halt: bool,
    /// Timer reload value.
    pub period: u16,
    /// Timer countdown.
    pub timer: u16,
}

impl ChannelCore {
    /// Low 8 bits of the period.
    pub fn write_period_low(&mut self, value: u8) {
        self.period = (self.period & 0x0700) | u16::from(value);
    }

    /// High 3 bits of the period plus a length reload from bits 3-7.
    pub fn write_period_high(&mut self, value: u8) {
        self.period = (self.period & 0x00FF) | (u16::from(value & 0x07) << 8);
        self.load_length(value);
    }

    /// Reload the length counter from bits 3-7 of `value`.
    pub fn load_length(&mut self, value: u8) {
        self.length = LENGTH_TABLE[usize::from(value >> 3)];
    }

    /// Half-frame length clock.
    pub fn clock_length(&mut self) {
        if !self.halt && self.length > 0 {
            self.length -= 1;
        }
    }

    /// Count the timer down. Returns true when it expired and reloaded.
    pub fn clock_timer(&mut self) -> bool {
        if self.timer == 0 {
            self.timer = self.period;
            true
        } else {
            self.timer -= 1;
            false
        }
    }
}

/// Volume envelope for pulse and noise.
///
/// Decays from 15 to 0 once per divider period, looping back to 15 when
/// the length halt bit is set. Constant-volume mode outputs the period
/// field directly.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    restart: bool,
    period: u8,
    divider: u8,
    decay: u8,
    constant: bool,
    looping: bool,
}

impl Envelope {
    /// Apply bits 0-5 of a channel control register.
    pub fn write_control(&mut self, value: u8) {
        self.period = value & 0x0F;
        self.constant = value & 0x10 != 0;
        self.looping = value & 0x20 != 0;
    }

    /// Restart the decay on the next quarter frame.
    pub fn restart(&mut self) {
        self.restart = true;
    }

    /// Quarter-frame clock.
    pub fn clock(&mut self) {
        if self.restart {
            self.restart = false;
            self.decay = 15;
            self.divider = self.period;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            self.divider = self.period;
            if self.decay > 0 {
                self.decay -= 1;
            } else if self.looping {
                self.decay = 15;
            }
        }
    }

    /// Current volume, 0-15.
    #[must_use]
    pub fn volume(&self) -> u8 {
        if self.constant {
            self.period
        } else {
            self.decay
        }
    }
}

/// Register-driven tone channel.
///
/// Each channel owns a [`ChannelCore`]; the trait carries what differs:
/// register decode, what a timer expiry does, and how the output is
/// formed.
pub trait Voice {
    /// Write channel register `index` (0-3).
    fn write_register(&mut self, index: u8, value: u8);

    /// Advance the period timer by one tick.
    fn clock_timer(&mut self);

    /// Envelope or linear counter clock.
    fn quarter_frame(&mut self) {}

    /// Length (and sweep) clock.
    fn half_frame(&mut self) {
        self.core_mut().clock_length();
    }

    /// Current level in DAC units (0-15).
    fn output(&self) -> f64;

    fn core(&self) -> &ChannelCore;

    fn core_mut(&mut self) -> &mut ChannelCore;

    /// Zero the length counter (channel disabled through $4015).
    fn silence(&mut self) {
        self.core_mut().length = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_byte_always_reloads_length() {
        for value in 0..=255u8 {
            let mut core = ChannelCore {
                length: 77,
                ..ChannelCore::default()
            };
            core.write_period_high(value);
            assert_eq!(core.length, LENGTH_TABLE[usize::from(value >> 3)]);
            assert_eq!(core.period >> 8, u16::from(value & 7));
        }
    }

    #[test]
    fn halt_freezes_length() {
        let mut core = ChannelCore::default();
        core.load_length(0x08);
        core.halt = true;
        core.clock_length();
        assert_eq!(core.length, 254);
        core.halt = false;
        core.clock_length();
        assert_eq!(core.length, 253);
    }

    #[test]
    fn envelope_decays_then_loops() {
        let mut env = Envelope::default();
        env.write_control(0x20); // loop, period 0
        env.restart();
        env.clock();
        assert_eq!(env.volume(), 15);
        for expected in (0..15).rev() {
            env.clock();
            assert_eq!(env.volume(), expected);
        }
        env.clock();
        assert_eq!(env.volume(), 15, "loop wraps back to 15");
    }

    #[test]
    fn envelope_divider_slows_decay() {
        let mut env = Envelope::default();
        env.write_control(0x02);
        env.restart();
        env.clock();
        env.clock();
        env.clock();
        assert_eq!(env.volume(), 15);
        env.clock();
        assert_eq!(env.volume(), 14);
    }

    #[test]
    fn constant_volume_ignores_decay() {
        let mut env = Envelope::default();
        env.write_control(0x1A);
        env.restart();
        env.clock();
        assert_eq!(env.volume(), 0x0A);
    }
}
