//! Triangle channel.

use crate::channel::{ChannelCore, Voice};

/// 32-step staircase: up 0-15, then down 15-0.
const SEQUENCE: [u8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6,
    5, 4, 3, 2, 1, 0,
];

/// Level held while the period is too short to step audibly.
const ULTRASONIC_LEVEL: f64 = 7.5;

/// Triangle channel ($4008, $400A, $400B). Its timer runs every CPU cycle.
#[derive(Debug, Clone, Default)]
pub struct Triangle {
    core: ChannelCore,
    /// 7-bit linear counter reload value.
    linear_load: u8,
    linear: u8,
    linear_reload: bool,
    step: u8,
}

impl Triangle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn linear_counter(&self) -> u8 {
        self.linear
    }
}

impl Voice for Triangle {
    fn write_register(&mut self, index: u8, value: u8) {
        match index {
            0 => {
                self.linear_load = value & 0x7F;
                self.core.halt = value & 0x80 != 0;
            }
            2 => self.core.write_period_low(value),
            3 => {
                self.core.write_period_high(value);
                self.core.timer = self.core.period;
                self.linear_reload = true;
            }
            _ => {}
        }
    }

    fn clock_timer(&mut self) {
        if self.core.clock_timer() && self.core.length > 0 && self.linear > 0 {
            self.step = (self.step + 1) % 32;
        }
    }

    /// Linear counter clock. The reload flag sticks while the control bit is set.
    fn quarter_frame(&mut self) {
        if self.linear_reload {
            self.linear = self.linear_load;
        } else if self.linear > 0 {
            self.linear -= 1;
        }
        if !self.core.halt {
            self.linear_reload = false;
        }
    }

    fn output(&self) -> f64 {
        if self.core.length == 0 || self.linear == 0 {
            return 0.0;
        }
        if self.core.period < 2 {
            return ULTRASONIC_LEVEL;
        }
        f64::from(SEQUENCE[usize::from(self.step)])
    }

    fn core(&self) -> &ChannelCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ChannelCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(period_low: u8) -> Triangle {
        let mut t = Triangle::new();
        t.write_register(0, 0x7F);
        t.write_register(2, period_low);
        t.write_register(3, 0x08);
        t.quarter_frame();
        t
    }

    #[test]
    fn linear_counter_reload_then_countdown() {
        let mut t = playing(0x40);
        assert_eq!(t.linear_counter(), 0x7F);
        t.quarter_frame();
        assert_eq!(t.linear_counter(), 0x7E);
    }

    #[test]
    fn control_bit_keeps_reloading() {
        let mut t = Triangle::new();
        t.write_register(0, 0x85);
        t.write_register(3, 0x08);
        t.quarter_frame();
        t.quarter_frame();
        assert_eq!(t.linear_counter(), 5);
    }

    #[test]
    fn ultrasonic_period_outputs_mid_level() {
        let t = playing(0x01);
        assert!((t.output() - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn staircase_walks_full_sequence() {
        let mut t = playing(0x02);
        let mut seen = Vec::new();
        for _ in 0..32 * 3 {
            t.clock_timer();
            seen.push(t.output());
        }
        let max = seen.iter().copied().fold(0.0, f64::max);
        let min = seen.iter().copied().fold(15.0, f64::min);
        assert!((max - 15.0).abs() < f64::EPSILON);
        assert!(min.abs() < f64::EPSILON);
    }

    #[test]
    fn silent_without_linear_counter() {
        let mut t = Triangle::new();
        t.write_register(2, 0x40);
        t.write_register(3, 0x08);
        assert!(t.output().abs() < f64::EPSILON);
    }
}
