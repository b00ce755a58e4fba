//! Pulse (square) channel with sweep unit.

use crate::channel::{ChannelCore, Envelope, Voice};

/// Duty waveforms: 12.5%, 25%, 50%, 75% (negated 25%).
const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

/// Largest period the sweep may produce.
const MAX_PERIOD: u16 = 0x7FF;

/// Periodic pitch bend for a pulse channel.
///
/// When decreasing, pulse 1's target lands one above pulse 2's for the
/// same period and shift.
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    enabled: bool,
    decrease: bool,
    shift: u8,
    rate: u8,
    divider: u8,
    reload: bool,
    adjust_up: bool,
}

impl Sweep {
    fn new(adjust_up: bool) -> Self {
        Self {
            adjust_up,
            ..Self::default()
        }
    }

    fn write(&mut self, value: u8) {
        self.shift = value & 0x07;
        self.decrease = value & 0x08 != 0;
        self.rate = (value >> 4) & 0x07;
        self.enabled = value & 0x80 != 0;
        self.reload = true;
    }

    /// Period the sweep would move to from `period`.
    #[must_use]
    pub fn target(&self, period: u16) -> u16 {
        let delta = period >> self.shift;
        if self.decrease {
            let target = period.wrapping_sub(delta);
            if self.adjust_up {
                target.wrapping_add(1)
            } else {
                target
            }
        } else {
            period + delta
        }
    }

    /// Whether the channel is silenced by its period or sweep target.
    #[must_use]
    pub fn mutes(&self, period: u16) -> bool {
        period < 8 || self.target(period) > MAX_PERIOD
    }

    fn apply(&self, period: &mut u16) {
        let target = self.target(*period);
        if self.enabled && self.shift != 0 && *period > 7 && target <= MAX_PERIOD {
            *period = target;
        }
    }

    /// Half-frame clock.
    fn clock(&mut self, period: &mut u16) {
        if self.reload {
            if self.enabled && self.divider == 0 {
                self.apply(period);
            }
            self.divider = self.rate;
            self.reload = false;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            if self.enabled {
                self.apply(period);
            }
            self.divider = self.rate;
        }
    }
}

/// Pulse wave channel ($4000-$4003 and $4004-$4007).
#[derive(Debug, Clone)]
pub struct Pulse {
    core: ChannelCore,
    envelope: Envelope,
    sweep: Sweep,
    duty: u8,
    duty_step: u8,
}

impl Pulse {
    /// Pulse 1 ($4000).
    #[must_use]
    pub fn first() -> Self {
        Self::new(true)
    }

    /// Pulse 2 ($4004).
    #[must_use]
    pub fn second() -> Self {
        Self::new(false)
    }

    fn new(adjust_up: bool) -> Self {
        Self {
            core: ChannelCore::default(),
            envelope: Envelope::default(),
            sweep: Sweep::new(adjust_up),
            duty: 0,
            duty_step: 0,
        }
    }

    #[must_use]
    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }

    #[must_use]
    pub fn duty(&self) -> u8 {
        self.duty
    }

    #[must_use]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

impl Voice for Pulse {
    fn write_register(&mut self, index: u8, value: u8) {
        match index {
            0 => {
                self.duty = value >> 6;
                self.core.halt = value & 0x20 != 0;
                self.envelope.write_control(value);
                self.envelope.restart();
            }
            1 => self.sweep.write(value),
            2 => self.core.write_period_low(value),
            3 => {
                self.core.write_period_high(value);
                self.duty_step = 0;
                self.envelope.restart();
            }
            _ => {}
        }
    }

    fn clock_timer(&mut self) {
        if self.core.clock_timer() {
            self.duty_step = (self.duty_step + 1) % 8;
        }
    }

    fn quarter_frame(&mut self) {
        self.envelope.clock();
    }

    fn half_frame(&mut self) {
        self.sweep.clock(&mut self.core.period);
        self.core.clock_length();
    }

    fn output(&self) -> f64 {
        if self.core.length == 0
            || DUTY_TABLE[usize::from(self.duty)][usize::from(self.duty_step)] == 0
            || self.sweep.mutes(self.core.period)
        {
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
