//! Frame sequencer ($4017).
//!
//! Counts CPU cycles and emits quarter-frame (envelope, linear counter) and
//! half-frame (length counter, sweep) clocks. In 4-step mode it also raises
//! the frame interrupt unless inhibited.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerMode {
    FourStep,
    FiveStep,
}

/// Clocks produced by one sequencer cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameClocks {
    pub quarter: bool,
    pub half: bool,
}

impl FrameClocks {
    const NONE: Self = Self {
        quarter: false,
        half: false,
    };
    const QUARTER: Self = Self {
        quarter: true,
        half: false,
    };
    const BOTH: Self = Self {
        quarter: true,
        half: true,
    };
}

#[derive(Debug, Clone)]
pub struct FrameSequencer {
    mode: SequencerMode,
    /// Signed so a write on an odd cycle can start one step early.
    cycle: i32,
    irq_inhibit: bool,
    irq_flag: bool,
    irq_delay: u8,
    irq_asserted: bool,
}

impl Default for FrameSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSequencer {
    /// Power-up state: 4-step mode with the interrupt inhibited until the
    /// program first writes $4017.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: SequencerMode::FourStep,
            cycle: 0,
            irq_inhibit: true,
            irq_flag: false,
            irq_delay: 0,
            irq_asserted: false,
        }
    }

    /// Advance one CPU cycle.
    pub fn clock(&mut self) -> FrameClocks {
        let clocks = match self.mode {
            SequencerMode::FiveStep => self.step_five(),
            SequencerMode::FourStep => self.step_four(),
        };
        self.cycle += 1;

        if self.irq_delay > 0 {
            self.irq_delay -= 1;
            if self.irq_delay == 0 {
                self.irq_asserted = true;
            }
        }
        clocks
    }

    fn step_five(&mut self) -> FrameClocks {
        match self.cycle {
            1 | 14915 => FrameClocks::BOTH,
            7459 | 22373 => FrameClocks::QUARTER,
            37282 => {
                self.cycle = 0;
                FrameClocks::NONE
            }
            _ => FrameClocks::NONE,
        }
    }

    fn step_four(&mut self) -> FrameClocks {
        match self.cycle {
            7459 | 22373 => FrameClocks::QUARTER,
            14915 => FrameClocks::BOTH,
            29830 | 29832 => {
                self.raise_flag();
                FrameClocks::NONE
            }
            29831 => {
                self.raise_flag();
                if !self.irq_inhibit && self.irq_flag {
                    self.irq_delay = 2;
                }
                FrameClocks::BOTH
            }
            37288 => {
                self.cycle = 7458;
                FrameClocks::NONE
            }
            _ => FrameClocks::NONE,
        }
    }

    fn raise_flag(&mut self) {
        if !self.irq_inhibit {
            self.irq_flag = true;
        }
    }

    /// $4017 write. `even_cycle` is the APU's current cycle parity.
    pub fn write_control(&mut self, value: u8, even_cycle: bool) {
        self.irq_inhibit = value & 0x40 != 0;
        if self.irq_inhibit {
            self.irq_flag = false;
            self.irq_asserted = false;
            self.irq_delay = 0;
        }
        self.mode = if value & 0x80 != 0 {
            SequencerMode::FiveStep
        } else {
            SequencerMode::FourStep
        };
        self.cycle = if even_cycle { 0 } else { -1 };
        debug!(mode = ?self.mode, inhibit = self.irq_inhibit, "frame sequencer reset");
    }

    /// Status read side effect: returns the flag and clears it along with
    /// the asserted line.
    pub fn take_irq_flag(&mut self) -> bool {
        let flag = self.irq_flag;
        self.irq_flag = false;
        self.irq_asserted = false;
        flag
    }

    #[must_use]
    pub fn irq_flag(&self) -> bool {
        self.irq_flag
    }

    #[must_use]
    pub fn irq_asserted(&self) -> bool {
        self.irq_asserted
    }

    #[must_use]
    pub fn mode(&self) -> SequencerMode {
        self.mode
    }
}
