//! Fetch-decode-execute engine.

use emu_core::{Bus, Cpu, Observable, Value};
use tracing::{debug, error, info, trace, warn};

use crate::flags::{C, D, I, N, V, Z};
use crate::{CpuError, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR, Registers, Status};

/// Consecutive unsupported opcodes tolerated before the core jams.
pub const DEFAULT_OPCODE_BUDGET: u32 = 50;

/// Cycles taken to service NMI or IRQ.
const INTERRUPT_CYCLES: u32 = 7;

/// Cycles charged for skipping an opcode the core does not decode.
const UNSUPPORTED_CYCLES: u32 = 2;

/// Whether the core is still executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Stopped by BRK.
    Halted,
    /// Stopped by an unsupported-opcode storm.
    Jammed,
}

/// The 2A03 CPU core.
pub struct Mos6502 {
    pub regs: Registers,
    state: RunState,
    /// NMI latched by `nmi()`, consumed by the next step.
    nmi_pending: bool,
    /// Level of the IRQ input.
    irq_line: bool,
    unsupported_streak: u32,
    opcode_budget: u32,
    /// Total cycles since power-on.
    cycles: u64,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    #[must_use]
    pub fn new() -> Self {
        Self::with_opcode_budget(DEFAULT_OPCODE_BUDGET)
    }

    /// A core that jams after `budget` unsupported opcodes in a row.
    /// A budget of 0 behaves like 1.
    #[must_use]
    pub fn with_opcode_budget(budget: u32) -> Self {
        Self {
            regs: Registers::power_on(),
            state: RunState::Running,
            nmi_pending: false,
            irq_line: false,
            unsupported_streak: 0,
            opcode_budget: budget.max(1),
            cycles: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// False once BRK or an opcode storm has stopped the core.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    #[must_use]
    pub fn unsupported_streak(&self) -> u32 {
        self.unsupported_streak
    }

    #[must_use]
    pub fn opcode_budget(&self) -> u32 {
        self.opcode_budget
    }

    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Push PC and P, set I, jump through `vector`.
    fn service_interrupt(&mut self, bus: &mut impl Bus, vector: u16) {
        self.push_word(bus, self.regs.pc);
        self.push(bus, self.regs.p.to_byte_irq());
        self.regs.p.set_if(I, true);
        self.regs.pc = Self::read_word(bus, vector);
    }

    fn load_a(&mut self, value: u8) {
        self.regs.a = value;
        self.regs.p.update_nz(value);
    }

    fn load_x(&mut self, value: u8) {
        self.regs.x = value;
        self.regs.p.update_nz(value);
    }

    fn load_y(&mut self, value: u8) {
        self.regs.y = value;
        self.regs.p.update_nz(value);
    }

    fn compare(&mut self, register: u8, operand: u8) {
        self.regs.p.set_if(C, register >= operand);
        self.regs.p.update_nz(register.wrapping_sub(operand));
    }

    fn bit(&mut self, operand: u8) {
        self.regs.p.set_if(Z, self.regs.a & operand == 0);
        self.regs.p.set_if(V, operand & 0x40 != 0);
        self.regs.p.set_if(N, operand & 0x80 != 0);
    }

    /// Read-modify-write at `addr` with `delta` added.
    fn step_memory(&mut self, bus: &mut impl Bus, addr: u16, delta: u8) {
        let value = bus.read(addr).wrapping_add(delta);
        bus.write(addr, value);
        self.regs.p.update_nz(value);
    }

    /// Execute one decoded opcode. `None` means the opcode is not supported.
    fn execute(&mut self, opcode: u8, bus: &mut impl Bus) -> Option<u32> {
        let cycles = match opcode {
            // ---- Loads ----
            0xA9 => {
                // LDA #nn
                let v = self.fetch(bus);
                self.load_a(v);
                2
            }
            0xA5 => {
                // LDA $nn
                let addr = self.addr_zero_page(bus);
                let v = bus.read(addr);
                self.load_a(v);
                3
            }
            0xB5 => {
                // LDA $nn,X
                let addr = self.addr_zero_page_x(bus);
                let v = bus.read(addr);
                self.load_a(v);
                4
            }
            0xAD => {
                // LDA $nnnn
                let addr = self.addr_absolute(bus);
                let v = bus.read(addr);
                self.load_a(v);
                4
            }
            0xBD | 0xB9 => {
                // LDA $nnnn,X / LDA $nnnn,Y
                let index = if opcode == 0xBD { self.regs.x } else { self.regs.y };
                let (addr, crossed) = self.addr_absolute_indexed(bus, index);
                let v = bus.read(addr);
                self.load_a(v);
                4 + u32::from(crossed)
            }
            0xA2 => {
                // LDX #nn
                let v = self.fetch(bus);
                self.load_x(v);
                2
            }
            0xA6 => {
                // LDX $nn
                let addr = self.addr_zero_page(bus);
                let v = bus.read(addr);
                self.load_x(v);
                3
            }
            0xAE => {
                // LDX $nnnn
                let addr = self.addr_absolute(bus);
                let v = bus.read(addr);
                self.load_x(v);
                4
            }
            0xA0 => {
                // LDY #nn
                let v = self.fetch(bus);
                self.load_y(v);
                2
            }
            0xA4 => {
                // LDY $nn
                let addr = self.addr_zero_page(bus);
                let v = bus.read(addr);
                self.load_y(v);
                3
            }
            0xAC => {
                // LDY $nnnn
                let addr = self.addr_absolute(bus);
                let v = bus.read(addr);
                self.load_y(v);
                4
            }

            // ---- Stores ----
            0x85 => {
                // STA $nn
                let addr = self.addr_zero_page(bus);
                bus.write(addr, self.regs.a);
                3
            }
            0x95 => {
                // STA $nn,X
                let addr = self.addr_zero_page_x(bus);
                bus.write(addr, self.regs.a);
                4
            }
            0x8D => {
                // STA $nnnn
                let addr = self.addr_absolute(bus);
                bus.write(addr, self.regs.a);
                4
            }
            0x9D | 0x99 => {
                // STA $nnnn,X / STA $nnnn,Y (no page-cross discount for stores)
                let index = if opcode == 0x9D { self.regs.x } else { self.regs.y };
                let (addr, _) = self.addr_absolute_indexed(bus, index);
                bus.write(addr, self.regs.a);
                5
            }
            0x86 => {
                // STX $nn
                let addr = self.addr_zero_page(bus);
                bus.write(addr, self.regs.x);
                3
            }
            0x8E => {
                // STX $nnnn
                let addr = self.addr_absolute(bus);
                bus.write(addr, self.regs.x);
                4
            }
            0x84 => {
                // STY $nn
                let addr = self.addr_zero_page(bus);
                bus.write(addr, self.regs.y);
                3
            }
            0x8C => {
                // STY $nnnn
                let addr = self.addr_absolute(bus);
                bus.write(addr, self.regs.y);
                4
            }

            // ---- Transfers ----
            0xAA => {
                self.load_x(self.regs.a); // TAX
                2
            }
            0xA8 => {
                self.load_y(self.regs.a); // TAY
                2
            }
            0x8A => {
                self.load_a(self.regs.x); // TXA
                2
            }
            0x98 => {
                self.load_a(self.regs.y); // TYA
                2
            }
            0xBA => {
                self.load_x(self.regs.s); // TSX
                2
            }
            0x9A => {
                // TXS: no flags
                self.regs.s = self.regs.x;
                2
            }

            // ---- Increments / decrements ----
            0xE8 => {
                self.load_x(self.regs.x.wrapping_add(1)); // INX
                2
            }
            0xC8 => {
                self.load_y(self.regs.y.wrapping_add(1)); // INY
                2
            }
            0xCA => {
                self.load_x(self.regs.x.wrapping_sub(1)); // DEX
                2
            }
            0x88 => {
                self.load_y(self.regs.y.wrapping_sub(1)); // DEY
                2
            }
            0xE6 => {
                // INC $nn
                let addr = self.addr_zero_page(bus);
                self.step_memory(bus, addr, 1);
                5
            }
            0xEE => {
                // INC $nnnn
                let addr = self.addr_absolute(bus);
                self.step_memory(bus, addr, 1);
                6
            }
            0xC6 => {
                // DEC $nn
                let addr = self.addr_zero_page(bus);
                self.step_memory(bus, addr, 0xFF);
                5
            }
            0xCE => {
                // DEC $nnnn
                let addr = self.addr_absolute(bus);
                self.step_memory(bus, addr, 0xFF);
                6
            }

            // ---- Logic and compare (immediate) ----
            0x29 => {
                // AND #nn
                let v = self.fetch(bus);
                self.load_a(self.regs.a & v);
                2
            }
            0x09 => {
                // ORA #nn
                let v = self.fetch(bus);
                self.load_a(self.regs.a | v);
                2
            }
            0x49 => {
                // EOR #nn
                let v = self.fetch(bus);
                self.load_a(self.regs.a ^ v);
                2
            }
            0xC9 => {
                // CMP #nn
                let v = self.fetch(bus);
                self.compare(self.regs.a, v);
                2
            }
            0xE0 => {
                // CPX #nn
                let v = self.fetch(bus);
                self.compare(self.regs.x, v);
                2
            }
            0xC0 => {
                // CPY #nn
                let v = self.fetch(bus);
                self.compare(self.regs.y, v);
                2
            }
            0x24 => {
                // BIT $nn
                let addr = self.addr_zero_page(bus);
                let v = bus.read(addr);
                self.bit(v);
                3
            }
            0x2C => {
                // BIT $nnnn
                let addr = self.addr_absolute(bus);
                let v = bus.read(addr);
                self.bit(v);
                4
            }

            // ---- Flags ----
            0x18 | 0x38 | 0x58 | 0x78 | 0xB8 | 0xD8 | 0xF8 => {
                // CLC SEC CLI SEI CLV CLD SED
                let (flag, value) = match opcode {
                    0x18 => (C, false),
                    0x38 => (C, true),
                    0x58 => (I, false),
                    0x78 => (I, true),
                    0xB8 => (V, false),
                    0xD8 => (D, false),
                    _ => (D, true),
                };
                self.regs.p.set_if(flag, value);
                2
            }

            // ---- Stack ----
            0x48 => {
                // PHA
                self.push(bus, self.regs.a);
                3
            }
            0x08 => {
                // PHP
                self.push(bus, self.regs.p.to_byte_brk());
                3
            }
            0x68 => {
                // PLA
                let v = self.pull(bus);
                self.load_a(v);
                4
            }
            0x28 => {
                // PLP
                let v = self.pull(bus);
                self.regs.p = Status::from_stack(v);
                4
            }

            // ---- Jumps ----
            0x4C => {
                // JMP $nnnn
                self.regs.pc = self.fetch_word(bus);
                3
            }
            0x6C => {
                // JMP ($nnnn)
                let ptr = self.fetch_word(bus);
                self.regs.pc = Self::read_word_same_page(bus, ptr);
                5
            }
            0x20 => {
                // JSR $nnnn: pushes the address of its own last byte
                let target = self.fetch_word(bus);
                self.push_word(bus, self.regs.pc.wrapping_sub(1));
                self.regs.pc = target;
                6
            }
            0x60 => {
                // RTS
                self.regs.pc = self.pull_word(bus).wrapping_add(1);
                6
            }
            0x40 => {
                // RTI
                let p = self.pull(bus);
                self.regs.p = Status::from_stack(p);
                self.regs.pc = self.pull_word(bus);
                6
            }

            // ---- Branches ----
            0x10 => 2 + self.branch_if(bus, !self.regs.p.is_set(N)), // BPL
            0x30 => 2 + self.branch_if(bus, self.regs.p.is_set(N)),  // BMI
            0x50 => 2 + self.branch_if(bus, !self.regs.p.is_set(V)), // BVC
            0x70 => 2 + self.branch_if(bus, self.regs.p.is_set(V)),  // BVS
            0x90 => 2 + self.branch_if(bus, !self.regs.p.is_set(C)), // BCC
            0xB0 => 2 + self.branch_if(bus, self.regs.p.is_set(C)),  // BCS
            0xD0 => 2 + self.branch_if(bus, !self.regs.p.is_set(Z)), // BNE
            0xF0 => 2 + self.branch_if(bus, self.regs.p.is_set(Z)),  // BEQ

            // ---- Misc ----
            0xEA => 2, // NOP
            0x00 => {
                // BRK stops the engine instead of vectoring through $FFFE.
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.state = RunState::Halted;
                info!(pc = self.regs.pc, "BRK: CPU halted");
                7
            }

            _ => return None,
        };
        Some(cycles)
    }
}

impl Cpu for Mos6502 {
    type Error = CpuError;

    fn step<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        match self.state {
            RunState::Running => {}
            RunState::Halted => return Ok(0),
            RunState::Jammed => return Err(CpuError::Jammed { pc: self.regs.pc }),
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            debug!(pc = self.regs.pc, "servicing NMI");
            self.service_interrupt(bus, NMI_VECTOR);
            self.cycles += u64::from(INTERRUPT_CYCLES);
            return Ok(INTERRUPT_CYCLES);
        }

        if self.irq_line && !self.regs.p.is_set(I) {
            debug!(pc = self.regs.pc, "servicing IRQ");
            self.service_interrupt(bus, IRQ_VECTOR);
            self.cycles += u64::from(INTERRUPT_CYCLES);
            return Ok(INTERRUPT_CYCLES);
        }

        let pc = self.regs.pc;
        let opcode = self.fetch(bus);
        trace!(pc, opcode, "execute");

        let cycles = if let Some(cycles) = self.execute(opcode, bus) {
            self.unsupported_streak = 0;
            cycles
        } else {
            self.unsupported_streak += 1;
            warn!(
                opcode,
                pc,
                streak = self.unsupported_streak,
                "unsupported opcode skipped"
            );
            if self.unsupported_streak >= self.opcode_budget {
                self.state = RunState::Jammed;
                error!(
                    opcode,
                    pc,
                    budget = self.opcode_budget,
                    "unsupported opcode budget exhausted, CPU jammed"
                );
                return Err(CpuError::OpcodeStorm {
                    opcode,
                    pc,
                    streak: self.unsupported_streak,
                });
            }
            UNSUPPORTED_CYCLES
        };

        self.cycles += u64::from(cycles);
        Ok(cycles)
    }

    fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.regs.pc = Self::read_word(bus, RESET_VECTOR);
        self.regs.s = 0xFD;
        self.regs.p.set_if(I, true);
        self.state = RunState::Running;
        self.nmi_pending = false;
        self.unsupported_streak = 0;
        info!(pc = self.regs.pc, "CPU reset");
    }

    fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    fn clear_nmi(&mut self) {
        self.nmi_pending = false;
    }

    fn set_irq(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn is_halted(&self) -> bool {
        self.state != RunState::Running
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" => Some(self.regs.p.0.into()),
            "flags.c" => Some(self.regs.p.is_set(C).into()),
            "flags.z" => Some(self.regs.p.is_set(Z).into()),
            "flags.i" => Some(self.regs.p.is_set(I).into()),
            "flags.d" => Some(self.regs.p.is_set(D).into()),
            "flags.v" => Some(self.regs.p.is_set(V).into()),
            "flags.n" => Some(self.regs.p.is_set(N).into()),
            "running" => Some(self.is_running().into()),
            "cycles" => Some(self.cycles.into()),
            "unsupported_streak" => Some(self.unsupported_streak.into()),
            "nmi_pending" => Some(self.nmi_pending.into()),
            "irq_line" => Some(self.irq_line.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "a",
            "x",
            "y",
            "s",
            "p",
            "flags.c",
            "flags.z",
            "flags.i",
            "flags.d",
            "flags.v",
            "flags.n",
            "running",
            "cycles",
            "unsupported_streak",
            "nmi_pending",
            "irq_line",
        ]
    }
}
