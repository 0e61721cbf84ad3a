/*!
core::Cpu - 6502 CPU facade wrapping `CpuState`.

Design
======
- `Cpu` stores a single field: `state: CpuState`. The bus is owned by the
  caller and borrowed for every call, so the CPU never holds memory.
- `step` runs exactly one instruction through the opcode table. `run` and
  `run_with_callback` loop over it until the CPU halts or an error surfaces.
- `load` is a small bootstrap for raw programs: it places bytes in RAM at
  `PROGRAM_BASE` and points the reset vector there. With a cartridge
  attached the vector lives in ROM and `load` fails with
  `ReadOnlyViolation`; cartridge programs start with plain `reset`.

Lifecycle
=========
Reset -> Running -> Halted. Halted is terminal: every later `step` returns
`StepOutcome::Halted` without touching the bus.

Usage:
```rust
use nescore::{Bus, Cpu};

let mut bus = Bus::new();
let mut cpu = Cpu::new();
cpu.load_and_run(&mut bus, &[0xA9, 0xC0, 0xAA, 0xE8, 0x00]).unwrap();
assert_eq!(cpu.x(), 0xC1);
```
*/

use log::{Level, debug, log_enabled, trace, warn};

use crate::bus::Bus;
use crate::cpu::addressing::AddressingMode;
use crate::cpu::execute;
use crate::cpu::state::{CpuState, HALT_OPCODE, PROGRAM_BASE, StatusFlags};
use crate::cpu::table::opcode_table;
use crate::cpu::trace::trace as trace_line;
use crate::error::{NesError, Result};

/// Bytes of RAM available to `Cpu::load` above `PROGRAM_BASE`.
const PROGRAM_CAPACITY: usize = 0x0800 - PROGRAM_BASE as usize;

/// Result of a single `Cpu::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Halted,
}

#[derive(Debug, Clone, Default)]
pub struct Cpu {
    state: CpuState,
}

impl Cpu {
    /// Construct a new CPU with power-up defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Immutable view of the register file.
    pub fn state(&self) -> &CpuState {
        &self.state
    }

    /// Mutable register access for drivers and tests.
    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    /// Reset registers and load PC from the reset vector.
    pub fn reset(&mut self, bus: &mut Bus) -> Result<()> {
        // Surface a broken instruction table here rather than on first step.
        opcode_table()?;
        self.state.reset(bus)?;
        debug!("cpu reset: pc=${:04X}", self.state.pc);
        Ok(())
    }

    /// Copy `program` into RAM at `PROGRAM_BASE` and point the reset vector at it.
    pub fn load(&mut self, bus: &mut Bus, program: &[u8]) -> Result<()> {
        if program.len() > PROGRAM_CAPACITY {
            return Err(NesError::ProgramTooLarge {
                len: program.len(),
                capacity: PROGRAM_CAPACITY,
            });
        }
        bus.write_word(crate::bus::RESET_VECTOR, PROGRAM_BASE)?;
        if !bus.ram_mut().load(PROGRAM_BASE as usize, program) {
            return Err(NesError::ProgramTooLarge {
                len: program.len(),
                capacity: PROGRAM_CAPACITY,
            });
        }
        Ok(())
    }

    /// `load`, `reset`, then `run`.
    pub fn load_and_run(&mut self, bus: &mut Bus, program: &[u8]) -> Result<()> {
        self.load(bus, program)?;
        self.reset(bus)?;
        self.run(bus)
    }

    /// Execute one instruction.
    pub fn step(&mut self, bus: &mut Bus) -> Result<StepOutcome> {
        if self.state.halted {
            return Ok(StepOutcome::Halted);
        }

        if log_enabled!(Level::Trace)
            && let Ok(line) = trace_line(&self.state, bus)
        {
            trace!("{}", line);
        }

        let opcode_pc = self.state.pc;
        let code = self.state.fetch_u8(bus)?;

        if code == HALT_OPCODE {
            execute::brk(&mut self.state, bus, AddressingMode::NoneAddressing)?;
            warn!("cpu halted at ${:04X}", opcode_pc);
            return Ok(StepOutcome::Halted);
        }

        let op = opcode_table()?
            .lookup(code)
            .ok_or(NesError::UnknownOpcode {
                opcode: code,
                pc: opcode_pc,
            })?;

        let pc_before = self.state.pc;
        (op.handler)(&mut self.state, bus, op.mode)?;
        if self.state.pc == pc_before {
            self.state.advance_pc(op.len as u16 - 1);
        }
        Ok(StepOutcome::Continue)
    }

    /// Step until the CPU halts or an error surfaces.
    pub fn run(&mut self, bus: &mut Bus) -> Result<()> {
        self.run_with_callback(bus, |_, _| Ok(()))
    }

    /// Like `run`, but invokes `callback` before every instruction.
    pub fn run_with_callback<F>(&mut self, bus: &mut Bus, mut callback: F) -> Result<()>
    where
        F: FnMut(&mut CpuState, &mut Bus) -> Result<()>,
    {
        loop {
            callback(&mut self.state, bus)?;
            if self.step(bus)? == StepOutcome::Halted {
                return Ok(());
            }
        }
    }

    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    // ---------------------------------------------------------------------
    // Register accessors
    // ---------------------------------------------------------------------
    pub fn a(&self) -> u8 {
        self.state.a
    }
    pub fn x(&self) -> u8 {
        self.state.x
    }
    pub fn y(&self) -> u8 {
        self.state.y
    }
    pub fn sp(&self) -> u8 {
        self.state.sp
    }
    pub fn pc(&self) -> u16 {
        self.state.pc
    }
    pub fn status(&self) -> StatusFlags {
        self.state.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;
    use crate::test_utils::build_nrom_with_prg;

    /// Load `program`, reset, then let `prepare` preset registers and memory.
    fn run_with<F>(program: &[u8], prepare: F) -> (Cpu, Bus)
    where
        F: FnOnce(&mut CpuState, &mut Bus),
    {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        cpu.load(&mut bus, program).unwrap();
        cpu.reset(&mut bus).unwrap();
        prepare(cpu.state_mut(), &mut bus);
        cpu.run(&mut bus).unwrap();
        (cpu, bus)
    }

    fn run_program(program: &[u8]) -> (Cpu, Bus) {
        run_with(program, |_, _| {})
    }

    #[test]
    fn lda_immediate_load_data() {
        let (cpu, _) = run_program(&[0xA9, 0x05, 0x00]);
        assert_eq!(cpu.a(), 0x05);
        assert!(!cpu.status().contains(StatusFlags::ZERO));
        assert!(!cpu.status().contains(StatusFlags::NEGATIVE));
    }

    #[test]
    fn lda_zero_flag() {
        let (cpu, _) = run_program(&[0xA9, 0x00, 0x00]);
        assert!(cpu.status().contains(StatusFlags::ZERO));
    }

    #[test]
    fn lda_negative_flag() {
        let (cpu, _) = run_program(&[0xA9, 0x81, 0x00]);
        assert!(cpu.status().contains(StatusFlags::NEGATIVE));
        assert!(!cpu.status().contains(StatusFlags::ZERO));
    }

    #[test]
    fn reset_zeroes_every_register() {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        cpu.load(&mut bus, &[0x00]).unwrap();
        {
            let s = cpu.state_mut();
            s.a = 0x11;
            s.x = 0x22;
            s.y = 0x33;
            s.sp = 0x44;
            s.status = StatusFlags::all();
        }
        cpu.reset(&mut bus).unwrap();
        assert_eq!((cpu.a(), cpu.x(), cpu.y(), cpu.sp()), (0, 0, 0, 0));
        assert!(cpu.status().is_empty());
        assert_eq!(cpu.pc(), PROGRAM_BASE);
    }

    #[test]
    fn tsx_sees_zero_stack_pointer_after_reset() {
        let (cpu, _) = run_program(&[0xBA, 0x00]);
        assert_eq!(cpu.x(), 0x00);
        assert!(cpu.status().contains(StatusFlags::ZERO));
    }

    #[test]
    fn tax_moves_a_to_x() {
        let (cpu, _) = run_with(&[0xAA, 0x00], |s, _| s.a = 10);
        assert_eq!(cpu.x(), 10);
    }

    #[test]
    fn five_ops_working_together() {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        cpu.load_and_run(&mut bus, &[0xA9, 0xC0, 0xAA, 0xE8, 0x00])
            .unwrap();
        assert_eq!(cpu.x(), 0xC1);
        assert!(cpu.is_halted());
    }

    #[test]
    fn inx_overflow() {
        let (cpu, _) = run_program(&[0xA9, 0xFF, 0xAA, 0xE8, 0xE8, 0x00]);
        assert_eq!(cpu.x(), 1);
    }

    #[test]
    fn lda_zero_page_x() {
        let (cpu, _) = run_with(&[0x85, 0x04, 0xA9, 0x00, 0xB5, 0x03, 0x00], |s, _| {
            s.a = 0xDB;
            s.x = 0x01;
        });
        assert_eq!(cpu.a(), 0xDB);
    }

    #[test]
    fn zero_page_x_wraps() {
        let (cpu, _) = run_with(&[0x85, 0x00, 0xA9, 0x00, 0xB5, 0xFF, 0x00], |s, _| {
            s.a = 0xDB;
            s.x = 0x01;
        });
        assert_eq!(cpu.a(), 0xDB);
    }

    #[test]
    fn lda_absolute_and_absolute_x() {
        let (cpu, _) = run_with(&[0x85, 0x01, 0xA9, 0x00, 0xAD, 0x01, 0x00, 0x00], |s, _| {
            s.a = 0xDB
        });
        assert_eq!(cpu.a(), 0xDB);

        let (cpu, _) = run_with(&[0x85, 0x01, 0xA9, 0x00, 0xBD, 0x00, 0x00, 0x00], |s, _| {
            s.a = 0xDB;
            s.x = 0x01;
        });
        assert_eq!(cpu.a(), 0xDB);
    }

    #[test]
    fn lda_indirect_x() {
        let (cpu, _) = run_with(&[0x85, 0xFF, 0xA1, 0xFE, 0x00], |s, bus| {
            bus.write(0x0001, 0xDB).unwrap();
            s.a = 0x01;
            s.x = 0x01;
        });
        assert_eq!(cpu.a(), 0xDB);
    }

    #[test]
    fn lda_indirect_y() {
        let (cpu, _) = run_with(&[0x85, 0xFF, 0xB1, 0xFF, 0x00], |s, bus| {
            bus.write(0x0002, 0xDB).unwrap();
            s.a = 0x01;
            s.y = 0x01;
        });
        assert_eq!(cpu.a(), 0xDB);
    }

    #[test]
    fn adc_overflow_and_carry() {
        let (cpu, _) = run_with(&[0x69, 0x90, 0x00], |s, _| s.a = 0xD0);
        assert_eq!(cpu.a(), 0x60);
        assert!(cpu.status().contains(StatusFlags::CARRY));
        assert!(cpu.status().contains(StatusFlags::OVERFLOW));
    }

    #[test]
    fn branches_follow_flag_polarity() {
        let cases = [
            (0x90u8, StatusFlags::CARRY, false),
            (0xB0, StatusFlags::CARRY, true),
            (0xF0, StatusFlags::ZERO, true),
            (0xD0, StatusFlags::ZERO, false),
            (0x30, StatusFlags::NEGATIVE, true),
            (0x10, StatusFlags::NEGATIVE, false),
            (0x70, StatusFlags::OVERFLOW, true),
            (0x50, StatusFlags::OVERFLOW, false),
        ];
        for (op, flag, set_when_taken) in cases {
            // Taken: skip one ASL.
            let (cpu, _) = run_with(&[op, 0x01, 0x0A, 0x0A, 0x00], |s, _| {
                s.a = 1;
                s.status.set(flag, set_when_taken);
            });
            assert_eq!(cpu.a(), 2, "opcode ${:02X} should branch", op);

            let (cpu, _) = run_with(&[op, 0x01, 0x0A, 0x0A, 0x00], |s, _| {
                s.a = 1;
                s.status.set(flag, !set_when_taken);
            });
            assert_eq!(cpu.a(), 4, "opcode ${:02X} should fall through", op);
        }
    }

    #[test]
    fn backward_branch_loops() {
        // LDX #3 ; loop: DEX ; BNE loop ; BRK
        let (cpu, _) = run_program(&[0xA2, 0x03, 0xCA, 0xD0, 0xFD, 0x00]);
        assert_eq!(cpu.x(), 0);
        assert!(cpu.status().contains(StatusFlags::ZERO));
    }

    #[test]
    fn branch_to_own_operand_still_advances() {
        // BNE -1 targets the operand byte, which equals the PC the handler
        // started from, so the step loop skips the operand.
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        cpu.load(&mut bus, &[0xD0, 0xFF, 0x00]).unwrap();
        cpu.reset(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), StepOutcome::Continue);
        assert_eq!(cpu.pc(), 0x0602);
    }

    #[test]
    fn bit_sets_overflow() {
        let (cpu, _) = run_with(&[0x24, 0x01, 0x00], |s, bus| {
            bus.write(0x0001, 0xF0).unwrap();
            s.a = 0x40;
        });
        assert!(cpu.status().contains(StatusFlags::OVERFLOW));
        assert!(cpu.status().contains(StatusFlags::NEGATIVE));
        assert!(!cpu.status().contains(StatusFlags::ZERO));
    }

    #[test]
    fn jmp_indirect() {
        let (cpu, _) = run_with(&[0x6C, 0x00, 0x00], |s, bus| {
            bus.write(0x0000, 0x02).unwrap();
            bus.write(0x0001, 0x00).unwrap();
            bus.write(0x0002, 0x0A).unwrap();
            bus.write(0x0003, 0x00).unwrap();
            s.a = 1;
        });
        assert_eq!(cpu.a(), 2);
    }

    #[test]
    fn jmp_indirect_page_boundary_bug() {
        let (cpu, _) = run_with(&[0x6C, 0xFF, 0x02], |s, bus| {
            bus.write(0x02FF, 0x80).unwrap();
            bus.write(0x0200, 0x07).unwrap();
            bus.write(0x0300, 0x05).unwrap();
            bus.write(0x0780, 0x0A).unwrap();
            s.a = 1;
        });
        assert_eq!(cpu.a(), 2);
    }

    #[test]
    fn jsr_pushes_return_address() {
        // JSR $0604 ; BRK ; BRK at $0604
        let (cpu, bus) = run_program(&[0x20, 0x04, 0x06, 0x00, 0x00]);
        assert_eq!(cpu.sp(), 0xFE);
        assert_eq!(bus.ram().read(0x0100), 0x06);
        assert_eq!(bus.ram().read(0x01FF), 0x02);
    }

    #[test]
    fn jsr_rts_round_trip() {
        // JSR sub ; INX ; BRK ; BRK ; sub: INY ; RTS
        let (cpu, _) = run_program(&[0x20, 0x06, 0x06, 0xE8, 0x00, 0x00, 0xC8, 0x60]);
        assert_eq!(cpu.x(), 1);
        assert_eq!(cpu.y(), 1);
        assert_eq!(cpu.sp(), 0x00);
    }

    #[test]
    fn php_then_pla_shows_break_bits() {
        let (cpu, _) = run_with(&[0x08, 0x68, 0x00], |s, _| {
            s.status = StatusFlags::NEGATIVE;
        });
        assert_eq!(cpu.a(), 0xB0);
    }

    #[test]
    fn pha_then_plp_clears_break_bits() {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        cpu.load(&mut bus, &[0x48, 0x28, 0x00]).unwrap();
        cpu.reset(&mut bus).unwrap();
        cpu.state_mut().a = 0xB0;
        cpu.step(&mut bus).unwrap();
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.status(), StatusFlags::NEGATIVE);
    }

    #[test]
    fn rol_ror_lsr_accumulator() {
        let (cpu, _) = run_with(&[0x2A, 0x00], |s, _| s.a = 0xC1);
        assert_eq!(cpu.a(), 0x82);
        assert!(cpu.status().contains(StatusFlags::CARRY));

        let (cpu, _) = run_with(&[0x6A, 0x00], |s, _| s.a = 0xC1);
        assert_eq!(cpu.a(), 0x60);
        assert!(cpu.status().contains(StatusFlags::CARRY));

        let (cpu, _) = run_with(&[0x4A, 0x00], |s, _| s.a = 0x40);
        assert_eq!(cpu.a(), 0x20);
        assert!(!cpu.status().contains(StatusFlags::CARRY));
    }

    #[test]
    fn ora_immediate() {
        let (cpu, _) = run_with(&[0x09, 0x10, 0x00], |s, _| s.a = 0x01);
        assert_eq!(cpu.a(), 0x11);
    }

    #[test]
    fn brk_sets_break_bits_and_halts() {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        cpu.load(&mut bus, &[0x00]).unwrap();
        cpu.reset(&mut bus).unwrap();
        assert_eq!(cpu.step(&mut bus).unwrap(), StepOutcome::Halted);
        assert!(cpu
            .status()
            .contains(StatusFlags::BREAK | StatusFlags::BREAK2));
        let pc = cpu.pc();
        assert_eq!(cpu.step(&mut bus).unwrap(), StepOutcome::Halted);
        assert_eq!(cpu.pc(), pc);
    }

    #[test]
    fn unknown_opcode_errors() {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        assert_eq!(
            cpu.load_and_run(&mut bus, &[0xEA, 0x02]),
            Err(NesError::UnknownOpcode {
                opcode: 0x02,
                pc: 0x0601
            })
        );
    }

    #[test]
    fn load_rejects_oversized_program() {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        assert_eq!(
            cpu.load(&mut bus, &[0xEA; 0x201]),
            Err(NesError::ProgramTooLarge {
                len: 0x201,
                capacity: 0x200
            })
        );
        assert!(cpu.load(&mut bus, &[0xEA; 0x200]).is_ok());
    }

    #[test]
    fn load_with_cartridge_fails_on_rom_vector() {
        let rom = build_nrom_with_prg(&[0x00], None);
        let mut bus = Bus::with_cartridge(Cartridge::from_ines_bytes(&rom).unwrap());
        let mut cpu = Cpu::new();
        assert_eq!(
            cpu.load(&mut bus, &[0xEA]),
            Err(NesError::ReadOnlyViolation(0xFFFC))
        );
    }

    #[test]
    fn runs_from_cartridge_reset_vector() {
        // LDA #$05 ; TAX ; BRK
        let rom = build_nrom_with_prg(&[0xA9, 0x05, 0xAA, 0x00], Some(0x8000));
        let mut bus = Bus::with_cartridge(Cartridge::from_ines_bytes(&rom).unwrap());
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();
        assert_eq!(cpu.pc(), 0x8000);
        cpu.run(&mut bus).unwrap();
        assert_eq!(cpu.x(), 0x05);
    }

    #[test]
    fn store_to_rom_propagates() {
        // LDA #$01 ; STA $8000
        let rom = build_nrom_with_prg(&[0xA9, 0x01, 0x8D, 0x00, 0x80, 0x00], Some(0x8000));
        let mut bus = Bus::with_cartridge(Cartridge::from_ines_bytes(&rom).unwrap());
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus).unwrap();
        assert_eq!(cpu.run(&mut bus), Err(NesError::ReadOnlyViolation(0x8000)));
    }

    #[test]
    fn callback_runs_before_each_instruction() {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        cpu.load(&mut bus, &[0xA9, 0xC0, 0xAA, 0xE8, 0x00]).unwrap();
        cpu.reset(&mut bus).unwrap();
        let mut seen = Vec::new();
        cpu.run_with_callback(&mut bus, |s, _| {
            seen.push(s.pc);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![0x0600, 0x0602, 0x0603, 0x0604]);
    }

    #[test]
    fn callback_error_stops_run() {
        let mut bus = Bus::new();
        let mut cpu = Cpu::new();
        cpu.load(&mut bus, &[0xE8, 0xE8, 0x00]).unwrap();
        cpu.reset(&mut bus).unwrap();
        let result = cpu.run_with_callback(&mut bus, |s, _| {
            if s.x == 1 {
                Err(NesError::InvalidAddress(0xDEAD))
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err(NesError::InvalidAddress(0xDEAD)));
        assert_eq!(cpu.x(), 1);
    }

    #[cfg(feature = "illegal_opcodes")]
    #[test]
    fn unofficial_nop_skips_operands() {
        // *NOP $1234,X ; INX ; BRK
        let (cpu, _) = run_program(&[0x1C, 0x34, 0x12, 0xE8, 0x00]);
        assert_eq!(cpu.x(), 1);
    }
}
