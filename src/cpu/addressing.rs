/*!
addressing.rs - 6502 addressing modes and operand address resolution

Overview
========
Resolves the effective operand address for every addressing mode, given a
PC that points at the first operand byte (the opcode has already been
consumed). Resolution never moves PC; the step loop skips the operand bytes
afterwards.

Scope & Responsibilities
=======================
- Pure address computation over a byte reader. `operand_address` reads
  through the live `Bus`; the tracer uses `resolve` with a side-effect free
  reader so it can describe an instruction without executing it.
- Emulates the JMP (indirect) page-wrap quirk and zero-page pointer wrap.
- `Accumulator` and `NoneAddressing` have no memory operand and resolve to
  `UnsupportedAddressingMode`.
*/

use crate::bus::Bus;
use crate::cpu::state::CpuState;
use crate::error::{NesError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum AddressingMode {
    Immediate,
    ZeroPage,
    ZeroPage_X,
    ZeroPage_Y,
    Absolute,
    Absolute_X,
    Absolute_Y,
    Indirect,
    Indirect_X,
    Indirect_Y,
    Relative,
    Accumulator,
    NoneAddressing,
}

/// Effective operand address for `mode`, reading operands through the bus.
pub fn operand_address(cpu: &CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<u16> {
    resolve(mode, cpu.pc, cpu.x, cpu.y, |addr| bus.read(addr))
}

/// Effective operand address for `mode` with the operand at `pc`.
pub fn resolve<F>(mode: AddressingMode, pc: u16, x: u8, y: u8, mut read: F) -> Result<u16>
where
    F: FnMut(u16) -> Result<u8>,
{
    match mode {
        AddressingMode::Immediate => Ok(pc),
        AddressingMode::ZeroPage => Ok(read(pc)? as u16),
        AddressingMode::ZeroPage_X => Ok(read(pc)?.wrapping_add(x) as u16),
        AddressingMode::ZeroPage_Y => Ok(read(pc)?.wrapping_add(y) as u16),
        AddressingMode::Absolute => read_word(&mut read, pc),
        AddressingMode::Absolute_X => Ok(read_word(&mut read, pc)?.wrapping_add(x as u16)),
        AddressingMode::Absolute_Y => Ok(read_word(&mut read, pc)?.wrapping_add(y as u16)),
        AddressingMode::Indirect => {
            let ptr = read_word(&mut read, pc)?;
            read_word_indirect_bug(&mut read, ptr)
        }
        AddressingMode::Indirect_X => {
            let zp = read(pc)?.wrapping_add(x);
            read_word_zp(&mut read, zp)
        }
        AddressingMode::Indirect_Y => {
            let zp = read(pc)?;
            Ok(read_word_zp(&mut read, zp)?.wrapping_add(y as u16))
        }
        AddressingMode::Relative => {
            let offset = read(pc)? as i8;
            Ok(pc.wrapping_add(1).wrapping_add(offset as u16))
        }
        AddressingMode::Accumulator | AddressingMode::NoneAddressing => {
            Err(NesError::UnsupportedAddressingMode(mode))
        }
    }
}

// -------------------------
// Low-level word helpers
// -------------------------

#[inline]
fn read_word<F>(read: &mut F, addr: u16) -> Result<u16>
where
    F: FnMut(u16) -> Result<u8>,
{
    let lo = read(addr)? as u16;
    let hi = read(addr.wrapping_add(1))? as u16;
    Ok((hi << 8) | lo)
}

/// Read a 16-bit little endian pointer from zero page; the high byte wraps
/// to $00 when the pointer sits at $FF.
#[inline]
pub(crate) fn read_word_zp<F>(read: &mut F, base: u8) -> Result<u16>
where
    F: FnMut(u16) -> Result<u8>,
{
    let lo = read(base as u16)? as u16;
    let hi = read(base.wrapping_add(1) as u16)? as u16;
    Ok((hi << 8) | lo)
}

/// JMP (indirect) hardware bug: when the low byte of the pointer is $FF the
/// high byte is fetched from the start of the same page.
#[inline]
pub(crate) fn read_word_indirect_bug<F>(read: &mut F, addr: u16) -> Result<u16>
where
    F: FnMut(u16) -> Result<u8>,
{
    let lo = read(addr)? as u16;
    let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
    let hi = read(hi_addr)? as u16;
    Ok((hi << 8) | lo)
}
