/*!
state.rs - 6502 register file and status flags.

`CpuState` is plain data: A, X, Y, SP, PC, the status byte and the halted
latch. Decoding and addressing live elsewhere; the only bus access here is
the stack (page one) and the reset vector fetch.

The status byte is a `bitflags` set. Break occupies two bits, `BREAK`
(bit 4) and `BREAK2` (bit 5): PHP pushes both set and PLP discards both, so
the difference is visible on the stack only. Bit layout, high to low:
`N V B B D I Z C`.
*/

use bitflags::bitflags;

use crate::bus::{Bus, RESET_VECTOR};
use crate::error::Result;

/// Stack page.
pub const STACK_BASE: u16 = 0x0100;
/// SP after reset. Reset clears every register, SP included.
pub const STACK_RESET: u8 = 0x00;
/// Where `Cpu::load` places a raw program in RAM.
pub const PROGRAM_BASE: u16 = 0x0600;
/// Reserved opcode that stops the CPU (BRK).
pub const HALT_OPCODE: u8 = 0x00;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusFlags: u8 {
        const CARRY             = 0b0000_0001;
        const ZERO              = 0b0000_0010;
        const INTERRUPT_DISABLE = 0b0000_0100;
        const DECIMAL_MODE      = 0b0000_1000;
        const BREAK             = 0b0001_0000;
        const BREAK2            = 0b0010_0000;
        const OVERFLOW          = 0b0100_0000;
        const NEGATIVE          = 0b1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: StatusFlags,
    pub halted: bool,
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: STACK_RESET,
            pc: 0x0000,
            status: StatusFlags::empty(),
            halted: false,
        }
    }
}

impl CpuState {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero A/X/Y/SP and every flag, and load PC from $FFFC/$FFFD.
    pub fn reset(&mut self, bus: &mut Bus) -> Result<()> {
        *self = Self::default();
        self.pc = bus.read_word(RESET_VECTOR)?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // PC
    // ---------------------------------------------------------------------

    #[inline]
    pub fn advance_pc(&mut self, delta: u16) {
        self.pc = self.pc.wrapping_add(delta);
    }

    /// Read the byte at PC and advance PC by 1.
    #[inline]
    pub fn fetch_u8(&mut self, bus: &mut Bus) -> Result<u8> {
        let b = bus.read(self.pc)?;
        self.advance_pc(1);
        Ok(b)
    }

    // ---------------------------------------------------------------------
    // Flags
    // ---------------------------------------------------------------------

    #[inline]
    pub fn is_flag_set(&self, flag: StatusFlags) -> bool {
        self.status.contains(flag)
    }

    #[inline]
    pub fn assign_flag(&mut self, flag: StatusFlags, value: bool) {
        self.status.set(flag, value);
    }

    /// ZERO + NEGATIVE from a result byte.
    #[inline]
    pub fn update_zn(&mut self, result: u8) {
        self.status.set(StatusFlags::ZERO, result == 0);
        self.status.set(StatusFlags::NEGATIVE, result & 0x80 != 0);
    }

    // ---------------------------------------------------------------------
    // Stack (page one)
    // ---------------------------------------------------------------------
    //
    // Push stores at $0100 | SP and then decrements; pop increments first.

    #[inline]
    pub fn push_u8(&mut self, bus: &mut Bus, value: u8) -> Result<()> {
        bus.write(STACK_BASE | self.sp as u16, value)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    #[inline]
    pub fn pop_u8(&mut self, bus: &mut Bus) -> Result<u8> {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE | self.sp as u16)
    }

    /// High byte first, so `pop_u16` (low then high) restores the value.
    #[inline]
    pub fn push_u16(&mut self, bus: &mut Bus, value: u16) -> Result<()> {
        self.push_u8(bus, (value >> 8) as u8)?;
        self.push_u8(bus, (value & 0xFF) as u8)
    }

    #[inline]
    pub fn pop_u16(&mut self, bus: &mut Bus) -> Result<u16> {
        let lo = self.pop_u8(bus)? as u16;
        let hi = self.pop_u8(bus)? as u16;
        Ok((hi << 8) | lo)
    }
}
