/*!
execute.rs - 6502 instruction semantics (ALU, flags, stack, RMW)

Purpose
=======
One handler per mnemonic. Every handler has the uniform shape
`fn(&mut CpuState, &mut Bus, AddressingMode) -> Result<()>`, so the opcode
table can hold them as plain function pointers. On entry PC points at the
first operand byte. Handlers that transfer control (JMP, JSR,
RTS, RTI, taken branches) write PC themselves; for everything else the
step loop skips the operand bytes afterwards.

Shifts and rotates dispatch on `AddressingMode::Accumulator` to pick the
register form over the memory form.
*/

use crate::bus::Bus;
use crate::cpu::addressing::{AddressingMode, operand_address};
use crate::cpu::state::{CpuState, StatusFlags};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Operand helpers
// ---------------------------------------------------------------------------

#[inline]
fn read_operand(cpu: &CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<u8> {
    let addr = operand_address(cpu, bus, mode)?;
    bus.read(addr)
}

/// Read-modify-write against either A or memory. Returns the new value.
fn modify<F>(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode, op: F) -> Result<u8>
where
    F: FnOnce(&mut CpuState, u8) -> u8,
{
    if mode == AddressingMode::Accumulator {
        let a = cpu.a;
        let result = op(cpu, a);
        cpu.a = result;
        return Ok(result);
    }
    let addr = operand_address(cpu, bus, mode)?;
    let old = bus.read(addr)?;
    let result = op(cpu, old);
    bus.write(addr, result)?;
    Ok(result)
}

// ---------------------------------------------------------------------------
// ALU kernels (register only)
// ---------------------------------------------------------------------------

/// Binary add with carry; decimal mode is ignored (2A03).
fn add_to_a(cpu: &mut CpuState, value: u8) {
    let a = cpu.a;
    let carry_in = cpu.is_flag_set(StatusFlags::CARRY) as u16;
    let sum = a as u16 + value as u16 + carry_in;
    let result = sum as u8;
    cpu.assign_flag(StatusFlags::CARRY, sum > 0xFF);
    cpu.assign_flag(
        StatusFlags::OVERFLOW,
        (a ^ result) & (value ^ result) & 0x80 != 0,
    );
    cpu.a = result;
    cpu.update_zn(result);
}

fn compare(cpu: &mut CpuState, register: u8, value: u8) {
    cpu.assign_flag(StatusFlags::CARRY, register >= value);
    cpu.update_zn(register.wrapping_sub(value));
}

fn shift_left(cpu: &mut CpuState, v: u8) -> u8 {
    cpu.assign_flag(StatusFlags::CARRY, v & 0x80 != 0);
    v << 1
}

fn shift_right(cpu: &mut CpuState, v: u8) -> u8 {
    cpu.assign_flag(StatusFlags::CARRY, v & 0x01 != 0);
    v >> 1
}

fn rotate_left(cpu: &mut CpuState, v: u8) -> u8 {
    let carry_in = cpu.is_flag_set(StatusFlags::CARRY) as u8;
    cpu.assign_flag(StatusFlags::CARRY, v & 0x80 != 0);
    (v << 1) | carry_in
}

fn rotate_right(cpu: &mut CpuState, v: u8) -> u8 {
    let carry_in = (cpu.is_flag_set(StatusFlags::CARRY) as u8) << 7;
    cpu.assign_flag(StatusFlags::CARRY, v & 0x01 != 0);
    (v >> 1) | carry_in
}

fn branch_if(cpu: &mut CpuState, bus: &mut Bus, condition: bool) -> Result<()> {
    if condition {
        cpu.pc = operand_address(cpu, bus, AddressingMode::Relative)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Loads / stores
// ---------------------------------------------------------------------------

pub fn lda(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    cpu.a = read_operand(cpu, bus, mode)?;
    cpu.update_zn(cpu.a);
    Ok(())
}

pub fn ldx(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    cpu.x = read_operand(cpu, bus, mode)?;
    cpu.update_zn(cpu.x);
    Ok(())
}

pub fn ldy(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    cpu.y = read_operand(cpu, bus, mode)?;
    cpu.update_zn(cpu.y);
    Ok(())
}

pub fn sta(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let addr = operand_address(cpu, bus, mode)?;
    bus.write(addr, cpu.a)
}

pub fn stx(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let addr = operand_address(cpu, bus, mode)?;
    bus.write(addr, cpu.x)
}

pub fn sty(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let addr = operand_address(cpu, bus, mode)?;
    bus.write(addr, cpu.y)
}

// ---------------------------------------------------------------------------
// Register transfers
// ---------------------------------------------------------------------------

pub fn tax(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.x = cpu.a;
    cpu.update_zn(cpu.x);
    Ok(())
}

pub fn tay(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.y = cpu.a;
    cpu.update_zn(cpu.y);
    Ok(())
}

pub fn txa(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.a = cpu.x;
    cpu.update_zn(cpu.a);
    Ok(())
}

pub fn tya(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.a = cpu.y;
    cpu.update_zn(cpu.a);
    Ok(())
}

pub fn tsx(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.x = cpu.sp;
    cpu.update_zn(cpu.x);
    Ok(())
}

/// TXS does not touch flags.
pub fn txs(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.sp = cpu.x;
    Ok(())
}

// ---------------------------------------------------------------------------
// Increments / decrements
// ---------------------------------------------------------------------------

pub fn inx(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.x = cpu.x.wrapping_add(1);
    cpu.update_zn(cpu.x);
    Ok(())
}

pub fn iny(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.y = cpu.y.wrapping_add(1);
    cpu.update_zn(cpu.y);
    Ok(())
}

pub fn dex(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.x = cpu.x.wrapping_sub(1);
    cpu.update_zn(cpu.x);
    Ok(())
}

pub fn dey(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.y = cpu.y.wrapping_sub(1);
    cpu.update_zn(cpu.y);
    Ok(())
}

pub fn inc(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = modify(cpu, bus, mode, |_, v| v.wrapping_add(1))?;
    cpu.update_zn(v);
    Ok(())
}

pub fn dec(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = modify(cpu, bus, mode, |_, v| v.wrapping_sub(1))?;
    cpu.update_zn(v);
    Ok(())
}

// ---------------------------------------------------------------------------
// Arithmetic / logic
// ---------------------------------------------------------------------------

pub fn adc(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = read_operand(cpu, bus, mode)?;
    add_to_a(cpu, v);
    Ok(())
}

/// A - M - (1 - C), computed as A + !M + C.
pub fn sbc(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = read_operand(cpu, bus, mode)?;
    add_to_a(cpu, v ^ 0xFF);
    Ok(())
}

pub fn and(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = read_operand(cpu, bus, mode)?;
    cpu.a &= v;
    cpu.update_zn(cpu.a);
    Ok(())
}

pub fn ora(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = read_operand(cpu, bus, mode)?;
    cpu.a |= v;
    cpu.update_zn(cpu.a);
    Ok(())
}

pub fn eor(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = read_operand(cpu, bus, mode)?;
    cpu.a ^= v;
    cpu.update_zn(cpu.a);
    Ok(())
}

/// Z from A & M; N and V copied from bits 7 and 6 of M.
pub fn bit(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = read_operand(cpu, bus, mode)?;
    cpu.assign_flag(StatusFlags::ZERO, cpu.a & v == 0);
    cpu.assign_flag(StatusFlags::NEGATIVE, v & 0x80 != 0);
    cpu.assign_flag(StatusFlags::OVERFLOW, v & 0x40 != 0);
    Ok(())
}

pub fn cmp(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = read_operand(cpu, bus, mode)?;
    let r = cpu.a;
    compare(cpu, r, v);
    Ok(())
}

pub fn cpx(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = read_operand(cpu, bus, mode)?;
    let r = cpu.x;
    compare(cpu, r, v);
    Ok(())
}

pub fn cpy(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = read_operand(cpu, bus, mode)?;
    let r = cpu.y;
    compare(cpu, r, v);
    Ok(())
}

// ---------------------------------------------------------------------------
// Shifts / rotates
// ---------------------------------------------------------------------------

pub fn asl(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = modify(cpu, bus, mode, shift_left)?;
    cpu.update_zn(v);
    Ok(())
}

pub fn lsr(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = modify(cpu, bus, mode, shift_right)?;
    cpu.update_zn(v);
    Ok(())
}

pub fn rol(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = modify(cpu, bus, mode, rotate_left)?;
    cpu.update_zn(v);
    Ok(())
}

pub fn ror(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let v = modify(cpu, bus, mode, rotate_right)?;
    cpu.update_zn(v);
    Ok(())
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

pub fn bcc(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let c = !cpu.is_flag_set(StatusFlags::CARRY);
    branch_if(cpu, bus, c)
}

pub fn bcs(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let c = cpu.is_flag_set(StatusFlags::CARRY);
    branch_if(cpu, bus, c)
}

pub fn beq(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let c = cpu.is_flag_set(StatusFlags::ZERO);
    branch_if(cpu, bus, c)
}

pub fn bne(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let c = !cpu.is_flag_set(StatusFlags::ZERO);
    branch_if(cpu, bus, c)
}

pub fn bmi(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let c = cpu.is_flag_set(StatusFlags::NEGATIVE);
    branch_if(cpu, bus, c)
}

pub fn bpl(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let c = !cpu.is_flag_set(StatusFlags::NEGATIVE);
    branch_if(cpu, bus, c)
}

pub fn bvs(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let c = cpu.is_flag_set(StatusFlags::OVERFLOW);
    branch_if(cpu, bus, c)
}

pub fn bvc(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let c = !cpu.is_flag_set(StatusFlags::OVERFLOW);
    branch_if(cpu, bus, c)
}

// ---------------------------------------------------------------------------
// Jumps / subroutines / interrupts
// ---------------------------------------------------------------------------

pub fn jmp(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    cpu.pc = operand_address(cpu, bus, mode)?;
    Ok(())
}

/// Pushes the address of the last byte of the JSR instruction (PC + 1 here,
/// since PC is on the operand). RTS adds the missing 1 back.
pub fn jsr(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
    let target = operand_address(cpu, bus, mode)?;
    let ret = cpu.pc.wrapping_add(1);
    cpu.push_u16(bus, ret)?;
    cpu.pc = target;
    Ok(())
}

pub fn rts(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.pc = cpu.pop_u16(bus)?.wrapping_add(1);
    Ok(())
}

pub fn rti(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let p = cpu.pop_u8(bus)?;
    cpu.status = StatusFlags::from_bits_retain(p) - StatusFlags::BREAK - StatusFlags::BREAK2;
    cpu.pc = cpu.pop_u16(bus)?;
    Ok(())
}

/// BRK halts this core instead of vectoring through $FFFE.
pub fn brk(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.status.insert(StatusFlags::BREAK | StatusFlags::BREAK2);
    cpu.halted = true;
    Ok(())
}

pub fn nop(_cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

pub fn pha(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.push_u8(bus, cpu.a)
}

pub fn pla(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.a = cpu.pop_u8(bus)?;
    cpu.update_zn(cpu.a);
    Ok(())
}

/// The pushed copy always has both break bits set.
pub fn php(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let p = cpu.status | StatusFlags::BREAK | StatusFlags::BREAK2;
    cpu.push_u8(bus, p.bits())
}

pub fn plp(cpu: &mut CpuState, bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    let p = cpu.pop_u8(bus)?;
    cpu.status = StatusFlags::from_bits_retain(p) - StatusFlags::BREAK - StatusFlags::BREAK2;
    Ok(())
}

// ---------------------------------------------------------------------------
// Flag set / clear
// ---------------------------------------------------------------------------

pub fn clc(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.assign_flag(StatusFlags::CARRY, false);
    Ok(())
}

pub fn sec(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.assign_flag(StatusFlags::CARRY, true);
    Ok(())
}

pub fn cld(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.assign_flag(StatusFlags::DECIMAL_MODE, false);
    Ok(())
}

pub fn sed(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.assign_flag(StatusFlags::DECIMAL_MODE, true);
    Ok(())
}

pub fn cli(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.assign_flag(StatusFlags::INTERRUPT_DISABLE, false);
    Ok(())
}

pub fn sei(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.assign_flag(StatusFlags::INTERRUPT_DISABLE, true);
    Ok(())
}

pub fn clv(cpu: &mut CpuState, _bus: &mut Bus, _mode: AddressingMode) -> Result<()> {
    cpu.assign_flag(StatusFlags::OVERFLOW, false);
    Ok(())
}

// ---------------------------------------------------------------------------
// Undocumented opcodes
// ---------------------------------------------------------------------------

#[cfg(feature = "illegal_opcodes")]
pub use self::illegal::*;

#[cfg(feature = "illegal_opcodes")]
mod illegal {
    use super::*;

    /// LDA + LDX from one operand.
    pub fn lax(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = read_operand(cpu, bus, mode)?;
        cpu.a = v;
        cpu.x = v;
        cpu.update_zn(v);
        Ok(())
    }

    /// Store A & X; flags untouched.
    pub fn sax(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let addr = operand_address(cpu, bus, mode)?;
        bus.write(addr, cpu.a & cpu.x)
    }

    /// DEC then CMP.
    pub fn dcp(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = modify(cpu, bus, mode, |_, v| v.wrapping_sub(1))?;
        let r = cpu.a;
        compare(cpu, r, v);
        Ok(())
    }

    /// INC then SBC.
    pub fn isb(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = modify(cpu, bus, mode, |_, v| v.wrapping_add(1))?;
        add_to_a(cpu, v ^ 0xFF);
        Ok(())
    }

    /// ASL then ORA.
    pub fn slo(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = modify(cpu, bus, mode, shift_left)?;
        cpu.a |= v;
        cpu.update_zn(cpu.a);
        Ok(())
    }

    /// ROL then AND.
    pub fn rla(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = modify(cpu, bus, mode, rotate_left)?;
        cpu.a &= v;
        cpu.update_zn(cpu.a);
        Ok(())
    }

    /// LSR then EOR.
    pub fn sre(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = modify(cpu, bus, mode, shift_right)?;
        cpu.a ^= v;
        cpu.update_zn(cpu.a);
        Ok(())
    }

    /// ROR then ADC (the carry out of the rotate feeds the add).
    pub fn rra(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = modify(cpu, bus, mode, rotate_right)?;
        add_to_a(cpu, v);
        Ok(())
    }

    /// AND immediate, C = N.
    pub fn anc(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = read_operand(cpu, bus, mode)?;
        cpu.a &= v;
        cpu.update_zn(cpu.a);
        let n = cpu.is_flag_set(StatusFlags::NEGATIVE);
        cpu.assign_flag(StatusFlags::CARRY, n);
        Ok(())
    }

    /// AND immediate then LSR A.
    pub fn alr(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = cpu.a & read_operand(cpu, bus, mode)?;
        cpu.a = shift_right(cpu, v);
        cpu.update_zn(cpu.a);
        Ok(())
    }

    /// AND immediate then ROR A; C from bit 6, V from bit 6 ^ bit 5.
    pub fn arr(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = cpu.a & read_operand(cpu, bus, mode)?;
        let carry_in = (cpu.is_flag_set(StatusFlags::CARRY) as u8) << 7;
        let result = (v >> 1) | carry_in;
        cpu.a = result;
        cpu.update_zn(result);
        let b6 = result & 0x40 != 0;
        let b5 = result & 0x20 != 0;
        cpu.assign_flag(StatusFlags::CARRY, b6);
        cpu.assign_flag(StatusFlags::OVERFLOW, b6 ^ b5);
        Ok(())
    }

    /// X = (A & X) - M without borrow; C as in CMP.
    pub fn axs(cpu: &mut CpuState, bus: &mut Bus, mode: AddressingMode) -> Result<()> {
        let v = read_operand(cpu, bus, mode)?;
        let ax = cpu.a & cpu.x;
        cpu.assign_flag(StatusFlags::CARRY, ax >= v);
        cpu.x = ax.wrapping_sub(v);
        cpu.update_zn(cpu.x);
        Ok(())
    }
}
