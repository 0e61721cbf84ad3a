/*!
trace.rs - nestest-style disassembly of the instruction at PC.

One line per instruction, columns as in the nestest reference log:

```text
C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD
```

Memory is inspected with `Bus::peek`, so tracing never disturbs PPU state.
Operand values behind the PPU register window print as `00`.
*/

use crate::bus::Bus;
use crate::cpu::addressing::{AddressingMode, resolve};
use crate::cpu::state::CpuState;
use crate::cpu::table::opcode_table;
use crate::error::{NesError, Result};

pub fn trace(cpu: &CpuState, bus: &Bus) -> Result<String> {
    let peek = |addr: u16| bus.peek(addr).ok_or(NesError::InvalidAddress(addr));

    let begin = cpu.pc;
    let code = peek(begin)?;
    let op = opcode_table()?
        .lookup(code)
        .ok_or(NesError::UnknownOpcode {
            opcode: code,
            pc: begin,
        })?;
    let operand_pc = begin.wrapping_add(1);

    let mut hex_dump = vec![code];
    for i in 1..op.len as u16 {
        hex_dump.push(peek(begin.wrapping_add(i))?);
    }

    let (mem_addr, stored_value) = match op.mode {
        AddressingMode::Immediate
        | AddressingMode::Relative
        | AddressingMode::Accumulator
        | AddressingMode::NoneAddressing => (0, 0),
        mode => {
            let addr = resolve(mode, operand_pc, cpu.x, cpu.y, peek)?;
            (addr, bus.peek(addr).unwrap_or(0))
        }
    };

    let operand = match hex_dump.len() {
        1 => match op.mode {
            AddressingMode::Accumulator => "A".to_string(),
            _ => String::new(),
        },
        2 => {
            let value = hex_dump[1];
            match op.mode {
                AddressingMode::Immediate => format!("#${:02X}", value),
                AddressingMode::ZeroPage => format!("${:02X} = {:02X}", mem_addr, stored_value),
                AddressingMode::ZeroPage_X => format!(
                    "${:02X},X @ {:02X} = {:02X}",
                    value, mem_addr, stored_value
                ),
                AddressingMode::ZeroPage_Y => format!(
                    "${:02X},Y @ {:02X} = {:02X}",
                    value, mem_addr, stored_value
                ),
                AddressingMode::Indirect_X => format!(
                    "(${:02X},X) @ {:02X} = {:04X} = {:02X}",
                    value,
                    value.wrapping_add(cpu.x),
                    mem_addr,
                    stored_value
                ),
                AddressingMode::Indirect_Y => format!(
                    "(${:02X}),Y = {:04X} @ {:04X} = {:02X}",
                    value,
                    mem_addr.wrapping_sub(cpu.y as u16),
                    mem_addr,
                    stored_value
                ),
                AddressingMode::Relative => format!(
                    "${:04X}",
                    operand_pc
                        .wrapping_add(1)
                        .wrapping_add(value as i8 as u16)
                ),
                _ => format!("${:02X}", value),
            }
        }
        _ => {
            let word = u16::from_le_bytes([hex_dump[1], hex_dump[2]]);
            match op.mode {
                AddressingMode::Indirect => format!("(${:04X}) = {:04X}", word, mem_addr),
                // Control transfers show the target only.
                AddressingMode::Absolute if matches!(op.mnemonic, "JMP" | "JSR") => {
                    format!("${:04X}", word)
                }
                AddressingMode::Absolute => format!("${:04X} = {:02X}", mem_addr, stored_value),
                AddressingMode::Absolute_X => format!(
                    "${:04X},X @ {:04X} = {:02X}",
                    word, mem_addr, stored_value
                ),
                AddressingMode::Absolute_Y => format!(
                    "${:04X},Y @ {:04X} = {:02X}",
                    word, mem_addr, stored_value
                ),
                _ => format!("${:04X}", word),
            }
        }
    };

    let hex_str = hex_dump
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ");
    let asm = format!("{:04X}  {:8} {: >4} {}", begin, hex_str, op.mnemonic, operand);
    Ok(format!(
        "{:47} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
        asm.trim_end(),
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.status.bits(),
        cpu.sp
    ))
}
