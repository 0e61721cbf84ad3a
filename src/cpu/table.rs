/*!
table.rs - Opcode metadata and the 256-entry dispatch table.

Purpose
=======
Maps each opcode byte to an `Opcode` record: mnemonic, instruction length,
addressing mode and a plain function-pointer handler from `execute`. The
step loop looks an opcode up, hands the handler the mode, and uses `len` to
skip operand bytes.

Design
------
- `OpcodeTable` is `[Option<Opcode>; 256]`. Building it from a list rejects
  a second registration of the same byte (`DuplicateOpcodeRegistration`).
- The full instruction set is built once, lazily, on first use. A failed
  build is cached and returned as an error from `opcode_table`.
- Undocumented opcodes are registered only with the `illegal_opcodes`
  feature. Their mnemonics carry a `*` prefix, the way nestest logs them.
*/

use lazy_static::lazy_static;

use crate::bus::Bus;
use crate::cpu::addressing::AddressingMode;
use crate::cpu::execute;
use crate::cpu::state::CpuState;
use crate::error::{NesError, Result};

pub type Handler = fn(&mut CpuState, &mut Bus, AddressingMode) -> Result<()>;

#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub code: u8,
    pub mnemonic: &'static str,
    pub len: u8,
    pub mode: AddressingMode,
    pub handler: Handler,
}

impl Opcode {
    pub fn new(
        code: u8,
        mnemonic: &'static str,
        len: u8,
        mode: AddressingMode,
        handler: Handler,
    ) -> Self {
        Opcode {
            code,
            mnemonic,
            len,
            mode,
            handler,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpcodeTable {
    entries: [Option<Opcode>; 256],
}

impl OpcodeTable {
    pub fn new(opcodes: &[Opcode]) -> Result<Self> {
        let mut entries: [Option<Opcode>; 256] = [None; 256];
        for op in opcodes {
            let slot = &mut entries[op.code as usize];
            if slot.is_some() {
                return Err(NesError::DuplicateOpcodeRegistration(op.code));
            }
            *slot = Some(*op);
        }
        Ok(OpcodeTable { entries })
    }

    #[inline]
    pub fn lookup(&self, code: u8) -> Option<&Opcode> {
        self.entries[code as usize].as_ref()
    }

    /// Number of registered opcodes.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The shared instruction set table.
pub fn opcode_table() -> Result<&'static OpcodeTable> {
    OPCODE_TABLE.as_ref().map_err(Clone::clone)
}

lazy_static! {
    static ref OPCODE_TABLE: Result<OpcodeTable> = {
        #[allow(unused_mut)]
        let mut all: Vec<Opcode> = CPU_OPS_CODES.to_vec();
        #[cfg(feature = "illegal_opcodes")]
        all.extend_from_slice(&UNOFFICIAL_OPS_CODES);
        OpcodeTable::new(&all)
    };

    pub static ref CPU_OPS_CODES: Vec<Opcode> = {
        use AddressingMode::*;
        use execute::*;
        vec![
            Opcode::new(0x00, "BRK", 1, NoneAddressing, brk),
            Opcode::new(0xEA, "NOP", 1, NoneAddressing, nop),

            /* Arithmetic */
            Opcode::new(0x69, "ADC", 2, Immediate, adc),
            Opcode::new(0x65, "ADC", 2, ZeroPage, adc),
            Opcode::new(0x75, "ADC", 2, ZeroPage_X, adc),
            Opcode::new(0x6D, "ADC", 3, Absolute, adc),
            Opcode::new(0x7D, "ADC", 3, Absolute_X, adc),
            Opcode::new(0x79, "ADC", 3, Absolute_Y, adc),
            Opcode::new(0x61, "ADC", 2, Indirect_X, adc),
            Opcode::new(0x71, "ADC", 2, Indirect_Y, adc),

            Opcode::new(0xE9, "SBC", 2, Immediate, sbc),
            Opcode::new(0xE5, "SBC", 2, ZeroPage, sbc),
            Opcode::new(0xF5, "SBC", 2, ZeroPage_X, sbc),
            Opcode::new(0xED, "SBC", 3, Absolute, sbc),
            Opcode::new(0xFD, "SBC", 3, Absolute_X, sbc),
            Opcode::new(0xF9, "SBC", 3, Absolute_Y, sbc),
            Opcode::new(0xE1, "SBC", 2, Indirect_X, sbc),
            Opcode::new(0xF1, "SBC", 2, Indirect_Y, sbc),

            Opcode::new(0x29, "AND", 2, Immediate, and),
            Opcode::new(0x25, "AND", 2, ZeroPage, and),
            Opcode::new(0x35, "AND", 2, ZeroPage_X, and),
            Opcode::new(0x2D, "AND", 3, Absolute, and),
            Opcode::new(0x3D, "AND", 3, Absolute_X, and),
            Opcode::new(0x39, "AND", 3, Absolute_Y, and),
            Opcode::new(0x21, "AND", 2, Indirect_X, and),
            Opcode::new(0x31, "AND", 2, Indirect_Y, and),

            Opcode::new(0x49, "EOR", 2, Immediate, eor),
            Opcode::new(0x45, "EOR", 2, ZeroPage, eor),
            Opcode::new(0x55, "EOR", 2, ZeroPage_X, eor),
            Opcode::new(0x4D, "EOR", 3, Absolute, eor),
            Opcode::new(0x5D, "EOR", 3, Absolute_X, eor),
            Opcode::new(0x59, "EOR", 3, Absolute_Y, eor),
            Opcode::new(0x41, "EOR", 2, Indirect_X, eor),
            Opcode::new(0x51, "EOR", 2, Indirect_Y, eor),

            Opcode::new(0x09, "ORA", 2, Immediate, ora),
            Opcode::new(0x05, "ORA", 2, ZeroPage, ora),
            Opcode::new(0x15, "ORA", 2, ZeroPage_X, ora),
            Opcode::new(0x0D, "ORA", 3, Absolute, ora),
            Opcode::new(0x1D, "ORA", 3, Absolute_X, ora),
            Opcode::new(0x19, "ORA", 3, Absolute_Y, ora),
            Opcode::new(0x01, "ORA", 2, Indirect_X, ora),
            Opcode::new(0x11, "ORA", 2, Indirect_Y, ora),

            /* Shifts */
            Opcode::new(0x0A, "ASL", 1, Accumulator, asl),
            Opcode::new(0x06, "ASL", 2, ZeroPage, asl),
            Opcode::new(0x16, "ASL", 2, ZeroPage_X, asl),
            Opcode::new(0x0E, "ASL", 3, Absolute, asl),
            Opcode::new(0x1E, "ASL", 3, Absolute_X, asl),

            Opcode::new(0x4A, "LSR", 1, Accumulator, lsr),
            Opcode::new(0x46, "LSR", 2, ZeroPage, lsr),
            Opcode::new(0x56, "LSR", 2, ZeroPage_X, lsr),
            Opcode::new(0x4E, "LSR", 3, Absolute, lsr),
            Opcode::new(0x5E, "LSR", 3, Absolute_X, lsr),

            Opcode::new(0x2A, "ROL", 1, Accumulator, rol),
            Opcode::new(0x26, "ROL", 2, ZeroPage, rol),
            Opcode::new(0x36, "ROL", 2, ZeroPage_X, rol),
            Opcode::new(0x2E, "ROL", 3, Absolute, rol),
            Opcode::new(0x3E, "ROL", 3, Absolute_X, rol),

            Opcode::new(0x6A, "ROR", 1, Accumulator, ror),
            Opcode::new(0x66, "ROR", 2, ZeroPage, ror),
            Opcode::new(0x76, "ROR", 2, ZeroPage_X, ror),
            Opcode::new(0x6E, "ROR", 3, Absolute, ror),
            Opcode::new(0x7E, "ROR", 3, Absolute_X, ror),

            Opcode::new(0xE6, "INC", 2, ZeroPage, inc),
            Opcode::new(0xF6, "INC", 2, ZeroPage_X, inc),
            Opcode::new(0xEE, "INC", 3, Absolute, inc),
            Opcode::new(0xFE, "INC", 3, Absolute_X, inc),
            Opcode::new(0xE8, "INX", 1, NoneAddressing, inx),
            Opcode::new(0xC8, "INY", 1, NoneAddressing, iny),

            Opcode::new(0xC6, "DEC", 2, ZeroPage, dec),
            Opcode::new(0xD6, "DEC", 2, ZeroPage_X, dec),
            Opcode::new(0xCE, "DEC", 3, Absolute, dec),
            Opcode::new(0xDE, "DEC", 3, Absolute_X, dec),
            Opcode::new(0xCA, "DEX", 1, NoneAddressing, dex),
            Opcode::new(0x88, "DEY", 1, NoneAddressing, dey),

            Opcode::new(0xC9, "CMP", 2, Immediate, cmp),
            Opcode::new(0xC5, "CMP", 2, ZeroPage, cmp),
            Opcode::new(0xD5, "CMP", 2, ZeroPage_X, cmp),
            Opcode::new(0xCD, "CMP", 3, Absolute, cmp),
            Opcode::new(0xDD, "CMP", 3, Absolute_X, cmp),
            Opcode::new(0xD9, "CMP", 3, Absolute_Y, cmp),
            Opcode::new(0xC1, "CMP", 2, Indirect_X, cmp),
            Opcode::new(0xD1, "CMP", 2, Indirect_Y, cmp),

            Opcode::new(0xC0, "CPY", 2, Immediate, cpy),
            Opcode::new(0xC4, "CPY", 2, ZeroPage, cpy),
            Opcode::new(0xCC, "CPY", 3, Absolute, cpy),

            Opcode::new(0xE0, "CPX", 2, Immediate, cpx),
            Opcode::new(0xE4, "CPX", 2, ZeroPage, cpx),
            Opcode::new(0xEC, "CPX", 3, Absolute, cpx),

            /* Branching */
            Opcode::new(0x4C, "JMP", 3, Absolute, jmp),
            Opcode::new(0x6C, "JMP", 3, Indirect, jmp),
            Opcode::new(0x20, "JSR", 3, Absolute, jsr),
            Opcode::new(0x60, "RTS", 1, NoneAddressing, rts),
            Opcode::new(0x40, "RTI", 1, NoneAddressing, rti),

            Opcode::new(0xD0, "BNE", 2, Relative, bne),
            Opcode::new(0x70, "BVS", 2, Relative, bvs),
            Opcode::new(0x50, "BVC", 2, Relative, bvc),
            Opcode::new(0x30, "BMI", 2, Relative, bmi),
            Opcode::new(0xF0, "BEQ", 2, Relative, beq),
            Opcode::new(0xB0, "BCS", 2, Relative, bcs),
            Opcode::new(0x90, "BCC", 2, Relative, bcc),
            Opcode::new(0x10, "BPL", 2, Relative, bpl),

            Opcode::new(0x24, "BIT", 2, ZeroPage, bit),
            Opcode::new(0x2C, "BIT", 3, Absolute, bit),

            /* Stores, Loads */
            Opcode::new(0xA9, "LDA", 2, Immediate, lda),
            Opcode::new(0xA5, "LDA", 2, ZeroPage, lda),
            Opcode::new(0xB5, "LDA", 2, ZeroPage_X, lda),
            Opcode::new(0xAD, "LDA", 3, Absolute, lda),
            Opcode::new(0xBD, "LDA", 3, Absolute_X, lda),
            Opcode::new(0xB9, "LDA", 3, Absolute_Y, lda),
            Opcode::new(0xA1, "LDA", 2, Indirect_X, lda),
            Opcode::new(0xB1, "LDA", 2, Indirect_Y, lda),

            Opcode::new(0xA2, "LDX", 2, Immediate, ldx),
            Opcode::new(0xA6, "LDX", 2, ZeroPage, ldx),
            Opcode::new(0xB6, "LDX", 2, ZeroPage_Y, ldx),
            Opcode::new(0xAE, "LDX", 3, Absolute, ldx),
            Opcode::new(0xBE, "LDX", 3, Absolute_Y, ldx),

            Opcode::new(0xA0, "LDY", 2, Immediate, ldy),
            Opcode::new(0xA4, "LDY", 2, ZeroPage, ldy),
            Opcode::new(0xB4, "LDY", 2, ZeroPage_X, ldy),
            Opcode::new(0xAC, "LDY", 3, Absolute, ldy),
            Opcode::new(0xBC, "LDY", 3, Absolute_X, ldy),

            Opcode::new(0x85, "STA", 2, ZeroPage, sta),
            Opcode::new(0x95, "STA", 2, ZeroPage_X, sta),
            Opcode::new(0x8D, "STA", 3, Absolute, sta),
            Opcode::new(0x9D, "STA", 3, Absolute_X, sta),
            Opcode::new(0x99, "STA", 3, Absolute_Y, sta),
            Opcode::new(0x81, "STA", 2, Indirect_X, sta),
            Opcode::new(0x91, "STA", 2, Indirect_Y, sta),

            Opcode::new(0x86, "STX", 2, ZeroPage, stx),
            Opcode::new(0x96, "STX", 2, ZeroPage_Y, stx),
            Opcode::new(0x8E, "STX", 3, Absolute, stx),

            Opcode::new(0x84, "STY", 2, ZeroPage, sty),
            Opcode::new(0x94, "STY", 2, ZeroPage_X, sty),
            Opcode::new(0x8C, "STY", 3, Absolute, sty),

            /* Flags clear */
            Opcode::new(0xD8, "CLD", 1, NoneAddressing, cld),
            Opcode::new(0x58, "CLI", 1, NoneAddressing, cli),
            Opcode::new(0xB8, "CLV", 1, NoneAddressing, clv),
            Opcode::new(0x18, "CLC", 1, NoneAddressing, clc),
            Opcode::new(0x38, "SEC", 1, NoneAddressing, sec),
            Opcode::new(0x78, "SEI", 1, NoneAddressing, sei),
            Opcode::new(0xF8, "SED", 1, NoneAddressing, sed),

            Opcode::new(0xAA, "TAX", 1, NoneAddressing, tax),
            Opcode::new(0xA8, "TAY", 1, NoneAddressing, tay),
            Opcode::new(0xBA, "TSX", 1, NoneAddressing, tsx),
            Opcode::new(0x8A, "TXA", 1, NoneAddressing, txa),
            Opcode::new(0x9A, "TXS", 1, NoneAddressing, txs),
            Opcode::new(0x98, "TYA", 1, NoneAddressing, tya),

            /* Stack */
            Opcode::new(0x48, "PHA", 1, NoneAddressing, pha),
            Opcode::new(0x68, "PLA", 1, NoneAddressing, pla),
            Opcode::new(0x08, "PHP", 1, NoneAddressing, php),
            Opcode::new(0x28, "PLP", 1, NoneAddressing, plp),
        ]
    };
}

#[cfg(feature = "illegal_opcodes")]
lazy_static! {
    pub static ref UNOFFICIAL_OPS_CODES: Vec<Opcode> = {
        use AddressingMode::*;
        use execute::*;
        vec![
            /* NOPs: operands are skipped without a bus read */
            Opcode::new(0x04, "*NOP", 2, ZeroPage, nop),
            Opcode::new(0x44, "*NOP", 2, ZeroPage, nop),
            Opcode::new(0x64, "*NOP", 2, ZeroPage, nop),
            Opcode::new(0x14, "*NOP", 2, ZeroPage_X, nop),
            Opcode::new(0x34, "*NOP", 2, ZeroPage_X, nop),
            Opcode::new(0x54, "*NOP", 2, ZeroPage_X, nop),
            Opcode::new(0x74, "*NOP", 2, ZeroPage_X, nop),
            Opcode::new(0xD4, "*NOP", 2, ZeroPage_X, nop),
            Opcode::new(0xF4, "*NOP", 2, ZeroPage_X, nop),
            Opcode::new(0x80, "*NOP", 2, Immediate, nop),
            Opcode::new(0x82, "*NOP", 2, Immediate, nop),
            Opcode::new(0x89, "*NOP", 2, Immediate, nop),
            Opcode::new(0xC2, "*NOP", 2, Immediate, nop),
            Opcode::new(0xE2, "*NOP", 2, Immediate, nop),
            Opcode::new(0x0C, "*NOP", 3, Absolute, nop),
            Opcode::new(0x1C, "*NOP", 3, Absolute_X, nop),
            Opcode::new(0x3C, "*NOP", 3, Absolute_X, nop),
            Opcode::new(0x5C, "*NOP", 3, Absolute_X, nop),
            Opcode::new(0x7C, "*NOP", 3, Absolute_X, nop),
            Opcode::new(0xDC, "*NOP", 3, Absolute_X, nop),
            Opcode::new(0xFC, "*NOP", 3, Absolute_X, nop),
            Opcode::new(0x1A, "*NOP", 1, NoneAddressing, nop),
            Opcode::new(0x3A, "*NOP", 1, NoneAddressing, nop),
            Opcode::new(0x5A, "*NOP", 1, NoneAddressing, nop),
            Opcode::new(0x7A, "*NOP", 1, NoneAddressing, nop),
            Opcode::new(0xDA, "*NOP", 1, NoneAddressing, nop),
            Opcode::new(0xFA, "*NOP", 1, NoneAddressing, nop),

            Opcode::new(0xA7, "*LAX", 2, ZeroPage, lax),
            Opcode::new(0xB7, "*LAX", 2, ZeroPage_Y, lax),
            Opcode::new(0xAF, "*LAX", 3, Absolute, lax),
            Opcode::new(0xBF, "*LAX", 3, Absolute_Y, lax),
            Opcode::new(0xA3, "*LAX", 2, Indirect_X, lax),
            Opcode::new(0xB3, "*LAX", 2, Indirect_Y, lax),

            Opcode::new(0x87, "*SAX", 2, ZeroPage, sax),
            Opcode::new(0x97, "*SAX", 2, ZeroPage_Y, sax),
            Opcode::new(0x8F, "*SAX", 3, Absolute, sax),
            Opcode::new(0x83, "*SAX", 2, Indirect_X, sax),

            Opcode::new(0xEB, "*SBC", 2, Immediate, sbc),

            Opcode::new(0xC7, "*DCP", 2, ZeroPage, dcp),
            Opcode::new(0xD7, "*DCP", 2, ZeroPage_X, dcp),
            Opcode::new(0xCF, "*DCP", 3, Absolute, dcp),
            Opcode::new(0xDF, "*DCP", 3, Absolute_X, dcp),
            Opcode::new(0xDB, "*DCP", 3, Absolute_Y, dcp),
            Opcode::new(0xC3, "*DCP", 2, Indirect_X, dcp),
            Opcode::new(0xD3, "*DCP", 2, Indirect_Y, dcp),

            Opcode::new(0xE7, "*ISB", 2, ZeroPage, isb),
            Opcode::new(0xF7, "*ISB", 2, ZeroPage_X, isb),
            Opcode::new(0xEF, "*ISB", 3, Absolute, isb),
            Opcode::new(0xFF, "*ISB", 3, Absolute_X, isb),
            Opcode::new(0xFB, "*ISB", 3, Absolute_Y, isb),
            Opcode::new(0xE3, "*ISB", 2, Indirect_X, isb),
            Opcode::new(0xF3, "*ISB", 2, Indirect_Y, isb),

            Opcode::new(0x07, "*SLO", 2, ZeroPage, slo),
            Opcode::new(0x17, "*SLO", 2, ZeroPage_X, slo),
            Opcode::new(0x0F, "*SLO", 3, Absolute, slo),
            Opcode::new(0x1F, "*SLO", 3, Absolute_X, slo),
            Opcode::new(0x1B, "*SLO", 3, Absolute_Y, slo),
            Opcode::new(0x03, "*SLO", 2, Indirect_X, slo),
            Opcode::new(0x13, "*SLO", 2, Indirect_Y, slo),

            Opcode::new(0x27, "*RLA", 2, ZeroPage, rla),
            Opcode::new(0x37, "*RLA", 2, ZeroPage_X, rla),
            Opcode::new(0x2F, "*RLA", 3, Absolute, rla),
            Opcode::new(0x3F, "*RLA", 3, Absolute_X, rla),
            Opcode::new(0x3B, "*RLA", 3, Absolute_Y, rla),
            Opcode::new(0x23, "*RLA", 2, Indirect_X, rla),
            Opcode::new(0x33, "*RLA", 2, Indirect_Y, rla),

            Opcode::new(0x47, "*SRE", 2, ZeroPage, sre),
            Opcode::new(0x57, "*SRE", 2, ZeroPage_X, sre),
            Opcode::new(0x4F, "*SRE", 3, Absolute, sre),
            Opcode::new(0x5F, "*SRE", 3, Absolute_X, sre),
            Opcode::new(0x5B, "*SRE", 3, Absolute_Y, sre),
            Opcode::new(0x43, "*SRE", 2, Indirect_X, sre),
            Opcode::new(0x53, "*SRE", 2, Indirect_Y, sre),

            Opcode::new(0x67, "*RRA", 2, ZeroPage, rra),
            Opcode::new(0x77, "*RRA", 2, ZeroPage_X, rra),
            Opcode::new(0x6F, "*RRA", 3, Absolute, rra),
            Opcode::new(0x7F, "*RRA", 3, Absolute_X, rra),
            Opcode::new(0x7B, "*RRA", 3, Absolute_Y, rra),
            Opcode::new(0x63, "*RRA", 2, Indirect_X, rra),
            Opcode::new(0x73, "*RRA", 2, Indirect_Y, rra),

            Opcode::new(0x0B, "*ANC", 2, Immediate, anc),
            Opcode::new(0x2B, "*ANC", 2, Immediate, anc),
            Opcode::new(0x4B, "*ALR", 2, Immediate, alr),
            Opcode::new(0x6B, "*ARR", 2, Immediate, arr),
            Opcode::new(0xCB, "*AXS", 2, Immediate, axs),
        ]
    };
}
