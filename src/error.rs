//! Error taxonomy shared by the cartridge loader, bus, PPU and CPU.
//!
//! Every variant is fatal at the point of detection: the core never retries
//! or degrades. Callers propagate with `?` and the driver decides how to
//! report the failure.

use thiserror::Error;

use crate::cpu::addressing::AddressingMode;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NesError {
    #[error("invalid iNES image: {0}")]
    InvalidFormat(String),

    #[error("unsupported mapper id {0}")]
    UnsupportedMapper(u8),

    #[error("unsupported iNES format version {0}")]
    UnsupportedVersion(u8),

    #[error("invalid memory access at ${0:04X}")]
    InvalidAddress(u16),

    #[error("write to read-only memory at ${0:04X}")]
    ReadOnlyViolation(u16),

    #[error("read from write-only register ${0:04X}")]
    WriteOnlyRegister(u16),

    #[error("unknown opcode ${opcode:02X} at ${pc:04X}")]
    UnknownOpcode { opcode: u8, pc: u16 },

    #[error("opcode ${0:02X} registered twice")]
    DuplicateOpcodeRegistration(u8),

    #[error("addressing mode {0:?} has no operand address")]
    UnsupportedAddressingMode(AddressingMode),

    #[error("program of {len} bytes does not fit in {capacity} bytes of RAM")]
    ProgramTooLarge { len: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, NesError>;
