#![doc = r#"
nescore library crate.

Core building blocks of an NES emulator: the 6502 CPU, the CPU-visible bus,
the iNES cartridge loader and the PPU register model.

Modules:
- bus: 64 KiB CPU address space (RAM, PPU register window, PRG ROM)
- cartridge: iNES v1 loader and cartridge metadata
- cpu: 6502 CPU core (facade + state + addressing + execute + table)
- error: `NesError`, the crate-wide error type
- ppu: PPU registers, VRAM/palette/OAM storage and nametable mirroring

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod error;
pub mod ppu;

// Re-export commonly used types at the crate root for convenience.
pub use bus::Bus;
pub use cartridge::{Cartridge, Mirroring};
pub use cpu::{Cpu, CpuState, StatusFlags, StepOutcome};
pub use error::{NesError, Result};
pub use ppu::Ppu;

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
