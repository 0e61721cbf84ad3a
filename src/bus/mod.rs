#![doc = r#"
Bus module: the CPU-visible 64 KiB address space.

Overview
- `Bus` owns system RAM, the PPU register model and the (optional) cartridge.
  The CPU borrows it mutably for every access; the bus never calls back into
  the CPU.

Address map
- $0000-$07FF: 2 KiB internal RAM
- $0800-$1FFF: mirrors of $0000-$07FF (mask & 0x07FF)
- $2000-$2007: PPU registers
- $2008-$3FFF: mirrors of $2000-$2007 (mask & 0x2007)
- $8000-$FFFF: cartridge PRG ROM (16 KiB images mirrored into $C000-$FFFF)
- $FFFC-$FFFD: reset vector; backed by the bus itself when no cartridge is
  attached, so a bare CPU can be bootstrapped from RAM

Every other address, and PRG ROM with no cartridge, is `InvalidAddress`.
Writes into PRG ROM with a cartridge attached are `ReadOnlyViolation`.

Side-effects
- `read` may mutate PPU state (PPUSTATUS, PPUDATA). `peek` never does and
  refuses the PPU window instead.
"#]

pub mod ram;


use log::debug;

use crate::cartridge::Cartridge;
use crate::error::{NesError, Result};
use crate::ppu::Ppu;
use ram::Ram;

pub const RAM: u16 = 0x0000;
pub const RAM_MIRRORS_END: u16 = 0x1FFF;
pub const PPU_REGISTERS: u16 = 0x2000;
pub const PPU_REGISTERS_MIRRORS_END: u16 = 0x3FFF;
pub const PRG_ROM_START: u16 = 0x8000;
pub const PRG_ROM_END: u16 = 0xFFFF;
pub const RESET_VECTOR: u16 = 0xFFFC;

#[derive(Debug, Clone, Default)]
pub struct Bus {
    ram: Ram,
    ppu: Ppu,
    cartridge: Option<Cartridge>,
    reset_vector: [u8; 2],
}

impl Bus {
    /// A bus with empty RAM and no cartridge.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cartridge(cart: Cartridge) -> Self {
        let mut bus = Self::new();
        bus.attach_cartridge(cart);
        bus
    }

    /// Insert a cartridge. The PPU is rebuilt around its CHR ROM and
    /// screen mirroring.
    pub fn attach_cartridge(&mut self, cart: Cartridge) {
        debug!(
            "attaching cartridge: prg={}B chr={}B mirroring={:?}",
            cart.prg_rom_len(),
            cart.chr_len(),
            cart.mirroring()
        );
        self.ppu = Ppu::new(cart.chr_rom().to_vec(), cart.mirroring());
        self.cartridge = Some(cart);
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub(crate) fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    #[inline]
    fn vector_index(addr: u16) -> Option<usize> {
        match addr {
            0xFFFC => Some(0),
            0xFFFD => Some(1),
            _ => None,
        }
    }

    // ---------------------------------------------------------------------
    // CPU-visible access
    // ---------------------------------------------------------------------

    pub fn read(&mut self, addr: u16) -> Result<u8> {
        match addr {
            RAM..=RAM_MIRRORS_END => Ok(self.ram.read(addr)),
            PPU_REGISTERS..=PPU_REGISTERS_MIRRORS_END => self.ppu.read_register(addr),
            PRG_ROM_START..=PRG_ROM_END => self.read_prg(addr),
            _ => Err(NesError::InvalidAddress(addr)),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) -> Result<()> {
        match addr {
            RAM..=RAM_MIRRORS_END => {
                self.ram.write(addr, value);
                Ok(())
            }
            PPU_REGISTERS..=PPU_REGISTERS_MIRRORS_END => self.ppu.write_register(addr, value),
            PRG_ROM_START..=PRG_ROM_END => {
                if self.cartridge.is_some() {
                    return Err(NesError::ReadOnlyViolation(addr));
                }
                let idx = Self::vector_index(addr).ok_or(NesError::InvalidAddress(addr))?;
                self.reset_vector[idx] = value;
                Ok(())
            }
            _ => Err(NesError::InvalidAddress(addr)),
        }
    }

    fn read_prg(&self, addr: u16) -> Result<u8> {
        match &self.cartridge {
            Some(cart) => Ok(cart.read_prg(addr)),
            None => Self::vector_index(addr)
                .map(|i| self.reset_vector[i])
                .ok_or(NesError::InvalidAddress(addr)),
        }
    }

    /// Little-endian 16-bit read.
    pub fn read_word(&mut self, addr: u16) -> Result<u16> {
        let lo = self.read(addr)? as u16;
        let hi = self.read(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    /// Little-endian 16-bit write.
    pub fn write_word(&mut self, addr: u16, value: u16) -> Result<()> {
        self.write(addr, (value & 0xFF) as u8)?;
        self.write(addr.wrapping_add(1), (value >> 8) as u8)
    }

    /// Side-effect free read for debuggers, tracers and renderers.
    ///
    /// Returns `None` for the PPU register window (reads there have
    /// side-effects) and for unmapped addresses.
    pub fn peek(&self, addr: u16) -> Option<u8> {
        match addr {
            RAM..=RAM_MIRRORS_END => Some(self.ram.read(addr)),
            PRG_ROM_START..=PRG_ROM_END => self.read_prg(addr).ok(),
            _ => None,
        }
    }
}
