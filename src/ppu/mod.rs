/*!
PPU register-level model providing:
- CPU-visible register interface ($2000-$2007) via `registers.rs`
- PPUADDR/PPUDATA two-stage access to CHR ROM, nametable VRAM and palette RAM
- OAM (sprite attribute memory) through OAMADDR/OAMDATA
- PPUSTATUS vblank flag with read side-effects

NOTES / LIMITATIONS:
- No rendering, scanline timing or NMI generation. The driver may set the
  vblank flag with `set_vblank_status`.
- PPUDATA reads below $3F00 are delayed by one access through an internal
  buffer; palette reads return immediately.
- Mirroring is fixed by the cartridge header for the lifetime of the PPU.

STRUCTURE:
- `Ppu` holds the register latches plus the CHR, VRAM, palette and OAM arrays.
- `registers.rs` defines the register types and the bus-facing dispatch.
- `memory.rs` maps PPU addresses onto the backing arrays.
*/

pub mod memory;
pub mod registers;

use log::trace;

use crate::cartridge::Mirroring;
use crate::error::{NesError, Result};
use memory::{map_palette_addr, vram_size};
use registers::{AddrRegister, ControlRegister, MaskRegister, ScrollRegister, StatusRegister};

#[derive(Debug, Clone)]
pub struct Ppu {
    chr_rom: Vec<u8>,
    mirroring: Mirroring,
    vram: Vec<u8>,
    palette_table: [u8; 32],
    oam_data: [u8; 256],

    addr: AddrRegister,       // $2006
    ctrl: ControlRegister,    // $2000
    mask: MaskRegister,       // $2001
    status: StatusRegister,   // $2002
    oam_addr: u8,             // $2003
    scroll: ScrollRegister,   // $2005
    internal_data_buf: u8,    // PPUDATA read buffer
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new(Vec::new(), Mirroring::Horizontal)
    }
}

impl Ppu {
    pub fn new(chr_rom: Vec<u8>, mirroring: Mirroring) -> Self {
        Self {
            chr_rom,
            mirroring,
            vram: vec![0; vram_size(mirroring)],
            palette_table: [0; 32],
            oam_data: [0; 256],
            addr: AddrRegister::new(),
            ctrl: ControlRegister::default(),
            mask: MaskRegister::default(),
            status: StatusRegister::default(),
            oam_addr: 0,
            scroll: ScrollRegister::default(),
            internal_data_buf: 0,
        }
    }

    // ---------------------------------------------------------------------
    // Register writes
    // ---------------------------------------------------------------------

    pub fn write_to_addr(&mut self, value: u8) {
        self.addr.update(value);
    }

    pub fn write_to_ctrl(&mut self, value: u8) {
        self.ctrl.update(value);
    }

    pub fn write_to_mask(&mut self, value: u8) {
        self.mask = MaskRegister::from_bits_retain(value);
    }

    pub fn write_to_oam_addr(&mut self, value: u8) {
        self.oam_addr = value;
    }

    pub fn write_to_oam_data(&mut self, value: u8) {
        self.oam_data[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    pub fn write_to_scroll(&mut self, value: u8) {
        self.scroll.write(value);
    }

    // ---------------------------------------------------------------------
    // Register reads
    // ---------------------------------------------------------------------

    /// PPUSTATUS read: returns the flags, then clears vblank and resets the
    /// PPUADDR/PPUSCROLL write latches.
    pub fn read_status(&mut self) -> u8 {
        let data = self.status.bits();
        self.status.remove(StatusRegister::VBLANK_STARTED);
        self.addr.reset_latch();
        self.scroll.reset_latch();
        data
    }

    pub fn read_oam_data(&self) -> u8 {
        self.oam_data[self.oam_addr as usize]
    }

    // ---------------------------------------------------------------------
    // PPUDATA ($2007)
    // ---------------------------------------------------------------------

    pub fn increment_vram_addr(&mut self) {
        self.addr.increment(self.ctrl.vram_addr_increment());
    }

    /// Read through PPUDATA, then advance the VRAM address.
    ///
    /// CHR and nametable reads return the previously buffered byte and refill
    /// the buffer. Palette reads bypass the buffer.
    pub fn read_data(&mut self) -> Result<u8> {
        let addr = self.addr.get();

        let result = match addr {
            0x0000..=0x1FFF => {
                let fresh = *self
                    .chr_rom
                    .get(addr as usize)
                    .ok_or(NesError::InvalidAddress(addr))?;
                std::mem::replace(&mut self.internal_data_buf, fresh)
            }
            0x2000..=0x2FFF => {
                let fresh = self.vram[self.mirror_vram_addr(addr) as usize];
                std::mem::replace(&mut self.internal_data_buf, fresh)
            }
            0x3F00..=0x3FFF => self.palette_table[map_palette_addr(addr)],
            _ => return Err(NesError::InvalidAddress(addr)),
        };

        self.increment_vram_addr();
        Ok(result)
    }

    /// Write through PPUDATA, then advance the VRAM address.
    pub fn write_data(&mut self, value: u8) -> Result<()> {
        let addr = self.addr.get();

        match addr {
            0x0000..=0x1FFF => return Err(NesError::ReadOnlyViolation(addr)),
            0x2000..=0x2FFF => {
                let idx = self.mirror_vram_addr(addr) as usize;
                self.vram[idx] = value;
            }
            0x3F00..=0x3FFF => self.palette_table[map_palette_addr(addr)] = value,
            _ => return Err(NesError::InvalidAddress(addr)),
        }

        trace!("PPUDATA ${:04X} <- ${:02X}", addr, value);
        self.increment_vram_addr();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Driver hooks and inspection
    // ---------------------------------------------------------------------

    pub fn set_vblank_status(&mut self, on: bool) {
        self.status.set(StatusRegister::VBLANK_STARTED, on);
    }

    pub fn vram_addr(&self) -> u16 {
        self.addr.get()
    }

    pub fn ctrl(&self) -> ControlRegister {
        self.ctrl
    }

    pub fn mask(&self) -> MaskRegister {
        self.mask
    }

    pub fn status(&self) -> StatusRegister {
        self.status
    }

    pub fn oam_addr(&self) -> u8 {
        self.oam_addr
    }

    pub fn scroll(&self) -> ScrollRegister {
        self.scroll
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
