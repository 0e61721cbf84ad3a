#![doc = r#"
PPU registers module

Purpose
- Home for the CPU-visible PPU register types (PPUCTRL, PPUMASK, PPUSTATUS,
  PPUSCROLL and PPUADDR latches) and the `$2000-$2007` register dispatch.

Notes
- The bus mirrors `$2000-$3FFF` down to `$2000-$2007` before calling in here
  (`addr & 0x2007`); `register_index` repeats the mask so direct callers get
  the same behavior.
- Reading a write-only register is reported as `WriteOnlyRegister`; writing
  PPUSTATUS is a `ReadOnlyViolation`.
- PPUADDR and PPUSCROLL keep independent two-write latches. A PPUSTATUS read
  resets both.
"#]

use bitflags::bitflags;

use super::Ppu;
use crate::error::{NesError, Result};

pub const PPUCTRL: u16 = 0x2000;
pub const PPUMASK: u16 = 0x2001;
pub const PPUSTATUS: u16 = 0x2002;
pub const OAMADDR: u16 = 0x2003;
pub const OAMDATA: u16 = 0x2004;
pub const PPUSCROLL: u16 = 0x2005;
pub const PPUADDR: u16 = 0x2006;
pub const PPUDATA: u16 = 0x2007;

// ---------------------------------------------------------------------------
// PPUADDR ($2006)
// ---------------------------------------------------------------------------

/// 14-bit VRAM pointer assembled from two byte writes, high byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrRegister {
    hi: u8,
    lo: u8,
    hi_ptr: bool,
}

impl Default for AddrRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl AddrRegister {
    pub fn new() -> Self {
        Self {
            hi: 0,
            lo: 0,
            hi_ptr: true,
        }
    }

    fn set(&mut self, data: u16) {
        self.hi = (data >> 8) as u8;
        self.lo = (data & 0xFF) as u8;
    }

    /// Latch one byte. Alternates high/low and masks the result to $3FFF.
    pub fn update(&mut self, data: u8) {
        if self.hi_ptr {
            self.hi = data;
        } else {
            self.lo = data;
        }

        if self.get() > 0x3FFF {
            self.set(self.get() & 0x3FFF);
        }
        self.hi_ptr = !self.hi_ptr;
    }

    pub fn increment(&mut self, inc: u8) {
        let lo = self.lo;
        self.lo = self.lo.wrapping_add(inc);
        if lo > self.lo {
            self.hi = self.hi.wrapping_add(1);
        }
        if self.get() > 0x3FFF {
            self.set(self.get() & 0x3FFF);
        }
    }

    /// Next write goes to the high byte.
    pub fn reset_latch(&mut self) {
        self.hi_ptr = true;
    }

    pub fn get(&self) -> u16 {
        ((self.hi as u16) << 8) | (self.lo as u16)
    }

    pub fn expects_high_byte(&self) -> bool {
        self.hi_ptr
    }
}

// ---------------------------------------------------------------------------
// PPUCTRL ($2000)
// ---------------------------------------------------------------------------

bitflags! {
    // 7  bit  0
    // ---- ----
    // VPHB SINN
    // |||| ||||
    // |||| ||++- Base nametable address
    // |||| ||    (0 = $2000; 1 = $2400; 2 = $2800; 3 = $2C00)
    // |||| |+--- VRAM address increment per CPU read/write of PPUDATA
    // |||| |     (0: add 1, going across; 1: add 32, going down)
    // |||| +---- Sprite pattern table address for 8x8 sprites
    // ||||       (0: $0000; 1: $1000; ignored in 8x16 mode)
    // |||+------ Background pattern table address (0: $0000; 1: $1000)
    // ||+------- Sprite size (0: 8x8 pixels; 1: 8x16 pixels)
    // |+-------- PPU master/slave select
    // +--------- Generate an NMI at the start of vblank
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ControlRegister: u8 {
        const NAMETABLE1              = 0b0000_0001;
        const NAMETABLE2              = 0b0000_0010;
        const VRAM_ADD_INCREMENT      = 0b0000_0100;
        const SPRITE_PATTERN_ADDR     = 0b0000_1000;
        const BACKGROUND_PATTERN_ADDR = 0b0001_0000;
        const SPRITE_SIZE             = 0b0010_0000;
        const MASTER_SLAVE_SELECT     = 0b0100_0000;
        const GENERATE_NMI            = 0b1000_0000;
    }
}

impl ControlRegister {
    pub fn vram_addr_increment(&self) -> u8 {
        if self.contains(ControlRegister::VRAM_ADD_INCREMENT) {
            32
        } else {
            1
        }
    }

    pub fn nametable_addr(&self) -> u16 {
        0x2000 + 0x400 * (self.bits() & 0b11) as u16
    }

    pub fn update(&mut self, data: u8) {
        *self = ControlRegister::from_bits_retain(data);
    }
}

// ---------------------------------------------------------------------------
// PPUMASK ($2001)
// ---------------------------------------------------------------------------

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MaskRegister: u8 {
        const GREYSCALE                = 0b0000_0001;
        const LEFTMOST_8PXL_BACKGROUND = 0b0000_0010;
        const LEFTMOST_8PXL_SPRITE     = 0b0000_0100;
        const SHOW_BACKGROUND          = 0b0000_1000;
        const SHOW_SPRITES             = 0b0001_0000;
        const EMPHASISE_RED            = 0b0010_0000;
        const EMPHASISE_GREEN          = 0b0100_0000;
        const EMPHASISE_BLUE           = 0b1000_0000;
    }
}

// ---------------------------------------------------------------------------
// PPUSTATUS ($2002)
// ---------------------------------------------------------------------------

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusRegister: u8 {
        const SPRITE_OVERFLOW = 0b0010_0000;
        const SPRITE_ZERO_HIT = 0b0100_0000;
        const VBLANK_STARTED  = 0b1000_0000;
    }
}

// ---------------------------------------------------------------------------
// PPUSCROLL ($2005)
// ---------------------------------------------------------------------------

/// Two-write scroll latch: X first, then Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollRegister {
    pub scroll_x: u8,
    pub scroll_y: u8,
    latch: bool,
}

impl ScrollRegister {
    pub fn write(&mut self, data: u8) {
        if !self.latch {
            self.scroll_x = data;
        } else {
            self.scroll_y = data;
        }
        self.latch = !self.latch;
    }

    pub fn reset_latch(&mut self) {
        self.latch = false;
    }
}

// ---------------------------------------------------------------------------
// CPU-visible dispatch
// ---------------------------------------------------------------------------

#[inline]
fn register_index(addr: u16) -> u16 {
    addr & 0x2007
}

impl Ppu {
    /// CPU-visible register read ($2000-$2007 and mirrors).
    pub fn read_register(&mut self, addr: u16) -> Result<u8> {
        match register_index(addr) {
            PPUSTATUS => Ok(self.read_status()),
            OAMDATA => Ok(self.read_oam_data()),
            PPUDATA => self.read_data(),
            PPUCTRL | PPUMASK | OAMADDR | PPUSCROLL | PPUADDR => {
                Err(NesError::WriteOnlyRegister(addr))
            }
            _ => Err(NesError::InvalidAddress(addr)),
        }
    }

    /// CPU-visible register write ($2000-$2007 and mirrors).
    pub fn write_register(&mut self, addr: u16, value: u8) -> Result<()> {
        match register_index(addr) {
            PPUCTRL => self.write_to_ctrl(value),
            PPUMASK => self.write_to_mask(value),
            PPUSTATUS => return Err(NesError::ReadOnlyViolation(addr)),
            OAMADDR => self.write_to_oam_addr(value),
            OAMDATA => self.write_to_oam_data(value),
            PPUSCROLL => self.write_to_scroll(value),
            PPUADDR => self.write_to_addr(value),
            PPUDATA => return self.write_data(value),
            _ => return Err(NesError::InvalidAddress(addr)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_register_hi_then_lo() {
        let mut r = AddrRegister::new();
        assert!(r.expects_high_byte());
        r.update(0x23);
        assert!(!r.expects_high_byte());
        r.update(0x05);
        assert_eq!(r.get(), 0x2305);
        assert!(r.expects_high_byte());
    }

    #[test]
    fn addr_register_masks_to_14_bits() {
        let mut r = AddrRegister::new();
        r.update(0x7F);
        assert_eq!(r.get(), 0x3F00);
        r.update(0xFF);
        assert_eq!(r.get(), 0x3FFF);
    }

    #[test]
    fn addr_register_increment_carries_and_wraps() {
        let mut r = AddrRegister::new();
        r.update(0x20);
        r.update(0xFF);
        r.increment(1);
        assert_eq!(r.get(), 0x2100);

        r.update(0x3F);
        r.update(0xF0);
        r.increment(32);
        assert_eq!(r.get(), 0x0010);
    }

    #[test]
    fn control_increment_size() {
        let mut c = ControlRegister::default();
        assert_eq!(c.vram_addr_increment(), 1);
        c.update(0b0000_0100);
        assert_eq!(c.vram_addr_increment(), 32);
        c.update(0b0000_0010);
        assert_eq!(c.nametable_addr(), 0x2800);
    }

    #[test]
    fn status_read_clears_vblank_and_latches() {
        let mut p = Ppu::default();
        p.set_vblank_status(true);
        p.write_register(0x2006, 0x21).unwrap();
        let s = p.read_register(0x2002).unwrap();
        assert_ne!(s & 0x80, 0, "status read returns vblank when set");
        assert_eq!(p.read_register(0x2002).unwrap() & 0x80, 0);
        // The pending low-byte write was discarded; this is a fresh high byte.
        p.write_register(0x2006, 0x23).unwrap();
        p.write_register(0x2006, 0x10).unwrap();
        assert_eq!(p.vram_addr(), 0x2310);
    }

    #[test]
    fn write_only_registers_reject_reads() {
        let mut p = Ppu::default();
        for addr in [0x2000, 0x2001, 0x2003, 0x2005, 0x2006, 0x3FFE] {
            assert!(matches!(
                p.read_register(addr),
                Err(NesError::WriteOnlyRegister(a)) if a == addr
            ));
        }
    }

    #[test]
    fn status_is_read_only() {
        let mut p = Ppu::default();
        assert_eq!(
            p.write_register(0x200A, 0xFF),
            Err(NesError::ReadOnlyViolation(0x200A))
        );
    }

    #[test]
    fn scroll_latch_alternates() {
        let mut p = Ppu::default();
        p.write_register(0x2005, 0x10).unwrap();
        p.write_register(0x2005, 0x20).unwrap();
        assert_eq!(p.scroll().scroll_x, 0x10);
        assert_eq!(p.scroll().scroll_y, 0x20);
    }
}
