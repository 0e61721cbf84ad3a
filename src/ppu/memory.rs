#![doc = r#"
PPU memory submodule

Responsibilities
- Map PPU addresses onto the backing arrays: nametable VRAM (with the
  cartridge's screen mirroring) and palette RAM (with the backdrop mirrors).
- Raw VRAM/OAM inspection helpers for tests and debugging front-ends.

PPU address map
- $0000-$1FFF: pattern tables (CHR ROM, read-only)
- $2000-$2FFF: nametables, mirrored per `Mirroring`
- $3000-$3EFF: unused mirror of the nametables; any access is a fault
- $3F00-$3FFF: palette RAM, 32 bytes mirrored across the range
"#]

use super::Ppu;
use crate::cartridge::Mirroring;

/// Size of one nametable in bytes.
pub const NAMETABLE_SIZE: u16 = 0x400;

/// Compute the palette RAM index (0..=31) for an address in $3F00-$3FFF.
///
/// $3F10/$3F14/$3F18/$3F1C mirror $3F00/$3F04/$3F08/$3F0C.
#[inline]
pub fn map_palette_addr(addr: u16) -> usize {
    let mut idx = (addr.wrapping_sub(0x3F00) as usize) & 0x1F;
    if idx >= 16 && (idx & 0x03) == 0 {
        idx -= 16;
    }
    idx
}

/// Compute the VRAM index for a nametable address in $2000-$2FFF.
///
/// Horizontal:
///   [ A ] [ a ]
///   [ B ] [ b ]
///
/// Vertical:
///   [ A ] [ B ]
///   [ a ] [ b ]
///
/// FourScreen keeps all four tables distinct and needs 4 KiB of VRAM.
///
/// Only the low 12 bits select a table and offset, so $3000-$3EFF folds onto
/// $2000-$2EFF and any other input still yields an in-range index.
#[inline]
pub fn mirror_nametable_addr(addr: u16, mirroring: Mirroring) -> u16 {
    let vram_index = addr & 0x0FFF;
    let name_table = vram_index / NAMETABLE_SIZE;
    match (mirroring, name_table) {
        (Mirroring::Vertical, 2) | (Mirroring::Vertical, 3) => vram_index - 0x800,
        (Mirroring::Horizontal, 1) | (Mirroring::Horizontal, 2) => vram_index - 0x400,
        (Mirroring::Horizontal, 3) => vram_index - 0x800,
        _ => vram_index,
    }
}

/// Backing VRAM size for a mirroring mode.
pub(crate) fn vram_size(mirroring: Mirroring) -> usize {
    match mirroring {
        Mirroring::FourScreen => 4 * NAMETABLE_SIZE as usize,
        Mirroring::Horizontal | Mirroring::Vertical => 2 * NAMETABLE_SIZE as usize,
    }
}

impl Ppu {
    /// Mirror a nametable address using this PPU's screen mirroring.
    #[inline]
    pub fn mirror_vram_addr(&self, addr: u16) -> u16 {
        mirror_nametable_addr(addr, self.mirroring)
    }

    /// Raw nametable VRAM, after mirroring has been applied.
    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    pub fn palette_table(&self) -> &[u8; 32] {
        &self.palette_table
    }

    pub fn oam_data(&self) -> &[u8; 256] {
        &self.oam_data
    }

    pub fn chr_rom(&self) -> &[u8] {
        &self.chr_rom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_backdrop_mirrors() {
        assert_eq!(map_palette_addr(0x3F00), 0x00);
        assert_eq!(map_palette_addr(0x3F10), 0x00);
        assert_eq!(map_palette_addr(0x3F14), 0x04);
        assert_eq!(map_palette_addr(0x3F18), 0x08);
        assert_eq!(map_palette_addr(0x3F1C), 0x0C);
        assert_eq!(map_palette_addr(0x3F11), 0x11);
        // Whole range mirrors every 32 bytes.
        assert_eq!(map_palette_addr(0x3F25), 0x05);
        assert_eq!(map_palette_addr(0x3FFC), 0x0C);
    }

    #[test]
    fn vertical_mirroring_folds_lower_tables() {
        let m = Mirroring::Vertical;
        assert_eq!(mirror_nametable_addr(0x2000, m), 0x000);
        assert_eq!(mirror_nametable_addr(0x2400, m), 0x400);
        assert_eq!(mirror_nametable_addr(0x2800, m), 0x000);
        assert_eq!(mirror_nametable_addr(0x2C05, m), 0x405);
    }

    #[test]
    fn horizontal_mirroring_pairs_tables() {
        let m = Mirroring::Horizontal;
        assert_eq!(mirror_nametable_addr(0x2000, m), 0x000);
        assert_eq!(mirror_nametable_addr(0x2401, m), 0x001);
        assert_eq!(mirror_nametable_addr(0x2802, m), 0x402);
        assert_eq!(mirror_nametable_addr(0x2C03, m), 0x403);
    }

    #[test]
    fn four_screen_is_identity() {
        let m = Mirroring::FourScreen;
        assert_eq!(mirror_nametable_addr(0x2C03, m), 0xC03);
        assert_eq!(vram_size(m), 0x1000);
        assert_eq!(vram_size(Mirroring::Vertical), 0x800);
    }

    #[test]
    fn upper_mirror_region_folds_into_nametables() {
        assert_eq!(mirror_nametable_addr(0x3000, Mirroring::Vertical), 0x000);
        assert_eq!(mirror_nametable_addr(0x3400, Mirroring::Vertical), 0x400);
    }

    #[test]
    fn addresses_below_nametables_stay_in_range() {
        assert_eq!(mirror_nametable_addr(0x0000, Mirroring::Horizontal), 0x000);
        assert_eq!(mirror_nametable_addr(0x0C05, Mirroring::Vertical), 0x405);
        assert_eq!(mirror_nametable_addr(0x1FFF, Mirroring::Horizontal), 0x7FF);
        assert_eq!(mirror_nametable_addr(0x1FFF, Mirroring::FourScreen), 0xFFF);
    }
}
