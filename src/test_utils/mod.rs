//! iNES image builders shared by the unit tests.
//!
//! Images are mapper 0 (NROM) with a v1 header. PRG banks are filled with
//! 0xAA and CHR banks with 0xCC so a test can tell which ROM a byte came
//! from. The trainer, when present, sits between header and PRG.

#![allow(dead_code)]

pub const PRG_BANK: usize = 16 * 1024;
pub const CHR_BANK: usize = 8 * 1024;

/// Offset of the reset vector inside a single 16 KiB PRG bank.
const RESET_VECTOR_OFFSET: usize = 0x3FFC;

/// Header + optional trainer + `prg_16k` PRG banks + `chr_8k` CHR banks.
pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let header: [u8; 16] = [
        b'N',
        b'E',
        b'S',
        0x1A,
        prg_16k as u8,
        chr_8k as u8,
        flags6,
        flags7,
        0,
        0,
        0,
        0,
        0,
        0,
        0,
        0,
    ];

    let mut rom = header.to_vec();
    if let Some(t) = trainer {
        rom.extend_from_slice(t);
    }
    rom.resize(rom.len() + prg_16k * PRG_BANK, 0xAA);
    rom.resize(rom.len() + chr_8k * CHR_BANK, 0xCC);
    rom
}

/// One PRG bank holding `prg` at $8000 and a reset vector pointing at
/// `reset` ($8000 when `None`), plus one CHR bank.
pub fn build_nrom_with_prg(prg: &[u8], reset: Option<u16>) -> Vec<u8> {
    assert!(
        prg.len() <= RESET_VECTOR_OFFSET,
        "program overlaps the reset vector"
    );

    let mut rom = build_ines(1, 1, 0, 0, None);
    let bank = &mut rom[16..16 + PRG_BANK];
    bank[..prg.len()].copy_from_slice(prg);
    bank[RESET_VECTOR_OFFSET..RESET_VECTOR_OFFSET + 2]
        .copy_from_slice(&reset.unwrap_or(0x8000).to_le_bytes());
    rom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fields_and_length() {
        let rom = build_ines(2, 1, 0x01, 0x00, None);
        assert_eq!(&rom[..8], &[0x4E, 0x45, 0x53, 0x1A, 2, 1, 0x01, 0x00]);
        assert_eq!(rom.len(), 16 + 2 * PRG_BANK + CHR_BANK);
        assert_eq!(rom[16], 0xAA);
        assert_eq!(rom[16 + 2 * PRG_BANK], 0xCC);
    }

    #[test]
    fn trainer_precedes_prg() {
        let trainer = [0x77u8; 512];
        let rom = build_ines(1, 0, 0x04, 0, Some(&trainer));
        assert_eq!(rom[16], 0x77);
        assert_eq!(rom[16 + 512], 0xAA);
        assert_eq!(rom.len(), 16 + 512 + PRG_BANK);
    }

    #[test]
    fn nrom_program_and_reset_vector() {
        let rom = build_nrom_with_prg(&[0xA9, 0x01, 0x00], Some(0x8010));
        assert_eq!(&rom[16..19], &[0xA9, 0x01, 0x00]);
        assert_eq!(rom[16 + 0x3FFC], 0x10);
        assert_eq!(rom[16 + 0x3FFD], 0x80);
    }
}
