/*!
Cartridge with iNES (v1) loader for NROM (mapper 0) images.

Features:
- Parse an iNES (v1) header from raw bytes
- Extract PRG ROM and CHR ROM banks at their header-derived offsets
- Determine screen mirroring and trainer presence

Notes:
- Only mapper 0 is accepted; any other id is rejected with `UnsupportedMapper`.
- A non-zero format version field (byte 7 bits 2..3) is rejected with
  `UnsupportedVersion`. This also rejects NES 2.0 headers.
- Reading files from disk is left to the caller; hand the bytes to
  `Cartridge::from_ines_bytes`.
- The cartridge is immutable once parsed. The bus borrows PRG ROM through
  `prg_rom()` and the PPU receives a copy of CHR ROM when attached.
*/

use log::debug;

use crate::error::{NesError, Result};

/// iNES magic tag: "NES" followed by MS-DOS end-of-file.
pub const NES_TAG: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];
pub const PRG_ROM_PAGE_SIZE: usize = 16 * 1024;
pub const CHR_ROM_PAGE_SIZE: usize = 8 * 1024;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Cartridge {
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    mapper: u8,
    mirroring: Mirroring,
    has_trainer: bool,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("mapper", &self.mapper)
            .field("mirroring", &self.mirroring)
            .field("has_trainer", &self.has_trainer)
            .field("prg_rom_len", &self.prg_rom.len())
            .field("chr_rom_len", &self.chr_rom.len())
            .finish()
    }
}

impl Cartridge {
    // -------------- Construction --------------

    /// Parse a cartridge from raw iNES bytes.
    ///
    /// Either the whole image is valid and a cartridge is returned, or an
    /// error describes the first problem found. No partial value escapes.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(NesError::InvalidFormat(format!(
                "{} bytes is too small for an iNES header",
                data.len()
            )));
        }

        if data[0..4] != NES_TAG {
            return Err(NesError::InvalidFormat(
                "missing NES<1A> magic tag".into(),
            ));
        }

        let prg_banks = data[4] as usize;
        let chr_banks = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];

        // Mapper ID: high nibble from flags7 and low nibble from flags6
        let mapper = (flags7 & 0xF0) | (flags6 >> 4);
        if mapper != 0 {
            return Err(NesError::UnsupportedMapper(mapper));
        }

        let version = (flags7 >> 2) & 0b11;
        if version != 0 {
            return Err(NesError::UnsupportedVersion(version));
        }

        let four_screen = (flags6 & 0b0000_1000) != 0;
        let vertical_mirroring = (flags6 & 0b0000_0001) != 0;
        let mirroring = if four_screen {
            Mirroring::FourScreen
        } else if vertical_mirroring {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let has_trainer = (flags6 & 0b0000_0100) != 0;

        if prg_banks == 0 {
            return Err(NesError::InvalidFormat(
                "header declares no PRG ROM banks".into(),
            ));
        }

        let prg_rom_len = prg_banks * PRG_ROM_PAGE_SIZE;
        let chr_rom_len = chr_banks * CHR_ROM_PAGE_SIZE;
        let prg_start = HEADER_LEN + if has_trainer { TRAINER_LEN } else { 0 };
        let chr_start = prg_start + prg_rom_len;

        let prg_rom = slice_section(data, "PRG ROM", prg_start, prg_rom_len)?.to_vec();
        let chr_rom = slice_section(data, "CHR ROM", chr_start, chr_rom_len)?.to_vec();

        debug!(
            "parsed iNES image: mapper={} mirroring={:?} trainer={} prg={}B chr={}B",
            mapper, mirroring, has_trainer, prg_rom_len, chr_rom_len
        );

        Ok(Self {
            prg_rom,
            chr_rom,
            mapper,
            mirroring,
            has_trainer,
        })
    }

    // -------------- Accessors --------------

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    pub fn chr_rom(&self) -> &[u8] {
        &self.chr_rom
    }

    pub fn mapper_id(&self) -> u8 {
        self.mapper
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn has_trainer(&self) -> bool {
        self.has_trainer
    }

    pub fn prg_rom_len(&self) -> usize {
        self.prg_rom.len()
    }

    pub fn chr_len(&self) -> usize {
        self.chr_rom.len()
    }

    /// Read PRG ROM as seen from the CPU window at $8000-$FFFF.
    ///
    /// A single 16 KiB bank (NROM-128) is mirrored into $C000-$FFFF.
    #[inline]
    pub fn read_prg(&self, addr: u16) -> u8 {
        let mut offset = addr.wrapping_sub(0x8000) as usize;
        if self.prg_rom.len() == PRG_ROM_PAGE_SIZE {
            offset %= PRG_ROM_PAGE_SIZE;
        }
        self.prg_rom[offset]
    }
}

fn slice_section<'a>(data: &'a [u8], what: &str, start: usize, len: usize) -> Result<&'a [u8]> {
    data.get(start..start + len).ok_or_else(|| {
        NesError::InvalidFormat(format!(
            "{what} needs bytes {start}..{} but the image has {}",
            start + len,
            data.len()
        ))
    })
}
