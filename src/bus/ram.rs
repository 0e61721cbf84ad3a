/*!
Internal work RAM of the console.

2 KiB of storage decoded at $0000-$1FFF, so every cell appears at four
CPU addresses ($0000, $0800, $1000, $1800 + offset). Only the low 11
address bits select a cell. The bus decodes the window before calling in
here, so these accessors never fail.
*/

/// Physical size of work RAM.
pub const RAM_SIZE: usize = 0x0800;

const RAM_ADDR_MASK: u16 = (RAM_SIZE as u16) - 1;

#[derive(Debug, Clone)]
pub struct Ram {
    cells: [u8; RAM_SIZE],
}

impl Default for Ram {
    fn default() -> Self {
        Ram {
            cells: [0; RAM_SIZE],
        }
    }
}

impl Ram {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.cells[Self::mirror_index(addr)]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        self.cells[Self::mirror_index(addr)] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Copy `bytes` to physical offset `start`. Nothing is written and
    /// `false` comes back when the block would not fit.
    pub fn load(&mut self, start: usize, bytes: &[u8]) -> bool {
        let Some(end) = start.checked_add(bytes.len()) else {
            return false;
        };
        match self.cells.get_mut(start..end) {
            Some(dst) => {
                dst.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// Physical cell for any address in the RAM window.
    #[inline]
    pub fn mirror_index(addr: u16) -> usize {
        (addr & RAM_ADDR_MASK) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let ram = Ram::new();
        assert_eq!(ram.as_slice().len(), RAM_SIZE);
        assert!(ram.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn four_aliases_per_cell() {
        let mut ram = Ram::new();
        ram.write(0x1234, 0x5A);
        for alias in [0x0234u16, 0x0A34, 0x1234, 0x1A34] {
            assert_eq!(ram.read(alias), 0x5A);
        }
        assert_eq!(Ram::mirror_index(0x1FFF), 0x07FF);
    }

    #[test]
    fn load_rejects_overflow() {
        let mut ram = Ram::new();
        assert!(ram.load(0x7FE, &[1, 2]));
        assert_eq!(ram.read(0x07FF), 2);
        assert!(!ram.load(0x7FF, &[3, 4]));
        assert_eq!(ram.read(0x07FF), 2);
        assert!(!ram.load(usize::MAX, &[1]));
    }
}
