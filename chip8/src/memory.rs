use crate::error::{Fault, LoadError};
use crate::font::{FONT, FONT_START_ADDRESS};

pub const MEMORY_SIZE: usize = 4096;
/// Programs are loaded here. Everything below is reserved for the interpreter.
pub const ROM_START_ADDRESS: usize = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - ROM_START_ADDRESS;

/// Flat 4KB byte store with bounds-checked access.
///
/// Nothing here wraps: an address past the end is always a
/// [`Fault::OutOfBounds`].
#[derive(Clone)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    /// Creates zeroed memory with the font installed.
    pub fn new() -> Self {
        let mut memory = Self {
            bytes: [0; MEMORY_SIZE],
        };
        memory.load_font(&FONT);
        memory
    }

    /// Zeroes everything and reinstalls the font.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn read_byte(&self, addr: u16) -> Result<u8, Fault> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(Fault::OutOfBounds { address: addr })
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), Fault> {
        *self
            .bytes
            .get_mut(addr as usize)
            .ok_or(Fault::OutOfBounds { address: addr })? = value;
        Ok(())
    }

    /// Reads the big-endian instruction word at `addr`.
    pub fn read_word(&self, addr: u16) -> Result<u16, Fault> {
        let bytes = self.slice(addr, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Borrows `len` bytes starting at `addr`.
    ///
    /// The fault reports the first address that does not exist.
    pub fn slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault> {
        let range = Self::range(addr, len)?;
        Ok(&self.bytes[range])
    }

    pub fn slice_mut(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Fault> {
        let range = Self::range(addr, len)?;
        Ok(&mut self.bytes[range])
    }

    /// Copies `rom` to [`ROM_START_ADDRESS`].
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        let rom_end = ROM_START_ADDRESS + rom.len();
        self.bytes
            .get_mut(ROM_START_ADDRESS..rom_end)
            .ok_or(LoadError::RomTooLarge {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            })?
            .copy_from_slice(rom);

        Ok(())
    }

    /// Copies font data into the reserved low region.
    ///
    /// Panics if `data` does not fit below [`ROM_START_ADDRESS`].
    pub fn load_font(&mut self, data: &[u8]) {
        let font_end = FONT_START_ADDRESS + data.len();
        assert!(
            font_end <= ROM_START_ADDRESS,
            "font data must fit in the reserved region"
        );
        self.bytes[FONT_START_ADDRESS..font_end].copy_from_slice(data);
    }

    fn range(addr: u16, len: usize) -> Result<std::ops::Range<usize>, Fault> {
        let start = addr as usize;
        let end = start + len;
        if end > MEMORY_SIZE {
            let address = start.max(MEMORY_SIZE) as u16;
            return Err(Fault::OutOfBounds { address });
        }
        Ok(start..end)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
