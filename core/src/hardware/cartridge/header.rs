use std::fmt;
use std::str::from_utf8;

use crate::EmulatorError;

pub const HEADER_START: u16 = 0x0100;
pub const HEADER_END: u16 = 0x014F;

/// The decoded cartridge header, read once at load time.
#[derive(Debug, Default, Clone)]
pub struct CartridgeHeader {
    /// Upper case ASCII, 15 bytes, zero padded when shorter.
    pub title: String,
    /// 0x80 or 0xC0 at 0x143 marks a color-capable image.
    pub cgb_flag: bool,
    /// Two character ASCII code, newer games only.
    pub new_licensee_code: u16,
    /// Which memory bank controller (if any) sits in the cartridge.
    pub cartridge_type: u8,
    /// ROM size code, bank count is `2 << code`.
    pub rom_size: u8,
    /// External RAM size code.
    pub ram_size: u8,
    /// Destination code, 0x00 for the Japanese market.
    pub is_japanese: bool,
    pub old_licensee_code: u8,
    pub version: u8,
    /// Checksum over 0x134..=0x14C, verified at load.
    pub header_checksum: u8,
}

impl CartridgeHeader {
    pub fn new(rom: &[u8]) -> Result<Self, EmulatorError> {
        if rom.len() <= HEADER_END as usize {
            return Err(EmulatorError::RomTooSmall(rom.len()));
        }

        let computed = compute_header_checksum(rom);
        let expected = rom[0x14D];
        if computed != expected {
            return Err(EmulatorError::HeaderChecksum { expected, computed });
        }

        Ok(CartridgeHeader {
            title: read_title(rom),
            cgb_flag: matches!(rom[0x143], 0x80 | 0xC0),
            new_licensee_code: (rom[0x144] as u16) << 8 | rom[0x145] as u16,
            cartridge_type: rom[0x147],
            rom_size: rom[0x148],
            ram_size: rom[0x149],
            is_japanese: rom[0x14A] == 0x00,
            old_licensee_code: rom[0x14B],
            version: rom[0x14C],
            header_checksum: expected,
        })
    }

    /// ROM bank count implied by the size code, 16 KiB per bank.
    pub fn rom_banks(&self) -> u16 {
        match self.rom_size {
            0x00..=0x08 => 2 << self.rom_size,
            _ => 2,
        }
    }

    /// External RAM bank count, 8 KiB per bank.
    pub fn ram_banks(&self) -> u8 {
        match self.ram_size {
            0x02 => 1,
            0x03 => 4,
            0x04 => 16,
            0x05 => 8,
            _ => 0,
        }
    }
}

impl fmt::Display for CartridgeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (type {:#04X}, {} ROM banks, {} RAM banks, v{}{})",
            self.title,
            self.cartridge_type,
            self.rom_banks(),
            self.ram_banks(),
            self.version,
            if self.cgb_flag { ", CGB" } else { "" }
        )
    }
}

fn read_title(rom: &[u8]) -> String {
    // 15 bytes; color images reuse the tail for the CGB flag so anything
    // non-ASCII is simply trimmed away.
    let slice = &rom[0x134..0x143];
    let end = slice.iter().position(|&b| b == 0 || b >= 0x80).unwrap_or(slice.len());

    from_utf8(&slice[..end]).unwrap_or("").trim().to_owned()
}

/// `x = 0; for i in 0x134..=0x14C { x = x - rom[i] - 1 }`
fn compute_header_checksum(rom: &[u8]) -> u8 {
    rom[0x134..=0x14C]
        .iter()
        .fold(0u8, |x, &byte| x.wrapping_sub(byte).wrapping_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_rom;

    #[test]
    fn decodes_title_and_sizes() {
        let rom = test_rom(0x01, 0x04, 0x03);
        let header = CartridgeHeader::new(&rom).unwrap();

        assert_eq!(header.title, "TEST");
        assert_eq!(header.rom_banks(), 32);
        assert_eq!(header.ram_banks(), 4);
        assert!(!header.cgb_flag);
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut rom = test_rom(0x00, 0x00, 0x00);
        rom[0x14D] ^= 0xFF;

        match CartridgeHeader::new(&rom) {
            Err(EmulatorError::HeaderChecksum { .. }) => {}
            other => panic!("expected checksum failure, got {:?}", other),
        }
    }

    #[test]
    fn rejects_truncated_image() {
        assert!(matches!(
            CartridgeHeader::new(&[0u8; 0x100]),
            Err(EmulatorError::RomTooSmall(0x100))
        ));
    }
}
