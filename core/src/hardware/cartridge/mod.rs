//! Cartridge plumbing: header decoding, mapper selection, and the
//! battery-save snapshot format (RAM bytes followed by the eleven-byte
//! clock block when the cartridge carries one).

use std::fmt;

use log::*;
use nanoserde::{DeBin, SerBin};

use crate::hardware::cartridge::header::CartridgeHeader;
use crate::hardware::cartridge::mbc::{Mbc1, Mbc2, Mbc5, MemoryBankController, RomOnly};
use crate::hardware::cartridge::mbc3::{Mbc3, RealTimeClock};
use crate::EmulatorError;

pub mod header;
pub mod mbc;
pub mod mbc3;

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const RAM_BANK_SIZE: usize = 0x2000;
pub const EXTERNAL_RAM_START: u16 = 0xA000;

pub struct Cartridge {
    header: CartridgeHeader,
    mbc: Box<dyn MemoryBankController>,
    file_name: String,
}

impl Cartridge {
    pub fn new(rom: &[u8], file_name: &str) -> Result<Self, EmulatorError> {
        let header = CartridgeHeader::new(rom)?;

        let expected_len = header.rom_banks() as usize * ROM_BANK_SIZE;
        if rom.len() != expected_len {
            return Err(EmulatorError::RomSizeMismatch {
                expected: expected_len,
                actual: rom.len(),
            });
        }

        // A zero-bank cartridge still gets one RAM bank allocated so the
        // mappers never have to bounds check.
        let ram_banks = header.ram_banks().max(1) as usize;
        let ram = vec![0u8; ram_banks * RAM_BANK_SIZE];
        let rom = rom.to_vec();
        let banks = header.rom_banks();

        let mbc: Box<dyn MemoryBankController> = match header.cartridge_type {
            0x00 => Box::new(RomOnly::new(rom)),
            0x01..=0x03 => Box::new(Mbc1::new(rom, ram, banks)),
            0x05 | 0x06 => Box::new(Mbc2::new(rom, banks)),
            0x0F | 0x10 => Box::new(Mbc3::new(rom, ram, banks, true)),
            0x11..=0x13 => Box::new(Mbc3::new(rom, ram, banks, false)),
            0x19..=0x1E => Box::new(Mbc5::new(rom, ram, banks)),
            other => return Err(EmulatorError::UnsupportedMapper(other)),
        };

        info!("Loaded cartridge {:?}: {}", file_name, header);

        Ok(Cartridge {
            header,
            mbc,
            file_name: file_name.to_owned(),
        })
    }

    #[inline]
    pub fn read_0000_3fff(&self, address: u16) -> u8 {
        self.mbc.read_0000_3fff(address)
    }

    #[inline]
    pub fn read_4000_7fff(&self, address: u16) -> u8 {
        self.mbc.read_4000_7fff(address)
    }

    #[inline]
    pub fn read_external_ram(&self, address: u16) -> u8 {
        self.mbc.read_external_ram(address)
    }

    #[inline]
    pub fn write_byte(&mut self, address: u16, value: u8) {
        self.mbc.write_byte(address, value)
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn is_cgb(&self) -> bool {
        self.header.cgb_flag
    }

    /// One wall-clock second for the cartridge clock, if there is one.
    pub fn rtc_tick_second(&mut self) {
        if let Some(clock) = self.mbc.clock_mut() {
            clock.tick_second();
        }
    }

    /// Battery snapshot: external RAM verbatim, then the clock block.
    pub fn save_data(&self) -> Vec<u8> {
        let mut data = self.mbc.ram().to_vec();
        if let Some(clock) = self.mbc.clock() {
            data.extend(SerBin::serialize_bin(clock));
        }
        data
    }

    /// Restore a battery snapshot. RAM-only blobs (from carts without a
    /// clock, or older saves) are accepted; trailing garbage is ignored.
    pub fn load_data(&mut self, data: &[u8]) {
        let ram = self.mbc.ram_mut();
        let len = ram.len().min(data.len());
        ram[..len].copy_from_slice(&data[..len]);

        let remainder = &data[len..];
        if let Some(clock) = self.mbc.clock_mut() {
            if let Ok(restored) = <RealTimeClock as DeBin>::deserialize_bin(remainder) {
                *clock = restored;
            }
        }
    }
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cartridge({:?}: {})", self.file_name, self.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_rom;

    #[test]
    fn selects_mapper_from_type_code() {
        let rom = test_rom(0x00, 0x00, 0x00);
        assert!(Cartridge::new(&rom, "rom_only.gb").is_ok());

        let rom = test_rom(0x1B, 0x04, 0x03);
        assert!(Cartridge::new(&rom, "mbc5.gb").is_ok());

        let rom = test_rom(0x20, 0x00, 0x00);
        assert!(matches!(
            Cartridge::new(&rom, "mbc6.gb"),
            Err(EmulatorError::UnsupportedMapper(0x20))
        ));
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut rom = test_rom(0x00, 0x01, 0x00);
        rom.truncate(2 * ROM_BANK_SIZE);
        crate::test_util::finalize_header(&mut rom);

        assert!(matches!(
            Cartridge::new(&rom, "short.gb"),
            Err(EmulatorError::RomSizeMismatch { .. })
        ));
    }

    #[test]
    fn save_round_trip_is_identity() {
        let rom = test_rom(0x10, 0x00, 0x02);
        let mut cartridge = Cartridge::new(&rom, "clocked.gb").unwrap();

        cartridge.write_byte(0x0000, 0x0A);
        cartridge.write_byte(0x4000, 0x00);
        cartridge.write_byte(0xA000, 0x42);
        cartridge.rtc_tick_second();

        let saved = cartridge.save_data();
        assert_eq!(saved.len(), RAM_BANK_SIZE + 11);

        cartridge.load_data(&saved);
        let resaved = cartridge.save_data();
        assert_eq!(saved, resaved);
        assert_eq!(cartridge.read_external_ram(0xA000), 0x42);
    }

    #[test]
    fn ram_only_save_loads_into_clocked_cart() {
        let rom = test_rom(0x10, 0x00, 0x02);
        let mut cartridge = Cartridge::new(&rom, "clocked.gb").unwrap();

        cartridge.load_data(&vec![0x11u8; RAM_BANK_SIZE]);
        cartridge.write_byte(0x0000, 0x0A);
        assert_eq!(cartridge.read_external_ram(0xA000), 0x11);
    }
}
