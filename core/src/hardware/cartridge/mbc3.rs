//! MBC3 and its calendar accessory. The live counters tick on host
//! wall-clock seconds; the guest only ever sees the latched copies, frozen
//! by a 0 -> 1 write to the latch window.

use nanoserde::{DeBin, SerBin};

use crate::hardware::cartridge::mbc::{ram_enable_value, rom_bank_mask, MemoryBankController};
use crate::hardware::cartridge::{EXTERNAL_RAM_START, RAM_BANK_SIZE, ROM_BANK_SIZE};
use crate::hardware::mmu::INVALID_READ;

/// Register codes selected through the 0x4000 latch when above 0x07.
const RTC_SECONDS: u8 = 0x08;
const RTC_MINUTES: u8 = 0x09;
const RTC_HOURS: u8 = 0x0A;
const RTC_DAYS_LOW: u8 = 0x0B;
const RTC_DAYS_HIGH: u8 = 0x0C;

/// The cartridge clock: five live counters advanced by the host at 1 Hz and
/// five latched shadows the guest reads. Serialized as-is behind the RAM in
/// battery saves, eleven bytes in field order.
#[derive(Debug, Default, Clone, SerBin, DeBin)]
pub struct RealTimeClock {
    pub live_seconds: u8,
    pub live_minutes: u8,
    pub live_hours: u8,
    pub live_days_low: u8,
    pub live_days_high: u8,

    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub days_low: u8,
    pub days_high: u8,

    pub prev_latch_value: u8,
}

impl RealTimeClock {
    /// One wall-clock second. Day-high bit 6 halts the whole chain.
    pub fn tick_second(&mut self) {
        if self.live_days_high & 0x40 != 0 {
            return;
        }

        self.live_seconds = (self.live_seconds + 1) % 60;
        if self.live_seconds == 0 {
            self.tick_minute();
        }
    }

    fn tick_minute(&mut self) {
        self.live_minutes = (self.live_minutes + 1) % 60;
        if self.live_minutes == 0 {
            self.tick_hour();
        }
    }

    fn tick_hour(&mut self) {
        self.live_hours = (self.live_hours + 1) % 24;
        if self.live_hours == 0 {
            self.tick_day();
        }
    }

    fn tick_day(&mut self) {
        self.live_days_low = self.live_days_low.wrapping_add(1);
        if self.live_days_low != 0 {
            return;
        }

        // The day counter is 9 bits; rolling past it latches the overflow
        // bit instead of wrapping silently.
        if self.live_days_high & 0x01 != 0 {
            self.live_days_high |= 0x80;
        } else {
            self.live_days_high |= 0x01;
        }
    }

    /// Latch trigger: a 0 -> 1 transition copies live counters to latched.
    pub fn write_latch(&mut self, value: u8) {
        if self.prev_latch_value == 0x00 && value == 0x01 {
            self.seconds = self.live_seconds;
            self.minutes = self.live_minutes;
            self.hours = self.live_hours;
            self.days_low = self.live_days_low;
            self.days_high = self.live_days_high;
        }
        self.prev_latch_value = value;
    }

    pub fn read_register(&self, code: u8) -> u8 {
        match code {
            RTC_SECONDS => self.seconds,
            RTC_MINUTES => self.minutes,
            RTC_HOURS => self.hours,
            RTC_DAYS_LOW => self.days_low,
            RTC_DAYS_HIGH => self.days_high,
            _ => INVALID_READ,
        }
    }

    /// Register writes land on the live counters, bounded to what the
    /// hardware can hold; the latched copies stay put until the next latch.
    pub fn write_register(&mut self, code: u8, value: u8) {
        match code {
            RTC_SECONDS => self.live_seconds = value % 60,
            RTC_MINUTES => self.live_minutes = value % 60,
            RTC_HOURS => self.live_hours = value % 24,
            RTC_DAYS_LOW => self.live_days_low = value,
            RTC_DAYS_HIGH => self.live_days_high = value & 0xC1,
            _ => {}
        }
    }
}

pub struct Mbc3 {
    ram_enabled: bool,
    rom_bank: u8,
    /// RAM bank number, or an RTC register code when `rtc_selected`.
    upper: u8,
    rtc_selected: bool,
    clock: Option<RealTimeClock>,
    bank_mask: u16,
    rom: Vec<u8>,
    ram: Vec<u8>,
}

impl Mbc3 {
    pub fn new(rom: Vec<u8>, ram: Vec<u8>, banks: u16, has_clock: bool) -> Self {
        Mbc3 {
            ram_enabled: false,
            rom_bank: 1,
            upper: 0,
            rtc_selected: false,
            clock: if has_clock { Some(RealTimeClock::default()) } else { None },
            bank_mask: rom_bank_mask(banks),
            rom,
            ram,
        }
    }

    fn ram_index(&self, address: u16) -> usize {
        let index = (address - EXTERNAL_RAM_START) as usize + self.upper as usize * RAM_BANK_SIZE;
        index % self.ram.len()
    }
}

impl MemoryBankController for Mbc3 {
    fn read_0000_3fff(&self, address: u16) -> u8 {
        self.rom[address as usize]
    }

    fn read_4000_7fff(&self, address: u16) -> u8 {
        let bank = if self.rom_bank == 0 { 1 } else { self.rom_bank as u16 };
        let offset = (bank & self.bank_mask) as usize * ROM_BANK_SIZE;
        self.rom[offset + (address - ROM_BANK_SIZE as u16) as usize]
    }

    fn read_external_ram(&self, address: u16) -> u8 {
        if self.rtc_selected {
            return match &self.clock {
                Some(clock) => clock.read_register(self.upper),
                None => INVALID_READ,
            };
        }

        if !self.ram_enabled {
            return INVALID_READ;
        }
        self.ram[self.ram_index(address)]
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        match address {
            0x0000..=0x1FFF => self.ram_enabled = ram_enable_value(value),
            0x2000..=0x3FFF => self.rom_bank = value & 0x7F,
            0x4000..=0x5FFF => {
                self.upper = value & 0x0F;
                self.rtc_selected = value > 0x07;
            }
            0x6000..=0x7FFF => {
                if let Some(clock) = self.clock.as_mut() {
                    clock.write_latch(value);
                }
            }
            0xA000..=0xBFFF => {
                if !self.ram_enabled {
                    return;
                }
                if self.rtc_selected {
                    if let Some(clock) = self.clock.as_mut() {
                        clock.write_register(self.upper, value);
                    }
                    return;
                }
                let index = self.ram_index(address);
                self.ram[index] = value;
            }
            _ => {}
        }
    }

    fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    fn clock(&self) -> Option<&RealTimeClock> {
        self.clock.as_ref()
    }

    fn clock_mut(&mut self) -> Option<&mut RealTimeClock> {
        self.clock.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mbc_with_clock() -> Mbc3 {
        Mbc3::new(vec![0; 4 * ROM_BANK_SIZE], vec![0; RAM_BANK_SIZE], 4, true)
    }

    #[test]
    fn latch_freezes_counters() {
        let mut mbc = mbc_with_clock();
        for _ in 0..61 {
            mbc.clock_mut().unwrap().tick_second();
        }

        mbc.write_byte(0x4000, RTC_SECONDS);
        // Nothing latched yet.
        assert_eq!(mbc.read_external_ram(0xA000), 0);

        mbc.write_byte(0x6000, 0x00);
        mbc.write_byte(0x6000, 0x01);
        assert_eq!(mbc.read_external_ram(0xA000), 1);
        mbc.write_byte(0x4000, RTC_MINUTES);
        assert_eq!(mbc.read_external_ram(0xA000), 1);

        // Repeating the high value without a 0 in between does nothing.
        mbc.clock_mut().unwrap().tick_second();
        mbc.write_byte(0x6000, 0x01);
        mbc.write_byte(0x4000, RTC_SECONDS);
        assert_eq!(mbc.read_external_ram(0xA000), 1);
    }

    #[test]
    fn halt_bit_freezes_ticks() {
        let mut mbc = mbc_with_clock();
        mbc.write_byte(0x0000, 0x0A);
        mbc.write_byte(0x4000, RTC_DAYS_HIGH);
        mbc.write_byte(0xA000, 0x40);

        mbc.clock_mut().unwrap().tick_second();
        assert_eq!(mbc.clock().unwrap().live_seconds, 0);
    }

    #[test]
    fn day_overflow_sets_carry() {
        let mut clock = RealTimeClock::default();
        clock.live_days_low = 0xFF;
        clock.live_days_high = 0x01;
        clock.live_hours = 23;
        clock.live_minutes = 59;
        clock.live_seconds = 59;

        clock.tick_second();
        assert_eq!(clock.live_days_low, 0);
        assert_eq!(clock.live_days_high & 0x80, 0x80);
    }

    #[test]
    fn ram_and_rtc_share_the_window() {
        let mut mbc = mbc_with_clock();
        mbc.write_byte(0x0000, 0x0A);

        mbc.write_byte(0x4000, 0x02);
        mbc.write_byte(0xA000, 0x5A);
        assert_eq!(mbc.read_external_ram(0xA000), 0x5A);

        mbc.write_byte(0x4000, RTC_HOURS);
        mbc.write_byte(0xA000, 30);
        // Bounded mod 24, written to the live counter, visible after a latch.
        mbc.write_byte(0x6000, 0x00);
        mbc.write_byte(0x6000, 0x01);
        assert_eq!(mbc.read_external_ram(0xA000), 6);

        mbc.write_byte(0x4000, 0x02);
        assert_eq!(mbc.read_external_ram(0xA000), 0x5A);
    }
}
