//! The 64 KiB dispatch fabric. Every bus access from the CPU and the
//! transfer engines funnels through here; component-owned registers get
//! their side effects applied on the way through, everything else lands in
//! the raw page.

use log::*;

use crate::hardware::apu::{Apu, AUDIO_END, AUDIO_START, WAVE_RAM_END, WAVE_RAM_START};
use crate::hardware::cartridge::Cartridge;
use crate::hardware::mmu::dma::{OamDma, VramDma};
use crate::hardware::ppu::register_flags::Mode;
use crate::hardware::ppu::Ppu;
use crate::io::interrupts::{InterruptFlags, Interrupts, INTERRUPT_ENABLE, INTERRUPT_FLAG};
use crate::io::joypad::{Joypad, JOYPAD_REGISTER};
use crate::io::timer::{SystemClock, DIVIDER_REGISTER, TIMER_CONTROL, TIMER_COUNTER, TIMER_MODULO};

pub mod dma;

pub const MEMORY_SIZE: usize = 0x10000;
/// 16 KB ROM bank 00, from the cartridge, read-only.
pub const ROM_BANK_00_START: u16 = 0x0000;
pub const ROM_BANK_00_END: u16 = 0x3FFF;
/// 16 KB switchable ROM bank, read-only.
pub const ROM_BANK_NN_START: u16 = 0x4000;
pub const ROM_BANK_NN_END: u16 = 0x7FFF;
/// 8 KB of VRAM, two banks in CGB mode.
pub const VRAM_START: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;
/// 8 KB of external (cartridge) RAM, possibly battery backed.
pub const EXTERNAL_RAM_START: u16 = 0xA000;
pub const EXTERNAL_RAM_END: u16 = 0xBFFF;
/// 4 KB static work RAM.
pub const WRAM_STATIC_START: u16 = 0xC000;
pub const WRAM_STATIC_END: u16 = 0xCFFF;
/// 4 KB banked work RAM, bank 1-7 selected by SVBK on CGB.
pub const WRAM_BANKED_START: u16 = 0xD000;
pub const WRAM_BANKED_END: u16 = 0xDFFF;
/// Mirror of 0xC000-0xDDFF.
pub const ECHO_RAM_START: u16 = 0xE000;
pub const ECHO_RAM_END: u16 = 0xFDFF;
pub const ECHO_RAM_OFFSET: u16 = 0x2000;
/// Object attribute memory, 40 entries of 4 bytes.
pub const OAM_START: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFE9F;
pub const NOT_USABLE_START: u16 = 0xFEA0;
pub const NOT_USABLE_END: u16 = 0xFEFF;
pub const IO_START: u16 = 0xFF00;
pub const IO_END: u16 = 0xFF7F;
pub const HRAM_START: u16 = 0xFF80;
pub const HRAM_END: u16 = 0xFFFE;

/// OAM DMA source-page register.
pub const DMA_TRANSFER: u16 = 0xFF46;
/// CGB speed-switch register: bit 7 current speed, bit 0 armed request.
pub const KEY1: u16 = 0xFF4D;
/// CGB VRAM DMA source/destination/control.
pub const HDMA1: u16 = 0xFF51;
pub const HDMA2: u16 = 0xFF52;
pub const HDMA3: u16 = 0xFF53;
pub const HDMA4: u16 = 0xFF54;
pub const HDMA5: u16 = 0xFF55;
/// CGB WRAM bank select.
pub const SVBK: u16 = 0xFF70;

/// Open bus: what a blocked or unmapped read returns.
pub const INVALID_READ: u8 = 0xFF;

const WRAM_BANK_SIZE: usize = 0x1000;

pub struct Memory {
    /// Raw backing page for I/O defaults, HRAM, and the unusable strip.
    memory: Box<[u8; MEMORY_SIZE]>,
    wram: Box<[[u8; WRAM_BANK_SIZE]; 8]>,

    pub cartridge: Cartridge,
    pub ppu: Ppu,
    pub apu: Apu,
    pub clock: SystemClock,
    pub joypad: Joypad,
    pub interrupts: Interrupts,
    pub dma: OamDma,
    pub hdma: VramDma,

    cgb: bool,
}

impl Memory {
    pub fn new(cartridge: Cartridge) -> Self {
        let cgb = cartridge.is_cgb();
        Memory {
            memory: Box::new([0; MEMORY_SIZE]),
            wram: Box::new([[0; WRAM_BANK_SIZE]; 8]),
            ppu: Ppu::new(cgb),
            apu: Apu::new(),
            clock: SystemClock::new(),
            joypad: Joypad::new(),
            interrupts: Interrupts::default(),
            dma: OamDma::default(),
            hdma: VramDma::default(),
            cartridge,
            cgb,
        }
    }

    #[inline]
    pub fn is_cgb(&self) -> bool {
        self.cgb
    }

    /// Current speed as reflected in KEY1 bit 7.
    #[inline]
    pub fn double_speed(&self) -> bool {
        self.memory[KEY1 as usize] & 0x80 != 0
    }

    fn wram_bank(&self) -> usize {
        if !self.cgb {
            return 1;
        }
        let bank = (self.memory[SVBK as usize] & 0x07) as usize;
        bank.max(1)
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        match address {
            ROM_BANK_00_START..=ROM_BANK_00_END => self.cartridge.read_0000_3fff(address),
            ROM_BANK_NN_START..=ROM_BANK_NN_END => self.cartridge.read_4000_7fff(address),
            VRAM_START..=VRAM_END => self.ppu.read_vram(address),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.cartridge.read_external_ram(address),
            WRAM_STATIC_START..=WRAM_STATIC_END => self.wram[0][(address - WRAM_STATIC_START) as usize],
            WRAM_BANKED_START..=WRAM_BANKED_END => {
                self.wram[self.wram_bank()][(address - WRAM_BANKED_START) as usize]
            }
            ECHO_RAM_START..=ECHO_RAM_END => self.read_byte(address - ECHO_RAM_OFFSET),
            OAM_START..=OAM_END => self.ppu.read_oam(address),
            NOT_USABLE_START..=NOT_USABLE_END => {
                warn!("Guest read of the unusable strip: {:04X}", address);
                self.memory[address as usize]
            }
            IO_START..=IO_END => self.read_io_byte(address),
            HRAM_START..=HRAM_END => self.memory[address as usize],
            INTERRUPT_ENABLE => self.interrupts.read_enable(),
        }
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        match address {
            ROM_BANK_00_START..=ROM_BANK_NN_END => self.cartridge.write_byte(address, value),
            VRAM_START..=VRAM_END => self.ppu.write_vram(address, value),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.cartridge.write_byte(address, value),
            WRAM_STATIC_START..=WRAM_STATIC_END => {
                self.wram[0][(address - WRAM_STATIC_START) as usize] = value
            }
            WRAM_BANKED_START..=WRAM_BANKED_END => {
                let bank = self.wram_bank();
                self.wram[bank][(address - WRAM_BANKED_START) as usize] = value;
            }
            ECHO_RAM_START..=ECHO_RAM_END => self.write_byte(address - ECHO_RAM_OFFSET, value),
            OAM_START..=OAM_END => self.ppu.write_oam(address, value),
            NOT_USABLE_START..=NOT_USABLE_END => self.memory[address as usize] = value,
            IO_START..=IO_END => self.write_io_byte(address, value),
            HRAM_START..=HRAM_END => self.memory[address as usize] = value,
            INTERRUPT_ENABLE => self.interrupts.write_enable(value),
        }
    }

    fn read_io_byte(&self, address: u16) -> u8 {
        use crate::hardware::ppu::*;

        match address {
            JOYPAD_REGISTER => self.joypad.read(),
            DIVIDER_REGISTER => self.clock.divider(),
            TIMER_COUNTER => self.clock.tima,
            TIMER_MODULO => self.clock.tma,
            TIMER_CONTROL => 0xF8 | self.clock.tac,
            INTERRUPT_FLAG => self.interrupts.read_flag(),
            AUDIO_START..=AUDIO_END => self.apu.read_register(address),
            WAVE_RAM_START..=WAVE_RAM_END => self.apu.read_wave_ram(address),
            DMA_TRANSFER => self.memory[address as usize],
            KEY1 if self.cgb => 0x7E | self.memory[address as usize],
            HDMA5 if self.cgb => self.read_hdma5(),
            SVBK if self.cgb => 0xF8 | self.memory[address as usize],
            LCD_CONTROL_REGISTER..=WX_REGISTER
            | VRAM_BANK_SELECT
            | BG_PALETTE_INDEX..=OB_PALETTE_DATA => self.ppu.read_register(address),
            _ => self.memory[address as usize],
        }
    }

    fn write_io_byte(&mut self, address: u16, value: u8) {
        use crate::hardware::ppu::*;

        match address {
            JOYPAD_REGISTER => self.joypad.write(value),
            DIVIDER_REGISTER => {
                let double_speed = self.double_speed();
                if self.clock.write_divider(double_speed) {
                    self.apu.frame_sequencer_step();
                }
            }
            TIMER_COUNTER => self.clock.write_tima(value),
            TIMER_MODULO => self.clock.write_tma(value),
            TIMER_CONTROL => self.clock.write_tac(value),
            INTERRUPT_FLAG => self.interrupts.write_flag(value),
            AUDIO_START..=AUDIO_END => self.apu.write_register(address, value),
            WAVE_RAM_START..=WAVE_RAM_END => self.apu.write_wave_ram(address, value),
            DMA_TRANSFER => self.start_dma(value),
            // The guest can only arm the speed switch; bit 7 belongs to the
            // CPU's STOP handshake.
            KEY1 if self.cgb => {
                self.memory[KEY1 as usize] = (self.memory[KEY1 as usize] & 0x80) | (value & 0x01)
            }
            HDMA5 if self.cgb => self.start_hdma(value),
            LCD_CONTROL_REGISTER..=WX_REGISTER
            | VRAM_BANK_SELECT
            | BG_PALETTE_INDEX..=OB_PALETTE_DATA => {
                self.ppu.write_register(address, value, &mut self.interrupts)
            }
            _ => self.memory[address as usize] = value,
        }
    }

    /// One PPU dot; fires the pending HBlank HDMA block on the HBlank edge.
    pub fn ppu_dot(&mut self) -> bool {
        let previous_mode = self.ppu.mode();
        let frame_ready = self.ppu.dot(&mut self.interrupts);

        if self.ppu.mode() == Mode::HBlank && previous_mode != Mode::HBlank {
            self.hdma_hblank_trigger();
        }

        frame_ready
    }

    #[inline]
    pub fn apu_dot(&mut self) {
        self.apu.dot();
    }

    /// Timer overflow automaton, one machine cycle, ahead of the CPU.
    pub fn timer_overflow_cycle(&mut self) {
        if self.clock.overflow_cycle() {
            self.interrupts.request(InterruptFlags::TIMER);
        }
    }

    /// Divider increment at the tail of the machine cycle; may pulse the
    /// APU frame sequencer.
    pub fn sys_increment(&mut self, double_speed: bool) {
        if self.clock.increment(double_speed) {
            self.apu.frame_sequencer_step();
        }
    }

    /// CPU-side KEY1 update during the STOP speed switch.
    pub fn write_key1_raw(&mut self, value: u8) {
        self.memory[KEY1 as usize] = value;
    }

    pub fn press_button(&mut self, button: crate::io::joypad::Button, pressed: bool) {
        if self.joypad.set_button(button, pressed) {
            self.interrupts.request(InterruptFlags::JOYPAD);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_rom;

    pub fn test_memory() -> Memory {
        let rom = test_rom(0x00, 0x00, 0x00);
        Memory::new(Cartridge::new(&rom, "test.gb").unwrap())
    }

    fn cgb_memory() -> Memory {
        let mut rom = test_rom(0x00, 0x00, 0x00);
        crate::test_util::make_cgb(&mut rom);
        Memory::new(Cartridge::new(&rom, "test.gbc").unwrap())
    }

    #[test]
    fn echo_ram_mirrors_wram() {
        let mut memory = test_memory();

        memory.write_byte(0xC123, 0x5A);
        assert_eq!(memory.read_byte(0xE123), 0x5A);

        memory.write_byte(0xFDFF, 0xA5);
        assert_eq!(memory.read_byte(0xDDFF), 0xA5);
    }

    #[test]
    fn wram_bank_zero_selects_one() {
        let mut memory = cgb_memory();

        memory.write_byte(SVBK, 0x02);
        memory.write_byte(0xD000, 0x22);

        memory.write_byte(SVBK, 0x00);
        memory.write_byte(0xD000, 0x11);

        // SVBK 0 and 1 are the same bank.
        memory.write_byte(SVBK, 0x01);
        assert_eq!(memory.read_byte(0xD000), 0x11);

        memory.write_byte(SVBK, 0x02);
        assert_eq!(memory.read_byte(0xD000), 0x22);
    }

    #[test]
    fn interrupt_flag_upper_bits_forced() {
        let mut memory = test_memory();
        memory.write_byte(0xFF0F, 0x01);
        assert_eq!(memory.read_byte(0xFF0F), 0xE1);
    }

    #[test]
    fn hram_round_trips() {
        let mut memory = test_memory();
        memory.write_byte(0xFF85, 0x77);
        assert_eq!(memory.read_byte(0xFF85), 0x77);
    }

    #[test]
    fn key1_guest_writes_only_arm() {
        let mut memory = cgb_memory();
        memory.write_byte(KEY1, 0xFF);
        assert_eq!(memory.read_byte(KEY1), 0x7F);
        assert!(!memory.double_speed());

        memory.write_key1_raw(0x80);
        assert!(memory.double_speed());
        assert_eq!(memory.read_byte(KEY1), 0xFE);
    }

    #[test]
    fn dmg_ignores_cgb_registers() {
        let mut memory = test_memory();
        memory.write_byte(SVBK, 0x03);
        memory.write_byte(0xD000, 0x42);
        // SVBK is inert on DMG: banked WRAM stays on bank 1.
        memory.write_byte(SVBK, 0x05);
        assert_eq!(memory.read_byte(0xD000), 0x42);
    }
}
