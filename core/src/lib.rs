//! Cycle-accurate emulation core for the color handheld: CPU, memory
//! fabric, PPU, APU, timer and cartridge mappers, driven one dot at a time
//! through [`Emulator::tick`]. Frontend concerns (windowing, audio devices,
//! input mapping, save files) stay on the host side of the API.

pub mod emulator;
pub mod hardware;
pub mod io;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_util;

pub use crate::emulator::{EmulationMode, Emulator, SYSTEM_CLOCK_FREQUENCY};
pub use crate::hardware::ppu::palette::DMG_SHADES;
pub use crate::hardware::ppu::{FRAMEBUFFER_SIZE, RESOLUTION_HEIGHT, RESOLUTION_WIDTH};
pub use crate::io::joypad::Button;

use thiserror::Error;

/// Load-time failures. Runtime anomalies never surface here: open-bus
/// reads return 0xFF, stray writes are dropped, and unused opcodes execute
/// as NOP, as the hardware would.
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("unsupported mapper type {0:#04X}")]
    UnsupportedMapper(u8),
    #[error("ROM image too small ({0} bytes)")]
    RomTooSmall(usize),
    #[error("header checksum mismatch: header claims {expected:#04X}, computed {computed:#04X}")]
    HeaderChecksum { expected: u8, computed: u8 },
    #[error("ROM length {actual} does not match the header-implied {expected} bytes")]
    RomSizeMismatch { expected: usize, actual: usize },
    #[error("no cartridge loaded")]
    MissingCartridge,
}
