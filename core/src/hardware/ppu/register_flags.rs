use bitflags::*;

bitflags! {
    /// FF40. LCDC is never locked by the PPU, so every bit can change
    /// mid-scanline and the pipeline re-reads it per dot.
    #[derive(Default)]
    pub struct LcdControl: u8 {
        /// DMG: BG/Window display. CGB: master priority; when clear,
        /// objects win over BG/Window regardless of the per-tile and
        /// per-object priority bits.
        const BG_WINDOW_PRIORITY = 0b0000_0001;
        /// Objects drawn at all this frame slice.
        const OBJ_ENABLE = 0b0000_0010;
        /// Object height: 8 when clear, 16 (two stacked tiles) when set.
        const OBJ_SIZE = 0b0000_0100;
        /// BG tilemap at 0x9C00 instead of 0x9800.
        const BG_MAP_SELECT = 0b0000_1000;
        /// Tile pattern addressing: 0x8000 unsigned when set, signed
        /// 0x9000-based when clear. Objects always use 0x8000.
        const TILE_DATA_SELECT = 0b0001_0000;
        /// Window layer enable.
        const WINDOW_ENABLE = 0b0010_0000;
        /// Window tilemap at 0x9C00 instead of 0x9800.
        const WINDOW_MAP_SELECT = 0b0100_0000;
        /// LCD power. Turning this off stops the PPU cold and unlocks
        /// VRAM/OAM; turning it on restarts with one discarded frame.
        const LCD_ENABLE = 0b1000_0000;
    }
}

bitflags! {
    /// OAM attribute byte; bits 0-3 only mean anything in CGB mode, and the
    /// same layout doubles as the CGB background tile attribute byte.
    #[derive(Default)]
    pub struct AttributeFlags: u8 {
        /// **CGB** palette index 0-7.
        const CGB_PALETTE = 0b0000_0111;
        /// **CGB** tile data fetched from VRAM bank 1.
        const VRAM_BANK = 0b0000_1000;
        /// **DMG** OBP1 instead of OBP0.
        const DMG_PALETTE = 0b0001_0000;
        /// Horizontally mirrored.
        const X_FLIP = 0b0010_0000;
        /// Vertically mirrored.
        const Y_FLIP = 0b0100_0000;
        /// Behind BG colors 1-3 (BG color 0 is always behind).
        const PRIORITY = 0b1000_0000;
    }
}

impl AttributeFlags {
    #[inline]
    pub fn cgb_palette(self) -> u8 {
        self.bits() & 0x07
    }
}

/// The four PPU modes as exposed in STAT bits 0-1.
#[derive(Debug, PartialOrd, PartialEq, Copy, Clone)]
pub enum Mode {
    HBlank,
    VBlank,
    OamScan,
    Drawing,
}

impl Mode {
    pub fn bits(self) -> u8 {
        match self {
            Mode::HBlank => 0,
            Mode::VBlank => 1,
            Mode::OamScan => 2,
            Mode::Drawing => 3,
        }
    }
}
