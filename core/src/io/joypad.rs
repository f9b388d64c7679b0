//! The keypad matrix behind the JOYP register.
//!
//! Only the two select bits are writable; the low nibble is synthesised on
//! read from the pressed-key state, active low.

use bitflags::*;

pub const JOYPAD_REGISTER: u16 = 0xFF00;

/// The eight physical buttons a host can drive through `set_button`.
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
}

bitflags! {
    /// One nibble of the keypad matrix; the same bit positions serve both
    /// the action column (A/B/Select/Start) and the direction column.
    #[derive(Default)]
    struct KeyLine: u8 {
        const RIGHT_A    = 0b0000_0001;
        const LEFT_B     = 0b0000_0010;
        const UP_SELECT  = 0b0000_0100;
        const DOWN_START = 0b0000_1000;
    }
}

#[derive(Debug, Default, Clone)]
pub struct Joypad {
    actions: KeyLine,
    directions: KeyLine,
    /// Upper nibble of JOYP as last written by the guest (select lines).
    select: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Joypad::default()
    }

    /// Press or release a button. Returns true when a newly pressed key
    /// should raise the Joypad interrupt.
    pub fn set_button(&mut self, button: Button, pressed: bool) -> bool {
        let (line, mask) = self.line_for(button);
        let was_pressed = line.contains(mask);
        line.set(mask, pressed);

        pressed && !was_pressed
    }

    fn line_for(&mut self, button: Button) -> (&mut KeyLine, KeyLine) {
        use Button::*;
        match button {
            A => (&mut self.actions, KeyLine::RIGHT_A),
            B => (&mut self.actions, KeyLine::LEFT_B),
            Select => (&mut self.actions, KeyLine::UP_SELECT),
            Start => (&mut self.actions, KeyLine::DOWN_START),
            Right => (&mut self.directions, KeyLine::RIGHT_A),
            Left => (&mut self.directions, KeyLine::LEFT_B),
            Up => (&mut self.directions, KeyLine::UP_SELECT),
            Down => (&mut self.directions, KeyLine::DOWN_START),
        }
    }

    /// Only the select bits stick; the rest of the byte is discarded.
    pub fn write(&mut self, value: u8) {
        self.select = value & 0x30;
    }

    /// Synthesise JOYP: select bits as written, pressed keys pulled low on
    /// whichever columns are selected (also active low), bits 6-7 high.
    pub fn read(&self) -> u8 {
        let mut result = self.select | 0xCF;

        if self.select & 0x20 == 0 {
            result &= !self.actions.bits();
        }
        if self.select & 0x10 == 0 {
            result &= !self.directions.bits();
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_register_reads_high() {
        let mut joypad = Joypad::new();
        joypad.write(0x30);
        assert_eq!(joypad.read(), 0xFF);
    }

    #[test]
    fn selected_column_pulls_pressed_keys_low() {
        let mut joypad = Joypad::new();
        assert!(joypad.set_button(Button::A, true));

        // Action column selected (bit 5 low).
        joypad.write(0x10);
        assert_eq!(joypad.read() & 0x0F, 0x0E);

        // Direction column selected instead; A is invisible there.
        joypad.write(0x20);
        assert_eq!(joypad.read() & 0x0F, 0x0F);

        joypad.set_button(Button::Down, true);
        assert_eq!(joypad.read() & 0x0F, 0x07);
    }

    #[test]
    fn repeated_press_requests_once() {
        let mut joypad = Joypad::new();
        assert!(joypad.set_button(Button::Start, true));
        assert!(!joypad.set_button(Button::Start, true));
        assert!(!joypad.set_button(Button::Start, false));
        assert!(joypad.set_button(Button::Start, true));
    }
}
