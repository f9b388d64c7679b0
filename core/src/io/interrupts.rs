use bitflags::*;

/// Interrupt Flag register (IF), write requests an interrupt.
pub const INTERRUPT_FLAG: u16 = 0xFF0F;
/// Interrupt Enable register (IE).
pub const INTERRUPT_ENABLE: u16 = 0xFFFF;

bitflags! {
    #[derive(Default)]
    pub struct InterruptFlags: u8 {
        /// V-Blank
        const VBLANK = 0b0000_0001;
        /// LCD Stat
        const LCD    = 0b0000_0010;
        /// Timer
        const TIMER  = 0b0000_0100;
        /// Serial
        const SERIAL = 0b0000_1000;
        /// Joypad
        const JOYPAD = 0b0001_0000;
    }
}

/// The five interrupt sources, in service priority order.
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub enum Interrupt {
    Vblank,
    LcdStat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    /// The address the CPU jumps to when servicing this interrupt.
    pub fn vector(self) -> u16 {
        match self {
            Interrupt::Vblank => 0x0040,
            Interrupt::LcdStat => 0x0048,
            Interrupt::Timer => 0x0050,
            Interrupt::Serial => 0x0058,
            Interrupt::Joypad => 0x0060,
        }
    }

    pub fn flag(self) -> InterruptFlags {
        match self {
            Interrupt::Vblank => InterruptFlags::VBLANK,
            Interrupt::LcdStat => InterruptFlags::LCD,
            Interrupt::Timer => InterruptFlags::TIMER,
            Interrupt::Serial => InterruptFlags::SERIAL,
            Interrupt::Joypad => InterruptFlags::JOYPAD,
        }
    }

    /// The highest-priority interrupt among the given pending flags, V-Blank first.
    pub fn highest_priority(pending: InterruptFlags) -> Option<Interrupt> {
        use Interrupt::*;
        [Vblank, LcdStat, Timer, Serial, Joypad]
            .iter()
            .copied()
            .find(|i| pending.contains(i.flag()))
    }
}

/// The IE/IF register pair, owned by the memory fabric so that every
/// component can raise a request during its slice of the dot.
#[derive(Default, Debug, Clone)]
pub struct Interrupts {
    pub enable: InterruptFlags,
    pub flag: InterruptFlags,
}

impl Interrupts {
    /// Raise a request in IF.
    #[inline]
    pub fn request(&mut self, interrupt: InterruptFlags) {
        self.flag.insert(interrupt);
    }

    /// The set of interrupts that are both requested and enabled.
    #[inline]
    pub fn pending(&self) -> InterruptFlags {
        self.flag & self.enable
    }

    /// IF as seen by the guest, the top three bits always read high.
    #[inline]
    pub fn read_flag(&self) -> u8 {
        0xE0 | self.flag.bits()
    }

    pub fn write_flag(&mut self, value: u8) {
        self.flag = InterruptFlags::from_bits_truncate(value);
    }

    pub fn read_enable(&self) -> u8 {
        self.enable.bits()
    }

    pub fn write_enable(&mut self, value: u8) {
        self.enable = InterruptFlags::from_bits_truncate(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_reads_with_unused_bits_high() {
        let mut interrupts = Interrupts::default();
        assert_eq!(interrupts.read_flag(), 0xE0);

        interrupts.request(InterruptFlags::TIMER);
        assert_eq!(interrupts.read_flag(), 0xE4);

        interrupts.write_flag(0x00);
        assert_eq!(interrupts.read_flag(), 0xE0);
    }

    #[test]
    fn priority_order() {
        let pending = InterruptFlags::SERIAL | InterruptFlags::LCD;
        assert_eq!(Interrupt::highest_priority(pending), Some(Interrupt::LcdStat));
        assert_eq!(Interrupt::highest_priority(InterruptFlags::empty()), None);
    }
}
