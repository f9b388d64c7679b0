//! The three clocked units shared between channels: length counter,
//! volume envelope, and (channel 1 only) the frequency sweep state.

/// Length counter, clocked on even frame-sequencer phases.
#[derive(Debug, Default, Clone)]
pub struct LengthCounter {
    pub enabled: bool,
    pub counter: u16,
}

impl LengthCounter {
    /// One length clock. Returns true when the channel should be cut.
    pub fn tick(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        if self.counter > 0 {
            self.counter -= 1;
        }
        self.counter == 0
    }
}

/// Volume envelope, clocked on frame-sequencer phase 7. The volume itself
/// lives on the channel; this tracks the pace timer and the at-the-rail
/// shutoff.
#[derive(Debug, Default, Clone)]
pub struct VolumeEnvelope {
    pub enabled: bool,
    pub timer: u8,
}

impl VolumeEnvelope {
    /// One envelope clock, stepping `volume` towards the NRx2 direction.
    pub fn tick(&mut self, nrx2: u8, volume: &mut u8) {
        if !self.enabled {
            return;
        }

        let pace = nrx2 & 0x07;
        if pace == 0 {
            return;
        }

        self.timer += 1;
        if self.timer < pace {
            return;
        }
        self.timer = 0;

        let increasing = nrx2 & 0x08 != 0;
        if increasing && *volume < 0x0F {
            *volume += 1;
            self.enabled = *volume != 0x0F;
        } else if !increasing && *volume > 0 {
            *volume -= 1;
            self.enabled = *volume != 0;
        }
    }

    pub fn trigger(&mut self) {
        self.enabled = true;
        self.timer = 0;
    }
}

/// Frequency sweep state for channel 1. The arithmetic stays in the
/// channel (it has to write the period registers back); this is the unit's
/// architectural state, including the negate-mode latch that kills the
/// channel when negate is cleared after a subtracting calculation.
#[derive(Debug, Default, Clone)]
pub struct FrequencySweep {
    pub enabled: bool,
    pub timer: u8,
    /// Reload value for the timer; a NR10 pace of 0 behaves as 8.
    pub threshold: u8,
    pub shadow: u16,
    pub negate_mode: bool,
    pub calc_in_negate_mode: bool,
}
