//! DWT cycle counter as a microsecond clock

use cortex_m::peripheral::{DCB, DWT};
use systick_delay::time::{Hertz, MicrosClock, TicksPerMicro};

/// A monotonic nondecreasing timer
///
/// Extends the 32-bit cycle counter in software, so it must be read at
/// least once per cycle-counter period (about 53s at 80MHz).
pub struct MonoTimer {
    dcb: DCB,
    dwt: DWT,
    frequency: Hertz,
    ticks_per_us: u32,
    last: u32,
    cycles: u64,
}

impl MonoTimer {
    /// Enables the DWT cycle counter and starts the clock from zero
    pub fn new<F: Into<Hertz>>(mut dcb: DCB, mut dwt: DWT, sysclk: F) -> Self {
        dcb.enable_trace();
        dwt.enable_cycle_counter();

        let frequency = sysclk.into();
        MonoTimer {
            dcb,
            dwt,
            frequency,
            ticks_per_us: TicksPerMicro::from_hz(frequency).0.max(1),
            last: DWT::cycle_count(),
            cycles: 0,
        }
    }

    /// Returns the frequency at which the monotonic timer is operating at
    #[inline]
    pub fn frequency(&self) -> Hertz {
        self.frequency
    }

    /// Releases the trace peripherals, leaving the cycle counter running
    pub fn free(self) -> (DCB, DWT) {
        (self.dcb, self.dwt)
    }
}

impl MicrosClock for MonoTimer {
    fn now_us(&mut self) -> u32 {
        let now = DWT::cycle_count();
        self.cycles += u64::from(now.wrapping_sub(self.last));
        self.last = now;
        (self.cycles / u64::from(self.ticks_per_us)) as u32
    }
}
