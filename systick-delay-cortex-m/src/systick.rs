//! SysTick as a free-running down-counter

use cortex_m::peripheral::{syst::SystClkSource, SYST};
use systick_delay::{counter::DownCounter, delay::MicroDelay, time::Hertz};

use crate::delay::SysTickDelay;

/// SysTick running free on the core clock
///
/// Counts down from [`RELOAD`](Self::RELOAD) with its interrupt off. Nothing
/// else may reprogram it while this handle exists.
pub struct SysTickCounter {
    syst: SYST,
}

impl SysTickCounter {
    /// Largest value the 24-bit counter can reload to
    pub const RELOAD: u32 = 0x00FF_FFFF;

    /// Starts SysTick counting down from `RELOAD` on the core clock
    pub fn new(mut syst: SYST) -> Self {
        syst.disable_counter();
        syst.set_clock_source(SystClkSource::Core);
        syst.disable_interrupt();
        syst.set_reload(Self::RELOAD);
        syst.clear_current();
        syst.enable_counter();

        SysTickCounter { syst }
    }

    /// Releases the system timer (SysTick) resource, still running
    pub fn free(self) -> SYST {
        self.syst
    }
}

impl DownCounter for SysTickCounter {
    #[inline(always)]
    fn current(&mut self) -> u32 {
        SYST::get_current()
    }

    #[inline(always)]
    fn reload(&mut self) -> u32 {
        SYST::get_reload()
    }
}

/// Extension trait that turns the `SYST` peripheral into a counter or delay
pub trait SystExt {
    /// Free-running down-counter
    fn counter(self) -> SysTickCounter;

    /// Microsecond delay provider on a free-running SysTick
    fn delay<F: Into<Hertz>>(self, sysclk: F) -> SysTickDelay;
}

impl SystExt for SYST {
    fn counter(self) -> SysTickCounter {
        SysTickCounter::new(self)
    }

    fn delay<F: Into<Hertz>>(self, sysclk: F) -> SysTickDelay {
        MicroDelay::new(SysTickCounter::new(self), sysclk)
    }
}
