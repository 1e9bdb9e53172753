//! Delay providers

use embedded_hal::delay::DelayNs;
use systick_delay::{delay::MicroDelay, time::Hertz};

use crate::systick::SysTickCounter;

/// Microsecond delays spinning on SysTick
pub type SysTickDelay = MicroDelay<SysTickCounter>;

/// Cycle-counting delay that leaves SysTick alone
///
/// Good for pauses between measurements, where a few percent of slack does
/// not matter but touching the measured counter would.
pub struct AsmDelay {
    sysclk: Hertz,
}

impl AsmDelay {
    /// Create a new delay for a core running at `sysclk`
    pub fn new<F: Into<Hertz>>(sysclk: F) -> Self {
        AsmDelay {
            sysclk: sysclk.into(),
        }
    }
}

impl DelayNs for AsmDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (u64::from(ns) * u64::from(self.sysclk.0)).div_ceil(1_000_000_000);
        cortex_m::asm::delay(u32::try_from(cycles).unwrap_or(u32::MAX));
    }
}
