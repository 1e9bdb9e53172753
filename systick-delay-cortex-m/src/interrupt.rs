//! PRIMASK as the interrupt mask

use cortex_m::register::primask;
use systick_delay::interrupt::InterruptControl;

/// Masks every configurable-priority interrupt via PRIMASK
///
/// NMI and HardFault still get through; they show up as outliers.
#[derive(Clone, Copy, Debug, Default)]
pub struct Primask;

impl InterruptControl for Primask {
    /// Whether interrupts were enabled before `disable`
    type State = bool;

    #[inline(always)]
    fn disable(&mut self) -> bool {
        let was_active = primask::read().is_active();
        cortex_m::interrupt::disable();
        was_active
    }

    #[inline(always)]
    fn restore(&mut self, was_active: bool) {
        if was_active {
            // Safety: interrupts were enabled when the matching `disable`
            // ran, so no enclosing critical section is being broken.
            unsafe { cortex_m::interrupt::enable() }
        }
    }
}
