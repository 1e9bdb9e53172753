//! Interrupt masking around measured regions

/// Global interrupt enable control
pub trait InterruptControl {
    /// Whatever is needed to put the enable flag back exactly as it was
    type State: Copy;

    /// Masks interrupts, returning the prior state
    fn disable(&mut self) -> Self::State;

    /// Restores the state returned by a matching `disable`
    fn restore(&mut self, state: Self::State);
}

impl<T: InterruptControl + ?Sized> InterruptControl for &mut T {
    type State = T::State;

    #[inline]
    fn disable(&mut self) -> Self::State {
        (**self).disable()
    }

    #[inline]
    fn restore(&mut self, state: Self::State) {
        (**self).restore(state)
    }
}

/// Runs `f` with interrupts masked when `mask` is set
///
/// Every disable is paired with exactly one restore, taken as soon as `f`
/// returns. `f` has a single exit, so there is no path out of the region
/// that skips the restore.
#[inline(always)]
pub fn masked<I, R>(interrupts: &mut I, mask: bool, f: impl FnOnce() -> R) -> R
where
    I: InterruptControl + ?Sized,
{
    if !mask {
        return f();
    }

    let state = interrupts.disable();
    let r = f();
    interrupts.restore(state);
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingInterrupts;

    #[test]
    fn restores_prior_enabled_state() {
        let mut irq = RecordingInterrupts::new(true);
        let seen = masked(&mut irq, true, || 7);
        assert_eq!(seen, 7);
        assert!(irq.enabled());
        assert_eq!((irq.disables(), irq.restores()), (1, 1));
    }

    #[test]
    fn leaves_already_disabled_state_disabled() {
        let mut irq = RecordingInterrupts::new(false);
        masked(&mut irq, true, || ());
        assert!(!irq.enabled());
        assert_eq!((irq.disables(), irq.restores()), (1, 1));
    }

    #[test]
    fn unmasked_region_does_not_touch_the_flag() {
        let mut irq = RecordingInterrupts::new(true);
        masked(&mut irq, false, || ());
        assert_eq!((irq.disables(), irq.restores()), (0, 0));
    }
}
