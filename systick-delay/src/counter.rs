//! The free-running down-counter the delays are measured against

/// A hardware down-counter (SysTick-like)
///
/// `current` decrements by one every cycle and reloads to `reload`
/// immediately after reaching zero, so `0 <= current <= reload` always
/// holds. The counter is already running; nothing in this crate stops it or
/// writes its reload value.
pub trait DownCounter {
    /// Current value (CVR)
    fn current(&mut self) -> u32;

    /// Reload value (RVR), the value the counter wraps to after zero
    fn reload(&mut self) -> u32;
}

impl<T: DownCounter + ?Sized> DownCounter for &mut T {
    #[inline]
    fn current(&mut self) -> u32 {
        (**self).current()
    }

    #[inline]
    fn reload(&mut self) -> u32 {
        (**self).reload()
    }
}

/// Ticks elapsed between two readings of a down-counter, assuming at most
/// one wrap happened in between.
///
/// A reading above `start` means the counter went through zero and was
/// reloaded, so `reload` is added back.
#[inline(always)]
pub fn elapsed(start: u32, now: u32, reload: u32) -> u32 {
    if now <= start {
        start - now
    } else {
        // True value lies in 0..reload, so the wrapping arithmetic is exact.
        start.wrapping_sub(now).wrapping_add(reload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_without_wrap() {
        assert_eq!(elapsed(500, 480, 1000), 20);
        assert_eq!(elapsed(500, 500, 1000), 0);
    }

    #[test]
    fn elapsed_across_zero() {
        // 10 -> 0 -> reload 0x00FF_FFFF -> 0x00FF_FFF5
        assert_eq!(elapsed(10, 0x00FF_FFF5, 0x00FF_FFFF), 20);
    }

    #[test]
    fn elapsed_at_full_width_reload() {
        assert_eq!(elapsed(5, u32::MAX - 5, u32::MAX), 10);
    }
}
