//! Time units

/// Hertz
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hertz(pub u32);

/// KiloHertz
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KiloHertz(pub u32);

/// MegaHertz
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MegaHertz(pub u32);

/// Down-counter ticks (one per core clock cycle)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticks(pub u32);

/// Extension trait that adds convenience methods to the `u32` type
pub trait U32Ext {
    /// Wrap in `Hertz`
    fn hz(self) -> Hertz;

    /// Wrap in `KiloHertz`
    fn khz(self) -> KiloHertz;

    /// Wrap in `MegaHertz`
    fn mhz(self) -> MegaHertz;

    /// Wrap in `Ticks`
    fn ticks(self) -> Ticks;
}

impl U32Ext for u32 {
    fn hz(self) -> Hertz {
        Hertz(self)
    }

    fn khz(self) -> KiloHertz {
        KiloHertz(self)
    }

    fn mhz(self) -> MegaHertz {
        MegaHertz(self)
    }

    fn ticks(self) -> Ticks {
        Ticks(self)
    }
}

impl From<KiloHertz> for Hertz {
    #[inline]
    fn from(val: KiloHertz) -> Self {
        Hertz(val.0 * 1_000)
    }
}

impl From<MegaHertz> for Hertz {
    #[inline]
    fn from(val: MegaHertz) -> Self {
        Hertz(val.0 * 1_000_000)
    }
}

impl From<MegaHertz> for KiloHertz {
    #[inline]
    fn from(val: MegaHertz) -> Self {
        KiloHertz(val.0 * 1_000)
    }
}

impl From<u32> for Ticks {
    #[inline]
    fn from(val: u32) -> Self {
        Ticks(val)
    }
}

/// Whole down-counter ticks per microsecond, derived once from the system
/// clock at startup.
///
/// Example: 125MHz gives 125, 16.5MHz gives 16 (truncated, as the clock
/// query is only used to scale microsecond targets).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TicksPerMicro(pub u32);

impl TicksPerMicro {
    /// Derive from the system clock frequency
    #[inline]
    pub fn from_hz<F: Into<Hertz>>(sysclk: F) -> Self {
        TicksPerMicro(sysclk.into().0 / 1_000_000)
    }

    /// The clock rate this constant corresponds to, in whole MHz
    #[inline]
    pub fn clock_rate(self) -> MegaHertz {
        MegaHertz(self.0)
    }

    /// Converts microseconds to ticks, or `None` if the result does not fit
    #[inline]
    pub fn ticks(self, us: u32) -> Option<Ticks> {
        us.checked_mul(self.0).map(Ticks)
    }
}

/// A free-running microsecond clock, independent of the down-counter
///
/// Only used to cross-check wall time around a measured delay; it never
/// drives a wait. Readings wrap at `u32::MAX`, so differences must be
/// taken with `wrapping_sub`.
pub trait MicrosClock {
    /// Current reading in microseconds
    fn now_us(&mut self) -> u32;
}

impl<T: MicrosClock + ?Sized> MicrosClock for &mut T {
    #[inline]
    fn now_us(&mut self) -> u32 {
        (**self).now_us()
    }
}

/// A count down timer
///
/// # Contract
///
/// - `self.start(count); block!(self.wait());` MUST block for AT LEAST the time specified by
///   `count`.
pub trait CountDown {
    /// The unit of time used by this timer
    type Time;

    /// Starts a new count down
    fn start<T>(&mut self, count: T)
    where
        T: Into<Self::Time>;

    /// Non-blockingly "waits" until the count down finishes
    ///
    /// # Contract
    ///
    /// - The behavior of calling `wait` after the last call returned `Ok` is UNSPECIFIED.
    fn wait(&mut self) -> nb::Result<(), void::Void>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_per_micro_truncates() {
        assert_eq!(TicksPerMicro::from_hz(125.mhz()), TicksPerMicro(125));
        assert_eq!(TicksPerMicro::from_hz(16_500.khz()), TicksPerMicro(16));
        assert_eq!(TicksPerMicro::from_hz(999_999.hz()), TicksPerMicro(0));
    }

    #[test]
    fn micro_conversion_overflow() {
        let tpu = TicksPerMicro(125);
        assert_eq!(tpu.ticks(13), Some(Ticks(1_625)));
        assert_eq!(tpu.ticks(u32::MAX), None);
    }
}
