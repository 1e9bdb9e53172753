//! Code for busy-waiting
//!
//! Both strategies spin on a free-running down-counter until it has
//! decremented by at least the requested number of ticks, allowing for one
//! wrap through zero. The count must stay below the reload value; that makes
//! these good for roughly a hundred cycles up to a large fraction of the
//! counter period, and useless as a general sleep.
//!
//! ```text
//!   eeeeeE--------SeeeeeeeeeeeeeeeeeR   no wrap
//!   --SeeeeeeeeeeeeeeeeeeeeeeeeeE----R  wrap: end E sits above start S
//! ```
//!
//! The waits are `#[inline(never)]`: their call and return overhead is part
//! of what the harness measures, so every caller must pay the same price.

use embedded_hal::delay::DelayNs;
use void::Void;

use crate::{
    counter::{self, DownCounter},
    time::{CountDown, Hertz, Ticks, TicksPerMicro},
};

/// Which wrap-handling algorithm a delay uses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Fold the end value into the post-wrap range and compare the live
    /// counter against a window
    #[default]
    RangeComparison,
    /// Normalize `start - now` for a wrap and compare it against the count
    DeltaNormalization,
}

impl Strategy {
    /// Spins until at least `count` ticks have elapsed on `counter`
    #[inline]
    pub fn delay<C>(self, counter: &mut C, count: u32)
    where
        C: DownCounter + ?Sized,
    {
        match self {
            Strategy::RangeComparison => delay_range(counter, count),
            Strategy::DeltaNormalization => delay_delta(counter, count),
        }
    }
}

/// Largest count a delay honours on a counter with this reload value
///
/// Larger requests trip a debug assertion; release builds clamp them, so the
/// wait comes up short instead of spinning forever.
#[inline(always)]
fn clamp_count(count: u32, reload: u32) -> u32 {
    debug_assert!(
        count < reload,
        "delay of {} ticks does not fit below reload value {}",
        count,
        reload
    );
    count.min(reload.saturating_sub(1))
}

/// Range-comparison busy-wait
///
/// Computes the end value `start - count` and, if that lands at or below
/// zero, folds it into the post-wrap range. Before a wrap the wait is over
/// once the counter is at or below the end, or has jumped above the start
/// (it wrapped past the whole window). After a wrap the counter has to be
/// both above the start and at or below the folded end.
///
/// An end of exactly zero takes the wrap branch, so a reading of zero does
/// not end the wait; [`delay_delta`] accepts that reading one tick sooner.
#[inline(never)]
pub fn delay_range<C>(counter: &mut C, count: u32)
where
    C: DownCounter + ?Sized,
{
    if count == 0 {
        return;
    }

    let reload = counter.reload();
    let count = clamp_count(count, reload);

    let start = i64::from(counter.current());
    let end = start - i64::from(count);

    if end > 0 {
        loop {
            let now = i64::from(counter.current());
            if now <= end || now > start {
                return;
            }
        }
    } else {
        let end = end + i64::from(reload);
        loop {
            let now = i64::from(counter.current());
            if now <= end && now > start {
                return;
            }
        }
    }
}

/// Delta-normalization busy-wait
///
/// Equivalent to [`delay_range`], but expressed as a single elapsed-tick
/// quantity corrected for the wrap. This is a blocking spin over
/// [`TickCountdown`].
#[inline(never)]
pub fn delay_delta<C>(counter: &mut C, count: u32)
where
    C: DownCounter + ?Sized,
{
    if count == 0 {
        return;
    }

    let mut countdown = TickCountdown::new(counter);
    countdown.start(Ticks(count));
    match nb::block!(countdown.wait()) {
        Ok(()) => {}
        Err(v) => void::unreachable(v),
    }
}

/// Non-blocking countdown on a down-counter
pub struct TickCountdown<C> {
    counter: C,
    start: u32,
    reload: u32,
    count: u32,
}

impl<C: DownCounter> TickCountdown<C> {
    /// Wraps a counter; nothing is read until `start`
    pub fn new(counter: C) -> Self {
        TickCountdown {
            counter,
            start: 0,
            reload: 0,
            count: 0,
        }
    }

    /// Ticks elapsed since `start`, corrected for at most one wrap
    pub fn elapsed(&mut self) -> u32 {
        let now = self.counter.current();
        counter::elapsed(self.start, now, self.reload)
    }

    /// Releases the counter
    pub fn free(self) -> C {
        self.counter
    }
}

impl<C: DownCounter> CountDown for TickCountdown<C> {
    type Time = Ticks;

    fn start<T>(&mut self, count: T)
    where
        T: Into<Ticks>,
    {
        let Ticks(count) = count.into();
        self.start = self.counter.current();
        self.reload = self.counter.reload();
        self.count = if count == 0 {
            0
        } else {
            clamp_count(count, self.reload)
        };
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        if self.elapsed() >= self.count {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

/// Microsecond and nanosecond delays on top of a down-counter
///
/// Requests are converted to ticks and split into chunks of half the reload
/// value, so each underlying wait sees at most one wrap.
pub struct MicroDelay<C> {
    counter: C,
    sysclk: Hertz,
    ticks_per_us: TicksPerMicro,
    strategy: Strategy,
}

impl<C: DownCounter> MicroDelay<C> {
    /// Builds a delay provider for a counter clocked at `sysclk`
    pub fn new<F: Into<Hertz>>(counter: C, sysclk: F) -> Self {
        let sysclk = sysclk.into();
        MicroDelay {
            counter,
            sysclk,
            ticks_per_us: TicksPerMicro::from_hz(sysclk),
            strategy: Strategy::default(),
        }
    }

    /// Selects the busy-wait algorithm
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Ticks per microsecond derived from the clock
    pub fn ticks_per_us(&self) -> TicksPerMicro {
        self.ticks_per_us
    }

    /// Spins for at least `ticks` ticks, however many wraps that takes
    pub fn delay_ticks(&mut self, mut ticks: u64) {
        let chunk = u64::from((self.counter.reload() / 2).max(1));
        while ticks > chunk {
            self.strategy.delay(&mut self.counter, chunk as u32);
            ticks -= chunk;
        }
        self.strategy.delay(&mut self.counter, ticks as u32);
    }

    /// Releases the counter
    pub fn free(self) -> C {
        self.counter
    }
}

impl<C: DownCounter> DelayNs for MicroDelay<C> {
    fn delay_ns(&mut self, ns: u32) {
        let ticks = (u64::from(ns) * u64::from(self.sysclk.0)).div_ceil(1_000_000_000);
        self.delay_ticks(ticks);
    }

    fn delay_us(&mut self, us: u32) {
        let ticks = (u64::from(us) * u64::from(self.sysclk.0)).div_ceil(1_000_000);
        self.delay_ticks(ticks);
    }

    fn delay_ms(&mut self, ms: u32) {
        let ticks = (u64::from(ms) * u64::from(self.sysclk.0)).div_ceil(1_000);
        self.delay_ticks(ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sim::{FreeRunningCounter, TraceCounter},
        time::U32Ext,
    };

    const STRATEGIES: [Strategy; 2] = [Strategy::RangeComparison, Strategy::DeltaNormalization];

    fn run(strategy: Strategy, reload: u32, trace: &[u32], count: u32) -> (Option<u32>, usize) {
        let mut counter = TraceCounter::new(reload, trace);
        strategy.delay(&mut counter, count);
        (counter.last(), counter.reads())
    }

    #[test]
    fn stops_at_end_without_wrap() {
        let trace = [500, 499, 490, 481, 480, 470];
        for strategy in STRATEGIES {
            assert_eq!(run(strategy, 1000, &trace, 20), (Some(480), 5));
        }
    }

    #[test]
    fn does_not_return_one_tick_early() {
        let trace = [500, 481, 480];
        for strategy in STRATEGIES {
            assert_eq!(run(strategy, 1000, &trace, 20), (Some(480), 3));
        }
    }

    #[test]
    fn crosses_zero_and_stops_at_folded_end() {
        // start = 10, count = 20: folded end = 10 - 20 + 0x00FF_FFFF = 0x00FF_FFF5
        let trace = [
            10, 5, 0, 0x00FF_FFFF, 0x00FF_FFFA, 0x00FF_FFF6, 0x00FF_FFF5, 0x00FF_FFF0,
        ];
        for strategy in STRATEGIES {
            assert_eq!(run(strategy, 0x00FF_FFFF, &trace, 20), (Some(0x00FF_FFF5), 7));
        }
    }

    #[test]
    fn jump_past_start_ends_an_unwrapped_wait() {
        // Counter stalled long enough to go all the way round
        let trace = [500, 450, 900, 850];
        for strategy in STRATEGIES {
            assert_eq!(run(strategy, 1000, &trace, 100), (Some(900), 3));
        }
    }

    #[test]
    fn zero_count_reads_nothing() {
        for strategy in STRATEGIES {
            assert_eq!(run(strategy, 1000, &[], 0), (None, 0));
        }
    }

    #[test]
    fn strategies_agree_on_a_running_counter() {
        for start in [3u32, 50, 480, 999] {
            for count in 1..400 {
                if count == start {
                    // Range comparison waits for the reload when the end
                    // lands exactly on zero; see `delay_range`.
                    continue;
                }
                let mut a = FreeRunningCounter::new(1000, start, 7);
                let mut b = FreeRunningCounter::new(1000, start, 7);
                delay_range(&mut a, count);
                delay_delta(&mut b, count);
                assert_eq!(a.value(), b.value(), "start {} count {}", start, count);
                assert_eq!(a.consumed(), b.consumed());
            }
        }
    }

    #[test]
    fn never_returns_early_on_a_running_counter() {
        for strategy in STRATEGIES {
            for start in [0u32, 1, 17, 640, 1000] {
                for count in [1u32, 2, 16, 17, 18, 500, 998] {
                    let mut counter = FreeRunningCounter::new(1000, start, 3);
                    strategy.delay(&mut counter, count);
                    // The final reading was taken one step before `consumed`.
                    assert!(counter.consumed() - 3 >= u64::from(count));
                }
            }
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "does not fit below reload")]
    fn count_at_reload_is_rejected() {
        let mut counter = FreeRunningCounter::new(1000, 500, 1);
        delay_delta(&mut counter, 1000);
    }

    #[test]
    fn countdown_polls_without_blocking() {
        let trace = [100, 95, 90, 80];
        let mut countdown = TickCountdown::new(TraceCounter::new(1000, &trace));
        countdown.start(15.ticks());
        assert!(matches!(countdown.wait(), Err(nb::Error::WouldBlock)));
        assert!(matches!(countdown.wait(), Err(nb::Error::WouldBlock)));
        assert!(countdown.wait().is_ok());
        assert_eq!(countdown.free().remaining(), 0);
    }

    #[test]
    fn micro_delay_waits_whole_microseconds() {
        let counter = FreeRunningCounter::new(0x00FF_FFFF, 0x00FF_FFFF, 1);
        let mut delay = MicroDelay::new(counter, 125.mhz());
        assert_eq!(delay.ticks_per_us(), TicksPerMicro(125));
        delay.delay_us(100);
        assert!(delay.free().consumed() >= 12_500);
    }

    #[test]
    fn micro_delay_keeps_fractional_megahertz() {
        // 16.5 ticks per microsecond; truncating to 16 would come up short
        let counter = FreeRunningCounter::new(0x00FF_FFFF, 0x00FF_FFFF, 1);
        let mut delay = MicroDelay::new(counter, 16_500.khz());
        delay.delay_us(1_000);
        assert!(delay.free().consumed() >= 16_500);

        let counter = FreeRunningCounter::new(0x00FF_FFFF, 0x00FF_FFFF, 1);
        let mut delay = MicroDelay::new(counter, 16_500.khz());
        delay.delay_ms(3);
        assert!(delay.free().consumed() >= 49_500);

        let counter = FreeRunningCounter::new(0x00FF_FFFF, 0x00FF_FFFF, 1);
        let mut delay = MicroDelay::new(counter, 16_500.khz());
        delay.delay_us(1);
        assert!(delay.free().consumed() >= 17);
    }

    #[test]
    fn micro_delay_rounds_nanoseconds_up() {
        let counter = FreeRunningCounter::new(0x00FF_FFFF, 0x1000, 1);
        let mut delay = MicroDelay::new(counter, 125.mhz());
        delay.delay_ns(1);
        // start read plus at least one more
        assert!(delay.free().consumed() >= 2);
    }

    #[test]
    fn micro_delay_splits_long_waits() {
        let counter = FreeRunningCounter::new(1000, 10, 1);
        let mut delay =
            MicroDelay::new(counter, 1.mhz()).with_strategy(Strategy::DeltaNormalization);
        delay.delay_ticks(5_000);
        assert!(delay.free().consumed() >= 5_000);
    }
}
