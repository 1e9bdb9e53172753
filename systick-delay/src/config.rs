//! Harness configuration

use crate::{delay::Strategy, histogram::MAX_BUCKETS, time::TicksPerMicro};

/// Configuration error
///
/// A harness cannot be built from a configuration that fails validation;
/// there is no degraded mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The sweep start lies beyond its end, so no trial would run
    EmptySweep,

    /// A zero step would never advance the sweep
    ZeroStep,

    /// A histogram needs at least one bucket
    ZeroHistogram,

    /// More buckets than the histogram can hold
    HistogramTooLarge,

    /// Microsecond targets need a clock of at least 1MHz
    ClockTooSlow,

    /// The largest target does not fit below the counter's reload value
    TargetOutOfRange,
}

/// The unit sweep values are given in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SweepUnit {
    /// Raw down-counter ticks
    #[default]
    Ticks,
    /// Microseconds, scaled to ticks with the clock's ticks-per-microsecond
    Micros,
}

/// An ascending, inclusive sweep of target values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepRange {
    /// First target
    pub start: u32,
    /// Last target (inclusive; only reached if it lies on a step)
    pub end: u32,
    /// Distance between consecutive targets
    pub step: u32,
}

impl SweepRange {
    /// A sweep from `start` to `end` inclusive
    pub const fn new(start: u32, end: u32, step: u32) -> Self {
        SweepRange { start, end, step }
    }

    /// Every target in order
    pub fn targets(&self) -> impl Iterator<Item = u32> {
        // step_by(0) panics, and an invalid range must yield nothing
        let step = self.step.max(1) as usize;
        let range = if self.step == 0 { 1..=0 } else { self.start..=self.end };
        range.step_by(step)
    }

    /// Number of targets (a full `u32` sweep has `u32::MAX + 1`)
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            u64::from((self.end - self.start) / self.step) + 1
        }
    }

    /// Whether the sweep has no targets at all
    pub fn is_empty(&self) -> bool {
        self.step == 0 || self.start > self.end
    }

    /// The largest target the sweep reaches
    pub fn last(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - (self.end - self.start) % self.step)
        }
    }
}

/// Harness configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Mask interrupts around each measured delay
    pub disable_interrupts: bool,
    /// Invalidate the instruction cache before each trial
    pub flush_cache: bool,
    /// Print every trial (outliers are printed regardless)
    pub print_individual: bool,
    /// Target values to sweep over
    pub sweep: SweepRange,
    /// Unit of the sweep values
    pub unit: SweepUnit,
    /// Number of histogram buckets; errors at or beyond this are outliers
    pub histogram_size: usize,
    /// Fixed part of the pause between trials, in microseconds
    pub pause_us: u32,
    /// Random extra pause between trials, `0..pause_jitter_us` microseconds
    pub pause_jitter_us: u32,
    /// Busy-wait algorithm under test
    pub strategy: Strategy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            disable_interrupts: true,
            flush_cache: true,
            print_individual: true,
            sweep: SweepRange::new(10, 4_999, 13),
            unit: SweepUnit::Ticks,
            histogram_size: 40,
            pause_us: 1_000_000,
            pause_jitter_us: 250_000,
            strategy: Strategy::RangeComparison,
        }
    }
}

impl HarnessConfig {
    /// Sets the sweep
    pub fn with_sweep(mut self, start: u32, end: u32, step: u32) -> Self {
        self.sweep = SweepRange::new(start, end, step);
        self
    }

    /// Sets the sweep unit
    pub fn with_unit(mut self, unit: SweepUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the bucket count
    pub fn with_histogram_size(mut self, size: usize) -> Self {
        self.histogram_size = size;
        self
    }

    /// Sets the interrupt mask flag
    pub fn with_disable_interrupts(mut self, disable: bool) -> Self {
        self.disable_interrupts = disable;
        self
    }

    /// Sets the cache flush flag
    pub fn with_flush_cache(mut self, flush: bool) -> Self {
        self.flush_cache = flush;
        self
    }

    /// Sets the per-trial printing flag
    pub fn with_print_individual(mut self, print: bool) -> Self {
        self.print_individual = print;
        self
    }

    /// Sets the inter-trial pause
    pub fn with_pause(mut self, pause_us: u32, jitter_us: u32) -> Self {
        self.pause_us = pause_us;
        self.pause_jitter_us = jitter_us;
        self
    }

    /// Sets the busy-wait algorithm
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Checks everything that can be checked without hardware
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep.step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        if self.sweep.start > self.sweep.end {
            return Err(ConfigError::EmptySweep);
        }
        if self.histogram_size == 0 {
            return Err(ConfigError::ZeroHistogram);
        }
        if self.histogram_size > MAX_BUCKETS {
            return Err(ConfigError::HistogramTooLarge);
        }
        Ok(())
    }

    /// Converts a sweep value to down-counter ticks
    pub fn target_ticks(&self, value: u32, ticks_per_us: TicksPerMicro) -> Option<u32> {
        match self.unit {
            SweepUnit::Ticks => Some(value),
            SweepUnit::Micros => ticks_per_us.ticks(value).map(|t| t.0),
        }
    }

    /// Checks the sweep against the clock and the counter's reload value
    pub fn validate_for(&self, ticks_per_us: TicksPerMicro, reload: u32) -> Result<(), ConfigError> {
        self.validate()?;

        if self.unit == SweepUnit::Micros && ticks_per_us.0 == 0 {
            return Err(ConfigError::ClockTooSlow);
        }

        let last = self.sweep.last().ok_or(ConfigError::EmptySweep)?;
        match self.target_ticks(last, ticks_per_us) {
            Some(ticks) if ticks < reload => Ok(()),
            _ => Err(ConfigError::TargetOutOfRange),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_firmware_sweep() {
        let config = HarnessConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.sweep.targets().next(), Some(10));
        assert_eq!(config.sweep.last(), Some(4_989));
        assert_eq!((config.pause_us, config.pause_jitter_us), (1_000_000, 250_000));
        assert_eq!(config.sweep.targets().count() as u64, config.sweep.len());
    }

    #[test]
    fn inclusive_end() {
        let sweep = SweepRange::new(1, 3, 1);
        assert_eq!(sweep.len(), 3);
        assert!(sweep.targets().eq([1, 2, 3]));
    }

    #[test]
    fn rejects_empty_sweeps() {
        let config = HarnessConfig::default();
        assert_eq!(config.with_sweep(5, 4, 1).validate(), Err(ConfigError::EmptySweep));
        assert_eq!(config.with_sweep(1, 4, 0).validate(), Err(ConfigError::ZeroStep));
        assert_eq!(SweepRange::new(1, 4, 0).targets().count(), 0);
    }

    #[test]
    fn rejects_bad_histograms() {
        let config = HarnessConfig::default();
        assert_eq!(config.with_histogram_size(0).validate(), Err(ConfigError::ZeroHistogram));
        assert_eq!(
            config.with_histogram_size(MAX_BUCKETS + 1).validate(),
            Err(ConfigError::HistogramTooLarge)
        );
    }

    #[test]
    fn targets_must_fit_below_reload() {
        let config = HarnessConfig::default().with_sweep(10, 1_000, 10);
        assert_eq!(config.validate_for(TicksPerMicro(125), 1_001), Ok(()));
        assert_eq!(
            config.validate_for(TicksPerMicro(125), 1_000),
            Err(ConfigError::TargetOutOfRange)
        );

        let micros = config.with_unit(SweepUnit::Micros);
        assert_eq!(
            micros.validate_for(TicksPerMicro(125), 0x00FF_FFFF),
            Ok(())
        );
        assert_eq!(
            micros.validate_for(TicksPerMicro(0), 0x00FF_FFFF),
            Err(ConfigError::ClockTooSlow)
        );
        assert_eq!(
            micros.with_sweep(10, u32::MAX / 2, 10).validate_for(TicksPerMicro(125), u32::MAX),
            Err(ConfigError::TargetOutOfRange)
        );
    }

    #[test]
    fn full_width_sweep_is_rejected_not_overflowed() {
        let sweep = SweepRange::new(0, u32::MAX, 1);
        assert_eq!(sweep.len(), u64::from(u32::MAX) + 1);
        assert_eq!(sweep.last(), Some(u32::MAX));
        assert_eq!(SweepRange::new(1, u32::MAX, 2).last(), Some(u32::MAX));
        assert_eq!(SweepRange::new(0, u32::MAX, 2).last(), Some(u32::MAX - 1));

        let config = HarnessConfig::default().with_sweep(0, u32::MAX, 1);
        assert_eq!(
            config.validate_for(TicksPerMicro(125), 0x00FF_FFFF),
            Err(ConfigError::TargetOutOfRange)
        );
    }
}
