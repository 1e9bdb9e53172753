//! Per-trial records and per-sweep statistics

use crate::histogram::Classification;

/// One measured delay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialRecord {
    /// Requested ticks
    pub target: u32,
    /// Counter value before the delay
    pub old_count: u32,
    /// Counter value after the delay
    pub new_count: u32,
    /// Microseconds between the two clock snapshots
    pub wall_us: u32,
}

impl TrialRecord {
    /// Ticks between the two snapshots, `old_count - new_count`
    ///
    /// No wrap correction is applied: a trial that crossed zero shows up as
    /// a huge value and lands among the outliers.
    #[inline]
    pub fn observed(&self) -> u32 {
        self.old_count.wrapping_sub(self.new_count)
    }

    /// Measured minus requested ticks, saturated to `i32`
    #[inline]
    pub fn error(&self) -> i32 {
        let error = i64::from(self.observed()) - i64::from(self.target);
        cast::i32(error).unwrap_or(if error < 0 { i32::MIN } else { i32::MAX })
    }
}

/// Running min/max/sum over the trials of one sweep
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepStats {
    min: i32,
    max: i32,
    sum: i64,
    trials: u32,
    outliers: u32,
}

impl Default for SweepStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepStats {
    /// Nothing recorded: min at its "infinity" sentinel, max at zero
    pub const fn new() -> Self {
        SweepStats {
            min: i32::MAX,
            max: 0,
            sum: 0,
            trials: 0,
            outliers: 0,
        }
    }

    /// Forgets everything recorded
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Folds in one trial's error and where it was classified
    pub fn record(&mut self, error: i32, class: Classification) {
        self.min = self.min.min(error);
        self.max = self.max.max(error);
        self.sum = self.sum.saturating_add(i64::from(error));
        self.trials = self.trials.saturating_add(1);
        if class.is_outlier() {
            self.outliers = self.outliers.saturating_add(1);
        }
    }

    /// Trials recorded so far
    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// Outliers recorded so far
    pub fn outliers(&self) -> u32 {
        self.outliers
    }

    /// Summary of what was recorded, or `None` before the first trial
    pub fn summary(&self, outliers_total: u32) -> Option<SweepSummary> {
        if self.trials == 0 {
            return None;
        }

        let average = self.sum / i64::from(self.trials);
        Some(SweepSummary {
            min: self.min,
            max: self.max,
            // |average| <= max(|min|, |max|), so it always fits
            average: cast::i32(average).unwrap_or(0),
            trials: self.trials,
            outliers: self.outliers,
            outliers_total,
        })
    }
}

/// Derived statistics of a finished sweep
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepSummary {
    /// Smallest error
    pub min: i32,
    /// Largest error (never below zero)
    pub max: i32,
    /// Sum of errors divided by the trial count, truncated
    pub average: i32,
    /// Number of trials
    pub trials: u32,
    /// Outliers in this sweep
    pub outliers: u32,
    /// Outliers since the harness started
    pub outliers_total: u32,
}

impl SweepSummary {
    /// Recomputes a summary from a frozen set of trials
    ///
    /// `histogram_size` decides what counts as an outlier, exactly as
    /// [`Histogram::classify`](crate::histogram::Histogram::classify) does.
    pub fn from_trials(
        trials: &[TrialRecord],
        histogram_size: usize,
        outliers_before: u32,
    ) -> Option<Self> {
        let mut stats = SweepStats::new();
        for trial in trials {
            let error = trial.error();
            let class = match cast::usize(error) {
                Ok(bucket) if bucket < histogram_size => Classification::Bucket(bucket),
                _ => Classification::Outlier,
            };
            stats.record(error, class);
        }
        stats.summary(outliers_before.saturating_add(stats.outliers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(target: u32, observed: u32) -> TrialRecord {
        TrialRecord {
            target,
            old_count: 10_000,
            new_count: 10_000 - observed,
            wall_us: 0,
        }
    }

    #[test]
    fn error_is_signed() {
        assert_eq!(trial(20, 25).error(), 5);
        assert_eq!(trial(20, 18).error(), -2);
    }

    #[test]
    fn wrapped_trial_saturates() {
        let wrapped = TrialRecord {
            target: 20,
            old_count: 5,
            new_count: 0x00FF_FFF0,
            wall_us: 0,
        };
        assert_eq!(wrapped.observed(), 5u32.wrapping_sub(0x00FF_FFF0));
        assert_eq!(wrapped.error(), i32::MAX);
    }

    #[test]
    fn average_truncates() {
        let trials = [trial(10, 11), trial(10, 11), trial(10, 10)];
        let summary = SweepSummary::from_trials(&trials, 40, 0).unwrap();
        assert_eq!((summary.min, summary.max, summary.average), (0, 1, 0));
        assert_eq!(summary.trials, 3);
    }

    #[test]
    fn max_starts_at_zero() {
        let trials = [trial(10, 8), trial(10, 9)];
        let summary = SweepSummary::from_trials(&trials, 40, 0).unwrap();
        assert_eq!((summary.min, summary.max, summary.average), (-2, 0, -1));
        assert_eq!(summary.outliers, 2);
    }

    #[test]
    fn summary_is_repeatable() {
        let trials = [trial(10, 12), trial(20, 65), trial(30, 29), trial(40, 41)];
        let first = SweepSummary::from_trials(&trials, 40, 7);
        let second = SweepSummary::from_trials(&trials, 40, 7);
        assert_eq!(first, second);

        let summary = first.unwrap();
        assert_eq!(summary.outliers, 2);
        assert_eq!(summary.outliers_total, 9);
        assert_eq!((summary.min, summary.max), (-1, 45));
        assert_eq!(summary.average, (2 + 45 - 1 + 1) / 4);
    }

    #[test]
    fn no_trials_no_summary() {
        assert_eq!(SweepSummary::from_trials(&[], 40, 0), None);
        assert_eq!(SweepStats::new().summary(3), None);
    }
}
