//! Line-oriented text report
//!
//! ```text
//! Target ticks = 23   old-new = 25 (2 delta)   t1-t0 = 0us
//! Target ticks = 36   old-new = 120 (84 delta)   t1-t0 = 1us  <-- OUTLIER
//!
//! Minimum: 2
//! Maximum: 84
//! Average: 5
//! Outliers: 1 (3 total)
//!   1 (    0):
//!   2 (  380): ****************************************************************************
//!   3 (    3): ***
//! ```

use core::fmt;

use embedded_io::Write;

use crate::{
    error::Error,
    histogram::Histogram,
    stats::{SweepSummary, TrialRecord},
    time::TicksPerMicro,
};

/// Longest run of marks printed for one bucket
pub const MAX_MARKS: usize = 76;

const MARKS: &str = "****************************************************************************";

/// Appended to the line of a trial classified as an outlier
pub const OUTLIER_MARKER: &str = "  <-- OUTLIER";

struct Adapter<'a, W: Write> {
    inner: &'a mut W,
    error: Option<W::Error>,
}

impl<W: Write> fmt::Write for Adapter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}

fn emit<W: Write>(out: &mut W, args: fmt::Arguments<'_>) -> Result<(), Error<W::Error>> {
    let mut adapter = Adapter {
        inner: out,
        error: None,
    };
    match fmt::write(&mut adapter, args) {
        Ok(()) => Ok(()),
        Err(fmt::Error) => Err(adapter.error.map_or(Error::Format, Error::Write)),
    }
}

/// Startup banner with the derived clock rate
pub fn write_banner<W: Write>(
    out: &mut W,
    ticks_per_us: TicksPerMicro,
) -> Result<(), Error<W::Error>> {
    emit(
        out,
        format_args!(
            "\n\nStarting\nCurrent Clock Rate is {}MHz\n",
            ticks_per_us.clock_rate().0
        ),
    )
}

/// One trial line, with the outlier marker when `outlier` is set
pub fn write_trial<W: Write>(
    out: &mut W,
    trial: &TrialRecord,
    outlier: bool,
) -> Result<(), Error<W::Error>> {
    emit(
        out,
        format_args!(
            "Target ticks = {}   old-new = {} ({} delta)   t1-t0 = {}us{}\n",
            trial.target,
            trial.observed(),
            trial.error(),
            trial.wall_us,
            if outlier { OUTLIER_MARKER } else { "" },
        ),
    )
}

/// The per-sweep statistics block
pub fn write_summary<W: Write>(
    out: &mut W,
    summary: &SweepSummary,
) -> Result<(), Error<W::Error>> {
    emit(
        out,
        format_args!(
            "\nMinimum: {}\nMaximum: {}\nAverage: {}\nOutliers: {} ({} total)\n",
            summary.min, summary.max, summary.average, summary.outliers, summary.outliers_total,
        ),
    )
}

/// Histogram lines from bucket `min - 1` onwards
///
/// Each bucket gets its count and a run of marks capped at [`MAX_MARKS`].
/// Printing stops at the first bucket from which every remaining bucket is
/// empty.
pub fn write_histogram<W: Write>(
    out: &mut W,
    histogram: &Histogram,
    min: i32,
) -> Result<(), Error<W::Error>> {
    let first = cast::usize(min.saturating_sub(1)).unwrap_or(0);

    for bucket in first..histogram.size() {
        if histogram.is_zero_from(bucket) {
            break;
        }
        let count = histogram.count(bucket);
        let marks = usize::try_from(count).map_or(MAX_MARKS, |n| n.min(MAX_MARKS));
        emit(
            out,
            format_args!("{:>3} ({:>5}): {}\n", bucket, count, &MARKS[..marks]),
        )?;
    }
    Ok(())
}

/// Separator printed after each sweep
pub fn write_restart<W: Write>(out: &mut W) -> Result<(), Error<W::Error>> {
    emit(out, format_args!("\nSTARTING OVER\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::TextSink;

    #[test]
    fn trial_line() {
        let trial = TrialRecord {
            target: 23,
            old_count: 1_000,
            new_count: 975,
            wall_us: 4,
        };
        let mut out = TextSink::<256>::new();
        write_trial(&mut out, &trial, false).unwrap();
        write_trial(&mut out, &trial, true).unwrap();
        assert_eq!(
            out.as_str(),
            "Target ticks = 23   old-new = 25 (2 delta)   t1-t0 = 4us\n\
             Target ticks = 23   old-new = 25 (2 delta)   t1-t0 = 4us  <-- OUTLIER\n"
        );
    }

    #[test]
    fn summary_block() {
        let summary = SweepSummary {
            min: -1,
            max: 45,
            average: 11,
            trials: 4,
            outliers: 2,
            outliers_total: 9,
        };
        let mut out = TextSink::<256>::new();
        write_summary(&mut out, &summary).unwrap();
        assert_eq!(
            out.as_str(),
            "\nMinimum: -1\nMaximum: 45\nAverage: 11\nOutliers: 2 (9 total)\n"
        );
    }

    #[test]
    fn histogram_starts_below_min_and_elides_trailing_zeros() {
        let mut histogram = Histogram::new(10).unwrap();
        for _ in 0..3 {
            histogram.record(3);
        }
        histogram.record(5);

        let mut out = TextSink::<512>::new();
        write_histogram(&mut out, &histogram, 3).unwrap();
        assert_eq!(
            out.as_str(),
            "  2 (    0): \n  3 (    3): ***\n  4 (    0): \n  5 (    1): *\n"
        );
    }

    #[test]
    fn histogram_caps_marks() {
        let mut histogram = Histogram::new(4).unwrap();
        for _ in 0..200 {
            histogram.record(0);
        }

        let mut out = TextSink::<256>::new();
        write_histogram(&mut out, &histogram, 0).unwrap();
        let line = out.as_str().lines().next().unwrap();
        assert!(line.starts_with("  0 (  200): "));
        assert_eq!(line.matches('*').count(), MAX_MARKS);
        assert_eq!(out.as_str().lines().count(), 1);
    }

    #[test]
    fn empty_histogram_prints_nothing() {
        let histogram = Histogram::new(4).unwrap();
        let mut out = TextSink::<64>::new();
        write_histogram(&mut out, &histogram, i32::MAX).unwrap();
        write_histogram(&mut out, &histogram, 0).unwrap();
        assert_eq!(out.as_str(), "");
    }

    #[test]
    fn banner() {
        let mut out = TextSink::<64>::new();
        write_banner(&mut out, TicksPerMicro(125)).unwrap();
        assert_eq!(out.as_str(), "\n\nStarting\nCurrent Clock Rate is 125MHz\n");
    }
}
