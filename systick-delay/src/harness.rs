//! Timing-accuracy harness
//!
//! Sweeps the delay engine over a range of targets. Each trial optionally
//! flushes the instruction cache and masks interrupts, snapshots the counter
//! and the microsecond clock around one delay, and files the error
//! (`observed - target`) into a histogram or the outlier count. Every sweep
//! ends with a summary and the histogram, then starts over.

use core::{
    cell::Cell,
    sync::atomic::{AtomicBool, Ordering},
};

use embedded_hal::delay::DelayNs;
use embedded_io::Write;
use log::{debug, error, info};

use crate::{
    cache::CacheFlush,
    config::{ConfigError, HarnessConfig},
    counter::DownCounter,
    error::Error,
    histogram::{Classification, Histogram},
    interrupt::{self, InterruptControl},
    jitter::Jitter,
    report,
    stats::{SweepStats, SweepSummary, TrialRecord},
    time::{Hertz, MicrosClock, TicksPerMicro},
};

/// Asks a running harness to stop
///
/// Checked between trials and between sweeps, never inside a measured region.
pub trait Cancel {
    /// Whether the harness should stop
    fn is_cancelled(&self) -> bool;
}

impl<T: Cancel + ?Sized> Cancel for &T {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl Cancel for AtomicBool {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl Cancel for Cell<bool> {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.get()
    }
}

/// Never cancels: the harness runs until reset or power loss
#[derive(Clone, Copy, Debug, Default)]
pub struct Never;

impl Cancel for Never {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// The hardware a harness drives
pub struct Hardware<C, K, I, F> {
    /// Down-counter under measurement
    pub counter: C,
    /// Microsecond clock for wall-time cross-checks
    pub clock: K,
    /// Interrupt mask control
    pub interrupts: I,
    /// Instruction cache control
    pub cache: F,
}

/// Timing-accuracy harness
///
/// Owns the histogram and statistics; the delay engine never sees them.
pub struct Harness<C, K, I, F, D, J> {
    hw: Hardware<C, K, I, F>,
    pause: D,
    jitter: J,
    config: HarnessConfig,
    ticks_per_us: TicksPerMicro,
    histogram: Histogram,
    stats: SweepStats,
    outliers_total: u32,
    sweeps: u32,
}

impl<C, K, I, F, D, J> Harness<C, K, I, F, D, J>
where
    C: DownCounter,
    K: MicrosClock,
    I: InterruptControl,
    F: CacheFlush,
    D: DelayNs,
    J: Jitter,
{
    /// Validates `config` against the hardware and builds a harness
    ///
    /// `sysclk` is the clock the counter runs at; `pause` sleeps between
    /// trials, lengthened by `jitter`.
    pub fn new<S: Into<Hertz>>(
        config: HarnessConfig,
        mut hw: Hardware<C, K, I, F>,
        pause: D,
        jitter: J,
        sysclk: S,
    ) -> Result<Self, ConfigError> {
        let ticks_per_us = TicksPerMicro::from_hz(sysclk);
        let reload = hw.counter.reload();

        if let Err(e) = config.validate_for(ticks_per_us, reload) {
            error!("rejected harness configuration {:?}: {:?}", config, e);
            return Err(e);
        }

        Ok(Harness {
            hw,
            pause,
            jitter,
            config,
            ticks_per_us,
            histogram: Histogram::new(config.histogram_size)?,
            stats: SweepStats::new(),
            outliers_total: 0,
            sweeps: 0,
        })
    }

    /// The validated configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Ticks per microsecond derived from the clock
    pub fn ticks_per_us(&self) -> TicksPerMicro {
        self.ticks_per_us
    }

    /// Histogram of the current (or last finished) sweep
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Running statistics of the current (or last finished) sweep
    pub fn stats(&self) -> &SweepStats {
        &self.stats
    }

    /// Outliers since construction
    pub fn outliers_total(&self) -> u32 {
        self.outliers_total
    }

    /// Sweeps completed since construction
    pub fn sweeps(&self) -> u32 {
        self.sweeps
    }

    /// The driven hardware
    pub fn hardware(&self) -> &Hardware<C, K, I, F> {
        &self.hw
    }

    /// The inter-trial pause
    pub fn pause(&self) -> &D {
        &self.pause
    }

    /// Releases the hardware, pause and jitter source
    pub fn free(self) -> (Hardware<C, K, I, F>, D, J) {
        (self.hw, self.pause, self.jitter)
    }

    /// Writes the startup banner
    pub fn banner<W: Write>(&self, out: &mut W) -> Result<(), Error<W::Error>> {
        report::write_banner(out, self.ticks_per_us)
    }

    /// Zeroes the histogram and the per-sweep statistics
    ///
    /// The cumulative outlier count survives.
    pub fn reset(&mut self) {
        self.histogram.reset();
        self.stats.reset();
    }

    /// Times one delay of `target` ticks
    ///
    /// The cache flush comes first, outside the interrupt mask. The mask
    /// covers the snapshots and the delay and is lifted before anything
    /// else happens.
    pub fn measure(&mut self, target: u32) -> TrialRecord {
        let strategy = self.config.strategy;
        let Hardware {
            counter,
            clock,
            interrupts,
            cache,
        } = &mut self.hw;

        if self.config.flush_cache {
            cache.flush();
        }

        let (old_count, t0, new_count, t1) =
            interrupt::masked(interrupts, self.config.disable_interrupts, || {
                let old_count = counter.current();
                let t0 = clock.now_us();
                strategy.delay(&mut *counter, target);
                let new_count = counter.current();
                let t1 = clock.now_us();
                (old_count, t0, new_count, t1)
            });

        TrialRecord {
            target,
            old_count,
            new_count,
            wall_us: t1.wrapping_sub(t0),
        }
    }

    /// Files one trial into the histogram or the outlier counts
    pub fn record(&mut self, trial: &TrialRecord) -> Classification {
        let error = trial.error();
        let class = self.histogram.record(error);
        if class.is_outlier() {
            self.outliers_total = self.outliers_total.saturating_add(1);
            debug!(
                "outlier: target {} ticks, observed {} ({} delta)",
                trial.target,
                trial.observed(),
                error
            );
        }
        self.stats.record(error, class);
        class
    }

    fn pause_between_trials(&mut self) {
        let extra = self.jitter.next_below(self.config.pause_jitter_us);
        let us = self.config.pause_us.saturating_add(extra);
        if us > 0 {
            self.pause.delay_us(us);
        }
    }

    /// Runs one full sweep and reports it
    ///
    /// Returns `None` if cancelled part way through; nothing is reported for
    /// an unfinished sweep.
    pub fn run_sweep<W, X>(
        &mut self,
        out: &mut W,
        cancel: &X,
    ) -> Result<Option<SweepSummary>, Error<W::Error>>
    where
        W: Write,
        X: Cancel + ?Sized,
    {
        self.reset();

        let sweep = self.config.sweep;
        debug!(
            "sweep {}: {}..={} step {} ({:?})",
            self.sweeps + 1,
            sweep.start,
            sweep.end,
            sweep.step,
            self.config.unit
        );

        for value in sweep.targets() {
            if cancel.is_cancelled() {
                debug!("sweep {} cancelled", self.sweeps + 1);
                return Ok(None);
            }

            let target = self
                .config
                .target_ticks(value, self.ticks_per_us)
                .ok_or(ConfigError::TargetOutOfRange)?;
            let trial = self.measure(target);
            let class = self.record(&trial);

            if self.config.print_individual || class.is_outlier() {
                report::write_trial(out, &trial, class.is_outlier())?;
            }

            self.pause_between_trials();
        }

        // Validation guarantees at least one trial
        let summary = self
            .stats
            .summary(self.outliers_total)
            .ok_or(ConfigError::EmptySweep)?;
        self.sweeps = self.sweeps.saturating_add(1);

        info!(
            "sweep {}: min {} max {} avg {} outliers {} ({} total)",
            self.sweeps,
            summary.min,
            summary.max,
            summary.average,
            summary.outliers,
            summary.outliers_total
        );

        report::write_summary(out, &summary)?;
        report::write_histogram(out, &self.histogram, summary.min)?;
        report::write_restart(out)?;

        Ok(Some(summary))
    }

    /// Sweeps until `cancel` fires, returning the number of finished sweeps
    ///
    /// With [`Never`] this only returns on a report error.
    pub fn run<W, X>(&mut self, out: &mut W, cancel: &X) -> Result<u32, Error<W::Error>>
    where
        W: Write,
        X: Cancel + ?Sized,
    {
        while !cancel.is_cancelled() {
            self.run_sweep(out, cancel)?;
        }
        Ok(self.sweeps)
    }
}
