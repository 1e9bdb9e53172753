//! Simulated hardware for running the delay engine and the harness off-target

use core::{convert::Infallible, str};

use embedded_hal::delay::DelayNs;

use crate::{
    cache::CacheFlush, counter::DownCounter, interrupt::InterruptControl, time::MicrosClock,
};

/// A down-counter that replays a fixed sequence of `current` readings
///
/// Running past the end of the trace panics, so a wait that never
/// terminates fails instead of hanging.
pub struct TraceCounter<'a> {
    trace: &'a [u32],
    reload: u32,
    reads: usize,
}

impl<'a> TraceCounter<'a> {
    /// Replays `trace`, reporting `reload` as the reload value
    pub fn new(reload: u32, trace: &'a [u32]) -> Self {
        TraceCounter {
            trace,
            reload,
            reads: 0,
        }
    }

    /// Number of `current` readings taken so far
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// The last value handed out, if any
    pub fn last(&self) -> Option<u32> {
        self.reads.checked_sub(1).map(|i| self.trace[i])
    }

    /// Readings left in the trace
    pub fn remaining(&self) -> usize {
        self.trace.len() - self.reads
    }
}

impl DownCounter for TraceCounter<'_> {
    fn current(&mut self) -> u32 {
        match self.trace.get(self.reads) {
            Some(&value) => {
                self.reads += 1;
                value
            }
            None => panic!("counter trace exhausted after {} reads", self.reads),
        }
    }

    fn reload(&mut self) -> u32 {
        self.reload
    }
}

/// A down-counter that advances a fixed number of ticks on every reading
///
/// Wraps like SysTick: after zero it reloads to `reload`, so one period is
/// `reload + 1` ticks.
pub struct FreeRunningCounter {
    value: u32,
    reload: u32,
    ticks_per_read: u32,
    consumed: u64,
}

impl FreeRunningCounter {
    /// Starts at `value`, decrementing by `ticks_per_read` per reading
    pub fn new(reload: u32, value: u32, ticks_per_read: u32) -> Self {
        assert!(value <= reload && ticks_per_read <= reload);
        FreeRunningCounter {
            value,
            reload,
            ticks_per_read,
            consumed: 0,
        }
    }

    /// The value the next reading will return
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Total ticks that have passed since construction
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Lets `ticks` pass without a reading
    pub fn advance(&mut self, ticks: u32) {
        let period = u64::from(self.reload) + 1;
        let back = u64::from(ticks) % period;
        self.value = ((u64::from(self.value) + period - back) % period) as u32;
        self.consumed += u64::from(ticks);
    }
}

impl DownCounter for FreeRunningCounter {
    fn current(&mut self) -> u32 {
        let value = self.value;
        self.advance(self.ticks_per_read);
        value
    }

    fn reload(&mut self) -> u32 {
        self.reload
    }
}

/// A microsecond clock that advances a fixed amount on every reading
#[derive(Default)]
pub struct SteppingClock {
    now: u32,
    step: u32,
}

impl SteppingClock {
    /// Starts at `now`, advancing `step` microseconds per reading
    pub fn new(now: u32, step: u32) -> Self {
        SteppingClock { now, step }
    }
}

impl MicrosClock for SteppingClock {
    fn now_us(&mut self) -> u32 {
        let now = self.now;
        self.now = self.now.wrapping_add(self.step);
        now
    }
}

/// Interrupt controller that tracks the enable flag and counts transitions
pub struct RecordingInterrupts {
    enabled: bool,
    disables: u32,
    restores: u32,
}

impl RecordingInterrupts {
    /// Starts with interrupts enabled or disabled
    pub fn new(enabled: bool) -> Self {
        RecordingInterrupts {
            enabled,
            disables: 0,
            restores: 0,
        }
    }

    /// Current interrupt-enable flag
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Number of `disable` calls
    pub fn disables(&self) -> u32 {
        self.disables
    }

    /// Number of `restore` calls
    pub fn restores(&self) -> u32 {
        self.restores
    }
}

impl InterruptControl for RecordingInterrupts {
    type State = bool;

    fn disable(&mut self) -> bool {
        self.disables += 1;
        core::mem::replace(&mut self.enabled, false)
    }

    fn restore(&mut self, state: bool) {
        self.restores += 1;
        self.enabled = state;
    }
}

/// Instruction cache stand-in that counts flushes
#[derive(Default)]
pub struct CountingFlush {
    flushes: u32,
}

impl CountingFlush {
    /// Number of flushes requested
    pub fn flushes(&self) -> u32 {
        self.flushes
    }
}

impl CacheFlush for CountingFlush {
    fn flush(&mut self) {
        self.flushes += 1;
    }
}

/// A pause that returns immediately, remembering what it was asked for
#[derive(Default)]
pub struct RecordingPause {
    calls: u32,
    total_us: u64,
}

impl RecordingPause {
    /// Number of pauses taken
    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// Sum of every requested pause, in microseconds
    pub fn total_us(&self) -> u64 {
        self.total_us
    }
}

impl DelayNs for RecordingPause {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_us += u64::from(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.calls += 1;
        self.total_us += u64::from(us);
    }
}

/// A fixed-capacity text sink for report output
///
/// Writes beyond capacity are dropped silently and flagged by `overflowed`.
pub struct TextSink<const N: usize> {
    buf: [u8; N],
    len: usize,
    overflowed: bool,
}

impl<const N: usize> TextSink<N> {
    /// An empty sink
    pub fn new() -> Self {
        TextSink {
            buf: [0; N],
            len: 0,
            overflowed: false,
        }
    }

    /// Everything written so far
    pub fn as_str(&self) -> &str {
        str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    /// Whether any write was truncated
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Discards everything written so far
    pub fn clear(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }
}

impl<const N: usize> Default for TextSink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> embedded_io::ErrorType for TextSink<N> {
    type Error = Infallible;
}

impl<const N: usize> embedded_io::Write for TextSink<N> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let room = N - self.len;
        let n = buf.len().min(room);
        if n < buf.len() {
            self.overflowed = true;
        }
        self.buf[self.len..self.len + n].copy_from_slice(&buf[..n]);
        self.len += n;
        // Claim the whole buffer so `write_all` never sees a short write.
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_running_wraps_through_reload() {
        let mut counter = FreeRunningCounter::new(1000, 5, 3);
        assert_eq!(counter.current(), 5);
        assert_eq!(counter.current(), 2);
        // 2 -> 1 -> 0 -> 1000
        assert_eq!(counter.current(), 1000);
        assert_eq!(counter.consumed(), 9);
    }

    #[test]
    #[should_panic(expected = "counter trace exhausted")]
    fn trace_counter_panics_when_exhausted() {
        let mut counter = TraceCounter::new(100, &[3]);
        counter.current();
        counter.current();
    }
}
