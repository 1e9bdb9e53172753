//! Wrap-safe busy-wait delays on a free-running down-counter (SysTick and
//! friends), and a harness that measures how accurate they are.
//!
//! The hardware is reached only through the traits in [`counter`], [`time`],
//! [`interrupt`] and [`cache`], so everything here runs equally well against
//! the simulated parts in `sim` (behind the `sim` feature).

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod cache;
pub mod config;
pub mod counter;
pub mod delay;
pub mod error;
pub mod harness;
pub mod histogram;
pub mod interrupt;
pub mod jitter;
pub mod report;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod stats;
pub mod time;

pub use crate::{
    config::{ConfigError, HarnessConfig, SweepRange, SweepUnit},
    counter::DownCounter,
    delay::{delay_delta, delay_range, MicroDelay, Strategy, TickCountdown},
    error::Error,
    harness::{Cancel, Hardware, Harness, Never},
    histogram::{Classification, Histogram},
    stats::{SweepSummary, TrialRecord},
    time::{Hertz, MicrosClock, TicksPerMicro},
};
