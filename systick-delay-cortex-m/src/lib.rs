//! Cortex-M core peripherals behind the `systick-delay` traits
//!
//! - SysTick is the down-counter,
//! - the DWT cycle counter is the microsecond clock,
//! - PRIMASK is the interrupt mask,
//! - the SCB instruction cache (Cortex-M7, `icache` feature) is the flush.

#![no_std]
#![deny(missing_docs)]

#[cfg(feature = "icache")]
pub mod cache;
pub mod delay;
pub mod dwt;
pub mod interrupt;
pub mod systick;

pub use crate::{
    delay::{AsmDelay, SysTickDelay},
    dwt::MonoTimer,
    interrupt::Primask,
    systick::{SysTickCounter, SystExt},
};
