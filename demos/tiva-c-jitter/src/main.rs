//! Measures SysTick busy-wait jitter on a Tiva-C LaunchPad and reports it
//! over semihosting, sweep after sweep.

#![no_std]
#![no_main]

mod console;
mod logging;

use cortex_m_rt::entry;
use embedded_hal::delay::DelayNs;
use log::{error, info};
use panic_halt as _;
use systick_delay::{
    cache::NoCache, jitter::XorShift32, time::U32Ext, Hardware, Harness, HarnessConfig, Never,
    SweepUnit,
};
use systick_delay_cortex_m::{AsmDelay, MonoTimer, Primask, SystExt};

use crate::console::Console;

/// Core clock straight out of reset (PIOSC)
const SYSCLK_HZ: u32 = 16_000_000;

/// Gives the debugger time to attach before the first line goes out
const SETTLE_MS: u32 = 10_000;

const JITTER_SEED: u32 = 0x2545_F491;

#[entry]
fn main() -> ! {
    let p = cortex_m::Peripherals::take().unwrap();

    logging::init_logging();

    let mut pause = AsmDelay::new(SYSCLK_HZ.hz());
    pause.delay_ms(SETTLE_MS);

    let mut console = match Console::stdout() {
        Ok(console) => console,
        Err(_) => halt(),
    };

    let hw = Hardware {
        counter: p.SYST.counter(),
        clock: MonoTimer::new(p.DCB, p.DWT, SYSCLK_HZ.hz()),
        interrupts: Primask,
        // The M4F has no instruction cache to flush
        cache: NoCache,
    };

    let config = HarnessConfig::default()
        .with_unit(SweepUnit::Micros)
        .with_flush_cache(false);

    let jitter = XorShift32::new(JITTER_SEED);
    let mut harness = match Harness::new(config, hw, pause, jitter, SYSCLK_HZ.hz()) {
        Ok(harness) => harness,
        Err(e) => {
            error!("bad configuration: {:?}", e);
            halt()
        }
    };

    if harness.banner(&mut console).is_err() {
        halt()
    }

    match harness.run(&mut console, &Never) {
        Ok(sweeps) => info!("stopped after {} sweeps", sweeps),
        Err(e) => error!("report failed: {:?}", e),
    }
    halt()
}

fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
