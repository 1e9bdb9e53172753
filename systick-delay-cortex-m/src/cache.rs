//! Instruction cache flushing (Cortex-M7)

use cortex_m::peripheral::SCB;
use systick_delay::cache::CacheFlush;

/// The core's instruction cache
pub struct ICache {
    scb: SCB,
}

impl ICache {
    /// Takes the SCB; the cache is expected to be enabled already
    pub fn new(scb: SCB) -> Self {
        ICache { scb }
    }

    /// Releases the SCB
    pub fn free(self) -> SCB {
        self.scb
    }
}

impl CacheFlush for ICache {
    #[inline]
    fn flush(&mut self) {
        self.scb.invalidate_icache();
    }
}
