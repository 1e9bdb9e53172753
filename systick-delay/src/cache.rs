//! Instruction cache flushing

/// Invalidates the instruction cache so the next measured delay runs cold
pub trait CacheFlush {
    /// Invalidate (and let hardware refill) the instruction cache
    fn flush(&mut self);
}

impl<T: CacheFlush + ?Sized> CacheFlush for &mut T {
    #[inline]
    fn flush(&mut self) {
        (**self).flush()
    }
}

/// For cores without an instruction cache
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl CacheFlush for NoCache {
    #[inline]
    fn flush(&mut self) {
        // Nothing to invalidate
    }
}
