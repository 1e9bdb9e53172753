//! Randomized spacing between trials
//!
//! Pausing a random amount between trials keeps periodic interference from
//! lining up with the sweep.

/// Source of pause jitter
pub trait Jitter {
    /// A value in `0..bound`, or zero when `bound` is zero
    fn next_below(&mut self, bound: u32) -> u32;
}

impl<T: Jitter + ?Sized> Jitter for &mut T {
    #[inline]
    fn next_below(&mut self, bound: u32) -> u32 {
        (**self).next_below(bound)
    }
}

/// Always zero: every pause is the fixed part only
#[derive(Clone, Copy, Debug, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    #[inline]
    fn next_below(&mut self, _bound: u32) -> u32 {
        0
    }
}

/// Marsaglia xorshift32 generator
#[derive(Clone, Copy, Debug)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// Seeds the generator (a zero seed would get stuck, so it is replaced)
    pub const fn new(seed: u32) -> Self {
        XorShift32 {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    /// Next raw value
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl Jitter for XorShift32 {
    fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            0
        } else {
            self.next_u32() % bound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_below_bound() {
        let mut rng = XorShift32::new(1);
        for _ in 0..1_000 {
            assert!(rng.next_below(17) < 17);
        }
        assert_eq!(rng.next_below(0), 0);
    }

    #[test]
    fn zero_seed_still_moves() {
        let mut rng = XorShift32::new(0);
        let a = rng.next_u32();
        let b = rng.next_u32();
        assert_ne!(a, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn known_sequence() {
        let mut rng = XorShift32::new(1);
        assert_eq!(rng.next_u32(), 270_369);
    }
}
