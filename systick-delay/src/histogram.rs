//! Fixed-size error histogram

use crate::config::ConfigError;

/// Upper bound on the number of buckets a histogram can hold
pub const MAX_BUCKETS: usize = 128;

/// Where a trial's error ended up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Counted in this bucket
    Bucket(usize),
    /// Negative, or too large for any bucket
    Outlier,
}

impl Classification {
    /// Whether the error fell outside the histogram
    pub fn is_outlier(self) -> bool {
        self == Classification::Outlier
    }
}

/// Occurrence counts for errors `0..size`
///
/// Errors outside that range are not stored here; [`record`](Self::record)
/// reports them as outliers and leaves every bucket untouched.
#[derive(Clone, Debug)]
pub struct Histogram {
    counts: [u32; MAX_BUCKETS],
    size: usize,
}

impl Histogram {
    /// An empty histogram with `size` buckets
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroHistogram);
        }
        if size > MAX_BUCKETS {
            return Err(ConfigError::HistogramTooLarge);
        }
        Ok(Histogram {
            counts: [0; MAX_BUCKETS],
            size,
        })
    }

    /// Number of buckets
    pub fn size(&self) -> usize {
        self.size
    }

    /// Zeroes every bucket
    pub fn reset(&mut self) {
        self.counts = [0; MAX_BUCKETS];
    }

    /// Returns the bucket an error belongs in, without recording it
    pub fn classify(&self, error: i32) -> Classification {
        match cast::usize(error) {
            Ok(bucket) if bucket < self.size => Classification::Bucket(bucket),
            _ => Classification::Outlier,
        }
    }

    /// Counts one error
    pub fn record(&mut self, error: i32) -> Classification {
        let class = self.classify(error);
        if let Classification::Bucket(bucket) = class {
            self.counts[bucket] = self.counts[bucket].saturating_add(1);
        }
        class
    }

    /// Count in one bucket (zero past the end)
    pub fn count(&self, bucket: usize) -> u32 {
        self.counts().get(bucket).copied().unwrap_or(0)
    }

    /// All bucket counts
    pub fn counts(&self) -> &[u32] {
        &self.counts[..self.size]
    }

    /// Sum over every bucket
    pub fn total(&self) -> u32 {
        self.counts().iter().fold(0u32, |acc, &c| acc.saturating_add(c))
    }

    /// Whether `bucket` and every bucket after it are empty
    pub fn is_zero_from(&self, bucket: usize) -> bool {
        self.counts().iter().skip(bucket).all(|&c| c == 0)
    }
}
