//! Windowed statistics over the most recent samples
//!
//! Used to profile the cost of each physics step. The buffer starts out
//! zero-filled, so the average is diluted until `window` samples have been
//! added.

/// Fixed-size ring of signed samples
#[derive(Clone, Debug)]
pub struct WindowedStats {
    samples: Vec<i64>,
    next: usize,
    total_samples: u64,
}

impl WindowedStats {
    /// Create stats over the last `window` samples
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero.
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "WindowedStats window must be at least 1");
        Self {
            samples: vec![0; window],
            next: 0,
            total_samples: 0,
        }
    }

    /// Record a sample, evicting the oldest once the window is full
    pub fn add(&mut self, sample: i64) {
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % self.samples.len();
        self.total_samples += 1;
    }

    /// Mean of the window, truncated toward zero
    pub fn average(&self) -> i64 {
        let sum: i128 = self.samples.iter().map(|&s| i128::from(s)).sum();
        (sum / self.samples.len() as i128) as i64
    }

    /// Smallest value in the window
    pub fn min(&self) -> i64 {
        self.samples.iter().copied().min().unwrap_or(0)
    }

    /// Largest value in the window
    pub fn max(&self) -> i64 {
        self.samples.iter().copied().max().unwrap_or(0)
    }

    /// Number of `add` calls so far, independent of wraparound
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Capacity of the ring
    pub fn window_size(&self) -> usize {
        self.samples.len()
    }
}
