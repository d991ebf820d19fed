//! Distribution helpers shared by the extractors.

use std::collections::HashMap;
use std::hash::Hash;

/// Frequency table over arbitrary hashable values.
#[derive(Debug)]
pub struct Frequency<T: Eq + Hash> {
    counts: HashMap<T, u64>,
    total: u64,
}

impl<T: Eq + Hash> Frequency<T> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            total: 0,
        }
    }

    pub fn add(&mut self, value: T) {
        *self.counts.entry(value).or_insert(0) += 1;
        self.total += 1;
    }

    /// Distinct values observed.
    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Shannon entropy in bits. One or zero observations carry no spread,
    /// so they score 0.0.
    pub fn entropy(&self) -> f64 {
        if self.total <= 1 {
            return 0.0;
        }
        let total = self.total as f64;
        self.counts
            .values()
            .map(|&count| {
                let p = count as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}

impl<T: Eq + Hash> Default for Frequency<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> FromIterator<T> for Frequency<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut freq = Self::new();
        for value in iter {
            freq.add(value);
        }
        freq
    }
}

/// Running numeric summary: mean and sample variance via Welford's update.
#[derive(Debug, Default)]
pub struct Summary {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Summary {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance (n - 1 denominator); 0.0 below two observations.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }
}

impl FromIterator<f64> for Summary {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut summary = Self::default();
        for value in iter {
            summary.add(value);
        }
        summary
    }
}
