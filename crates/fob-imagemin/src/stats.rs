use std::fmt;

/// Raw vs. optimized size of one asset, rendered as `~N% smaller|bigger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeComparison {
    pub raw: usize,
    pub optimized: usize,
}

impl SizeComparison {
    pub fn new(raw: usize, optimized: usize) -> Self {
        Self { raw, optimized }
    }

    pub fn is_smaller(&self) -> bool {
        self.optimized < self.raw
    }

    /// Rounded relative size difference in percent. Empty input counts as 0%.
    pub fn percent(&self) -> u64 {
        if self.raw == 0 {
            return 0;
        }
        let ratio = self.optimized as f64 / self.raw as f64;
        ((1.0 - ratio).abs() * 100.0).round() as u64
    }
}

impl fmt::Display for SizeComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_smaller() { "smaller" } else { "bigger" };
        write!(f, "~{}% {}", self.percent(), direction)
    }
}
