//! Precision and recall bookkeeping for `test`.

/// Aggregate counts over evaluated examples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Meter {
    /// Examples evaluated.
    pub examples: u64,

    /// Gold labels seen.
    pub gold: u64,

    /// Labels predicted.
    pub predicted: u64,

    /// Predicted labels that were gold.
    pub true_positives: u64,
}

impl Meter {
    /// Record one example.
    pub fn log(&mut self, gold: &[usize], predicted: &[usize]) {
        self.examples += 1;
        self.gold += gold.len() as u64;
        self.predicted += predicted.len() as u64;
        self.true_positives += predicted.iter().filter(|p| gold.contains(p)).count() as u64;
    }

    /// Precision at k.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.predicted)
    }

    /// Recall at k.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.gold)
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
