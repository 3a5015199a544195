/// incremental arithmetic mean, `mean += (x - mean) / n`. stays exact when all
/// samples are equal and does not accumulate a large running sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    mean: f64,
    count: usize,
}

impl RunningMean {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.mean += (x - self.mean) / self.count as f64;
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean)
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// mean of a sample set that does not depend on the order the samples arrive in.
/// the samples are sorted in place before folding.
pub fn stable_mean(samples: &mut [f64]) -> RunningMean {
    samples.sort_by(|a, b| a.total_cmp(b));
    let mut acc = RunningMean::default();
    for x in samples.iter() {
        acc.push(*x);
    }
    acc
}
