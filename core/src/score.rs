/// Running score of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreAccumulator {
    total: u64,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, delta: u64) {
        self.total = self.total.saturating_add(delta);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Back to zero, for a new session or a restart.
    pub fn reset(&mut self) {
        self.total = 0;
    }
}
