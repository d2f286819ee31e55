//! Counters collected while a program runs.

/// Execution statistics, reported by `BREAK` and written by `--stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Instructions that completed successfully.
    pub instructions: u64,
    /// Largest number of initialized variables alive at once, over all frames.
    pub max_initialized_vars: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one completed instruction, given the current number of
    /// initialized variables.
    pub fn record(&mut self, initialized_vars: usize) {
        self.instructions = self.instructions.saturating_add(1);
        self.max_initialized_vars = self.max_initialized_vars.max(initialized_vars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tracks_maximum() {
        let mut stats = RunStats::new();
        stats.record(2);
        stats.record(5);
        stats.record(1);
        assert_eq!(stats.instructions, 3);
        assert_eq!(stats.max_initialized_vars, 5);
    }
}
