//! The `--stats` report: one counter per line, in command-line order.

use std::io::{self, Write};
use std::path::Path;

use ippcode_vm::RunStats;

/// A counter that can be requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// `--insts`: executed instructions.
    Insts,
    /// `--vars`: peak number of initialized variables.
    Vars,
}

impl Counter {
    pub fn value(self, stats: &RunStats) -> u64 {
        match self {
            Counter::Insts => stats.instructions,
            Counter::Vars => stats.max_initialized_vars as u64,
        }
    }
}

pub fn render(counters: &[Counter], stats: &RunStats) -> String {
    counters
        .iter()
        .map(|c| format!("{}\n", c.value(stats)))
        .collect()
}

/// Create or truncate `path` and write the requested counters.
pub fn write_stats(path: &Path, counters: &[Counter], stats: &RunStats) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(render(counters, stats).as_bytes())?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_follows_requested_order() {
        let stats = RunStats {
            instructions: 12,
            max_initialized_vars: 3,
        };
        assert_eq!(render(&[Counter::Vars, Counter::Insts], &stats), "3\n12\n");
        assert_eq!(render(&[Counter::Insts], &stats), "12\n");
        assert_eq!(render(&[], &stats), "");
    }
}
