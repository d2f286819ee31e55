//! IPPcode VM: three-frame interpreter for loaded IPPcode19 programs.

pub mod frames;
pub mod io;
pub mod labels;
pub mod stacks;
pub mod stats;
pub mod vm;

pub use io::{LineSource, ReadOutcome, ReaderLines, ScriptedLines, Sink};
pub use stats::RunStats;
pub use vm::{DebugEvent, VmError, VM};
