//! I/O collaborators: the line source behind `READ` and the sinks behind
//! `WRITE`, `DPRINT` and `BREAK`.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use ippcode_core::values::{parse_float, parse_int};
use ippcode_core::{DataType, Value};

/// Produces input lines for `READ`.
pub trait LineSource {
    /// Next line without its terminator, or `None` at end of input.
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Lines from any buffered reader (an input file, stdin).
pub struct ReaderLines<R: BufRead> {
    reader: R,
}

impl<R: BufRead> ReaderLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// A fixed queue of lines.
#[derive(Debug, Default, Clone)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for ScriptedLines {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Result of converting an input line for `READ`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Parsed(Value),
    /// Missing or malformed input; the type's zero value is used instead.
    Defaulted(Value),
}

impl ReadOutcome {
    pub fn into_value(self) -> Value {
        match self {
            ReadOutcome::Parsed(v) | ReadOutcome::Defaulted(v) => v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, ReadOutcome::Defaulted(_))
    }
}

/// Convert one input line to a value of `ty`. Never fails.
pub fn convert_input(line: Option<&str>, ty: DataType) -> ReadOutcome {
    let Some(line) = line else {
        return ReadOutcome::Defaulted(Value::zero(ty));
    };
    let parsed = match ty {
        DataType::Int => parse_int(line.trim()).map(Value::Int),
        DataType::Float => parse_float(line).map(Value::Float),
        DataType::Bool => Some(Value::Bool(line.trim().eq_ignore_ascii_case("true"))),
        DataType::String => Some(Value::String(line.to_string())),
        DataType::Nil => Some(Value::Nil),
    };
    match parsed {
        Some(v) => ReadOutcome::Parsed(v),
        None => ReadOutcome::Defaulted(Value::zero(ty)),
    }
}

/// Destination for program output or diagnostics.
pub enum Sink {
    /// Collect text in memory (default; used by tests and embedders).
    Captured(String),
    Writer(Box<dyn Write>),
}

impl Sink {
    pub fn captured() -> Self {
        Sink::Captured(String::new())
    }

    pub fn writer(w: impl Write + 'static) -> Self {
        Sink::Writer(Box::new(w))
    }

    pub fn write_text(&mut self, text: &str) -> io::Result<()> {
        match self {
            Sink::Captured(buf) => {
                buf.push_str(text);
                Ok(())
            }
            Sink::Writer(w) => w.write_all(text.as_bytes()),
        }
    }

    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.write_text(text)?;
        self.write_text("\n")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Captured(_) => Ok(()),
            Sink::Writer(w) => w.flush(),
        }
    }

    /// Captured text; empty for writer sinks.
    pub fn text(&self) -> &str {
        match self {
            Sink::Captured(buf) => buf,
            Sink::Writer(_) => "",
        }
    }
}

impl Default for Sink {
    fn default() -> Self {
        Sink::captured()
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sink::Captured(buf) => f.debug_tuple("Captured").field(buf).finish(),
            Sink::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}
