//! Error chain rendering for CLI diagnostics.
//!
//! Walks `std::error::Error::source()` so every layer of a failure is shown:
//!
//! ```text
//! error: cannot read source file 'prog.json'
//!   caused by: No such file or directory (os error 2)
//! ```

use std::fmt;

/// A primary message plus the messages of its causes, outermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorChain {
    primary: String,
    causes: Vec<String>,
}

impl ErrorChain {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            causes: Vec::new(),
        }
    }

    pub fn add_cause(&mut self, cause: impl Into<String>) {
        self.causes.push(cause.into());
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// Format the chain with `prefix` (usually a possibly coloured `error:`).
    pub fn format_with_prefix(&self, prefix: &str) -> String {
        format!("{} {}", prefix, self)
    }
}

impl fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}

/// Walk a `std::error::Error` source chain and collect all messages.
pub fn chain_from_error(err: &dyn std::error::Error) -> ErrorChain {
    let mut chain = ErrorChain::new(err.to_string());
    let mut source = err.source();
    while let Some(cause) = source {
        chain.add_cause(cause.to_string());
        source = cause.source();
    }
    chain
}
