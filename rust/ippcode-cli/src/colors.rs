//! ANSI color helpers for CLI output.

/// Format text in red.
pub fn red(s: &str) -> String {
    format!("\x1b[31m{}\x1b[0m", s)
}

/// Format text in yellow.
pub fn yellow(s: &str) -> String {
    format!("\x1b[33m{}\x1b[0m", s)
}

/// Format text in gray.
pub fn gray(s: &str) -> String {
    format!("\x1b[90m{}\x1b[0m", s)
}

/// Apply `style` only when colour output is enabled.
pub fn paint(enabled: bool, style: fn(&str) -> String, s: &str) -> String {
    if enabled {
        style(s)
    } else {
        s.to_string()
    }
}
