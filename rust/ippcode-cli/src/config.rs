//! Configuration file parsing for `ippcode.toml`.
//!
//! Searches current directory then ancestors, falling back to
//! `<config dir>/ippcode/ippcode.toml` if no project-level file is found.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "ippcode.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IppcodeConfig {
    /// Default tracing filter, used when `IPPCODE_LOG` is unset.
    #[serde(default)]
    pub log: Option<String>,
    /// Colour the `error:`/`warning:` labels on stderr.
    #[serde(default = "default_color")]
    pub color: bool,
    #[serde(default)]
    pub stats: StatsSection,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StatsSection {
    /// Statistics file used when `--insts`/`--vars` are given without `--stats`.
    pub path: Option<PathBuf>,
}

fn default_color() -> bool {
    true
}

impl Default for IppcodeConfig {
    fn default() -> Self {
        Self {
            log: None,
            color: default_color(),
            stats: StatsSection::default(),
        }
    }
}

impl IppcodeConfig {
    /// Load config from `ippcode.toml`, searching current dir then parents.
    ///
    /// Returns `Default` when no file is found and an error message when
    /// the file that was found cannot be used.
    pub fn load() -> Result<Self, String> {
        match Self::find() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("invalid toml in '{}': {}", path.display(), e))
    }

    /// Path of the config file that applies to the current directory.
    pub fn find() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::find_from(&cwd)
    }

    fn find_from(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !dir.pop() {
                break;
            }
        }
        // Try global config
        let global = dirs::config_dir()?.join("ippcode").join(CONFIG_FILE);
        global.is_file().then_some(global)
    }

    /// Parse a TOML string directly (useful for testing and embedding).
    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Generate a default `ippcode.toml` template.
    pub fn default_template() -> &'static str {
        r#"# IPPcode19 interpreter configuration
log = "warn"
color = true

[stats]
# path = "stats.txt"
"#
    }
}
