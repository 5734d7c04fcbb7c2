use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Store Configuration
// ============================================================================
//
// Both values are supplied from outside the process: environment variables
// for the binary, a JSON file or plain construction for embedders.
//
// ============================================================================

pub const FOLDER_ENV: &str = "EVENT_STORE_FOLDER";
pub const SEPARATOR_ENV: &str = "EVENT_STORE_SEPARATOR";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root folder; one sub-folder per aggregate type.
    pub folder: PathBuf,
    /// Token written between consecutive records of a log.
    pub event_separator: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("./data/events"),
            event_separator: "\n".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new(folder: impl Into<PathBuf>, event_separator: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            event_separator: event_separator.into(),
        }
    }

    /// Read `EVENT_STORE_FOLDER` / `EVENT_STORE_SEPARATOR`, defaulting
    /// whatever is unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid store config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(folder) = lookup(FOLDER_ENV) {
            config.folder = PathBuf::from(folder);
        }
        if let Some(separator) = lookup(SEPARATOR_ENV) {
            config.event_separator = unescape(&separator);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_separator.is_empty() {
            bail!("Event separator cannot be empty");
        }
        if self.folder.as_os_str().is_empty() {
            bail!("Event store folder cannot be empty");
        }
        Ok(())
    }
}

/// Environment variables cannot easily carry control characters, so accept
/// `\n`, `\r`, `\t` and `\\` escapes.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

// ============================================================================
// Unit Tests
// ============================================================================
