//! `asdrc` engine configuration.
//!
//! A config file is a list of `key = value` settings:
//!
//! | Key | Value | Default |
//! |-----|-------|---------|
//! | `max_iterations` | WHILE iteration cap (positive integer) | `10000` |
//! | `show_tips` | print the tip line under each diagnostic | `true` |
//! | `sleep` | honour `SLEEP n` (`false` skips the wait) | `true` |
//! | `seed` | fixed RNG seed, or `none` | `none` |
//!
//! Lines starting with `#` or `;` are comments.  A bad line is reported and
//! skipped; it never stops the rest of the file from loading.

use std::path::Path;

use thiserror::Error;

pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Settings that shape one interpreter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_iterations: usize,
    pub show_tips: bool,
    pub sleep: bool,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            show_tips: true,
            sleep: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string on top of the defaults.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = EngineConfig::new();
        let errors = config.apply_str(s);
        (config, errors)
    }

    /// Apply the settings in `s` to `self`, returning any per-line errors.
    pub fn apply_str(&mut self, s: &str) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected `key = value`, got `{line}`"),
                });
                continue;
            };

            if let Err(message) = self.set(key.trim(), value.trim()) {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        errors
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// Set one key.  Keys are case-insensitive.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key.to_ascii_lowercase().as_str() {
            "max_iterations" => {
                self.max_iterations = match value.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(format!("max_iterations must be a positive integer, got `{value}`")),
                };
            }
            "show_tips" => self.show_tips = parse_bool(key, value)?,
            "sleep" => self.sleep = parse_bool(key, value)?,
            "seed" => {
                self.seed = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(
                        value
                            .parse()
                            .map_err(|_| format!("seed must be an unsigned integer or `none`, got `{value}`"))?,
                    )
                };
            }
            _ => return Err(format!("unknown setting `{key}`")),
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(format!("{key} must be true or false, got `{value}`")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
