// file: src/config/loader.rs
// version: 1.0.0
// guid: c7e2d914-85a6-4b03-92c1-8d4e7f1a6b35

//! Dotenv-style configuration loading
//!
//! Settings come from three layers with increasing precedence: built-in
//! defaults, an optional `KEY=VALUE` file, and the process environment.
//! File contents are parsed, never evaluated: a malformed line is skipped
//! with a warning and can never execute anything. Unquoted values end at an
//! inline ` # comment`; quoted values keep everything up to the closing
//! quote.

use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::Result;

/// Keys the loader recognizes from file and environment
pub const KNOWN_KEYS: &[&str] = &[
    "USERNAME",
    "SSH_PORT",
    "FAIL2BAN_FINDTIME",
    "FAIL2BAN_MAXRETRY",
    "FAIL2BAN_BANTIME",
    "SSH_MAX_AUTH_TRIES",
    "SSH_CLIENT_ALIVE_INTERVAL",
    "SSH_CLIENT_ALIVE_COUNT_MAX",
    "SSH_MAX_STARTUPS",
    "SSH_LOGIN_GRACE_TIME",
    "CONTROL_PLANE_UI_PORT",
    "PROMETHEUS_PORT",
    "GRAFANA_PORT",
    "PERSONAL_SSH_KEY",
    "CONTROL_PLANE_SSH_KEY",
    "CONTROL_PLANE_IP",
    "SWARM_JOIN_TOKEN",
];

/// Built-in defaults applied before file and environment layers
const DEFAULTS: &[(&str, &str)] = &[
    ("USERNAME", "ubuntu"),
    ("SSH_PORT", "22"),
    ("FAIL2BAN_FINDTIME", "600"),
    ("FAIL2BAN_MAXRETRY", "3"),
    ("FAIL2BAN_BANTIME", "3600"),
    ("SSH_MAX_AUTH_TRIES", "3"),
    ("SSH_CLIENT_ALIVE_INTERVAL", "300"),
    ("SSH_CLIENT_ALIVE_COUNT_MAX", "2"),
    ("SSH_MAX_STARTUPS", "10:30:60"),
    ("SSH_LOGIN_GRACE_TIME", "30"),
    ("CONTROL_PLANE_UI_PORT", "3000"),
    ("PROMETHEUS_PORT", "9090"),
    ("GRAFANA_PORT", "3001"),
];

/// Raw string settings after layering, before validation
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Get a setting value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Get a setting that is guaranteed a default
    pub fn get_or_default(&self, key: &str) -> &str {
        self.get(key).unwrap_or_else(|| {
            panic!("setting {} has no default", key);
        })
    }

    /// Insert a value, used by tests and the loader
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

/// Configuration loader with environment override support
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
    line_re: Regex,
}

impl ConfigLoader {
    /// Create a new config loader using the process environment
    pub fn new() -> Self {
        Self::with_env(std::env::vars().collect())
    }

    /// Create a loader with an explicit environment map
    pub fn with_env(env_vars: HashMap<String, String>) -> Self {
        // KEY=VALUE with a shell-identifier key; anything else is skipped.
        let line_re = Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$")
            .expect("static regex");
        Self { env_vars, line_re }
    }

    /// Load settings: defaults, then the optional file, then environment.
    ///
    /// A missing file is not an error; the remaining layers still apply.
    pub fn load(&self, path: Option<&Path>) -> Result<Settings> {
        let mut settings = Settings::default();
        for (key, value) in DEFAULTS {
            settings.set(*key, *value);
        }

        if let Some(path) = path {
            match fs::read_to_string(path) {
                Ok(content) => {
                    debug!("Loading configuration from {}", path.display());
                    self.apply_file(&mut settings, &content);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(
                        "Configuration file {} not found, using defaults and environment",
                        path.display()
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        for key in KNOWN_KEYS {
            if let Some(value) = self.env_vars.get(*key) {
                settings.set(*key, value.clone());
            }
        }

        Ok(settings)
    }

    /// Parse `KEY=VALUE` lines into the settings map
    fn apply_file(&self, settings: &mut Settings, content: &str) {
        for (lineno, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match self.line_re.captures(line) {
                Some(caps) => {
                    let key = caps[1].to_string();
                    let value = parse_value(caps[2].trim()).to_string();
                    if !KNOWN_KEYS.contains(&key.as_str()) {
                        warn!("Ignoring unknown configuration key {}", key);
                        continue;
                    }
                    settings.set(key, value);
                }
                None => {
                    warn!(
                        "Skipping malformed configuration line {}: {}",
                        lineno + 1,
                        raw
                    );
                }
            }
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpret raw value text.
///
/// A leading quote runs to its matching close quote and protects `#`
/// inside; the rest of the line is discarded. An unquoted value ends at an
/// inline ` # comment`; a `#` not preceded by whitespace is part of the
/// value.
fn parse_value(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return &rest[..end];
            }
        }
    }
    let cut = raw
        .char_indices()
        .find(|&(i, c)| c == '#' && (i == 0 || raw[..i].ends_with(char::is_whitespace)))
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    raw[..cut].trim_end()
}
