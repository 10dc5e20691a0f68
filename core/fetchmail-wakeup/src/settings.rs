//! Per-session key/value settings sources.
//!
//! The host supplies settings through [`SettingsLookup`]. Keys are the plugin
//! setting names (`fetchmail_helper`, `fetchmail_interval`, ...) and values are
//! raw strings; interpretation happens in [`crate::config`].

use crate::error::{Result, WakeError};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::io;
use std::path::Path;

/// Read-only view of one session's plugin settings.
pub trait SettingsLookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl SettingsLookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl SettingsLookup for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

/// Settings exported into the process environment.
///
/// IMAP servers that run one process per session typically export plugin
/// settings as upper-cased environment variables, so `fetchmail_helper` is
/// read from `FETCHMAIL_HELPER`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSettings;

impl SettingsLookup for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key.to_ascii_uppercase()).ok()
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    plugin: BTreeMap<String, toml::Value>,
}

/// Settings loaded from the `[plugin]` table of a TOML file.
///
/// ```toml
/// [plugin]
/// fetchmail_pidfile = "/var/run/fetchmail/fetchmail.pid"
/// fetchmail_interval = 60
/// fetchmail_interval_idle = 5
/// ```
#[derive(Debug, Default, Clone)]
pub struct SettingsFile {
    values: BTreeMap<String, String>,
}

impl SettingsFile {
    /// Loads settings from `path`, returning empty settings if it doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs_err::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(WakeError::SettingsUnavailable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&content).map_err(|details| WakeError::SettingsMalformed {
            path: path.to_path_buf(),
            details,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let document: SettingsDocument = toml::from_str(content).map_err(|e| e.to_string())?;

        let mut values = BTreeMap::new();
        for (key, value) in document.plugin {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
                other => return Err(format!("unsupported value for {}: {}", key, other)),
            };
            values.insert(key, text);
        }

        Ok(Self { values })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsLookup for SettingsFile {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Ordered stack of lookups; the first layer that has a key wins.
#[derive(Default)]
pub struct Layered<'a> {
    layers: Vec<&'a dyn SettingsLookup>,
}

impl<'a> Layered<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn with(mut self, layer: &'a dyn SettingsLookup) -> Self {
        self.layers.push(layer);
        self
    }
}

impl SettingsLookup for Layered<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}
