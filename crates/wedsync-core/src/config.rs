//! TOML-based engine configuration.
//!
//! Holds the resolution policy (buffer and confidence scores) and the
//! session carry-over policy. Stored at `~/.config/wedsync/timeline.toml`;
//! set `WEDSYNC_ENV=dev` to use `~/.config/wedsync-dev/` instead.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Buffer inserted after an anchor or dependency when none is declared.
pub const DEFAULT_BUFFER_MINUTES: i64 = 15;

/// Resolution synthesizer policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: i64,
    /// Confidence when exactly one side of a time overlap is flexible
    #[serde(default = "default_single_flexible_confidence")]
    pub single_flexible_confidence: f64,
    /// Confidence when both sides are flexible and event 1 is picked
    #[serde(default = "default_both_flexible_confidence")]
    pub both_flexible_confidence: f64,
    #[serde(default = "default_dependency_confidence")]
    pub dependency_confidence: f64,
}

/// What happens to resolved state when a conflict id recurs on re-detect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarryOver {
    /// Every pass is authoritative; recurring ids come back unresolved.
    #[default]
    Fresh,
    /// Recurring ids keep their previous resolved state.
    Sticky,
}

/// Conflict session policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub carry_over: CarryOver,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/wedsync/timeline.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

// Default functions
fn default_buffer_minutes() -> i64 {
    DEFAULT_BUFFER_MINUTES
}
fn default_single_flexible_confidence() -> f64 {
    0.9
}
fn default_both_flexible_confidence() -> f64 {
    0.7
}
fn default_dependency_confidence() -> f64 {
    0.95
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: default_buffer_minutes(),
            single_flexible_confidence: default_single_flexible_confidence(),
            both_flexible_confidence: default_both_flexible_confidence(),
            dependency_confidence: default_dependency_confidence(),
        }
    }
}

impl ResolutionConfig {
    pub fn with_buffer_minutes(mut self, minutes: i64) -> Self {
        self.buffer_minutes = minutes;
        self
    }

    /// # Errors
    /// Returns an error for a negative buffer or a confidence outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_minutes < 0 {
            return Err(ConfigError::InvalidValue {
                key: "resolution.buffer_minutes".into(),
                message: format!("must not be negative, got {}", self.buffer_minutes),
            });
        }
        let confidences = [
            ("resolution.single_flexible_confidence", self.single_flexible_confidence),
            ("resolution.both_flexible_confidence", self.both_flexible_confidence),
            ("resolution.dependency_confidence", self.dependency_confidence),
        ];
        for (key, value) in confidences {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("must be within [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

impl EngineConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<i64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) => return Err(unknown()),
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Returns `~/.config/wedsync[-dev]/timeline.toml` based on WEDSYNC_ENV.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let base_dir = dirs::home_dir().ok_or(ConfigError::NoConfigDir)?.join(".config");
        let env = std::env::var("WEDSYNC_ENV").unwrap_or_else(|_| "production".to_string());
        let dir = if env == "dev" {
            base_dir.join("wedsync-dev")
        } else {
            base_dir.join("wedsync")
        };
        Ok(dir.join("timeline.toml"))
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`, or return the default if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from the default location.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from the default location, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default engine config");
                Self::default()
            }
        }
    }

    /// Persist to `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Persist to the default location.
    ///
    /// # Errors
    /// Returns an error if the config cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    /// # Errors
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolution.validate()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
