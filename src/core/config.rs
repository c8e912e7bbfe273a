use crate::errors::{AutomatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub hints: LocatorHints,
    pub browser: BrowserConfig,
    pub reporter: ReporterConfig,
}

/// Pacing of a run. Both values are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub char_delay_ms: u64,
    pub step_delay_ms: u64,
}

/// User-supplied selectors that override automatic element detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorHints {
    pub input_hint: Option<String>,
    pub button_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
    pub navigation_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    pub channel_capacity: usize,
}

impl Config {
    /// Loads a JSON config file. Missing sections take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AutomatorError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)?;
        if config.reporter.channel_capacity == 0 {
            return Err(AutomatorError::ConfigurationError(
                "reporter.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            char_delay_ms: 20,
            step_delay_ms: 1500,
        }
    }
}

impl LocatorHints {
    /// Empty strings count as "no hint".
    pub fn new(input_hint: Option<String>, button_hint: Option<String>) -> Self {
        Self {
            input_hint: non_empty(input_hint),
            button_hint: non_empty(button_hint),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            args: vec![],
            navigation_timeout_ms: 30000,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}
