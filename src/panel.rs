//! Control-panel side: turning raw input into commands, remembering the
//! last settings, and rendering status for a human.

use crate::errors::Result;
use crate::types::{Command, StartRequest, StatusSnapshot};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

fn prompt_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[\n,]+").expect("static pattern compiles"))
}

/// Splits on newlines and commas, trims, and drops empty entries.
pub fn parse_prompts(text: &str) -> Vec<String> {
    prompt_separator()
        .split(text)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Last-used panel values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelSettings {
    pub typing_speed: u64,
    pub delay_between: u64,
    pub input_selector: String,
    pub button_selector: String,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            typing_speed: 20,
            delay_between: 1500,
            input_selector: String::new(),
            button_selector: String::new(),
        }
    }
}

impl PanelSettings {
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    pub fn start_request(&self, prompts: Vec<String>) -> StartRequest {
        StartRequest::new(prompts)
            .with_selectors(
                Some(self.input_selector.trim().to_string()),
                Some(self.button_selector.trim().to_string()),
            )
            .with_timing(self.typing_speed as f64, self.delay_between as f64)
    }
}

/// What pressing "start" should do given the last known status.
#[derive(Debug, Clone, PartialEq)]
pub enum StartDecision {
    Resume,
    Start(StartRequest),
    NoPrompts,
}

impl StartDecision {
    pub fn decide(last: &StatusSnapshot, prompts: Vec<String>, settings: &PanelSettings) -> Self {
        if last.paused {
            StartDecision::Resume
        } else if prompts.is_empty() {
            StartDecision::NoPrompts
        } else {
            StartDecision::Start(settings.start_request(prompts))
        }
    }

    pub fn into_command(self) -> Option<Command> {
        match self {
            StartDecision::Resume => Some(Command::Resume),
            StartDecision::Start(request) => Some(Command::Start(request)),
            StartDecision::NoPrompts => None,
        }
    }
}

/// Human-readable rendering of a status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub label: String,
    pub progress: String,
    pub start_label: &'static str,
    pub can_stop: bool,
    pub can_cancel: bool,
}

pub fn render_status(status: &StatusSnapshot) -> StatusLine {
    let label = if let Some(error) = &status.error {
        format!("Error: {}", error)
    } else if status.running && !status.paused {
        "Running".to_string()
    } else if status.paused {
        "Paused".to_string()
    } else if status.total > 0 && status.index >= status.total {
        "Done".to_string()
    } else {
        "Idle".to_string()
    };

    StatusLine {
        label,
        progress: format!("{} / {}", status.index, status.total),
        start_label: if status.paused { "Resume" } else { "Start" },
        can_stop: status.running && !status.paused,
        can_cancel: status.running || status.paused,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_split_on_newlines_and_commas() {
        let prompts = parse_prompts("a castle, a dragon\n\n  a knight  \r\n,,  \nlast");
        assert_eq!(prompts, vec!["a castle", "a dragon", "a knight", "last"]);
        assert!(parse_prompts(" ,\n ").is_empty());
    }

    #[test]
    fn status_labels_follow_precedence() {
        let mut status = StatusSnapshot {
            running: true,
            paused: false,
            index: 1,
            total: 3,
            error: None,
        };
        let line = render_status(&status);
        assert_eq!(line.label, "Running");
        assert_eq!(line.progress, "1 / 3");
        assert!(line.can_stop);

        status.paused = true;
        let line = render_status(&status);
        assert_eq!(line.label, "Paused");
        assert_eq!(line.start_label, "Resume");
        assert!(!line.can_stop);
        assert!(line.can_cancel);

        status = StatusSnapshot {
            running: false,
            paused: false,
            index: 3,
            total: 3,
            error: None,
        };
        assert_eq!(render_status(&status).label, "Done");

        status.error = Some("Input not found".to_string());
        assert_eq!(render_status(&status).label, "Error: Input not found");

        assert_eq!(render_status(&StatusSnapshot::default()).label, "Idle");
    }

    #[test]
    fn start_decision_prefers_resume_when_paused() {
        let settings = PanelSettings::default();
        let paused = StatusSnapshot {
            running: true,
            paused: true,
            ..Default::default()
        };
        assert_eq!(
            StartDecision::decide(&paused, vec![], &settings).into_command(),
            Some(Command::Resume)
        );

        let idle = StatusSnapshot::default();
        assert_eq!(
            StartDecision::decide(&idle, vec![], &settings),
            StartDecision::NoPrompts
        );

        match StartDecision::decide(&idle, vec!["x".to_string()], &settings) {
            StartDecision::Start(request) => {
                assert_eq!(request.typing_speed, Some(20.0));
                assert_eq!(request.delay_between, Some(1500.0));
                assert_eq!(request.input_selector.as_deref(), Some(""));
            }
            other => panic!("expected start, got {:?}", other),
        }
    }

    #[test]
    fn settings_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("panel-{}.json", uuid::Uuid::new_v4()));
        assert_eq!(PanelSettings::load(&path).unwrap(), PanelSettings::default());

        let settings = PanelSettings {
            typing_speed: 5,
            delay_between: 300,
            input_selector: "#prompt".to_string(),
            button_selector: String::new(),
        };
        settings.save(&path).unwrap();
        assert_eq!(PanelSettings::load(&path).unwrap(), settings);

        std::fs::remove_file(&path).unwrap();
    }
}
