use crate::core::{LocatorHints, TimingConfig};
use crate::types::StatusSnapshot;

/// The single run shared by every command for the life of the page.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub running: bool,
    pub paused: bool,
    pub queue: Vec<String>,
    /// Prompts already submitted.
    pub index: usize,
    pub hints: LocatorHints,
    pub timing: TimingConfig,
    pub last_error: Option<String>,
}

impl RunState {
    pub fn new(timing: TimingConfig, hints: LocatorHints) -> Self {
        Self {
            timing,
            hints,
            ..Default::default()
        }
    }

    /// Running and not paused.
    pub fn is_active(&self) -> bool {
        self.running && !self.paused
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.queue.len()
    }

    pub fn current_prompt(&self) -> Option<&str> {
        self.queue.get(self.index).map(String::as_str)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            running: self.running,
            paused: self.paused,
            index: self.index,
            total: self.queue.len(),
            error: self.last_error.clone(),
        }
    }
}
