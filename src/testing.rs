use crate::core::Config;
use crate::dom::HtmlPage;
use crate::engine::{Engine, StatusSink};
use crate::errors::Result;
use crate::types::{StatusMessage, StatusSnapshot};
use std::sync::{Arc, Mutex};

/// Markup shaped like a typical generator page: a search box, the big
/// prompt area, a few unrelated buttons and the submit control.
pub const GENERATOR_PAGE: &str = r#"<html><body>
    <header>
        <input id="search" type="search" placeholder="Search">
        <button id="menu">Menu</button>
    </header>
    <main>
        <textarea id="prompt" placeholder="Describe an image"></textarea>
        <div role="button" id="settings">Settings</div>
        <button id="generate" type="submit">Generate</button>
    </main>
</body></html>"#;

/// Keeps every status it is handed.
#[derive(Clone, Default)]
pub struct RecordingSink {
    messages: Arc<Mutex<Vec<StatusMessage>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<StatusSnapshot> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|m| m.status.clone())
            .collect()
    }

    pub fn last(&self) -> Option<StatusSnapshot> {
        self.statuses().pop()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatusSink for RecordingSink {
    fn publish(&self, message: &StatusMessage) -> Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(())
    }
}

pub struct TestHelper;

impl TestHelper {
    /// The generator page with a prompt area big enough to win detection.
    pub fn generator_page() -> HtmlPage {
        HtmlPage::new(GENERATOR_PAGE)
            .with_size("#search", 240.0, 32.0)
            .with_size("#prompt", 640.0, 160.0)
    }

    pub fn engine(page: HtmlPage) -> (Engine<HtmlPage, RecordingSink>, RecordingSink) {
        let sink = RecordingSink::new();
        let engine = Engine::new(page, sink.clone(), &Config::default());
        (engine, sink)
    }

    pub fn prompts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}
