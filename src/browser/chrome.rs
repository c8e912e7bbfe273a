use crate::core::{BrowserConfig, Page, SyntheticEvent};
use crate::dom::{DomElement, ElementRect};
use crate::errors::{AutomatorError, Result};
use crate::utils::javascript::{ElementSnapshot, PageScripts, QueryOutcome};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A live Chrome tab driven over the DevTools protocol.
pub struct ChromePage {
    // Dropping the browser closes the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        // Add custom args
        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| AutomatorError::LaunchFailed(e.to_string()))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| AutomatorError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AutomatorError::LaunchFailed(e.to_string()))?;
        tab.set_default_timeout(Duration::from_millis(config.navigation_timeout_ms));

        tracing::info!(headless = config.headless, "chrome launched");
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    pub async fn navigate(&self, url: &Url) -> Result<()> {
        self.tab
            .navigate_to(url.as_str())
            .map_err(|e| AutomatorError::NavigationFailed(e.to_string()))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| AutomatorError::NavigationFailed(e.to_string()))?;

        tracing::info!(%url, "page loaded");
        Ok(())
    }

    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| AutomatorError::JavaScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    fn describe(&self, selector: &str, first_only: bool) -> Result<Vec<DomElement>> {
        let value = self.evaluate(&PageScripts::query(selector, first_only))?;
        let raw = value.as_str().ok_or_else(|| {
            AutomatorError::JavaScriptFailed(format!("query returned {}", value))
        })?;

        let outcome: QueryOutcome = serde_json::from_str(raw)?;
        if let Some(error) = outcome.error {
            return Err(AutomatorError::InvalidSelector(format!(
                "{}: {}",
                selector, error
            )));
        }

        Ok(outcome.elements.into_iter().map(into_dom_element).collect())
    }

    fn run_on(&self, element: &DomElement, script: String) -> Result<()> {
        match self.evaluate(&script)?.as_bool() {
            Some(true) => Ok(()),
            _ => Err(AutomatorError::ElementDetached(element.id.clone())),
        }
    }
}

fn into_dom_element(snapshot: ElementSnapshot) -> DomElement {
    let mut element = DomElement::new(snapshot.tag_name, snapshot.id)
        .with_rect(ElementRect::new(snapshot.width, snapshot.height))
        .with_client_rects(snapshot.client_rects)
        .set_content_editable(snapshot.content_editable);
    element.attributes = snapshot.attributes;
    if !snapshot.text.trim().is_empty() {
        element = element.with_text_content(snapshot.text);
    }
    element
}

#[async_trait]
impl Page for ChromePage {
    async fn query_selector(&self, selector: &str) -> Result<Option<DomElement>> {
        Ok(self.describe(selector, true)?.into_iter().next())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<DomElement>> {
        self.describe(selector, false)
    }

    async fn set_text_content(&mut self, element: &DomElement, value: &str) -> Result<()> {
        self.run_on(element, PageScripts::set_text_content(&element.id, value))
    }

    async fn set_native_value(&mut self, element: &DomElement, value: &str) -> Result<()> {
        self.run_on(element, PageScripts::set_native_value(&element.id, value))
    }

    async fn dispatch_event(&mut self, element: &DomElement, event: SyntheticEvent) -> Result<()> {
        self.run_on(element, PageScripts::dispatch(&element.id, event))
    }

    async fn focus(&mut self, element: &DomElement) -> Result<()> {
        self.run_on(element, PageScripts::focus(&element.id))
    }

    async fn click(&mut self, element: &DomElement) -> Result<()> {
        self.run_on(element, PageScripts::click(&element.id))
    }
}
