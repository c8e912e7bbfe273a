use crate::core::{Page, SyntheticEvent};
use crate::dom::{DomElement, ElementRect};
use crate::errors::{AutomatorError, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// What happened on an [`HtmlPage`], in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEvent {
    pub kind: PageEventKind,
    pub element: String,
    /// Content of the target at dispatch time. For clicks, the content of
    /// the focused element.
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageEventKind {
    Focus,
    Input,
    Change,
    Click,
}

/// Page operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageAction {
    Query,
    Focus,
    Inject,
    Dispatch,
    Click,
}

/// A static HTML document with an approximated layout.
///
/// The markup is never re-rendered: written values, removals and sizes live
/// in an overlay keyed by each element's position in document order.
pub struct HtmlPage {
    source: String,
    sizes: HashMap<usize, ElementRect>,
    removed: HashSet<usize>,
    values: HashMap<usize, String>,
    focused: Option<usize>,
    events: Vec<PageEvent>,
    failures: HashSet<PageAction>,
}

impl HtmlPage {
    pub fn new(html: &str) -> Self {
        Self {
            source: html.to_string(),
            sizes: HashMap::new(),
            removed: HashSet::new(),
            values: HashMap::new(),
            focused: None,
            events: Vec::new(),
            failures: HashSet::new(),
        }
    }

    /// Overrides the rendered size of every element matching `selector`.
    pub fn with_size(mut self, selector: &str, width: f64, height: f64) -> Self {
        if let Ok(indices) = self.indices_matching(selector) {
            for index in indices {
                self.sizes.insert(index, ElementRect::new(width, height));
            }
        }
        self
    }

    pub fn failing_on(mut self, action: PageAction) -> Self {
        self.failures.insert(action);
        self
    }

    pub fn fail_on(&mut self, action: PageAction) {
        self.failures.insert(action);
    }

    /// Detaches every element matching `selector`. Returns how many were removed.
    pub fn remove(&mut self, selector: &str) -> Result<usize> {
        let indices = self.indices_matching(selector)?;
        let count = indices.len();
        self.removed.extend(indices);
        Ok(count)
    }

    pub fn events(&self) -> &[PageEvent] {
        &self.events
    }

    pub fn events_of(&self, kind: PageEventKind) -> Vec<&PageEvent> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }

    /// Value of the focused element at each click, in order.
    pub fn submissions(&self) -> Vec<String> {
        self.events_of(PageEventKind::Click)
            .into_iter()
            .map(|e| e.value.clone())
            .collect()
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        let index = self.indices_matching(selector).ok()?.into_iter().next()?;
        self.values.get(&index).cloned()
    }

    pub fn focused(&self) -> Option<String> {
        self.focused.map(element_id)
    }

    fn indices_matching(&self, selector: &str) -> Result<Vec<usize>> {
        let selector = parse_selector(selector)?;
        let all = parse_selector("*")?;
        let document = Html::parse_document(&self.source);
        let indices = document
            .select(&all)
            .enumerate()
            .filter(|(index, element)| !self.removed.contains(index) && selector.matches(element))
            .map(|(index, _)| index)
            .collect();
        Ok(indices)
    }

    fn matching(&self, selector: &str) -> Result<Vec<DomElement>> {
        let selector = parse_selector(selector)?;
        let all = parse_selector("*")?;
        let document = Html::parse_document(&self.source);
        let elements = document
            .select(&all)
            .enumerate()
            .filter(|(index, element)| !self.removed.contains(index) && selector.matches(element))
            .map(|(index, element)| self.describe(index, &element))
            .collect();
        Ok(elements)
    }

    fn describe(&self, index: usize, element_ref: &ElementRef) -> DomElement {
        let element = element_ref.value();
        let attributes = attribute_map(element_ref);

        let is_content_editable = attributes
            .get("contenteditable")
            .map(|v| matches!(v.to_lowercase().as_str(), "" | "true" | "plaintext-only"))
            .unwrap_or(false);

        let text = if is_content_editable && self.values.contains_key(&index) {
            self.values.get(&index).cloned().unwrap_or_default()
        } else {
            element_ref.text().collect::<Vec<_>>().join("")
        };

        let hidden = is_hidden_element(&attributes)
            || element_ref
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| is_hidden_element(&attribute_map(&ancestor)));

        let (rect, client_rects) = if hidden {
            (ElementRect::default(), 0)
        } else {
            let rect = self
                .sizes
                .get(&index)
                .copied()
                .unwrap_or_else(|| default_size(element.name()));
            let client_rects = if rect.area() > 0.0 { 1 } else { 0 };
            (rect, client_rects)
        };

        let mut dom_element = DomElement::new(element.name().to_string(), element_id(index))
            .with_rect(rect)
            .with_client_rects(client_rects)
            .set_content_editable(is_content_editable);
        dom_element.attributes = attributes;
        if !text.trim().is_empty() {
            dom_element = dom_element.with_text_content(text);
        }
        dom_element
    }

    fn check_query(&self, selector: &str) -> Result<()> {
        if self.failures.contains(&PageAction::Query) {
            return Err(AutomatorError::PageFailed(format!(
                "query {} rejected",
                selector
            )));
        }
        Ok(())
    }

    fn resolve(&self, element: &DomElement, action: PageAction) -> Result<usize> {
        if self.failures.contains(&action) {
            return Err(AutomatorError::PageFailed(format!(
                "{:?} on {} rejected",
                action, element.id
            )));
        }
        let index = element
            .id
            .strip_prefix("elem_")
            .and_then(|raw| raw.parse::<usize>().ok())
            .ok_or_else(|| AutomatorError::ElementDetached(element.id.clone()))?;
        if self.removed.contains(&index) {
            return Err(AutomatorError::ElementDetached(element.id.clone()));
        }
        Ok(index)
    }

    fn record(&mut self, kind: PageEventKind, index: usize, value: String) {
        self.events.push(PageEvent {
            kind,
            element: element_id(index),
            value,
        });
    }
}

#[async_trait]
impl Page for HtmlPage {
    async fn query_selector(&self, selector: &str) -> Result<Option<DomElement>> {
        self.check_query(selector)?;
        Ok(self.matching(selector)?.into_iter().next())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<DomElement>> {
        self.check_query(selector)?;
        self.matching(selector)
    }

    async fn set_text_content(&mut self, element: &DomElement, value: &str) -> Result<()> {
        let index = self.resolve(element, PageAction::Inject)?;
        self.values.insert(index, value.to_string());
        Ok(())
    }

    async fn set_native_value(&mut self, element: &DomElement, value: &str) -> Result<()> {
        let index = self.resolve(element, PageAction::Inject)?;
        self.values.insert(index, value.to_string());
        Ok(())
    }

    async fn dispatch_event(&mut self, element: &DomElement, event: SyntheticEvent) -> Result<()> {
        let index = self.resolve(element, PageAction::Dispatch)?;
        let value = self.values.get(&index).cloned().unwrap_or_default();
        let kind = match event {
            SyntheticEvent::Input => PageEventKind::Input,
            SyntheticEvent::Change => PageEventKind::Change,
        };
        self.record(kind, index, value);
        Ok(())
    }

    async fn focus(&mut self, element: &DomElement) -> Result<()> {
        let index = self.resolve(element, PageAction::Focus)?;
        self.focused = Some(index);
        let value = self.values.get(&index).cloned().unwrap_or_default();
        self.record(PageEventKind::Focus, index, value);
        Ok(())
    }

    async fn click(&mut self, element: &DomElement) -> Result<()> {
        let index = self.resolve(element, PageAction::Click)?;
        let value = self
            .focused
            .and_then(|focused| self.values.get(&focused).cloned())
            .unwrap_or_default();
        self.record(PageEventKind::Click, index, value);
        Ok(())
    }
}

fn attribute_map(element_ref: &ElementRef) -> HashMap<String, String> {
    element_ref
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn element_id(index: usize) -> String {
    format!("elem_{}", index)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| AutomatorError::InvalidSelector(format!("{}: {:?}", selector, e)))
}

fn default_size(tag_name: &str) -> ElementRect {
    match tag_name {
        "textarea" => ElementRect::new(400.0, 100.0),
        "input" => ElementRect::new(200.0, 24.0),
        "button" => ElementRect::new(80.0, 32.0),
        "html" | "head" | "script" | "style" | "meta" | "title" => ElementRect::default(),
        _ => ElementRect::new(100.0, 20.0),
    }
}

fn is_hidden_element(attributes: &HashMap<String, String>) -> bool {
    // Check for hidden input
    if attributes.get("type").map(String::as_str) == Some("hidden") {
        return true;
    }

    // Check for style attributes that hide elements
    if let Some(style) = attributes.get("style") {
        let style_lower = style.to_lowercase();
        if style_lower.contains("display:none")
            || style_lower.contains("display: none")
            || style_lower.contains("visibility:hidden")
            || style_lower.contains("visibility: hidden")
        {
            return true;
        }
    }

    // Check for hidden attribute
    if attributes.contains_key("hidden") {
        return true;
    }

    // Check for common hidden classes
    if let Some(class) = attributes.get("class") {
        let class_lower = class.to_lowercase();
        if class_lower
            .split_whitespace()
            .any(|c| matches!(c, "hidden" | "invisible" | "d-none"))
        {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"<html><body>
        <textarea id="prompt"></textarea>
        <input id="secret" type="text" style="display: none">
        <div class="panel hidden"><button id="ghost">Generate</button></div>
        <button id="go">Go</button>
    </body></html>"#;

    #[tokio::test]
    async fn hidden_elements_have_no_geometry() {
        let page = HtmlPage::new(FORM);
        let secret = page.query_selector("#secret").await.unwrap().unwrap();
        assert!(!secret.is_visible());

        let prompt = page.query_selector("#prompt").await.unwrap().unwrap();
        assert!(prompt.is_visible());
        assert_eq!(prompt.area(), 40000.0);
    }

    #[tokio::test]
    async fn query_all_is_in_document_order() {
        let page = HtmlPage::new(FORM);
        let buttons = page.query_all("button").await.unwrap();
        let ids: Vec<_> = buttons.iter().filter_map(|b| b.attribute("id")).collect();
        assert_eq!(ids, vec!["ghost", "go"]);
        assert!(!buttons[0].is_visible());
    }

    #[tokio::test]
    async fn failing_queries_are_page_errors() {
        let page = HtmlPage::new(FORM).failing_on(PageAction::Query);
        let err = page.query_all("button").await.unwrap_err();
        assert!(matches!(err, AutomatorError::PageFailed(_)));
    }

    #[tokio::test]
    async fn invalid_selector_is_an_error() {
        let page = HtmlPage::new(FORM);
        let err = page.query_selector("textarea[").await.unwrap_err();
        assert!(matches!(err, AutomatorError::InvalidSelector(_)));
    }

    #[tokio::test]
    async fn events_record_current_value() {
        let mut page = HtmlPage::new(FORM);
        let prompt = page.query_selector("#prompt").await.unwrap().unwrap();
        let go = page.query_selector("#go").await.unwrap().unwrap();

        page.focus(&prompt).await.unwrap();
        page.set_native_value(&prompt, "hello").await.unwrap();
        page.dispatch_event(&prompt, SyntheticEvent::Input).await.unwrap();
        page.click(&go).await.unwrap();

        assert_eq!(page.value_of("#prompt").as_deref(), Some("hello"));
        assert_eq!(page.events_of(PageEventKind::Input)[0].value, "hello");
        assert_eq!(page.submissions(), vec!["hello".to_string()]);
        assert_eq!(page.focused(), Some(prompt.id));
    }

    #[tokio::test]
    async fn removed_elements_are_detached() {
        let mut page = HtmlPage::new(FORM);
        let prompt = page.query_selector("#prompt").await.unwrap().unwrap();

        assert_eq!(page.remove("#prompt").unwrap(), 1);
        assert!(page.query_selector("#prompt").await.unwrap().is_none());

        let err = page.focus(&prompt).await.unwrap_err();
        assert!(matches!(err, AutomatorError::ElementDetached(_)));
    }
}
