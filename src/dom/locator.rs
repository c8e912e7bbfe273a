use crate::core::Page;
use crate::dom::DomElement;
use crate::errors::Result;
use regex::Regex;
use std::sync::OnceLock;

/// Text-entry-like elements considered for automatic detection.
pub const INPUT_CANDIDATES: &str = r#"textarea, input[type="text"], input[type="search"], input:not([type]), [contenteditable="true"], [contenteditable=""]"#;

/// Clickable elements considered for automatic detection.
pub const BUTTON_CANDIDATES: &str =
    r#"button, input[type="button"], input[type="submit"], [role="button"]"#;

const ACTION_VERB_SCORE: u32 = 3;
const NATIVE_BUTTON_SCORE: u32 = 1;
const SUBMIT_TYPE_SCORE: u32 = 1;

fn action_verb_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(generate|create|make|run|go|submit)").expect("static pattern compiles")
    })
}

/// Finds the prompt input and the submission control on a page.
///
/// An explicit hint is authoritative: when one is given it is resolved
/// directly and no fallback search happens.
pub struct ElementLocator;

impl ElementLocator {
    pub async fn locate_input<P: Page + ?Sized>(
        page: &P,
        hint: Option<&str>,
    ) -> Result<Option<DomElement>> {
        if let Some(selector) = hint {
            return page.query_selector(selector).await;
        }

        let candidates = page.query_all(INPUT_CANDIDATES).await?;
        Ok(Self::largest_visible(candidates))
    }

    pub async fn locate_button<P: Page + ?Sized>(
        page: &P,
        hint: Option<&str>,
    ) -> Result<Option<DomElement>> {
        if let Some(selector) = hint {
            return page.query_selector(selector).await;
        }

        let candidates = page.query_all(BUTTON_CANDIDATES).await?;
        Ok(Self::best_scored(candidates))
    }

    /// Largest rendered area wins; the first in document order on a tie.
    pub fn largest_visible(candidates: Vec<DomElement>) -> Option<DomElement> {
        let mut visible: Vec<DomElement> =
            candidates.into_iter().filter(DomElement::is_visible).collect();
        visible.sort_by(|a, b| b.area().total_cmp(&a.area()));
        visible.into_iter().next()
    }

    /// Highest score wins; the first in document order on a tie.
    pub fn best_scored(candidates: Vec<DomElement>) -> Option<DomElement> {
        let mut scored: Vec<(u32, DomElement)> = candidates
            .into_iter()
            .filter(DomElement::is_visible)
            .map(|element| (Self::button_score(&element), element))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().next().map(|(_, element)| element)
    }

    pub fn button_score(element: &DomElement) -> u32 {
        let mut score = 0;
        if action_verb_pattern().is_match(&element.label()) {
            score += ACTION_VERB_SCORE;
        }
        if element.is_native_button() {
            score += NATIVE_BUTTON_SCORE;
        }
        if element.is_submit_type() {
            score += SUBMIT_TYPE_SCORE;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlPage;
    use crate::dom::ElementRect;

    fn button(id: &str, tag: &str, text: &str) -> DomElement {
        DomElement::new(tag.to_string(), id.to_string())
            .with_text_content(text.to_string())
            .with_rect(ElementRect::new(80.0, 30.0))
    }

    #[test]
    fn score_combines_verb_tag_and_submit_type() {
        let plain = button("a", "div", "Settings");
        assert_eq!(ElementLocator::button_score(&plain), 0);

        let native = button("b", "button", "Settings");
        assert_eq!(ElementLocator::button_score(&native), 1);

        let submit = button("c", "button", "Create")
            .with_attribute("type".to_string(), "submit".to_string());
        assert_eq!(ElementLocator::button_score(&submit), 5);

        let labelled = button("d", "div", "")
            .with_attribute("aria-label".to_string(), "RUN model".to_string());
        assert_eq!(ElementLocator::button_score(&labelled), 3);
    }

    #[test]
    fn ties_keep_document_order() {
        let first = button("first", "button", "Generate");
        let second = button("second", "button", "Generate");
        let best = ElementLocator::best_scored(vec![first, second]).unwrap();
        assert_eq!(best.id, "first");
    }

    #[test]
    fn invisible_candidates_are_ignored() {
        let hidden = DomElement::new("textarea".to_string(), "hidden".to_string());
        let small = DomElement::new("input".to_string(), "small".to_string())
            .with_rect(ElementRect::new(10.0, 10.0));
        let best = ElementLocator::largest_visible(vec![hidden, small]).unwrap();
        assert_eq!(best.id, "small");

        assert!(ElementLocator::largest_visible(vec![]).is_none());
    }

    #[tokio::test]
    async fn picks_largest_input_and_best_button_on_page() {
        let page = HtmlPage::new(
            r#"<html><body>
                <input id="search" type="search">
                <textarea id="prompt"></textarea>
                <input type="hidden" id="token">
                <button id="menu">Menu</button>
                <button id="go" type="submit">Generate</button>
            </body></html>"#,
        )
        .with_size("#search", 300.0, 30.0)
        .with_size("#prompt", 600.0, 120.0);

        let input = ElementLocator::locate_input(&page, None).await.unwrap().unwrap();
        assert_eq!(input.attribute("id"), Some("prompt"));

        let button = ElementLocator::locate_button(&page, None).await.unwrap().unwrap();
        assert_eq!(button.attribute("id"), Some("go"));
    }

    #[tokio::test]
    async fn explicit_hint_does_not_fall_back() {
        let page = HtmlPage::new(r#"<body><textarea id="prompt"></textarea></body>"#);

        let missing = ElementLocator::locate_input(&page, Some("#nope")).await.unwrap();
        assert!(missing.is_none());

        let hinted = ElementLocator::locate_input(&page, Some("textarea")).await.unwrap();
        assert_eq!(hinted.unwrap().attribute("id"), Some("prompt"));
    }

    #[tokio::test]
    async fn content_editable_counts_as_input() {
        let page = HtmlPage::new(r#"<body><div id="editor" contenteditable="true"></div></body>"#)
            .with_size("#editor", 500.0, 200.0);

        let input = ElementLocator::locate_input(&page, None).await.unwrap().unwrap();
        assert!(input.is_content_editable);
    }
}
