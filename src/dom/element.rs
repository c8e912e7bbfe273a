use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptor of an element as seen at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomElement {
    pub id: String,
    pub tag_name: String,
    pub attributes: HashMap<String, String>,
    pub text_content: Option<String>,
    pub rect: ElementRect,
    pub client_rect_count: usize,
    pub is_content_editable: bool,
}

/// Rendered size of an element in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl DomElement {
    pub fn new(tag_name: String, id: String) -> Self {
        Self {
            id,
            tag_name: tag_name.to_lowercase(),
            attributes: HashMap::new(),
            text_content: None,
            rect: ElementRect::default(),
            client_rect_count: 0,
            is_content_editable: false,
        }
    }

    pub fn with_text_content(mut self, text: String) -> Self {
        self.text_content = Some(text);
        self
    }

    pub fn with_attribute(mut self, key: String, value: String) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn with_rect(mut self, rect: ElementRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_client_rects(mut self, count: usize) -> Self {
        self.client_rect_count = count;
        self
    }

    pub fn set_content_editable(mut self, editable: bool) -> Self {
        self.is_content_editable = editable;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Rendered if it has any width, any height, or occupies at least one
    /// client rectangle.
    pub fn is_visible(&self) -> bool {
        self.rect.width > 0.0 || self.rect.height > 0.0 || self.client_rect_count > 0
    }

    pub fn area(&self) -> f64 {
        self.rect.area()
    }

    /// Visible text, accessibility label and title joined with spaces.
    pub fn label(&self) -> String {
        format!(
            "{} {} {}",
            self.text_content.as_deref().unwrap_or("").trim(),
            self.attribute("aria-label").unwrap_or(""),
            self.attribute("title").unwrap_or("")
        )
    }

    pub fn is_native_button(&self) -> bool {
        self.tag_name == "button"
    }

    pub fn is_submit_type(&self) -> bool {
        self.attribute("type") == Some("submit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_needs_size_or_client_rects() {
        let hidden = DomElement::new("textarea".to_string(), "elem_1".to_string());
        assert!(!hidden.is_visible());

        let flat = hidden.clone().with_rect(ElementRect::new(120.0, 0.0));
        assert!(flat.is_visible());

        let inline = hidden.with_client_rects(1);
        assert!(inline.is_visible());
    }

    #[test]
    fn label_joins_text_aria_label_and_title() {
        let element = DomElement::new("BUTTON".to_string(), "elem_2".to_string())
            .with_text_content("  Send ".to_string())
            .with_attribute("aria-label".to_string(), "Generate image".to_string())
            .with_attribute("title".to_string(), "Go".to_string());

        assert_eq!(element.tag_name, "button");
        assert_eq!(element.label(), "Send Generate image Go");
        assert!(element.is_native_button());
        assert!(!element.is_submit_type());
    }
}
