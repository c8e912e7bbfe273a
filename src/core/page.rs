use crate::dom::DomElement;
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Synthetic notifications dispatched at an element after its content
/// changes. Both bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntheticEvent {
    Input,
    Change,
}

impl SyntheticEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntheticEvent::Input => "input",
            SyntheticEvent::Change => "change",
        }
    }
}

/// The document the automation runs against.
///
/// Element descriptors returned by the query methods carry an opaque handle
/// that the mutating methods use to find the element again.
#[async_trait]
pub trait Page: Send + Sync {
    /// Resolve a selector to its first match, if any.
    async fn query_selector(&self, selector: &str) -> Result<Option<DomElement>>;

    /// All matches of a selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<DomElement>>;

    /// Replace the text of an editable-in-place element.
    async fn set_text_content(&mut self, element: &DomElement, value: &str) -> Result<()>;

    /// Assign a form field's value through the platform's own setter, so
    /// page code that hooks the setter observes the change.
    async fn set_native_value(&mut self, element: &DomElement, value: &str) -> Result<()>;

    async fn dispatch_event(&mut self, element: &DomElement, event: SyntheticEvent) -> Result<()>;

    async fn focus(&mut self, element: &DomElement) -> Result<()>;

    /// Synthetic activation, equivalent to a user click.
    async fn click(&mut self, element: &DomElement) -> Result<()>;
}
