use crate::core::{Page, SyntheticEvent};
use crate::dom::DomElement;
use crate::errors::Result;

/// Writes values into located elements so the host page's own reactive
/// code sees them.
pub struct ValueInjector;

impl ValueInjector {
    /// Editable-in-place elements get their text replaced; form fields go
    /// through the native value setter.
    pub async fn apply<P: Page + ?Sized>(
        page: &mut P,
        element: &DomElement,
        value: &str,
    ) -> Result<()> {
        if element.is_content_editable {
            page.set_text_content(element, value).await
        } else {
            page.set_native_value(element, value).await
        }
    }

    pub async fn notify_input<P: Page + ?Sized>(page: &mut P, element: &DomElement) -> Result<()> {
        page.dispatch_event(element, SyntheticEvent::Input).await
    }

    pub async fn notify_change<P: Page + ?Sized>(page: &mut P, element: &DomElement) -> Result<()> {
        page.dispatch_event(element, SyntheticEvent::Change).await
    }

    /// Full value in one step: set, input, change.
    pub async fn inject<P: Page + ?Sized>(
        page: &mut P,
        element: &DomElement,
        value: &str,
    ) -> Result<()> {
        Self::apply(page, element, value).await?;
        Self::notify_input(page, element).await?;
        Self::notify_change(page, element).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{HtmlPage, PageAction, PageEventKind};

    #[tokio::test]
    async fn inject_sets_value_then_fires_input_and_change() {
        let mut page = HtmlPage::new(r#"<body><input id="q"></body>"#);
        let input = page.query_selector("#q").await.unwrap().unwrap();

        ValueInjector::inject(&mut page, &input, "a red fox").await.unwrap();

        let kinds: Vec<_> = page.events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![PageEventKind::Input, PageEventKind::Change]);
        assert!(page.events().iter().all(|e| e.value == "a red fox"));
    }

    #[tokio::test]
    async fn editable_elements_take_text_content() {
        let mut page = HtmlPage::new(r#"<body><div id="ed" contenteditable="">old</div></body>"#);
        let editor = page.query_selector("#ed").await.unwrap().unwrap();
        assert!(editor.is_content_editable);

        ValueInjector::apply(&mut page, &editor, "new text").await.unwrap();

        let refreshed = page.query_selector("#ed").await.unwrap().unwrap();
        assert_eq!(refreshed.text_content.as_deref(), Some("new text"));
    }

    #[test]
    fn failed_setter_fires_no_events() {
        let mut page = HtmlPage::new(r#"<body><textarea id="t"></textarea></body>"#)
            .failing_on(PageAction::Inject);
        let area = tokio_test::block_on(page.query_selector("#t")).unwrap().unwrap();

        let result = tokio_test::block_on(ValueInjector::inject(&mut page, &area, "x"));

        tokio_test::assert_err!(result);
        assert!(page.events().is_empty());
        assert_eq!(page.value_of("#t"), None);
    }
}
