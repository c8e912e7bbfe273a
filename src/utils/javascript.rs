use crate::core::SyntheticEvent;
use serde::{Deserialize, Serialize};

/// Attribute stamped on every element the automation has described, so it
/// can be found again by later operations.
pub const HANDLE_ATTRIBUTE: &str = "data-prompt-automator-id";

/// What the in-page query script reports for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub id: String,
    pub tag_name: String,
    #[serde(default)]
    pub attributes: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub client_rects: usize,
    #[serde(default)]
    pub content_editable: bool,
}

/// Envelope the query script returns, as a JSON string.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryOutcome {
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Builders for the scripts evaluated inside the page.
pub struct PageScripts;

impl PageScripts {
    /// Describes the matches of `selector`. Only the first when `first_only`.
    pub fn query(selector: &str, first_only: bool) -> String {
        format!(
            r#"
            (function() {{
                const selector = {selector};
                try {{
                    const found = {first_only}
                        ? [document.querySelector(selector)].filter(Boolean)
                        : Array.from(document.querySelectorAll(selector));
                    window.__promptAutomatorSeq = window.__promptAutomatorSeq || 0;
                    const elements = found.map((el) => {{
                        if (!el.getAttribute('{attr}')) {{
                            window.__promptAutomatorSeq += 1;
                            el.setAttribute('{attr}', String(window.__promptAutomatorSeq));
                        }}
                        const attributes = {{}};
                        for (const attr of Array.from(el.attributes)) {{
                            if (attr.name !== '{attr}') {{
                                attributes[attr.name] = attr.value;
                            }}
                        }}
                        return {{
                            id: el.getAttribute('{attr}'),
                            tagName: el.tagName.toLowerCase(),
                            attributes: attributes,
                            text: el.innerText || '',
                            width: el.offsetWidth || 0,
                            height: el.offsetHeight || 0,
                            clientRects: el.getClientRects().length,
                            contentEditable: !!el.isContentEditable
                        }};
                    }});
                    return JSON.stringify({{ elements: elements }});
                }} catch (error) {{
                    return JSON.stringify({{ error: String(error && error.message || error) }});
                }}
            }})()
            "#,
            selector = js_string(selector),
            first_only = first_only,
            attr = HANDLE_ATTRIBUTE,
        )
    }

    pub fn set_text_content(id: &str, value: &str) -> String {
        Self::on_element(id, &format!("el.textContent = {};", js_string(value)))
    }

    /// Assigns through the prototype's `value` setter, bypassing any
    /// accessor the page installed on the element itself.
    pub fn set_native_value(id: &str, value: &str) -> String {
        Self::on_element(
            id,
            &format!(
                r#"
                const value = {};
                const proto = Object.getPrototypeOf(el);
                const descriptor = Object.getOwnPropertyDescriptor(proto, 'value');
                if (descriptor && descriptor.set) {{
                    descriptor.set.call(el, value);
                }} else {{
                    el.value = value;
                }}
                "#,
                js_string(value)
            ),
        )
    }

    pub fn dispatch(id: &str, event: SyntheticEvent) -> String {
        Self::on_element(
            id,
            &format!(
                "el.dispatchEvent(new Event({}, {{ bubbles: true }}));",
                js_string(event.as_str())
            ),
        )
    }

    pub fn focus(id: &str) -> String {
        Self::on_element(id, "el.focus();")
    }

    pub fn click(id: &str) -> String {
        Self::on_element(id, "el.click();")
    }

    /// Wraps `body` so it runs with `el` bound to the handled element.
    /// Evaluates to `false` when the element is gone.
    fn on_element(id: &str, body: &str) -> String {
        format!(
            r#"
            (function() {{
                const el = document.querySelector('[{attr}=' + JSON.stringify({id}) + ']');
                if (!el) return false;
                {body}
                return true;
            }})()
            "#,
            attr = HANDLE_ATTRIBUTE,
            id = js_string(id),
            body = body,
        )
    }
}

/// A JavaScript string literal for `value`.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_embedded_as_escaped_literals() {
        let script = PageScripts::set_native_value("7", "it's a \"quote\"\nnext");
        assert!(script.contains(r#"const value = "it's a \"quote\"\nnext";"#));
        assert!(script.contains(r#"JSON.stringify("7")"#));
    }

    #[test]
    fn dispatch_names_the_event() {
        let script = PageScripts::dispatch("3", SyntheticEvent::Change);
        assert!(script.contains(r#"new Event("change", { bubbles: true })"#));
    }

    #[test]
    fn query_outcome_parses_snapshot() {
        let raw = r#"{"elements":[{"id":"1","tagName":"textarea","attributes":{"id":"p"},
            "text":"","width":300,"height":80,"clientRects":1,"contentEditable":false}]}"#;
        let outcome: QueryOutcome = serde_json::from_str(raw).unwrap();
        assert!(outcome.error.is_none());
        assert_eq!(outcome.elements[0].tag_name, "textarea");
        assert_eq!(outcome.elements[0].width, 300.0);

        let failed: QueryOutcome = serde_json::from_str(r#"{"error":"bad selector"}"#).unwrap();
        assert_eq!(failed.error.as_deref(), Some("bad selector"));
        assert!(failed.elements.is_empty());
    }

    #[test]
    fn query_selects_first_or_all() {
        assert!(PageScripts::query("textarea", true).contains("const found = true"));
        assert!(PageScripts::query("textarea", false).contains("const found = false"));
    }
}
