pub mod element;
pub mod html_page;
pub mod locator;

pub use element::{DomElement, ElementRect};
pub use html_page::{HtmlPage, PageAction, PageEvent, PageEventKind};
pub use locator::ElementLocator;
