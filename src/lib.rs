pub mod actions;
#[cfg(feature = "chrome")]
pub mod browser;
pub mod core;
pub mod dom;
pub mod engine;
pub mod errors;
pub mod panel;
pub mod testing;
pub mod types;
pub mod utils;

#[cfg(feature = "chrome")]
pub use browser::ChromePage;
pub use crate::core::{Config, Page};
pub use dom::{DomElement, ElementLocator, HtmlPage};
pub use engine::{BroadcastSink, Engine, EngineHandle};
pub use errors::{AutomatorError, RunError};
pub use types::*;
