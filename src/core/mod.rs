pub mod config;
pub mod page;

pub use config::{BrowserConfig, Config, LocatorHints, TimingConfig};
pub use page::{Page, SyntheticEvent};
