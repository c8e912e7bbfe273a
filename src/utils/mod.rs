pub mod javascript;

pub use javascript::{js_string, PageScripts};
