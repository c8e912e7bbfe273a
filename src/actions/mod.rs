pub mod inject;
pub mod typing;

pub use inject::ValueInjector;
pub use typing::{Typist, TypingStep};
