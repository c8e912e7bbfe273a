pub mod driver;
pub mod machine;
pub mod reporter;
pub mod state;
pub mod timers;

pub use driver::{spawn, EngineHandle};
pub use machine::Engine;
pub use reporter::{BroadcastSink, NullSink, StatusReporter, StatusSink};
pub use state::RunState;
pub use timers::{Task, TimerHandle, TimerQueue};
