pub mod config;
pub mod diff;
pub mod engine;
pub mod schedule;

pub use config::EngineConfig;
pub use diff::SceneDiff;
pub use engine::{Engine, Stores};
pub use schedule::{Debounce, Inbox, SharedInbox};
