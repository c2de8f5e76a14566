pub mod controller;
pub mod drafts;
pub mod preview;
pub mod scheduler;

pub use controller::{EditorController, KeySource};
pub use drafts::DraftStore;
pub use scheduler::{EditorScheduler, Intent};

use chrono::Local;

/// Session keys have minute granularity, e.g. `2024-01-01 10:00`.
pub fn session_key_now() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}
