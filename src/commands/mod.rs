pub mod autostart;
pub mod config;
pub mod editor;
pub mod explorer;
pub mod notes;
