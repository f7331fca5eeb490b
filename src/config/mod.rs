//! Configuration management.

mod settings;
mod theme;
mod xdg;

pub use settings::{Settings, SettingsError, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use theme::Theme;
pub use xdg::XdgDirs;
