// Breadcrumb History Library Entry Point
// This file exposes all modules so they can be imported by main.rs
// and tested independently.

// Core modules
pub mod history;
pub mod settings;

// Pure transition logic
pub mod state;

// Pure logic modules (no host framework imports)
pub mod modules;

pub use history::{HistoryEntry, HistoryTracker, WeakHistoryTracker};
pub use modules::breadcrumbs::Breadcrumbs;
pub use modules::compare::{FieldSource, FieldValue, LessOrEqualRule, ValidationFailure};
pub use modules::events::SubscriptionId;
pub use modules::navigation::{InMemoryNavigator, NavigationError, Navigator};
pub use settings::{Settings, SettingsError};

/// Installs the process logger at the level from `settings`.
/// `RUST_LOG`, when set, takes precedence. Calling this twice is harmless.
pub fn init_logging(settings: &Settings) {
    let _ = env_logger::Builder::new()
        .filter_level(settings.level_filter())
        .parse_default_env()
        .try_init();
}
