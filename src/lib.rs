// CTD Pre-System - shipboard CTD cast pre-processing core
//
// This library crate holds the two mechanisms shared by every frame of the
// pre-system GUI: the event bus that decouples widgets from one another, and
// the selection store that remembers form-field values between runs. The GUI
// layer itself lives in the hosting application, not here.

pub mod events;
pub mod logging;
pub mod selections;

// Re-export commonly used types for convenience
pub use events::{EVENT_TYPES, EventBus, EventData, EventError, Tier};
pub use selections::{FieldValues, FormField, SelectionStore, restore_selection, save_selection};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
