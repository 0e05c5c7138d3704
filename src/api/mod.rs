//! Presentation of navigation state
//!
//! Turns fusion output, sensor errors and the meter countdown into the panel
//! the finder screen shows, as text or JSON.

pub mod formatting;

pub use formatting::{ArrowMode, JsonFormatter, NavigationPanel, TextFormatter, NAVIGATING};
