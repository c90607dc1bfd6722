//! Terminal output helpers.

pub mod progress;

pub use progress::{JobBars, format_duration, format_speed, status_line};
