//! Console rendering of tick reports.

pub mod console;

pub use console::{render_json, render_text};
