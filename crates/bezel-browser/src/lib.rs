//! Browser automation engine for the Bezel listing harvester.
//!
//! Wraps chromiumoxide behind a small surface: one browser process, one
//! page, strictly sequential interaction. The harvester drives a single
//! [`PageSession`] for an entire run.

pub mod engine;
pub mod error;
pub mod session;

pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use session::PageSession;
