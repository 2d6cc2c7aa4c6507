//! The persisted result artifact: a flat JSON array of listing records.
//!
//! Each successful harvest run overwrites the artifact wholesale. The two
//! maintenance operations (delete one record by URL, bulk replace) serve
//! the dashboard layer, which is an external collaborator.

pub mod error;
pub mod results;

pub use error::{Result, StoreError};
pub use results::ResultsStore;
