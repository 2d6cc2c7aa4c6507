//! The Bezel harvest pipeline.
//!
//! Drives a live browser through a six-stage run against the watch
//! marketplace: navigate home, search, discover listing links across the
//! available and historical result views, visit each listing, and persist
//! the extracted records. Parsing and filtering are pure functions over
//! HTML snapshots; browser interaction sits behind the [`PagePilot`] seam
//! so the run logic is testable without Chromium.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod discover;
mod dom;
pub mod error;
pub mod extract;
pub mod gate;
pub mod harvest;
pub mod orchestrator;
pub mod page;
pub mod progress;
pub mod selectors;

pub use discover::{DiscoveryView, LinkDiscoverer, ViewCounts};
pub use error::{HarvestError, Result};
pub use extract::HarvestPass;
pub use gate::ChallengeGate;
pub use harvest::{HarvestState, ListingHarvester};
pub use orchestrator::{HarvestPipeline, HarvestRequest};
pub use page::{LivePage, PagePilot};
pub use progress::{start_harvest, HarvestEvent, HarvestStep};
