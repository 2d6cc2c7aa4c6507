//! Run progress reporting.
//!
//! The pipeline emits coarse step markers so an observer (CLI, dashboard)
//! can show where a long run currently is, then a terminal completion or
//! failure event.

use bezel_core::ListingRecord;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::orchestrator::{HarvestPipeline, HarvestRequest};

/// The six stages of a harvest run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HarvestStep {
    Init,
    LaunchBrowser,
    NavigateHome,
    DiscoverLinks,
    HarvestListings,
    Persist,
}

impl HarvestStep {
    pub const ALL: [Self; 6] = [
        Self::Init,
        Self::LaunchBrowser,
        Self::NavigateHome,
        Self::DiscoverLinks,
        Self::HarvestListings,
        Self::Persist,
    ];

    /// Zero-based position in the run.
    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            Self::Init => 0,
            Self::LaunchBrowser => 1,
            Self::NavigateHome => 2,
            Self::DiscoverLinks => 3,
            Self::HarvestListings => 4,
            Self::Persist => 5,
        }
    }
}

impl fmt::Display for HarvestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "initializing",
            Self::LaunchBrowser => "launching browser",
            Self::NavigateHome => "navigating to marketplace",
            Self::DiscoverLinks => "discovering listing links",
            Self::HarvestListings => "harvesting listings",
            Self::Persist => "persisting results",
        };
        write!(f, "{name}")
    }
}

/// One event on a run's progress stream.
#[derive(Debug, Clone)]
pub enum HarvestEvent {
    /// The run entered a new stage.
    Step(HarvestStep),
    /// The run finished; carries the persisted records.
    Completed(Vec<ListingRecord>),
    /// The run failed; carries the error rendering.
    Failed(String),
}

/// Start a harvest run in the background and return its progress stream.
///
/// Validation failures are reported synchronously, before any browser
/// work begins. The stream always ends with exactly one terminal event.
pub fn start_harvest(
    pipeline: Arc<HarvestPipeline>,
    request: HarvestRequest,
) -> Result<mpsc::UnboundedReceiver<HarvestEvent>> {
    request.validate()?;

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let progress = tx.clone();
        let outcome = pipeline
            .run(&request, move |step| {
                let _ = progress.send(HarvestEvent::Step(step));
            })
            .await;

        let terminal = match outcome {
            Ok(records) => HarvestEvent::Completed(records),
            Err(e) => {
                tracing::error!(error = %e, "harvest run failed");
                HarvestEvent::Failed(e.to_string())
            }
        };
        let _ = tx.send(terminal);
    });

    Ok(rx)
}
