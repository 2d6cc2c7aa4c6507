//! The six-stage harvest run.
//!
//! The orchestrator owns run-level control flow: browser acquisition and
//! unconditional release, stage ordering, the candidate universe, the
//! single retry pass, and persistence. Everything page-shaped is behind
//! [`PagePilot`], so the whole flow after browser launch is testable
//! against a scripted pilot.

use bezel_browser::BrowserEngine;
use bezel_core::{AppConfig, ChallengeSignal, ListingRecord};
use bezel_store::ResultsStore;
use chrono::Utc;
use std::collections::HashSet;

use crate::discover::{view_counts, DiscoveryView, LinkDiscoverer};
use crate::error::{HarvestError, Result};
use crate::extract::HarvestPass;
use crate::gate::ChallengeGate;
use crate::harvest::{normalize_path, HarvestState, ListingHarvester};
use crate::page::{LivePage, PagePilot};
use crate::progress::HarvestStep;
use crate::selectors;

/// Parameters of one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestRequest {
    /// Free-text search submitted to the marketplace.
    pub search_query: String,
    /// Maximum listing age, in days. Inclusive.
    pub lookback_days: u32,
}

impl HarvestRequest {
    /// Reject unusable parameters before any browser work starts.
    pub fn validate(&self) -> Result<()> {
        if self.search_query.trim().is_empty() {
            return Err(HarvestError::InvalidRequest(
                "search query is empty".to_string(),
            ));
        }
        if self.lookback_days == 0 {
            return Err(HarvestError::InvalidRequest(
                "lookback window must be at least one day".to_string(),
            ));
        }
        Ok(())
    }
}

/// One fully configured pipeline, reusable across runs.
pub struct HarvestPipeline {
    config: AppConfig,
    store: ResultsStore,
    signal: ChallengeSignal,
}

impl HarvestPipeline {
    #[must_use]
    pub fn new(config: AppConfig, signal: ChallengeSignal) -> Self {
        let store = ResultsStore::new(config.harvest.results_path.clone());
        Self {
            config,
            store,
            signal,
        }
    }

    /// The challenge-resolution signal observed by this pipeline's runs.
    #[must_use]
    pub fn signal(&self) -> &ChallengeSignal {
        &self.signal
    }

    /// The result artifact this pipeline persists to.
    #[must_use]
    pub fn store(&self) -> &ResultsStore {
        &self.store
    }

    /// Execute one full run. The browser is released on every exit path.
    pub async fn run<F>(&self, request: &HarvestRequest, progress: F) -> Result<Vec<ListingRecord>>
    where
        F: Fn(HarvestStep) + Send + Sync,
    {
        request.validate()?;
        // A stale resolution from a previous run must not satisfy this
        // run's challenge gate.
        self.signal.reset();

        progress(HarvestStep::Init);
        tracing::info!(
            query = %request.search_query,
            lookback_days = request.lookback_days,
            "harvest run starting"
        );

        progress(HarvestStep::LaunchBrowser);
        let engine = BrowserEngine::launch(&self.config.browser).await?;

        let outcome = match engine
            .new_session(selectors::POPUP_KILLER, self.config.browser.navigation_timeout())
            .await
        {
            Ok(session) => {
                let pilot = LivePage::new(session, self.config.harvest.clone());
                self.run_on_page(&pilot, request, &progress).await
            }
            Err(e) => Err(e.into()),
        };

        engine.close().await;
        outcome
    }

    /// The run from first navigation onward, over any page implementation.
    pub async fn run_on_page<P, F>(
        &self,
        pilot: &P,
        request: &HarvestRequest,
        progress: &F,
    ) -> Result<Vec<ListingRecord>>
    where
        P: PagePilot + ?Sized,
        F: Fn(HarvestStep) + Send + Sync,
    {
        let settings = &self.config.harvest;
        let gate = ChallengeGate::new(self.signal.clone(), settings);

        progress(HarvestStep::NavigateHome);
        pilot.navigate(&settings.base_url).await?;
        pilot
            .wait_for_any(&[selectors::HOME_SEARCH_INPUT], settings.search_box_wait())
            .await?;
        gate.check_and_wait(pilot).await?;
        pilot.submit_search(&request.search_query).await?;
        tokio::time::sleep(settings.search_settle()).await;

        progress(HarvestStep::DiscoverLinks);
        let html = pilot.html().await?;
        let counts = view_counts(&html);
        tracing::info!(
            available = counts.available,
            historical = counts.historical,
            "result view counts"
        );

        let discoverer = LinkDiscoverer::new(pilot, settings);
        let now = Utc::now();

        let mut available_links = Vec::new();
        let mut historical_links = Vec::new();
        for view in [DiscoveryView::Available, DiscoveryView::Historical] {
            if counts.of(view) == 0 {
                continue;
            }
            let links = discoverer.discover(view, request.lookback_days, now).await?;
            match view {
                DiscoveryView::Available => available_links = links,
                DiscoveryView::Historical => historical_links = links,
            }
        }

        // Candidate universe: every discovered link, available view first,
        // deduplicated by normalized path.
        let mut candidate_paths = HashSet::new();
        let mut candidates = Vec::new();
        for link in available_links.iter().chain(historical_links.iter()) {
            if candidate_paths.insert(normalize_path(link, &settings.base_url)) {
                candidates.push(link.clone());
            }
        }

        progress(HarvestStep::HarvestListings);
        let harvester = ListingHarvester::new(pilot, &gate, settings);
        let mut state = HarvestState::new();
        harvester
            .harvest(&available_links, HarvestPass::Available, &mut state)
            .await;
        harvester
            .harvest(&historical_links, HarvestPass::Historical, &mut state)
            .await;
        tracing::info!(count = state.records().len(), "view passes complete");

        // One retry pass over candidates whose visit never completed.
        let missing: Vec<String> = candidates
            .into_iter()
            .filter(|link| !state.is_seen(&normalize_path(link, &settings.base_url)))
            .collect();
        if !missing.is_empty() {
            tracing::info!(count = missing.len(), "retrying incomplete listings");
            harvester
                .harvest(&missing, HarvestPass::Retry, &mut state)
                .await;
        }

        progress(HarvestStep::Persist);
        let records = state.into_records();
        self.store.save(&records)?;
        tracing::info!(count = records.len(), "harvest run complete");

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_query_rejected() {
        let request = HarvestRequest {
            search_query: "   ".to_string(),
            lookback_days: 30,
        };
        assert!(matches!(
            request.validate(),
            Err(HarvestError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let request = HarvestRequest {
            search_query: "rolex submariner".to_string(),
            lookback_days: 0,
        };
        assert!(matches!(
            request.validate(),
            Err(HarvestError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_reasonable_request_accepted() {
        let request = HarvestRequest {
            search_query: "rolex submariner".to_string(),
            lookback_days: 30,
        };
        assert!(request.validate().is_ok());
    }
}
