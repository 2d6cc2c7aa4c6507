//! Per-listing harvesting.
//!
//! Listing failures are isolated: one broken page never aborts the run.
//! The seen set records *completed* visits only. A visit that errors is
//! unmarked so the retry pass can pick it up; a visit that completes but
//! yields no record (out of scope) stays marked and is never retried.

use bezel_browser::BrowserError;
use bezel_core::{HarvestSettings, ListingRecord};
use std::collections::HashSet;
use url::Url;

use crate::extract::{extract_record, HarvestPass};
use crate::gate::ChallengeGate;
use crate::page::PagePilot;
use crate::selectors;

/// Normalize a link to its path component for dedup and retry math.
/// Links across the two views may differ in host or query while naming
/// the same listing.
pub fn normalize_path(href: &str, base_url: &str) -> String {
    if let Ok(url) = Url::parse(href) {
        return url.path().to_string();
    }
    if let Ok(base) = Url::parse(base_url) {
        if let Ok(url) = base.join(href) {
            return url.path().to_string();
        }
    }
    href.to_string()
}

fn full_url(href: &str, base_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    }
}

/// Mutable state threaded through the harvest passes.
#[derive(Debug, Default)]
pub struct HarvestState {
    seen: HashSet<String>,
    records: Vec<ListingRecord>,
}

impl HarvestState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a normalized path has a completed visit.
    #[must_use]
    pub fn is_seen(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    #[must_use]
    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<ListingRecord> {
        self.records
    }
}

/// Visits listing pages one at a time and accumulates records.
pub struct ListingHarvester<'a, P: PagePilot + ?Sized> {
    pilot: &'a P,
    gate: &'a ChallengeGate,
    settings: &'a HarvestSettings,
}

impl<'a, P: PagePilot + ?Sized> ListingHarvester<'a, P> {
    pub fn new(pilot: &'a P, gate: &'a ChallengeGate, settings: &'a HarvestSettings) -> Self {
        Self {
            pilot,
            gate,
            settings,
        }
    }

    /// Visit every not-yet-seen link in order. Infallible by construction:
    /// per-link outcomes are folded into `state`, never propagated.
    pub async fn harvest(&self, links: &[String], pass: HarvestPass, state: &mut HarvestState) {
        for link in links {
            let path = normalize_path(link, &self.settings.base_url);
            if state.seen.contains(&path) {
                continue;
            }
            state.seen.insert(path.clone());

            match self.visit(link, pass).await {
                Ok(Some(record)) => state.records.push(record),
                Ok(None) => {
                    tracing::info!(%path, "listing out of scope, skipping");
                }
                Err(e) => {
                    tracing::warn!(%path, error = %e, "listing visit failed, eligible for retry");
                    state.seen.remove(&path);
                }
            }
        }
    }

    async fn visit(
        &self,
        link: &str,
        pass: HarvestPass,
    ) -> Result<Option<ListingRecord>, BrowserError> {
        let url = full_url(link, &self.settings.base_url);
        tracing::debug!(%url, pass = pass.label(), "visiting listing");

        self.pilot.navigate(&url).await?;
        self.gate.check_and_wait(self.pilot).await?;
        self.pilot
            .wait_for_any(selectors::LISTING_MARKERS, self.settings.listing_wait())
            .await?;

        let html = self.pilot.html().await?;
        Ok(extract_record(&html, pass, &url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://everywatch.com";

    #[test]
    fn test_normalize_relative_link() {
        assert_eq!(normalize_path("/watch/rolex-1", BASE), "/watch/rolex-1");
    }

    #[test]
    fn test_normalize_absolute_link_strips_host_and_query() {
        assert_eq!(
            normalize_path("https://everywatch.com/watch/rolex-1?pageSize=999", BASE),
            "/watch/rolex-1"
        );
    }

    #[test]
    fn test_normalize_unparseable_link_passes_through() {
        assert_eq!(normalize_path("watch-1", BASE), "/watch-1");
    }

    #[test]
    fn test_full_url_joins_relative_links_once() {
        assert_eq!(
            full_url("/watch/1", "https://everywatch.com"),
            "https://everywatch.com/watch/1"
        );
        assert_eq!(
            full_url("/watch/1", "https://everywatch.com/"),
            "https://everywatch.com/watch/1"
        );
        assert_eq!(
            full_url("https://everywatch.com/watch/1", BASE),
            "https://everywatch.com/watch/1"
        );
    }
}
