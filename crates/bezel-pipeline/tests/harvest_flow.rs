//! End-to-end pipeline tests over a scripted page, no browser involved.

use async_trait::async_trait;
use bezel_browser::BrowserError;
use bezel_core::{AppConfig, ChallengeSignal};
use bezel_pipeline::{HarvestPipeline, HarvestRequest, HarvestStep, PagePilot};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

const BASE: &str = "https://everywatch.com";

/// A scripted stand-in for the live page. Serves canned HTML per URL,
/// tracks the active result view, and can fail a URL's first visit.
struct FakePilot {
    state: Mutex<FakeState>,
}

struct FakeState {
    current: String,
    home: String,
    search_results: String,
    view_results: HashMap<String, String>,
    listings: HashMap<String, String>,
    fail_once: HashSet<String>,
    active_view: String,
    log: Vec<String>,
}

impl FakePilot {
    fn new(home: String, search_results: String) -> Self {
        Self {
            state: Mutex::new(FakeState {
                current: String::new(),
                home,
                search_results,
                view_results: HashMap::new(),
                listings: HashMap::new(),
                fail_once: HashSet::new(),
                active_view: "Available".to_string(),
                log: Vec::new(),
            }),
        }
    }

    fn with_view(self, label: &str, html: String) -> Self {
        self.state
            .lock()
            .expect("state")
            .view_results
            .insert(label.to_string(), html);
        self
    }

    fn with_listing(self, url: &str, html: String) -> Self {
        self.state
            .lock()
            .expect("state")
            .listings
            .insert(url.to_string(), html);
        self
    }

    fn failing_once(self, url: &str) -> Self {
        self.state
            .lock()
            .expect("state")
            .fail_once
            .insert(url.to_string());
        self
    }

    fn log(&self) -> Vec<String> {
        self.state.lock().expect("state").log.clone()
    }

    fn visits_to(&self, url: &str) -> usize {
        let needle = format!("navigate {url}");
        self.log().iter().filter(|entry| **entry == needle).count()
    }
}

#[async_trait]
impl PagePilot for FakePilot {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().expect("state");
        state.log.push(format!("navigate {url}"));

        if state.fail_once.remove(url) {
            return Err(BrowserError::Timeout(format!("navigation to {url}")));
        }
        if url == BASE {
            state.current = state.home.clone();
            return Ok(());
        }
        match state.listings.get(url) {
            Some(html) => {
                state.current = html.clone();
                Ok(())
            }
            None => Err(BrowserError::Navigation(format!("no such page: {url}"))),
        }
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        let mut state = self.state.lock().expect("state");
        state.log.push("reload".to_string());
        let view = state.active_view.clone();
        if let Some(html) = state.view_results.get(&view) {
            state.current = html.clone();
        }
        Ok(())
    }

    async fn wait_for_any(
        &self,
        _selectors: &[&str],
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn submit_search(&self, query: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().expect("state");
        state.log.push(format!("search {query}"));
        state.current = state.search_results.clone();
        Ok(())
    }

    async fn select_view(&self, label: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().expect("state");
        state.log.push(format!("select_view {label}"));
        state.active_view = label.to_string();
        Ok(())
    }

    async fn ensure_paging(&self, suffix: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock().expect("state");
        state.log.push(format!("ensure_paging {suffix}"));
        Ok(())
    }

    async fn html(&self) -> Result<String, BrowserError> {
        Ok(self.state.lock().expect("state").current.clone())
    }
}

fn home_page() -> String {
    r#"<html><body>
        <input placeholder="Search over 1,000,000 watches">
    </body></html>"#
        .to_string()
}

fn gated_home_page() -> String {
    r#"<html><body>
        <iframe title="reCAPTCHA" src="https://challenge.example/"></iframe>
    </body></html>"#
        .to_string()
}

fn search_results_page(available: u32, historical: u32) -> String {
    format!(
        r#"<html><body>
        <div class="ew-select-dropdown__single-value">
            <span class="ew-tab-option-label">Available</span>
        </div>
        <div class="ew-tab-option">
            <span class="ew-tab-option-label">Available</span>
            <span class="ew-tab-option-count">({available})</span>
        </div>
        <div class="ew-tab-option">
            <span class="ew-tab-option-label">Historical</span>
            <span class="ew-tab-option-count">({historical})</span>
        </div>
        </body></html>"#
    )
}

fn available_card(href: &str, days: u32) -> String {
    format!(
        r#"<a class="ew-grid-item ew-grid-watch-card" href="{href}">
            <div class="location-date-details">
                <span class="location" title="Chrono24"></span>
            </div>
            <div class="days-on-market"><b>{days}</b></div>
        </a>"#
    )
}

fn historical_card(href: &str, last_seen: &str) -> String {
    format!(
        r#"<a class="ew-grid-item ew-grid-watch-card" href="{href}">
            <div class="location-date-details">
                <span class="location" title="Chrono24"></span>
            </div>
            <div class="last-seen">{last_seen}</div>
        </a>"#
    )
}

fn cards_page(cards: &[String]) -> String {
    format!("<html><body>{}</body></html>", cards.join("\n"))
}

fn listing_page(venue: &str, brand: &str) -> String {
    format!(
        r#"<html><body>
        <div class="brand"><span>{brand}</span></div>
        <div class="awd-desc-items">
            <span class="awd-title">Source:</span>
            <span class="awd-detail"><a href="/sellers/{venue}">{venue}</a></span>
        </div>
        <div class="price-analysis-item">
            <div class="title-wrapper">Current price</div>
            <div class="price">$10,500</div>
        </div>
        </body></html>"#
    )
}

fn recent_date() -> String {
    (chrono::Utc::now() - chrono::Duration::days(2))
        .format("%b %-d, %Y")
        .to_string()
}

fn test_pipeline(dir: &TempDir) -> HarvestPipeline {
    let mut config = AppConfig::default();
    config.harvest.results_path = dir.path().join("results.json");
    config.harvest.search_settle_secs = 0;
    config.harvest.view_settle_secs = 0;
    HarvestPipeline::new(config, ChallengeSignal::new())
}

fn request(query: &str) -> HarvestRequest {
    HarvestRequest {
        search_query: query.to_string(),
        lookback_days: 30,
    }
}

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

#[tokio::test(start_paused = true)]
async fn test_full_run_steps_and_persisted_records() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = test_pipeline(&dir);

    let pilot = FakePilot::new(home_page(), search_results_page(1, 1))
        .with_view(
            "Available",
            cards_page(&[available_card("/watch/avail", 3)]),
        )
        .with_view(
            "Historical",
            cards_page(&[historical_card("/watch/hist", &recent_date())]),
        )
        .with_listing(&url("/watch/avail"), listing_page("Chrono24", "Rolex"))
        .with_listing(&url("/watch/hist"), listing_page("Chrono24", "Omega"));

    let steps = Mutex::new(Vec::new());
    let records = pipeline
        .run_on_page(&pilot, &request("rolex"), &|step| {
            steps.lock().expect("steps").push(step);
        })
        .await
        .expect("run");

    assert_eq!(
        steps.into_inner().expect("steps"),
        vec![
            HarvestStep::NavigateHome,
            HarvestStep::DiscoverLinks,
            HarvestStep::HarvestListings,
            HarvestStep::Persist,
        ]
    );
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].brand, "Rolex");
    assert_eq!(records[1].brand, "Omega");

    // The artifact holds exactly what the run returned.
    assert_eq!(pipeline.store().load().expect("load"), records);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_link_across_views_visited_once() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = test_pipeline(&dir);

    // The same listing shows up in both views.
    let pilot = FakePilot::new(home_page(), search_results_page(1, 1))
        .with_view("Available", cards_page(&[available_card("/watch/dup", 3)]))
        .with_view(
            "Historical",
            cards_page(&[historical_card("/watch/dup", &recent_date())]),
        )
        .with_listing(&url("/watch/dup"), listing_page("Chrono24", "Rolex"));

    let records = pipeline
        .run_on_page(&pilot, &request("rolex"), &|_| {})
        .await
        .expect("run");

    assert_eq!(records.len(), 1);
    assert_eq!(pilot.visits_to(&url("/watch/dup")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_listing_is_retried_once() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = test_pipeline(&dir);

    let pilot = FakePilot::new(home_page(), search_results_page(2, 0))
        .with_view(
            "Available",
            cards_page(&[
                available_card("/watch/ok", 3),
                available_card("/watch/flaky", 5),
            ]),
        )
        .with_listing(&url("/watch/ok"), listing_page("Chrono24", "Rolex"))
        .with_listing(&url("/watch/flaky"), listing_page("Chrono24", "Tudor"))
        .failing_once(&url("/watch/flaky"));

    let records = pipeline
        .run_on_page(&pilot, &request("rolex"), &|_| {})
        .await
        .expect("run");

    let brands: Vec<_> = records.iter().map(|r| r.brand.as_str()).collect();
    assert!(brands.contains(&"Rolex"));
    assert!(brands.contains(&"Tudor"));
    assert_eq!(pilot.visits_to(&url("/watch/flaky")), 2);
    assert_eq!(pilot.visits_to(&url("/watch/ok")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_scope_listing_is_not_retried() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = test_pipeline(&dir);

    // The card claims the right venue but the listing page disagrees.
    let pilot = FakePilot::new(home_page(), search_results_page(1, 0))
        .with_view(
            "Available",
            cards_page(&[available_card("/watch/elsewhere", 3)]),
        )
        .with_listing(
            &url("/watch/elsewhere"),
            listing_page("SomeAuctionHouse", "Rolex"),
        );

    let records = pipeline
        .run_on_page(&pilot, &request("rolex"), &|_| {})
        .await
        .expect("run");

    assert!(records.is_empty());
    // The visit completed, so the retry pass must not touch it again.
    assert_eq!(pilot.visits_to(&url("/watch/elsewhere")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_view_is_skipped() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = test_pipeline(&dir);

    let pilot = FakePilot::new(home_page(), search_results_page(1, 0))
        .with_view("Available", cards_page(&[available_card("/watch/a", 3)]))
        .with_listing(&url("/watch/a"), listing_page("Chrono24", "Rolex"));

    pipeline
        .run_on_page(&pilot, &request("rolex"), &|_| {})
        .await
        .expect("run");

    let log = pilot.log();
    assert!(!log.contains(&"select_view Historical".to_string()));
    assert!(!log
        .iter()
        .any(|entry| entry.contains("unsold=false")));
}

#[tokio::test(start_paused = true)]
async fn test_unresolved_challenge_suspends_the_run() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = test_pipeline(&dir);

    let pilot = FakePilot::new(gated_home_page(), search_results_page(0, 0));

    // Nobody resolves the challenge, so the run never gets past the gate.
    let outcome = tokio::time::timeout(
        Duration::from_secs(300),
        pipeline.run_on_page(&pilot, &request("rolex"), &|_| {}),
    )
    .await;

    assert!(outcome.is_err(), "run should still be waiting on the gate");
}

#[tokio::test(start_paused = true)]
async fn test_challenge_resolution_resumes_the_run() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = test_pipeline(&dir);

    let pilot = FakePilot::new(gated_home_page(), search_results_page(1, 0))
        .with_view("Available", cards_page(&[available_card("/watch/a", 3)]))
        .with_listing(&url("/watch/a"), listing_page("Chrono24", "Rolex"));

    let signal = pipeline.signal().clone();
    let resolver = async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        signal.resolve();
    };

    let req = request("rolex");
    let (outcome, ()) = tokio::join!(pipeline.run_on_page(&pilot, &req, &|_| {}), resolver);

    let records = outcome.expect("run resumes after resolution");
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_start_harvest_rejects_blank_query_before_any_work() {
    let dir = TempDir::new().expect("temp dir");
    let pipeline = std::sync::Arc::new(test_pipeline(&dir));

    let result = bezel_pipeline::start_harvest(pipeline, request("   "));
    assert!(result.is_err());
}
