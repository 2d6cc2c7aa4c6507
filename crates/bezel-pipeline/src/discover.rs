//! Link discovery over the dual result views.
//!
//! Parsing and filtering are pure functions over an HTML snapshot; the
//! [`LinkDiscoverer`] adds the page choreography (view switch, paging
//! rewrite, reload) around them.

use bezel_browser::BrowserError;
use bezel_core::HarvestSettings;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::dom;
use crate::page::PagePilot;
use crate::selectors;

const SECONDS_PER_DAY: f64 = 86_400.0;

static DISPLAY_DATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"[A-Za-z]{3,9} \d{1,2}, \d{4}").ok());
static DIGITS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+").ok());

/// The two result views the marketplace exposes for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryView {
    /// Listings currently for sale. Cards show a days-on-market counter.
    Available,
    /// Listings that have sold or expired. Cards show a last-seen date.
    Historical,
}

impl DiscoveryView {
    /// Label shown in the view dropdown.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Historical => "Historical",
        }
    }

    /// Query suffix that collapses the view's results onto one page.
    #[must_use]
    pub fn paging_suffix(self) -> &'static str {
        match self {
            Self::Available => "&pageSize=999",
            Self::Historical => "&unsold=false&pageSize=999",
        }
    }
}

/// Result counts read off the view dropdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewCounts {
    pub available: u32,
    pub historical: u32,
}

impl ViewCounts {
    #[must_use]
    pub fn of(&self, view: DiscoveryView) -> u32 {
        match view {
            DiscoveryView::Available => self.available,
            DiscoveryView::Historical => self.historical,
        }
    }
}

/// Read the per-view result counts from a search-result snapshot. Options
/// missing a label or count are ignored.
pub fn view_counts(html: &str) -> ViewCounts {
    let doc = Html::parse_document(html);
    let mut counts = ViewCounts::default();

    for option in dom::all(doc.root_element(), selectors::VIEW_OPTION) {
        let Some(label) = dom::first(option, selectors::VIEW_OPTION_LABEL) else {
            continue;
        };
        let Some(count_el) = dom::first(option, selectors::VIEW_OPTION_COUNT) else {
            continue;
        };
        let count_text = dom::text(count_el);
        let Some(count) = DIGITS
            .as_ref()
            .and_then(|re| re.find(&count_text))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        else {
            continue;
        };

        match dom::text(label).to_lowercase().as_str() {
            "available" => counts.available = count,
            "historical" => counts.historical = count,
            _ => {}
        }
    }

    counts
}

/// Lowercased label of the currently selected view, if the dropdown is
/// present.
pub fn active_view(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    dom::first(doc.root_element(), selectors::ACTIVE_VIEW_LABEL)
        .map(|el| dom::text(el).to_lowercase())
}

/// One listing card as it appears on a search-result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    /// Link to the listing, usually site-relative.
    pub href: String,
    /// `title` attribute of the source badge, naming the origin venue.
    pub source_title: Option<String>,
    /// Last-seen date text (historical cards).
    pub last_seen_text: Option<String>,
    /// Days-on-market text (available cards).
    pub days_listed_text: Option<String>,
}

/// Parse every listing card out of a search-result snapshot. Cards
/// without an `href` are dropped.
pub fn parse_cards(html: &str) -> Vec<ListingCard> {
    let doc = Html::parse_document(html);
    dom::all(doc.root_element(), selectors::LISTING_CARD)
        .into_iter()
        .filter_map(|card| {
            let href = card.value().attr("href")?.to_string();
            Some(ListingCard {
                href,
                source_title: dom::first(card, selectors::CARD_SOURCE)
                    .and_then(|el| el.value().attr("title"))
                    .map(str::to_string),
                last_seen_text: dom::first(card, selectors::CARD_LAST_SEEN).map(dom::text),
                days_listed_text: dom::first(card, selectors::CARD_DAYS_LISTED).map(dom::text),
            })
        })
        .collect()
}

/// Extract a displayed date like `Mar 4, 2025` from free text.
pub fn parse_display_date(text: &str) -> Option<NaiveDate> {
    let raw = DISPLAY_DATE.as_ref()?.find(text)?.as_str();
    NaiveDate::parse_from_str(raw, "%b %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%B %d, %Y"))
        .ok()
}

/// Age of a card in days, under the view's own notion of age.
///
/// Historical cards age fractionally from the midnight of their displayed
/// last-seen date; available cards report a whole-day counter. A card
/// without the age marker its view requires has no age.
pub fn card_age(card: &ListingCard, view: DiscoveryView, now: DateTime<Utc>) -> Option<f64> {
    match view {
        DiscoveryView::Historical => {
            let date = parse_display_date(card.last_seen_text.as_deref()?)?;
            let midnight = date.and_time(NaiveTime::MIN).and_utc();
            Some((now - midnight).num_seconds() as f64 / SECONDS_PER_DAY)
        }
        DiscoveryView::Available => {
            let text = card.days_listed_text.as_deref()?;
            let digits = DIGITS.as_ref()?.find(text)?;
            digits.as_str().parse::<u32>().ok().map(f64::from)
        }
    }
}

fn source_matches(card: &ListingCard) -> bool {
    card.source_title
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains(&selectors::SOURCE_MARKETPLACE.to_lowercase()))
}

/// Filter a view's cards down to in-scope links: relayed from the source
/// marketplace, with a computable age of at most `lookback_days`. Links
/// are returned in DOM order, deduplicated.
pub fn filter_cards(
    cards: &[ListingCard],
    view: DiscoveryView,
    lookback_days: u32,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();
    for card in cards {
        if !source_matches(card) {
            continue;
        }
        let Some(age) = card_age(card, view, now) else {
            continue;
        };
        if age <= f64::from(lookback_days) && seen.insert(card.href.clone()) {
            links.push(card.href.clone());
        }
    }
    links
}

/// Drives one result view to a full single-page listing and collects its
/// in-scope links.
pub struct LinkDiscoverer<'a, P: PagePilot + ?Sized> {
    pilot: &'a P,
    settings: &'a HarvestSettings,
}

impl<'a, P: PagePilot + ?Sized> LinkDiscoverer<'a, P> {
    pub fn new(pilot: &'a P, settings: &'a HarvestSettings) -> Self {
        Self { pilot, settings }
    }

    /// Switch to `view` if it is not already active, collapse its results
    /// onto one page, and return the in-scope links.
    pub async fn discover(
        &self,
        view: DiscoveryView,
        lookback_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, BrowserError> {
        let html = self.pilot.html().await?;
        let already_active =
            active_view(&html).is_some_and(|a| a.eq_ignore_ascii_case(view.label()));
        if !already_active {
            self.pilot.select_view(view.label()).await?;
        }

        self.pilot.ensure_paging(view.paging_suffix()).await?;
        self.pilot.reload().await?;
        self.pilot
            .wait_for_any(&[selectors::LISTING_CARD], self.settings.card_wait())
            .await?;

        let html = self.pilot.html().await?;
        let links = filter_cards(&parse_cards(&html), view, lookback_days, now);
        tracing::info!(view = view.label(), count = links.len(), "links discovered");
        Ok(links)
    }
}
