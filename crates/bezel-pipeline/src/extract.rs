//! Listing-page field extraction.
//!
//! A pure function over a detail-page snapshot. Scope is decided first:
//! pages not relayed from the source marketplace yield no record at all.
//! Missing individual fields never fail a record; they read as empty
//! strings, matching the artifact's loose schema.

use bezel_core::ListingRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::dom;
use crate::selectors;

static LISTED_DAYS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)\d+\s*Days").ok());
static WHITESPACE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\s+").ok());

/// Which field rules apply to a listing visit.
///
/// The retry pass revisits links from both views without knowing their
/// origin, so it falls back to the available-view rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestPass {
    Available,
    Historical,
    Retry,
}

impl HarvestPass {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Historical => "historical",
            Self::Retry => "retry",
        }
    }

    fn historical_rules(self) -> bool {
        matches!(self, Self::Historical)
    }
}

/// Extract a record from a listing-page snapshot, or `None` when the
/// listing is not relayed from the source marketplace.
pub fn extract_record(html: &str, pass: HarvestPass, url: &str) -> Option<ListingRecord> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    if !source_in_scope(root) {
        return None;
    }

    let (price, last_seen_date, listed_for) = if pass.historical_rules() {
        (
            price_field(root, "Last seen price"),
            price_field(root, "Last seen date"),
            detail_field(root, "Listed For"),
        )
    } else {
        (first_price(root), String::new(), listed_days(root))
    };

    Some(ListingRecord {
        brand: brand(root),
        model: model(root),
        reference: heading_reference(root),
        price,
        seller: detail_field(root, "Source"),
        country: detail_field(root, "Location"),
        last_seen_date,
        box_included: detail_field(root, "Box"),
        papers: detail_field(root, "Papers"),
        listed_for,
        condition: detail_field(root, "Condition"),
        image_url: image_url(root),
        url: url.to_string(),
    })
}

/// The scope check reads the linked value of the `Source` detail row and
/// asks whether it names the source marketplace.
fn source_in_scope(root: ElementRef<'_>) -> bool {
    for item in dom::all(root, selectors::DETAIL_ITEM) {
        let Some(title) = dom::first(item, selectors::DETAIL_TITLE) else {
            continue;
        };
        if !dom::text(title).contains("Source") {
            continue;
        }
        return dom::first(item, selectors::DETAIL_VALUE_LINK)
            .map(dom::text)
            .is_some_and(|v| v.contains(selectors::SOURCE_MARKETPLACE));
    }
    false
}

/// Value of the detail row whose label, stripped of its trailing colon,
/// equals `label` exactly. Empty when absent.
fn detail_field(root: ElementRef<'_>, label: &str) -> String {
    for item in dom::all(root, selectors::DETAIL_ITEM) {
        let (Some(title), Some(value)) = (
            dom::first(item, selectors::DETAIL_TITLE),
            dom::first(item, selectors::DETAIL_VALUE),
        ) else {
            continue;
        };
        if dom::text(title).replace(':', "") == label {
            return dom::text(value);
        }
    }
    String::new()
}

/// Value of the price-analysis block whose label equals `label` exactly.
fn price_field(root: ElementRef<'_>, label: &str) -> String {
    for item in dom::all(root, selectors::PRICE_ITEM) {
        let (Some(title), Some(value)) = (
            dom::first(item, selectors::PRICE_ITEM_TITLE),
            dom::first(item, selectors::PRICE_ITEM_VALUE),
        ) else {
            continue;
        };
        if dom::text(title) == label {
            return dom::text(value);
        }
    }
    String::new()
}

/// First price in the analysis strip, used on available listings.
fn first_price(root: ElementRef<'_>) -> String {
    dom::first(root, selectors::FIRST_PRICE)
        .map(dom::text)
        .unwrap_or_default()
}

/// Days-on-market phrase from the `Listed` detail row, normalized to a
/// single space, e.g. `12 Days`.
fn listed_days(root: ElementRef<'_>) -> String {
    for item in dom::all(root, selectors::DETAIL_ITEM) {
        let Some(title) = dom::first(item, selectors::DETAIL_TITLE) else {
            continue;
        };
        if !dom::text(title).contains("Listed") {
            continue;
        }
        let value = dom::first(item, selectors::DETAIL_VALUE)
            .map(dom::text)
            .unwrap_or_default();
        let Some(m) = LISTED_DAYS.as_ref().and_then(|re| re.find(&value)) else {
            return String::new();
        };
        return WHITESPACE
            .as_ref()
            .map(|re| re.replace_all(m.as_str(), " ").into_owned())
            .unwrap_or_else(|| m.as_str().to_string());
    }
    String::new()
}

/// Reference number: text of the last link in the listing heading.
fn heading_reference(root: ElementRef<'_>) -> String {
    dom::all(root, selectors::HEADING_LINKS)
        .last()
        .map(|el| dom::text(*el))
        .unwrap_or_default()
}

fn brand(root: ElementRef<'_>) -> String {
    dom::first(root, selectors::BRAND)
        .map(dom::text)
        .unwrap_or_default()
}

/// Model line: the second lot-detail row.
fn model(root: ElementRef<'_>) -> String {
    dom::all(root, selectors::LOT_DETAIL_ROWS)
        .get(1)
        .map(|el| dom::text(*el))
        .unwrap_or_default()
}

/// Gallery image URL: first `srcset` entry when present, else `src`.
fn image_url(root: ElementRef<'_>) -> String {
    let Some(img) = dom::first(root, selectors::GALLERY_IMAGE) else {
        return String::new();
    };
    let src = img.value().attr("src").unwrap_or_default();
    match img.value().attr("srcset") {
        Some(srcset) => srcset
            .split(',')
            .filter_map(|entry| entry.trim().split(' ').next())
            .find(|s| !s.is_empty())
            .unwrap_or(src)
            .to_string(),
        None => src.to_string(),
    }
}
