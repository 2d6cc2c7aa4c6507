//! Shared types used across the Bezel application.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One harvested marketplace listing.
///
/// Every field is an opaque display string exactly as it appears on the
/// listing page; numeric and date parsing is a presentation concern. The
/// serde names match the keys of the persisted JSON artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingRecord {
    /// Watch brand, read positionally from the page heading
    #[serde(rename = "Brand")]
    pub brand: String,
    /// Model name, read positionally from the page heading
    #[serde(rename = "Model")]
    pub model: String,
    /// Reference number
    #[serde(rename = "Reference")]
    pub reference: String,
    /// Display price (current price, or last seen price for historical listings)
    #[serde(rename = "Price")]
    pub price: String,
    /// Upstream seller attribution
    #[serde(rename = "Seller")]
    pub seller: String,
    /// Seller location
    #[serde(rename = "Country")]
    pub country: String,
    /// Last seen date; empty for currently-available listings
    #[serde(rename = "LastSeenDate")]
    pub last_seen_date: String,
    /// Whether the original box is included
    #[serde(rename = "Box")]
    pub box_included: String,
    /// Whether the original papers are included
    #[serde(rename = "Papers")]
    pub papers: String,
    /// How long the listing has been (or was) on the market
    #[serde(rename = "ListedFor")]
    pub listed_for: String,
    /// Condition description
    #[serde(rename = "Condition")]
    pub condition: String,
    /// First listing image URL
    #[serde(rename = "Image")]
    pub image_url: String,
    /// Canonical listing URL; unique within one harvest run's output
    #[serde(rename = "URL")]
    pub url: String,
}

/// Shared challenge-resolution signal.
///
/// An anti-bot challenge can only be solved by a human acting out-of-band,
/// so the pipeline suspends and polls this cell until an external caller
/// flips it. The cell is reset at the start of each run; the pipeline
/// itself only ever reads it. One active run at a time is assumed.
#[derive(Debug, Clone, Default)]
pub struct ChallengeSignal(Arc<AtomicBool>);

impl ChallengeSignal {
    /// Create a new, unresolved signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the challenge as resolved. Idempotent.
    pub fn resolve(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear the signal. Called once at the start of each run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Whether the challenge has been marked resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_artifact_keys() {
        let record = ListingRecord {
            brand: "Rolex".to_string(),
            url: "https://everywatch.com/watch/1".to_string(),
            ..ListingRecord::default()
        };

        let json = serde_json::to_value(&record).expect("serialize record");
        let obj = json.as_object().expect("record is an object");

        for key in [
            "Brand",
            "Model",
            "Reference",
            "Price",
            "Seller",
            "Country",
            "LastSeenDate",
            "Box",
            "Papers",
            "ListedFor",
            "Condition",
            "Image",
            "URL",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj["Brand"], "Rolex");
    }

    #[test]
    fn test_record_deserializes_partial_object() {
        let record: ListingRecord =
            serde_json::from_str(r#"{"Brand":"Omega","URL":"/watch/2"}"#).expect("parse record");
        assert_eq!(record.brand, "Omega");
        assert_eq!(record.url, "/watch/2");
        assert_eq!(record.price, "");
    }

    #[test]
    fn test_challenge_signal_lifecycle() {
        let signal = ChallengeSignal::new();
        assert!(!signal.is_resolved());

        signal.resolve();
        assert!(signal.is_resolved());
        // Setting twice is harmless
        signal.resolve();
        assert!(signal.is_resolved());

        signal.reset();
        assert!(!signal.is_resolved());
    }

    #[test]
    fn test_challenge_signal_clones_share_state() {
        let signal = ChallengeSignal::new();
        let reader = signal.clone();
        signal.resolve();
        assert!(reader.is_resolved());
    }
}
