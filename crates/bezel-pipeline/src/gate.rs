//! The anti-bot challenge gate.
//!
//! Detection is a pure function over an HTML snapshot; the wait itself is
//! deliberately unbounded, because only a human at the live browser window
//! can clear the challenge. The post-resolution wait is bounded.

use bezel_core::{ChallengeSignal, HarvestSettings};
use scraper::Html;
use std::time::Duration;

use crate::dom;
use crate::page::PagePilot;
use crate::selectors;

/// Whether the snapshot shows an active challenge: either the embedded
/// challenge frame or the gated-content interstitial phrase.
pub fn challenge_present(html: &str) -> bool {
    let doc = Html::parse_document(html);
    if dom::first(doc.root_element(), selectors::CHALLENGE_FRAME).is_some() {
        return true;
    }
    let text: String = doc.root_element().text().collect();
    text.to_lowercase().contains(selectors::GATED_CONTENT_PHRASE)
}

/// Suspends the pipeline while a challenge is up and resumes it once the
/// external resolution signal fires.
pub struct ChallengeGate {
    signal: ChallengeSignal,
    poll: Duration,
    post_wait: Duration,
}

impl ChallengeGate {
    pub fn new(signal: ChallengeSignal, settings: &HarvestSettings) -> Self {
        Self {
            signal,
            poll: settings.challenge_poll(),
            post_wait: settings.post_challenge_wait(),
        }
    }

    /// Check the current page for a challenge. If one is up, wait without
    /// bound for the resolution signal, then wait (bounded) for real
    /// content to reappear.
    pub async fn check_and_wait<P: PagePilot + ?Sized>(
        &self,
        pilot: &P,
    ) -> Result<(), bezel_browser::BrowserError> {
        let html = pilot.html().await?;
        if !challenge_present(&html) {
            return Ok(());
        }

        tracing::warn!("anti-bot challenge detected; waiting for manual resolution");
        while !self.signal.is_resolved() {
            tokio::time::sleep(self.poll).await;
        }

        tracing::info!("challenge resolution signalled; waiting for content");
        pilot
            .wait_for_any(selectors::POST_CHALLENGE_MARKERS, self.post_wait)
            .await
    }
}
