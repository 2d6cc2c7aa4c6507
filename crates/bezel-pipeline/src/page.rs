//! The pipeline's view of a browser page.
//!
//! [`PagePilot`] is the narrow seam between harvest logic and the live
//! browser: the pipeline only ever navigates, waits, performs the three
//! site gestures and snapshots HTML. Tests drive the same logic with a
//! scripted pilot instead of Chromium.

use async_trait::async_trait;
use bezel_browser::{BrowserError, PageSession};
use bezel_core::HarvestSettings;
use std::time::Duration;

use crate::selectors;

/// Delay between opening the view dropdown and confirming the choice,
/// giving the widget time to register the highlighted option.
const DROPDOWN_SETTLE: Duration = Duration::from_millis(300);

/// Bounded wait for dropdown options to render after opening it.
const DROPDOWN_WAIT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait PagePilot: Send + Sync {
    /// Navigate to an absolute URL and wait for the load to commit.
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Reload the current document.
    async fn reload(&self) -> Result<(), BrowserError>;

    /// Wait until at least one of `selectors` is present.
    async fn wait_for_any(&self, selectors: &[&str], timeout: Duration)
        -> Result<(), BrowserError>;

    /// Type `query` into the home-page search box and submit it.
    async fn submit_search(&self, query: &str) -> Result<(), BrowserError>;

    /// Switch the result-view dropdown to the option labeled `label`.
    async fn select_view(&self, label: &str) -> Result<(), BrowserError>;

    /// Rewrite the current URL with the paging query `suffix` so the next
    /// reload fetches the whole result set in one page. A URL that already
    /// carries a page-size parameter is left alone.
    async fn ensure_paging(&self, suffix: &str) -> Result<(), BrowserError>;

    /// Snapshot the current DOM as HTML.
    async fn html(&self) -> Result<String, BrowserError>;
}

/// [`PagePilot`] over a real Chromium page.
pub struct LivePage {
    session: PageSession,
    settings: HarvestSettings,
}

impl LivePage {
    pub fn new(session: PageSession, settings: HarvestSettings) -> Self {
        Self { session, settings }
    }

    /// Press Enter on whatever currently has focus. The view dropdown is a
    /// custom widget that commits its highlighted option on Enter.
    async fn press_enter(&self) -> Result<(), BrowserError> {
        let js = r"(() => {
            const el = document.activeElement || document.body;
            const opts = { key: 'Enter', code: 'Enter', bubbles: true };
            el.dispatchEvent(new KeyboardEvent('keydown', opts));
            el.dispatchEvent(new KeyboardEvent('keyup', opts));
            return true;
        })()";
        self.session.evaluate::<bool>(js).await?;
        Ok(())
    }
}

#[async_trait]
impl PagePilot for LivePage {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.session.navigate(url).await
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        self.session.reload().await
    }

    async fn wait_for_any(
        &self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.session.wait_for_any(selectors, timeout).await
    }

    async fn submit_search(&self, query: &str) -> Result<(), BrowserError> {
        self.session
            .type_and_submit(selectors::HOME_SEARCH_INPUT, query)
            .await
    }

    async fn select_view(&self, label: &str) -> Result<(), BrowserError> {
        self.session.click(selectors::VIEW_DROPDOWN_CONTROL).await?;
        self.session
            .wait_for_any(&[selectors::VIEW_OPTION_LABEL], DROPDOWN_WAIT)
            .await?;
        self.session
            .click_by_text(selectors::VIEW_OPTION_LABEL, label)
            .await?;
        tokio::time::sleep(DROPDOWN_SETTLE).await;
        self.press_enter().await?;
        tokio::time::sleep(self.settings.view_settle()).await;
        Ok(())
    }

    async fn ensure_paging(&self, suffix: &str) -> Result<(), BrowserError> {
        let suffix_js = serde_json::to_string(suffix).unwrap_or_else(|_| "\"\"".to_string());
        let js = format!(
            r"(() => {{
                const href = window.location.href;
                if (href.includes('pageSize')) return false;
                const suffix = {suffix_js};
                const next = href.includes('?')
                    ? href + suffix
                    : href + '?' + suffix.replace(/^&/, '');
                history.replaceState({{}}, '', next);
                return true;
            }})()"
        );
        self.session.evaluate::<bool>(&js).await?;
        Ok(())
    }

    async fn html(&self) -> Result<String, BrowserError> {
        self.session.html().await
    }
}
