use crate::error::{BrowserError, Result};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, ReloadParams,
};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Interval between selector-presence polls.
const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// A single live browser page.
///
/// All interaction with the target site goes through this wrapper. Every
/// wait here is bounded except none: the unbounded challenge poll lives in
/// the pipeline, not in the browser layer.
pub struct PageSession {
    page: Page,
    navigation_timeout: Duration,
}

impl PageSession {
    pub(crate) async fn new(
        page: Page,
        init_script: &str,
        navigation_timeout: Duration,
    ) -> Result<Self> {
        if !init_script.is_empty() {
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(init_script))
                .await
                .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        }
        Ok(Self {
            page,
            navigation_timeout,
        })
    }

    /// Navigate to `url` and wait for the navigation to commit, bounded by
    /// the configured navigation timeout.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let nav = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            Ok(())
        };

        tokio::time::timeout(self.navigation_timeout, nav)
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {url}")))?
    }

    /// Reload the current document and wait for it to commit.
    pub async fn reload(&self) -> Result<()> {
        let nav = async {
            self.page
                .execute(ReloadParams::default())
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            Ok(())
        };

        tokio::time::timeout(self.navigation_timeout, nav)
            .await
            .map_err(|_| BrowserError::Timeout("page reload".to_string()))?
    }

    /// Evaluate a JS expression and deserialize its result.
    pub async fn evaluate<T: DeserializeOwned>(&self, js: &str) -> Result<T> {
        self.page
            .evaluate(js)
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| BrowserError::Evaluation(e.to_string()))
    }

    /// Whether any element currently matches `selector`.
    pub async fn has_element(&self, selector: &str) -> Result<bool> {
        let sel = js_string(selector);
        self.evaluate::<bool>(&format!("document.querySelector({sel}) !== null"))
            .await
    }

    /// Wait until at least one of `selectors` is present, polling the live
    /// DOM, bounded by `timeout`.
    pub async fn wait_for_any(&self, selectors: &[&str], timeout: Duration) -> Result<()> {
        let combined = selectors.join(", ");
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.has_element(&combined).await? {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!("selector {combined}")));
            }
            tokio::time::sleep(SELECTOR_POLL).await;
        }
    }

    /// Click the first element matching `selector`.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        Ok(())
    }

    /// Click the first element matching `selector` whose trimmed text
    /// equals `text`.
    pub async fn click_by_text(&self, selector: &str, text: &str) -> Result<()> {
        let sel = js_string(selector);
        let needle = js_string(text);
        let js = format!(
            r"(() => {{
                const el = Array.from(document.querySelectorAll({sel}))
                    .find((e) => e.textContent.trim() === {needle});
                if (!el) return false;
                el.click();
                return true;
            }})()"
        );
        if self.evaluate::<bool>(&js).await? {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound(format!(
                "{selector} with text {text:?}"
            )))
        }
    }

    /// Focus the first element matching `selector`, type `text` into it and
    /// press Enter.
    pub async fn type_and_submit(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        element
            .type_str(text)
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        element
            .press_key("Enter")
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        Ok(())
    }

    /// Snapshot the live DOM as HTML. Falls back to a JS serialization when
    /// the CDP content call fails, which happens on fragile connections.
    pub async fn html(&self) -> Result<String> {
        match self.page.content().await {
            Ok(html) => Ok(html),
            Err(e) => {
                tracing::debug!("page content failed ({}), falling back to JS snapshot", e);
                self.evaluate::<String>("document.documentElement.outerHTML")
                    .await
            }
        }
    }
}

/// Serialize a Rust string as a JS string literal.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
