use crate::error::{BrowserError, Result};
use crate::session::PageSession;
use bezel_core::BrowserSettings;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::stream::StreamExt;
use tokio::task::JoinHandle;

/// Browser automation engine.
///
/// Owns the Chromium process for the duration of one harvest run. The
/// orchestrator acquires it at launch and releases it unconditionally at
/// the end of the run, on both success and failure paths.
pub struct BrowserEngine {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserEngine {
    /// Launch a Chromium instance with the given settings.
    ///
    /// The browser is headful unless configured otherwise: a human must be
    /// able to solve an anti-bot challenge in the live window.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(settings.window_width, settings.window_height);
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The handler stream must be drained for the CDP connection to
        // make progress; it ends when the browser goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        tracing::info!(headless = settings.headless, "browser launched");

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open the single page used for the run, installing `init_script` so
    /// it executes on every subsequent document load.
    pub async fn new_session(
        &self,
        init_script: &str,
        navigation_timeout: std::time::Duration,
    ) -> Result<PageSession> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        PageSession::new(page, init_script, navigation_timeout).await
    }

    /// Shut down the browser process. Errors are logged, not propagated:
    /// release must not mask the run's own outcome.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("browser did not exit cleanly: {}", e);
        }
        self.handler_task.abort();
        tracing::info!("browser released");
    }
}
