use std::time::Duration;

use chromiumoxide::browser::Browser as CrBrowser;
use futures::StreamExt;
use tracing::debug;

use crate::config::AutofillConfig;
use crate::error::{Error, Result};
use crate::page::Page;

/// A connection to an already-running browser's remote debugging endpoint.
///
/// The browser is expected to have been started by the operator (with the form
/// open and a session logged in); this never launches one. A failed attach is
/// fatal to the run.
pub struct Session {
    browser: CrBrowser,
    poll_timeout: Duration,
    _handler_task: tokio::task::JoinHandle<()>,
}

impl Session {
    /// Attach over the configured remote debugging URL.
    pub async fn attach(config: &AutofillConfig) -> Result<Self> {
        let (mut browser, mut handler) = CrBrowser::connect(config.cdp_url.as_str())
            .await
            .map_err(|e| Error::Connect(format!("{}: {e}", config.cdp_url)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        // Populate the target list so tabs opened before the attach are visible.
        browser
            .fetch_targets()
            .await
            .map_err(|e| Error::Connect(format!("failed to fetch targets: {e}")))?;
        tokio::time::sleep(Duration::from_millis(100)).await;

        Ok(Self {
            browser,
            poll_timeout: config.poll_timeout,
            _handler_task: handler_task,
        })
    }

    /// Return all currently open pages (tabs).
    pub async fn pages(&self) -> Result<Vec<Page>> {
        let timeout = self.poll_timeout;
        let cr_pages = self.browser.pages().await?;
        Ok(cr_pages.into_iter().map(|p| Page::new(p, timeout)).collect())
    }

    /// The most recently opened tab, brought to the front.
    pub async fn active_page(&self) -> Result<Page> {
        let mut cr_pages = self.browser.pages().await?;
        debug!(tabs = cr_pages.len(), "enumerated open tabs");
        let cr_page = cr_pages
            .pop()
            .ok_or_else(|| Error::Connect("browser has no open tabs".into()))?;
        cr_page.bring_to_front().await?;
        Ok(Page::new(cr_page, self.poll_timeout))
    }

    /// Open a fresh tab navigated to the given URL.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        let cr_page = self.browser.new_page(url).await?;
        Ok(Page::new(cr_page, self.poll_timeout))
    }
}
