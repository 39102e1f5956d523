use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use co_core::config::ExtractionConfig;
use co_core::{Error, Result};
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use super::fetch::PageFetcher;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Renders pages in headless Chromium for hosts that build their content
/// client-side. One browser and one page per fetch, torn down on every path.
pub struct BrowserFetcher {
    user_agent: String,
    navigation_timeout: Duration,
    selector_timeout: Duration,
    ready_selector: String,
}

impl BrowserFetcher {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            navigation_timeout: config.network_idle_timeout(),
            selector_timeout: config.selector_timeout(),
            ready_selector: config.content_ready_selector.clone(),
        }
    }

    async fn render(&self, browser: &Browser, url: &str) -> Result<String> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Scraping(format!("Failed to open page: {}", e)))?;

        let html = self.load(&page, url).await;
        if let Err(e) = page.close().await {
            debug!("Failed to close page for {}: {}", url, e);
        }
        html
    }

    async fn load(&self, page: &Page, url: &str) -> Result<String> {
        timeout(self.navigation_timeout, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await
        .map_err(|_| Error::Scraping(format!("Timed out loading {}", url)))?
        .map_err(|e| Error::Scraping(format!("Failed to load {}: {}", url, e)))?;

        // Missing content markers are not fatal: read whatever rendered.
        let deadline = Instant::now() + self.selector_timeout;
        while page.find_element(self.ready_selector.as_str()).await.is_err() {
            if Instant::now() >= deadline {
                debug!("No content element appeared on {}", url);
                break;
            }
            sleep(POLL_INTERVAL).await;
        }

        page.content()
            .await
            .map_err(|e| Error::Scraping(format!("Failed to read DOM of {}: {}", url, e)))
    }
}

/// Pumps the CDP connection until it closes. A malformed message is logged
/// and skipped; the session stays usable. Returns the number of errors seen.
async fn drain_events<S, T, E>(events: &mut S) -> usize
where
    S: Stream<Item = std::result::Result<T, E>> + Unpin,
    E: Display,
{
    let mut errors = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            errors += 1;
            debug!("Browser event error (#{}): {}", errors, e);
        }
    }
    errors
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &str {
        "browser"
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg(format!("--user-agent={}", self.user_agent))
            .build()
            .map_err(|e| Error::Scraping(format!("Invalid browser config: {}", e)))?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Scraping(format!("Failed to launch browser: {}", e)))?;

        let events = tokio::spawn(async move {
            drain_events(&mut handler).await;
        });

        let html = self.render(&browser, url).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        let _ = browser.wait().await;
        events.abort();

        html
    }
}
