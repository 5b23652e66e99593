use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use tracing::info;

use crate::driver::{LinkElement, PageDriver};

/// Anchor href prefixes treated as content links.
pub const DEFAULT_LINK_PREFIXES: &[&str] = &["/p/", "/reel/"];

/// [`PageDriver`] over a live WebDriver session.
///
/// Attaches to an already-running chromedriver/geckodriver. Logging in is
/// the operator's job, done in the attached browser window before collection
/// starts; this adapter only navigates, queries and scrolls.
pub struct WebDriverPage {
    client: Client,
    selector: String,
}

impl WebDriverPage {
    /// Connects to the WebDriver endpoint and opens `page_url`, matching the
    /// default content-link prefixes.
    pub async fn connect(webdriver_url: &str, page_url: &str) -> Result<Self> {
        Self::connect_with_prefixes(webdriver_url, page_url, DEFAULT_LINK_PREFIXES).await
    }

    pub async fn connect_with_prefixes(
        webdriver_url: &str,
        page_url: &str,
        prefixes: &[&str],
    ) -> Result<Self> {
        let client = ClientBuilder::rustls()
            .map_err(|e| anyhow!("webdriver tls setup failed: {e}"))?
            .connect(webdriver_url)
            .await
            .with_context(|| format!("failed to connect to webdriver at {webdriver_url}"))?;
        client
            .goto(page_url)
            .await
            .with_context(|| format!("failed to open {page_url}"))?;
        info!(page = page_url, "webdriver session ready");

        let selector = prefixes
            .iter()
            .map(|prefix| format!("a[href^=\"{prefix}\"]"))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self { client, selector })
    }

    /// Ends the session. Dropping the adapter without calling this leaves
    /// the browser window open.
    pub async fn close(self) -> Result<()> {
        self.client
            .close()
            .await
            .context("failed to close webdriver session")
    }
}

struct WebDriverElement {
    element: Element,
}

#[async_trait]
impl LinkElement for WebDriverElement {
    async fn href(&self) -> Result<Option<String>> {
        let href = self.element.attr("href").await?;
        Ok(href)
    }
}

#[async_trait]
impl PageDriver for WebDriverPage {
    async fn query_link_elements(&self) -> Result<Vec<Box<dyn LinkElement>>> {
        let elements = self.client.find_all(Locator::Css(&self.selector)).await?;
        Ok(elements
            .into_iter()
            .map(|element| Box::new(WebDriverElement { element }) as Box<dyn LinkElement>)
            .collect())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.client
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await?;
        Ok(())
    }

    async fn wait(&self, pause: Duration) -> Result<()> {
        tokio::time::sleep(pause).await;
        Ok(())
    }
}
