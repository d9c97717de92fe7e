//! Connected WebDriver session wrapper.

use fantoccini::{Client, ClientBuilder};
use planchette_common::Result;
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use crate::browser::launch::{build_capabilities, BrowserKind, LaunchOptions};

/// Thin wrapper around a `fantoccini` WebDriver client, remembering which
/// browser it drives. Higher layers add element semantics on top; this type
/// only covers session lifecycle and whole-page operations.
pub struct Driver {
    client: Client,
    kind: BrowserKind,
}

impl Driver {
    /// Open a browser session against a running WebDriver endpoint
    /// (chromedriver or geckodriver; see
    /// [`LaunchOptions::resolve_webdriver_url`] for endpoint selection).
    pub async fn launch(kind: BrowserKind, options: &LaunchOptions) -> Result<Self> {
        let endpoint = options.resolve_webdriver_url(kind);
        let caps = build_capabilities(kind, options);

        info!(
            target: "browser.launch",
            browser = %kind,
            %endpoint,
            headless = options.headless,
            "starting browser session"
        );

        let client = match ClientBuilder::native().capabilities(caps).connect(&endpoint).await {
            Ok(client) => client,
            Err(e) => {
                error!(
                    target: "browser.launch",
                    %endpoint,
                    error = %e,
                    "could not reach the WebDriver endpoint; is the driver binary running?"
                );
                return Err(e.into());
            }
        };

        let driver = Self { client, kind };
        driver.apply_window_options(options).await?;
        Ok(driver)
    }

    /// Chrome consumes window geometry as command-line flags; Firefox needs
    /// a post-connect resize for the maximize case since geckodriver has no
    /// equivalent launch argument.
    async fn apply_window_options(&self, options: &LaunchOptions) -> Result<()> {
        if self.kind != BrowserKind::Firefox {
            return Ok(());
        }
        if options.window_size.is_some() || options.headless || !options.maximize {
            return Ok(());
        }

        let size = self
            .client
            .execute(
                "return [window.screen.availWidth, window.screen.availHeight];",
                vec![],
            )
            .await?;
        let dims: Option<(u32, u32)> = size.as_array().and_then(|a| {
            let w = a.first()?.as_u64()?;
            let h = a.get(1)?.as_u64()?;
            Some((w as u32, h as u32))
        });
        if let Some((w, h)) = dims {
            debug!(target: "browser.launch", width = w, height = h, "sizing window to screen");
            self.client.set_window_size(w, h).await?;
        }
        Ok(())
    }

    /// Borrow the underlying WebDriver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Clone the underlying client handle (cheap; it is reference-counted).
    pub fn clone_client(&self) -> Client {
        self.client.clone()
    }

    pub fn kind(&self) -> BrowserKind {
        self.kind
    }

    /// Navigate the session to `url`.
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!(target: "browser.session", %url, "navigating");
        self.client.goto(url).await?;
        Ok(())
    }

    /// Reload the current page.
    pub async fn refresh(&self) -> Result<()> {
        debug!(target: "browser.session", "refreshing page");
        self.client.refresh().await?;
        Ok(())
    }

    /// Title of the current page.
    pub async fn title(&self) -> Result<String> {
        Ok(self.client.title().await?)
    }

    /// URL of the current page.
    pub async fn current_url(&self) -> Result<Url> {
        Ok(self.client.current_url().await?)
    }

    /// Full HTML source of the current page.
    pub async fn page_source(&self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    /// Run a script in the page and return its result.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.client.execute(script, args).await?)
    }

    /// Resize the browser window.
    pub async fn set_window_size(&self, width: u32, height: u32) -> Result<()> {
        self.client.set_window_size(width, height).await?;
        Ok(())
    }

    /// End the browser session, closing every window it owns.
    pub async fn quit(self) -> Result<()> {
        info!(target: "browser.session", browser = %self.kind, "closing browser session");
        self.client.close().await?;
        Ok(())
    }
}
