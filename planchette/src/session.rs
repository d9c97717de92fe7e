//! The session: one attached browser plus the settings that govern lookups
//! made through it.
//!
//! All waiting behaviour is carried by the session value itself. There is
//! no process-global state; two sessions with different implicit-wait
//! budgets coexist without seeing each other.

use std::future::Future;
use std::time::{Duration, Instant};

use fantoccini::wd::WindowHandle;
use fantoccini::Client;
use planchette_common::{PlanchetteError, Result};
use planchette_drivers::{BrowserKind, Driver, LaunchOptions};
use tracing::{debug, info};
use url::Url;

use crate::handle::Handle;
use crate::locator::Locator;
use crate::resolve::{Resolver, DEFAULT_IMPLICIT_WAIT, DEFAULT_POLL_INTERVAL};

/// Launch Chrome and attach a session to it.
pub async fn start_chrome(options: &LaunchOptions) -> Result<Session> {
    Session::launch(BrowserKind::Chrome, options).await
}

/// Launch Firefox and attach a session to it.
pub async fn start_firefox(options: &LaunchOptions) -> Result<Session> {
    Session::launch(BrowserKind::Firefox, options).await
}

/// An attached browser.
pub struct Session {
    driver: Driver,
    implicit_wait: Duration,
}

impl Session {
    pub async fn launch(kind: BrowserKind, options: &LaunchOptions) -> Result<Self> {
        let driver = Driver::launch(kind, options).await?;
        Ok(Self::from_driver(driver))
    }

    /// Wrap an already-connected driver.
    pub fn from_driver(driver: Driver) -> Self {
        Self {
            driver,
            implicit_wait: DEFAULT_IMPLICIT_WAIT,
        }
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn implicit_wait(&self) -> Duration {
        self.implicit_wait
    }

    /// Change how long lookups through this session keep polling before
    /// they fail. Zero disables waiting: lookups evaluate once.
    pub fn set_implicit_wait(&mut self, budget: Duration) {
        self.implicit_wait = budget;
    }

    pub(crate) fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.driver.client(), self.implicit_wait)
    }

    fn immediate_resolver(&self) -> Resolver<'_> {
        Resolver::new(self.driver.client(), Duration::ZERO)
    }

    /// Navigate to `url`. Bare addresses like `localhost:8080` or
    /// `example.com/login` get an `http://` prefix.
    pub async fn go_to(&self, url: &str) -> Result<()> {
        self.driver.goto(&normalize_url(url)).await
    }

    /// Reload the current page. A pending alert blocks the reload, so one
    /// left open is confirmed first.
    pub async fn refresh(&self) -> Result<()> {
        match self.driver.client().accept_alert().await {
            Ok(()) => {}
            Err(error) if error.is_no_such_alert() => {}
            Err(error) => return Err(error.into()),
        }
        self.driver.refresh().await
    }

    pub async fn title(&self) -> Result<String> {
        self.driver.title().await
    }

    pub async fn current_url(&self) -> Result<Url> {
        self.driver.current_url().await
    }

    pub async fn page_source(&self) -> Result<String> {
        self.driver.page_source().await
    }

    /// Close the browser and end the driver session.
    pub async fn kill(self) -> Result<()> {
        self.driver.quit().await
    }

    /// A handle for `locator`. Nothing is looked up until the handle is
    /// first used.
    pub fn element(&self, locator: impl Into<Locator>) -> Handle {
        Handle::unbound(
            locator.into(),
            self.driver.clone_client(),
            self.implicit_wait,
        )
    }

    /// Whether `locator` matches right now. Never waits.
    pub async fn exists(&self, locator: impl Into<Locator>) -> Result<bool> {
        self.immediate_resolver().exists(&locator.into()).await
    }

    /// Every element currently matching `locator`, as already-bound
    /// handles. Never waits.
    pub async fn find_all(&self, locator: impl Into<Locator>) -> Result<Vec<Handle>> {
        let locator = locator.into();
        let elements = self.immediate_resolver().all_matches(&locator).await?;
        Ok(elements
            .into_iter()
            .map(|element| {
                Handle::bound(
                    locator.clone(),
                    self.driver.clone_client(),
                    element,
                    self.implicit_wait,
                )
            })
            .collect())
    }

    /// All open windows and tabs. The current window keeps focus.
    pub async fn windows(&self) -> Result<Vec<Window>> {
        let client = self.driver.client();
        let current = client.window().await?;
        let handles = client.windows().await?;
        let mut windows = Vec::with_capacity(handles.len());
        for handle in handles {
            client.switch_to_window(handle.clone()).await?;
            let title = client.title().await?;
            windows.push(Window {
                is_current: handle == current,
                handle,
                title,
            });
        }
        client.switch_to_window(current).await?;
        Ok(windows)
    }

    /// Focus the window whose title contains `title`, case-insensitively.
    pub async fn switch_to(&self, title: &str) -> Result<()> {
        let needle = title.to_lowercase();
        for window in self.windows().await? {
            if window.title.to_lowercase().contains(&needle) {
                self.driver.client().switch_to_window(window.handle).await?;
                info!(target: "browser.session", title = %window.title, "switched window");
                return Ok(());
            }
        }
        Err(PlanchetteError::NotFound(format!(
            "window with title containing '{title}'"
        )))
    }

    /// The currently open alert, confirm, or prompt dialog.
    pub fn alert(&self) -> Alert {
        Alert {
            client: self.driver.clone_client(),
            expected_text: None,
        }
    }

    /// Like [`alert`](Self::alert), but `exists` additionally checks that
    /// the dialog text starts with `text`.
    pub fn alert_matching(&self, text: impl Into<String>) -> Alert {
        Alert {
            client: self.driver.clone_client(),
            expected_text: Some(text.into()),
        }
    }

    /// Poll `condition` until it returns true, with the default ten-second
    /// budget and half-second interval.
    pub async fn wait_until<F, Fut>(&self, condition: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.wait_until_with(condition, DEFAULT_IMPLICIT_WAIT, DEFAULT_POLL_INTERVAL)
            .await
    }

    /// Poll `condition` until it returns true or `timeout` elapses. Errors
    /// from the condition end the wait immediately; return `Ok(false)` to
    /// keep waiting.
    pub async fn wait_until_with<F, Fut>(
        &self,
        mut condition: F,
        timeout: Duration,
        interval: Duration,
    ) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if condition().await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PlanchetteError::Timeout { waited: timeout });
            }
            tokio::time::sleep(interval).await;
        }
    }
}

/// One open browser window or tab.
#[derive(Debug, Clone)]
pub struct Window {
    pub handle: WindowHandle,
    pub title: String,
    pub is_current: bool,
}

/// A JavaScript alert, confirm, or prompt dialog.
pub struct Alert {
    client: Client,
    expected_text: Option<String>,
}

impl Alert {
    /// The dialog's message text. Fails if no dialog is open.
    pub async fn text(&self) -> Result<String> {
        Ok(self.client.get_alert_text().await?)
    }

    pub async fn accept(&self) -> Result<()> {
        self.client.accept_alert().await?;
        debug!(target: "browser.session", "alert accepted");
        Ok(())
    }

    pub async fn dismiss(&self) -> Result<()> {
        self.client.dismiss_alert().await?;
        debug!(target: "browser.session", "alert dismissed");
        Ok(())
    }

    /// Type into a prompt dialog.
    pub async fn write(&self, text: &str) -> Result<()> {
        self.client.send_alert_text(text).await?;
        Ok(())
    }

    /// Whether a dialog is open, and when this alert was built with an
    /// expected text, whether the message starts with it.
    pub async fn exists(&self) -> Result<bool> {
        match self.client.get_alert_text().await {
            Ok(message) => Ok(match &self.expected_text {
                Some(prefix) => message.starts_with(prefix),
                None => true,
            }),
            Err(error) if error.is_no_such_alert() => Ok(false),
            Err(error) => Err(error.into()),
        }
    }
}

/// Give scheme-less addresses an `http://` prefix so plain host names work.
/// Anything already carrying a scheme, including `data:` and `about:`
/// pages, runs unchanged.
fn normalize_url(url: &str) -> String {
    let schemeless = !url.contains("://")
        && !url.starts_with("data:")
        && !url.starts_with("about:")
        && !url.starts_with("javascript:");
    if schemeless {
        format!("http://{url}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hosts_get_a_scheme() {
        assert_eq!(normalize_url("example.com"), "http://example.com");
        assert_eq!(normalize_url("localhost:8080/admin"), "http://localhost:8080/admin");
    }

    #[test]
    fn explicit_schemes_pass_through() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("file:///tmp/page.html"), "file:///tmp/page.html");
    }

    #[test]
    fn schemes_without_authority_pass_through() {
        assert_eq!(normalize_url("data:text/html,<p>hi</p>"), "data:text/html,<p>hi</p>");
        assert_eq!(normalize_url("about:blank"), "about:blank");
    }
}
