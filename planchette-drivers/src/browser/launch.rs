//! Browser selection, launch options, and WebDriver capability assembly.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use fantoccini::wd::Capabilities;
use planchette_common::util::inverse;
use planchette_common::PlanchetteError;
use serde_json::json;

/// Environment variable overriding the WebDriver endpoint for all browsers.
pub const WEBDRIVER_URL_ENV: &str = "PLANCHETTE_WEBDRIVER_URL";

/// Browsers this layer knows how to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

impl BrowserKind {
    /// Endpoint the matching driver binary listens on by default
    /// (chromedriver and geckodriver respectively).
    pub fn default_webdriver_url(&self) -> &'static str {
        match self {
            Self::Chrome => "http://localhost:9515",
            Self::Firefox => "http://localhost:4444",
        }
    }

    fn aliases() -> HashMap<BrowserKind, HashSet<&'static str>> {
        HashMap::from([
            (
                Self::Chrome,
                HashSet::from(["chrome", "chromium", "google-chrome"]),
            ),
            (
                Self::Firefox,
                HashSet::from(["firefox", "ff", "gecko", "mozilla"]),
            ),
        ])
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chrome => write!(f, "chrome"),
            Self::Firefox => write!(f, "firefox"),
        }
    }
}

impl FromStr for BrowserKind {
    type Err = PlanchetteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let by_alias = inverse(&Self::aliases());
        let lowered = s.trim().to_ascii_lowercase();
        by_alias
            .get(lowered.as_str())
            .and_then(|kinds| kinds.iter().next().copied())
            .ok_or_else(|| PlanchetteError::Config(format!("unknown browser '{s}'")))
    }
}

/// Options applied when opening a browser session.
///
/// All fields have workable defaults; builder methods cover scripted use:
///
/// ```rust
/// use planchette_drivers::LaunchOptions;
///
/// let options = LaunchOptions::new().headless(true).window_size(1280, 1024);
/// assert!(options.headless);
/// assert_eq!(options.window_size, Some((1280, 1024)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Open the window maximized. Ignored when `headless` is set.
    pub maximize: bool,
    /// Explicit window size in pixels; takes precedence over `maximize`.
    pub window_size: Option<(u32, u32)>,
    /// Explicit WebDriver endpoint. When unset, `PLANCHETTE_WEBDRIVER_URL`
    /// is consulted, then the browser's default endpoint.
    pub webdriver_url: Option<String>,
    /// Override the browser's user-agent string.
    pub user_agent: Option<String>,
    /// Additional raw command-line arguments passed to the browser binary.
    pub extra_args: Vec<String>,
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn maximize(mut self, maximize: bool) -> Self {
        self.maximize = maximize;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = Some(url.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Endpoint to connect to, resolved in precedence order: explicit
    /// option, environment override, per-browser default.
    pub fn resolve_webdriver_url(&self, kind: BrowserKind) -> String {
        if let Some(url) = &self.webdriver_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var(WEBDRIVER_URL_ENV) {
            if !url.trim().is_empty() {
                return url;
            }
        }
        kind.default_webdriver_url().to_string()
    }
}

/// Construct the browser command-line arguments for a launch.
pub fn build_browser_arguments(kind: BrowserKind, options: &LaunchOptions) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    match kind {
        BrowserKind::Chrome => {
            if options.headless {
                args.push("--headless".to_string());
                args.push("--disable-gpu".to_string());
            } else if options.maximize && options.window_size.is_none() {
                args.push("--start-maximized".to_string());
            }
            if let Some((w, h)) = options.window_size {
                args.push(format!("--window-size={w},{h}"));
            }
            if let Some(ua) = &options.user_agent {
                args.push(format!("--user-agent={ua}"));
            }
        }
        BrowserKind::Firefox => {
            if options.headless {
                args.push("-headless".to_string());
            }
            if let Some((w, h)) = options.window_size {
                args.push("-width".to_string());
                args.push(w.to_string());
                args.push("-height".to_string());
                args.push(h.to_string());
            }
            // The user agent is a profile preference on Firefox; it is set
            // through moz:firefoxOptions in build_capabilities instead.
        }
    }

    args.extend(options.extra_args.iter().cloned());
    args
}

/// Assemble the WebDriver capabilities payload for a launch.
pub(crate) fn build_capabilities(kind: BrowserKind, options: &LaunchOptions) -> Capabilities {
    let mut caps = Capabilities::new();
    let args = build_browser_arguments(kind, options);

    match kind {
        BrowserKind::Chrome => {
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
        BrowserKind::Firefox => {
            let mut firefox_opts = json!({ "args": args });
            if let Some(ua) = &options.user_agent {
                firefox_opts["prefs"] = json!({ "general.useragent.override": ua });
            }
            caps.insert("moz:firefoxOptions".to_string(), firefox_opts);
        }
    }

    caps
}
