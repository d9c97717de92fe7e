//! Browser session layer for the planchette workspace.
//!
//! This crate owns everything between "I want a Chrome" and a connected
//! WebDriver client: browser selection, launch options, capability
//! assembly, and session teardown.
//!
//! - [`browser::launch::BrowserKind`]: supported browsers and their aliases
//! - [`browser::launch::LaunchOptions`]: headless/window/endpoint options
//! - [`browser::driver::Driver`]: connected session wrapper
pub mod browser;

pub use browser::driver::Driver;
pub use browser::launch::{BrowserKind, LaunchOptions};
