//! Browser launch and session management.

pub mod driver;
pub mod launch;

pub use driver::Driver;
pub use launch::{BrowserKind, LaunchOptions};
