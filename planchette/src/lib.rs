//! planchette describes web UI interactions the way you would to a person
//! looking over your shoulder: click the Log In button, write the password
//! into the field below Password, select French from the Language box.
//!
//! - [`Locator`]: immutable element descriptions built from an element
//!   kind, matching text, and spatial constraints like [`Locator::below`]
//! - [`Session`]: one attached browser, carrying its own implicit-wait
//!   budget with no process-global state
//! - [`Handle`]: a lazily-resolved element reference that binds on first
//!   use and stays bound
//! - gestures and input: `click`, `drag`, `write_into`, `press`, `select`,
//!   `attach_file`, and friends, all accepting locators, handles, strings,
//!   or points where each makes sense
//!
//! ```no_run
//! use planchette::{start_chrome, LaunchOptions, Locator};
//!
//! # async fn run() -> planchette::Result<()> {
//! let session = start_chrome(&LaunchOptions::new().headless(true)).await?;
//! session.go_to("example.com/login").await?;
//! session.write_into("lena", Locator::text_field("Username")).await?;
//! session.write_into("hunter2", Locator::text_field("Password")).await?;
//! session.click(Locator::button("Log In")).await?;
//! session.kill().await?;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod geometry;
pub mod handle;
pub mod keys;
pub mod locator;
mod query;
pub mod resolve;
pub mod session;

pub use actions::{ComboTarget, ElementTarget, FileTarget, Target};
pub use geometry::{Point, Rect, PROXIMITY_TOLERANCE};
pub use handle::Handle;
pub use keys::{Key, Keys};
pub use locator::{Kind, Locator};
pub use planchette_common::{PlanchetteError, Result};
pub use planchette_drivers::{BrowserKind, Driver, LaunchOptions};
pub use resolve::{DEFAULT_IMPLICIT_WAIT, DEFAULT_POLL_INTERVAL};
pub use session::{start_chrome, start_firefox, Alert, Session, Window};
