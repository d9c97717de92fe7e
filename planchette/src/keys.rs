//! Keyboard input for [`Session::press`](crate::Session::press).
//!
//! [`Keys`] is a flat sequence of characters in the driver's key encoding.
//! Special keys come from [`Key`]; chords are built with `+`, and the
//! driver releases any modifiers still held when the sequence ends:
//!
//! ```
//! use planchette::{Key, Keys};
//!
//! let select_all = Keys::from(Key::Control) + 'a';
//! let shifted = Keys::from(Key::Shift) + "hello";
//! # let _ = (select_all, shifted);
//! ```

use std::ops::Add;

pub use fantoccini::key::Key;

/// A sequence of keyboard input, possibly containing special keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keys(String);

impl Keys {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Key> for Keys {
    fn from(key: Key) -> Self {
        Keys(char::from(key).to_string())
    }
}

impl From<char> for Keys {
    fn from(c: char) -> Self {
        Keys(c.to_string())
    }
}

impl From<&str> for Keys {
    fn from(text: &str) -> Self {
        Keys(text.to_string())
    }
}

impl From<String> for Keys {
    fn from(text: String) -> Self {
        Keys(text)
    }
}

impl<T: Into<Keys>> Add<T> for Keys {
    type Output = Keys;

    fn add(mut self, rhs: T) -> Keys {
        self.0.push_str(&rhs.into().0);
        self
    }
}
