//! Locators describe an element the way a person would: by what it is, what
//! it says, and where it sits relative to other things on the page.
//!
//! A [`Locator`] is an immutable value. Building one never talks to the
//! browser; resolution happens when the locator is handed to a session
//! operation or a [`Handle`](crate::Handle) first needs a live element.

use std::fmt;

use crate::geometry::Direction;

/// The element class a locator targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Raw CSS or XPath selector, or an `@name` shorthand.
    Selector,
    /// Any element carrying the given visible text.
    Text,
    /// An anchor (`<a>`).
    Link,
    /// A list item (`<li>`).
    ListItem,
    /// A button, submit input, or anything with `role="button"`.
    Button,
    /// An image (`<img>`), matched by alt text.
    Image,
    /// A text-like `<input>` or a `<textarea>`.
    TextField,
    /// A `<select>` drop-down.
    ComboBox,
    /// A checkbox input.
    CheckBox,
    /// A radio input.
    RadioButton,
    /// A file upload input (`<input type="file">`).
    FileInput,
}

impl Kind {
    /// Noun used when rendering a locator for error messages.
    pub(crate) fn noun(&self) -> &'static str {
        match self {
            Kind::Selector => "selector",
            Kind::Text => "text",
            Kind::Link => "link",
            Kind::ListItem => "list item",
            Kind::Button => "button",
            Kind::Image => "image",
            Kind::TextField => "text field",
            Kind::ComboBox => "combo box",
            Kind::CheckBox => "checkbox",
            Kind::RadioButton => "radio button",
            Kind::FileInput => "file input",
        }
    }
}

/// One spatial condition attached to a locator.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Constraint {
    pub(crate) direction: Direction,
    pub(crate) anchor: Box<Locator>,
}

/// A description of an element to find.
///
/// ```
/// use planchette::Locator;
///
/// let field = Locator::text_field("Street").below("Billing address");
/// assert_eq!(field.to_string(), "text field 'Street' below text 'Billing address'");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    kind: Kind,
    needle: Option<String>,
    constraints: Vec<Constraint>,
}

impl Locator {
    fn of(kind: Kind, needle: Option<String>) -> Self {
        Self {
            kind,
            needle,
            constraints: Vec::new(),
        }
    }

    /// A raw selector. Strings starting with `@` match by `name` attribute,
    /// strings that look like XPath (`//`, `./`, `(`) are taken as XPath,
    /// everything else is CSS.
    pub fn selector(selector: impl Into<String>) -> Self {
        Self::of(Kind::Selector, Some(selector.into()))
    }

    /// Any element whose visible text (or `value`) equals `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self::of(Kind::Text, Some(text.into()))
    }

    pub fn link(label: impl Into<String>) -> Self {
        Self::of(Kind::Link, Some(label.into()))
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        Self::of(Kind::ListItem, Some(text.into()))
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::of(Kind::Button, Some(label.into()))
    }

    /// An image, matched by its alt text.
    pub fn image(alt: impl Into<String>) -> Self {
        Self::of(Kind::Image, Some(alt.into()))
    }

    /// A text input or textarea, matched by label, placeholder, name, or
    /// `aria-label`.
    pub fn text_field(label: impl Into<String>) -> Self {
        Self::of(Kind::TextField, Some(label.into()))
    }

    pub fn combo_box(label: impl Into<String>) -> Self {
        Self::of(Kind::ComboBox, Some(label.into()))
    }

    pub fn check_box(label: impl Into<String>) -> Self {
        Self::of(Kind::CheckBox, Some(label.into()))
    }

    pub fn radio_button(label: impl Into<String>) -> Self {
        Self::of(Kind::RadioButton, Some(label.into()))
    }

    /// A file upload input, matched by label, name, or `aria-label`.
    pub fn file_input(label: impl Into<String>) -> Self {
        Self::of(Kind::FileInput, Some(label.into()))
    }

    /// An unlabelled locator matching every element of `kind`.
    ///
    /// Useful with `find_all`, e.g. `Locator::any(Kind::Link)` for all links
    /// on the page.
    pub fn any(kind: Kind) -> Self {
        Self::of(kind, None)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn needle(&self) -> Option<&str> {
        self.needle.as_deref()
    }

    pub(crate) fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    fn constrained(mut self, direction: Direction, anchor: impl Into<Locator>) -> Self {
        self.constraints.push(Constraint {
            direction,
            anchor: Box::new(anchor.into()),
        });
        self
    }

    /// Restrict matches to elements below `anchor`.
    ///
    /// A plain string anchor is shorthand for [`Locator::text`].
    pub fn below(self, anchor: impl Into<Locator>) -> Self {
        self.constrained(Direction::Below, anchor)
    }

    /// Restrict matches to elements above `anchor`.
    pub fn above(self, anchor: impl Into<Locator>) -> Self {
        self.constrained(Direction::Above, anchor)
    }

    /// Restrict matches to elements to the right of `anchor`.
    pub fn to_right_of(self, anchor: impl Into<Locator>) -> Self {
        self.constrained(Direction::RightOf, anchor)
    }

    /// Restrict matches to elements to the left of `anchor`.
    pub fn to_left_of(self, anchor: impl Into<Locator>) -> Self {
        self.constrained(Direction::LeftOf, anchor)
    }
}

impl From<&str> for Locator {
    fn from(text: &str) -> Self {
        Locator::text(text)
    }
}

impl From<String> for Locator {
    fn from(text: String) -> Self {
        Locator::text(text)
    }
}

impl From<&String> for Locator {
    fn from(text: &String) -> Self {
        Locator::text(text.clone())
    }
}

impl From<&Locator> for Locator {
    fn from(locator: &Locator) -> Self {
        locator.clone()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.needle {
            Some(needle) => write!(f, "{} '{}'", self.kind.noun(), needle)?,
            None => write!(f, "any {}", self.kind.noun())?,
        }
        for constraint in &self.constraints {
            write!(f, " {} {}", constraint.direction.keyword(), constraint.anchor)?;
        }
        Ok(())
    }
}
