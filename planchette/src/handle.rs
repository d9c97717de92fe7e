//! Handles pair a locator with the session that will resolve it.
//!
//! A handle starts out unbound. The first accessor that needs a live
//! element resolves the locator, waiting up to the session's implicit-wait
//! budget, and memoizes the result; from then on the handle stays bound to
//! that element and never re-resolves. A failed resolution leaves the
//! handle unbound, so the next access starts a fresh wait window. A bound
//! handle whose element has since left the page surfaces driver errors
//! unchanged.

use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::Client;
use planchette_common::{PlanchetteError, Result};

use crate::geometry::{Point, Rect};
use crate::locator::Locator;
use crate::resolve::Resolver;

/// Binding state of a handle. Transitions one way, from unbound to bound.
#[derive(Clone)]
enum Binding {
    Unbound,
    Bound(Element),
}

/// A lazily-resolved reference to one element.
#[derive(Clone)]
pub struct Handle {
    locator: Locator,
    client: Client,
    implicit_wait: Duration,
    binding: Binding,
}

impl Handle {
    pub(crate) fn unbound(locator: Locator, client: Client, implicit_wait: Duration) -> Self {
        Self {
            locator,
            client,
            implicit_wait,
            binding: Binding::Unbound,
        }
    }

    /// A handle already attached to a live element, as produced by
    /// `find_all`.
    pub(crate) fn bound(
        locator: Locator,
        client: Client,
        element: Element,
        implicit_wait: Duration,
    ) -> Self {
        Self {
            locator,
            client,
            implicit_wait,
            binding: Binding::Bound(element),
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound(_))
    }

    /// Resolve the locator if this handle is still unbound, then return the
    /// bound element.
    async fn bind(&mut self) -> Result<&Element> {
        if matches!(self.binding, Binding::Unbound) {
            let resolver = Resolver::new(&self.client, self.implicit_wait);
            let element = resolver.resolve(&self.locator).await?;
            self.binding = Binding::Bound(element);
        }
        let Binding::Bound(element) = &self.binding else {
            return Err(PlanchetteError::NotFound(self.locator.to_string()));
        };
        Ok(element)
    }

    /// Whether the locator matches right now. Never waits and never binds.
    pub async fn exists(&self) -> Result<bool> {
        if self.is_bound() {
            return Ok(true);
        }
        Resolver::new(&self.client, Duration::ZERO)
            .exists(&self.locator)
            .await
    }

    /// The underlying driver element, for operations this crate does not
    /// cover. Binds first if needed.
    pub async fn web_element(&mut self) -> Result<Element> {
        Ok(self.bind().await?.clone())
    }

    /// Current bounding box. Geometry is re-read on every call; only the
    /// element identity is memoized.
    pub async fn rect(&mut self) -> Result<Rect> {
        let element = self.bind().await?;
        Ok(Rect::from(element.rectangle().await?))
    }

    pub async fn width(&mut self) -> Result<f64> {
        Ok(self.rect().await?.width)
    }

    pub async fn height(&mut self) -> Result<f64> {
        Ok(self.rect().await?.height)
    }

    pub async fn x(&mut self) -> Result<f64> {
        Ok(self.rect().await?.x)
    }

    pub async fn y(&mut self) -> Result<f64> {
        Ok(self.rect().await?.y)
    }

    pub async fn top_left(&mut self) -> Result<Point> {
        Ok(self.rect().await?.top_left())
    }

    /// The element's visible text.
    pub async fn free_text(&mut self) -> Result<String> {
        Ok(self.bind().await?.text().await?)
    }

    /// Current value of a form control, empty for elements without one.
    pub async fn value(&mut self) -> Result<String> {
        let element = self.bind().await?;
        Ok(element.prop("value").await?.unwrap_or_default())
    }

    pub async fn href(&mut self) -> Result<Option<String>> {
        let element = self.bind().await?;
        Ok(element.attr("href").await?)
    }

    pub async fn attr(&mut self, name: &str) -> Result<Option<String>> {
        let element = self.bind().await?;
        Ok(element.attr(name).await?)
    }

    pub async fn is_enabled(&mut self) -> Result<bool> {
        Ok(self.bind().await?.is_enabled().await?)
    }

    /// Enabled and not read-only.
    pub async fn is_editable(&mut self) -> Result<bool> {
        let element = self.bind().await?;
        let enabled = element.is_enabled().await?;
        let readonly = element.attr("readonly").await?;
        Ok(enabled && readonly.is_none())
    }

    pub async fn is_checked(&mut self) -> Result<bool> {
        Ok(self.bind().await?.is_selected().await?)
    }

    pub async fn is_selected(&mut self) -> Result<bool> {
        Ok(self.bind().await?.is_selected().await?)
    }

    /// Visible texts of a drop-down's options, in document order.
    pub async fn options(&mut self) -> Result<Vec<String>> {
        let element = self.bind().await?;
        let options = element.find_all(fantoccini::Locator::Css("option")).await?;
        let mut texts = Vec::with_capacity(options.len());
        for option in &options {
            texts.push(option.text().await?);
        }
        Ok(texts)
    }

    /// The element a pointer gesture should aim at, if already known.
    pub(crate) fn bound_element(&self) -> Option<&Element> {
        match &self.binding {
            Binding::Bound(element) => Some(element),
            Binding::Unbound => None,
        }
    }
}
