//! Input operations on a session: pointer gestures, typing, drop-down
//! selection, scrolling, and file attachment.
//!
//! Most operations take an `impl Into<Target>` so that callers can pass a
//! locator, a screen point, a handle, or a plain string. What a string
//! means depends on the operation: for pointer gestures it names visible
//! text, for `write_into` a text field label, for `select` a combo box
//! label, and for `attach_file_into` a file input label.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use fantoccini::actions::{
    InputSource, MouseActions, PointerAction, MOUSE_BUTTON_LEFT, MOUSE_BUTTON_RIGHT,
};
use fantoccini::elements::Element;
use planchette_common::{PlanchetteError, Result};
use serde_json::json;
use tracing::debug;

use crate::geometry::Point;
use crate::handle::Handle;
use crate::keys::Keys;
use crate::locator::Locator;
use crate::query;
use crate::session::Session;

/// Id of the staging input injected by `drag_file`.
const DRAG_FILE_INPUT_ID: &str = "planchette-drag-file-input";

/// Anything a pointer gesture can aim at. Plain strings are shorthand for
/// [`Locator::text`].
pub enum Target {
    Locator(Locator),
    Point(Point),
    Element(Element),
}

impl From<Locator> for Target {
    fn from(locator: Locator) -> Self {
        Target::Locator(locator)
    }
}

impl From<&Locator> for Target {
    fn from(locator: &Locator) -> Self {
        Target::Locator(locator.clone())
    }
}

impl From<&str> for Target {
    fn from(text: &str) -> Self {
        Target::Locator(Locator::text(text))
    }
}

impl From<String> for Target {
    fn from(text: String) -> Self {
        Target::Locator(Locator::text(text))
    }
}

impl From<Point> for Target {
    fn from(point: Point) -> Self {
        Target::Point(point)
    }
}

impl From<Element> for Target {
    fn from(element: Element) -> Self {
        Target::Element(element)
    }
}

impl From<&Handle> for Target {
    fn from(handle: &Handle) -> Self {
        match handle.bound_element() {
            Some(element) => Target::Element(element.clone()),
            None => Target::Locator(handle.locator().clone()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Locator(locator) => locator.fmt(f),
            Target::Point(point) => write!(f, "point {point}"),
            Target::Element(_) => write!(f, "bound element"),
        }
    }
}

/// Targets that must resolve to an element. Plain strings are shorthand
/// for [`Locator::text_field`], the usual destination for typed text.
pub enum ElementTarget {
    Locator(Locator),
    Element(Element),
}

impl From<Locator> for ElementTarget {
    fn from(locator: Locator) -> Self {
        ElementTarget::Locator(locator)
    }
}

impl From<&Locator> for ElementTarget {
    fn from(locator: &Locator) -> Self {
        ElementTarget::Locator(locator.clone())
    }
}

impl From<&str> for ElementTarget {
    fn from(label: &str) -> Self {
        ElementTarget::Locator(Locator::text_field(label))
    }
}

impl From<String> for ElementTarget {
    fn from(label: String) -> Self {
        ElementTarget::Locator(Locator::text_field(label))
    }
}

impl From<Element> for ElementTarget {
    fn from(element: Element) -> Self {
        ElementTarget::Element(element)
    }
}

impl From<&Handle> for ElementTarget {
    fn from(handle: &Handle) -> Self {
        match handle.bound_element() {
            Some(element) => ElementTarget::Element(element.clone()),
            None => ElementTarget::Locator(handle.locator().clone()),
        }
    }
}

impl fmt::Display for ElementTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementTarget::Locator(locator) => locator.fmt(f),
            ElementTarget::Element(_) => write!(f, "bound element"),
        }
    }
}

/// Target of a [`select`](Session::select) call. Plain strings name a
/// combo box label.
pub struct ComboTarget(pub(crate) ElementTarget);

impl From<&str> for ComboTarget {
    fn from(label: &str) -> Self {
        ComboTarget(ElementTarget::Locator(Locator::combo_box(label)))
    }
}

impl From<String> for ComboTarget {
    fn from(label: String) -> Self {
        ComboTarget(ElementTarget::Locator(Locator::combo_box(label)))
    }
}

impl From<Locator> for ComboTarget {
    fn from(locator: Locator) -> Self {
        ComboTarget(ElementTarget::Locator(locator))
    }
}

impl From<&Locator> for ComboTarget {
    fn from(locator: &Locator) -> Self {
        ComboTarget(ElementTarget::Locator(locator.clone()))
    }
}

impl From<&Handle> for ComboTarget {
    fn from(handle: &Handle) -> Self {
        ComboTarget(ElementTarget::from(handle))
    }
}

/// Target of a file attachment. Plain strings name a file input label.
pub struct FileTarget(pub(crate) ElementTarget);

impl From<&str> for FileTarget {
    fn from(label: &str) -> Self {
        FileTarget(ElementTarget::Locator(Locator::file_input(label)))
    }
}

impl From<String> for FileTarget {
    fn from(label: String) -> Self {
        FileTarget(ElementTarget::Locator(Locator::file_input(label)))
    }
}

impl From<Locator> for FileTarget {
    fn from(locator: Locator) -> Self {
        FileTarget(ElementTarget::Locator(locator))
    }
}

impl From<&Locator> for FileTarget {
    fn from(locator: &Locator) -> Self {
        FileTarget(ElementTarget::Locator(locator.clone()))
    }
}

impl From<&Handle> for FileTarget {
    fn from(handle: &Handle) -> Self {
        FileTarget(ElementTarget::from(handle))
    }
}

fn move_to(x: i64, y: i64) -> PointerAction {
    PointerAction::MoveTo {
        duration: None,
        x: x as f64,
        y: y as f64,
    }
}

fn button_down(button: u64) -> PointerAction {
    PointerAction::Down { button }
}

fn button_up(button: u64) -> PointerAction {
    PointerAction::Up { button }
}

fn settle(ms: u64) -> PointerAction {
    PointerAction::Pause {
        duration: Duration::from_millis(ms),
    }
}

/// File inputs need an absolute path; resolve relative ones against the
/// working directory when the file exists locally.
fn absolute_path(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    resolved.to_string_lossy().into_owned()
}

impl Session {
    async fn element_for(&self, target: ElementTarget) -> Result<Element> {
        match target {
            ElementTarget::Locator(locator) => self.resolver().resolve(&locator).await,
            ElementTarget::Element(element) => Ok(element),
        }
    }

    async fn gesture_element(&self, target: Target, gesture: &str) -> Result<Element> {
        match target {
            Target::Point(point) => Err(PlanchetteError::Config(format!(
                "{gesture} needs an element, not point {point}"
            ))),
            Target::Locator(locator) => self.resolver().resolve(&locator).await,
            Target::Element(element) => Ok(element),
        }
    }

    /// Pointer actions address the viewport, not the page, so scroll the
    /// element into view first and measure its center from there.
    async fn viewport_center(&self, element: &Element) -> Result<(i64, i64)> {
        let value = self
            .driver()
            .execute(
                "arguments[0].scrollIntoView({block: 'center', inline: 'nearest'}); \
                 const r = arguments[0].getBoundingClientRect(); \
                 return [r.left + r.width / 2, r.top + r.height / 2];",
                vec![serde_json::to_value(element)?],
            )
            .await?;
        let coords = value.as_array().map(|pair| {
            (
                pair.first().and_then(|v| v.as_f64()),
                pair.get(1).and_then(|v| v.as_f64()),
            )
        });
        match coords {
            Some((Some(x), Some(y))) => Ok((x.round() as i64, y.round() as i64)),
            _ => Err(PlanchetteError::Script(format!(
                "expected an [x, y] pair, got {value}"
            ))),
        }
    }

    async fn pointer_position(&self, target: Target) -> Result<(i64, i64)> {
        match target {
            Target::Point(point) => Ok((i64::from(point.x), i64::from(point.y))),
            Target::Locator(locator) => {
                let element = self.resolver().resolve(&locator).await?;
                self.viewport_center(&element).await
            }
            Target::Element(element) => self.viewport_center(&element).await,
        }
    }

    async fn perform_mouse(&self, actions: Vec<PointerAction>) -> Result<()> {
        let mut mouse = MouseActions::new("mouse".to_string());
        for action in actions {
            mouse = mouse.then(action);
        }
        self.driver().client().perform_actions(mouse).await?;
        Ok(())
    }

    async fn click_at(&self, x: i64, y: i64, button: u64) -> Result<()> {
        self.perform_mouse(vec![move_to(x, y), button_down(button), button_up(button)])
            .await
    }

    /// Click `target`: a locator, a handle, visible text, or a point.
    pub async fn click(&self, target: impl Into<Target>) -> Result<()> {
        let target = target.into();
        debug!(target: "browser.session", on = %target, "click");
        match target {
            Target::Point(point) => {
                self.click_at(i64::from(point.x), i64::from(point.y), MOUSE_BUTTON_LEFT)
                    .await
            }
            Target::Locator(locator) => {
                let element = self.resolver().resolve(&locator).await?;
                element.click().await?;
                Ok(())
            }
            Target::Element(element) => {
                element.click().await?;
                Ok(())
            }
        }
    }

    pub async fn double_click(&self, target: impl Into<Target>) -> Result<()> {
        let target = target.into();
        debug!(target: "browser.session", on = %target, "double click");
        let (x, y) = self.pointer_position(target).await?;
        self.perform_mouse(vec![
            move_to(x, y),
            button_down(MOUSE_BUTTON_LEFT),
            button_up(MOUSE_BUTTON_LEFT),
            settle(50),
            button_down(MOUSE_BUTTON_LEFT),
            button_up(MOUSE_BUTTON_LEFT),
        ])
        .await
    }

    pub async fn right_click(&self, target: impl Into<Target>) -> Result<()> {
        let target = target.into();
        debug!(target: "browser.session", on = %target, "right click");
        let (x, y) = self.pointer_position(target).await?;
        self.click_at(x, y, MOUSE_BUTTON_RIGHT).await
    }

    /// Move the pointer over `target` without clicking.
    pub async fn hover(&self, target: impl Into<Target>) -> Result<()> {
        let target = target.into();
        debug!(target: "browser.session", on = %target, "hover");
        let (x, y) = self.pointer_position(target).await?;
        self.perform_mouse(vec![move_to(x, y)]).await
    }

    /// Press on `source`, move to `destination`, release. Runs as one input
    /// sequence so the browser sees a continuous gesture.
    pub async fn drag(
        &self,
        source: impl Into<Target>,
        destination: impl Into<Target>,
    ) -> Result<()> {
        let source = source.into();
        let destination = destination.into();
        debug!(target: "browser.session", from = %source, to = %destination, "drag");
        let (sx, sy) = self.pointer_position(source).await?;
        let (dx, dy) = self.pointer_position(destination).await?;
        self.perform_mouse(vec![
            move_to(sx, sy),
            button_down(MOUSE_BUTTON_LEFT),
            settle(100),
            move_to(dx, dy),
            settle(100),
            button_up(MOUSE_BUTTON_LEFT),
        ])
        .await
    }

    /// Press and hold the left button over `target`. The pressed state
    /// persists across calls; pair with
    /// [`release_mouse_over`](Self::release_mouse_over).
    pub async fn press_mouse_on(&self, target: impl Into<Target>) -> Result<()> {
        let target = target.into();
        debug!(target: "browser.session", on = %target, "press mouse");
        let (x, y) = self.pointer_position(target).await?;
        self.perform_mouse(vec![move_to(x, y), button_down(MOUSE_BUTTON_LEFT)])
            .await
    }

    /// Move to `target` and release the left button.
    pub async fn release_mouse_over(&self, target: impl Into<Target>) -> Result<()> {
        let target = target.into();
        debug!(target: "browser.session", on = %target, "release mouse");
        let (x, y) = self.pointer_position(target).await?;
        self.perform_mouse(vec![move_to(x, y), button_up(MOUSE_BUTTON_LEFT)])
            .await
    }

    /// Type into whichever element currently has keyboard focus.
    pub async fn write(&self, text: &str) -> Result<()> {
        // Text content stays out of the logs; it may be a password.
        debug!(target: "browser.session", chars = text.chars().count(), "write");
        let element = self.driver().client().active_element().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    /// Replace the content of `target` with `text`.
    pub async fn write_into(&self, text: &str, target: impl Into<ElementTarget>) -> Result<()> {
        let target = target.into();
        debug!(target: "browser.session", into = %target, chars = text.chars().count(), "write");
        let element = self.element_for(target).await?;
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    /// Send keyboard input to the focused element, including special keys
    /// and chords built from [`Keys`].
    pub async fn press(&self, keys: impl Into<Keys>) -> Result<()> {
        let keys = keys.into();
        let element = self.driver().client().active_element().await?;
        element.send_keys(keys.as_str()).await?;
        Ok(())
    }

    /// Choose `option` from a drop-down by its visible text.
    pub async fn select(&self, combo_box: impl Into<ComboTarget>, option: &str) -> Result<()> {
        let ComboTarget(target) = combo_box.into();
        debug!(target: "browser.session", combo = %target, option, "select");
        let element = self.element_for(target).await?;
        let xpath = format!(
            ".//option[normalize-space(.) = {}]",
            query::xpath_literal(option)
        );
        let option_element = match element.find(fantoccini::Locator::XPath(&xpath)).await {
            Ok(found) => found,
            Err(error) if error.is_no_such_element() => {
                return Err(PlanchetteError::NotFound(format!("option '{option}'")));
            }
            Err(error) => return Err(error.into()),
        };
        option_element.click().await?;
        Ok(())
    }

    pub async fn scroll_down(&self, pixels: u32) -> Result<()> {
        self.scroll_by(0, i64::from(pixels)).await
    }

    pub async fn scroll_up(&self, pixels: u32) -> Result<()> {
        self.scroll_by(0, -i64::from(pixels)).await
    }

    pub async fn scroll_right(&self, pixels: u32) -> Result<()> {
        self.scroll_by(i64::from(pixels), 0).await
    }

    pub async fn scroll_left(&self, pixels: u32) -> Result<()> {
        self.scroll_by(-i64::from(pixels), 0).await
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<()> {
        self.driver()
            .execute(
                "window.scrollBy(arguments[0], arguments[1]);",
                vec![json!(dx), json!(dy)],
            )
            .await?;
        Ok(())
    }

    /// Outline `target` in red and bold its text. Handy when walking an
    /// audience through a script.
    pub async fn highlight(&self, target: impl Into<Target>) -> Result<()> {
        let element = self.gesture_element(target.into(), "highlight").await?;
        self.driver()
            .execute(
                "arguments[0].style.border = '2px solid red'; \
                 arguments[0].style.fontWeight = 'bold';",
                vec![serde_json::to_value(&element)?],
            )
            .await?;
        Ok(())
    }

    /// Point the first file input on the page at `path`.
    pub async fn attach_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.attach_file_into(path, Locator::selector("input[type=file]"))
            .await
    }

    /// Point a specific file input at `path`. String targets name the file
    /// input's label.
    pub async fn attach_file_into(
        &self,
        path: impl AsRef<Path>,
        target: impl Into<FileTarget>,
    ) -> Result<()> {
        let FileTarget(target) = target.into();
        let path = absolute_path(path.as_ref());
        debug!(target: "browser.session", into = %target, path = %path, "attach file");
        let element = self.element_for(target).await?;
        element.send_keys(&path).await?;
        Ok(())
    }

    /// Simulate dropping a file from the desktop onto `target`.
    ///
    /// Browsers cannot script a real OS drag, so the file is staged in an
    /// injected input and the drag events replayed with its `DataTransfer`.
    pub async fn drag_file(&self, path: impl AsRef<Path>, target: impl Into<Target>) -> Result<()> {
        let drop_element = self.gesture_element(target.into(), "drag_file").await?;
        let path = absolute_path(path.as_ref());
        debug!(target: "browser.session", path = %path, "drag file");
        // The staging input must stay interactable, so it is parked in the
        // corner at 1x1 pixel rather than display: none.
        self.driver()
            .execute(
                "let input = document.getElementById(arguments[0]); \
                 if (!input) { \
                     input = document.createElement('input'); \
                     input.type = 'file'; \
                     input.id = arguments[0]; \
                     input.style.cssText = \
                         'position: fixed; top: 0; left: 0; \
                          width: 1px; height: 1px; opacity: 0.01;'; \
                     document.body.appendChild(input); \
                 }",
                vec![json!(DRAG_FILE_INPUT_ID)],
            )
            .await?;
        let input = self
            .resolver()
            .resolve(&Locator::selector(format!("#{DRAG_FILE_INPUT_ID}")))
            .await?;
        input.send_keys(&path).await?;
        self.driver()
            .execute(
                "const input = document.getElementById(arguments[0]); \
                 const dropTarget = arguments[1]; \
                 const dataTransfer = new DataTransfer(); \
                 for (const file of input.files) { dataTransfer.items.add(file); } \
                 for (const type of ['dragenter', 'dragover', 'drop']) { \
                     dropTarget.dispatchEvent(new DragEvent(type, \
                         {bubbles: true, cancelable: true, dataTransfer})); \
                 } \
                 input.remove();",
                vec![json!(DRAG_FILE_INPUT_ID), serde_json::to_value(&drop_element)?],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Kind;

    #[test]
    fn strings_aim_pointer_gestures_at_visible_text() {
        match Target::from("OK") {
            Target::Locator(locator) => assert_eq!(locator.kind(), Kind::Text),
            _ => panic!("expected a locator target"),
        }
    }

    #[test]
    fn strings_write_into_text_fields() {
        match ElementTarget::from("Email") {
            ElementTarget::Locator(locator) => assert_eq!(locator.kind(), Kind::TextField),
            _ => panic!("expected a locator target"),
        }
    }

    #[test]
    fn strings_select_from_combo_boxes() {
        let ComboTarget(target) = ComboTarget::from("Language");
        match target {
            ElementTarget::Locator(locator) => assert_eq!(locator.kind(), Kind::ComboBox),
            _ => panic!("expected a locator target"),
        }
    }

    #[test]
    fn strings_attach_to_labelled_file_inputs() {
        let FileTarget(target) = FileTarget::from("Please select a file:");
        match target {
            ElementTarget::Locator(locator) => {
                assert_eq!(locator.kind(), Kind::FileInput);
                assert_eq!(locator.needle(), Some("Please select a file:"));
            }
            _ => panic!("expected a locator target"),
        }
    }

    #[test]
    fn pointer_moves_land_on_whole_viewport_pixels() {
        match move_to(40, -8) {
            PointerAction::MoveTo { duration, x, y } => {
                assert_eq!(duration, None);
                assert_eq!(x, 40.0);
                assert_eq!(y, -8.0);
            }
            other => panic!("expected a move, got {other:?}"),
        }
    }

    #[test]
    fn points_render_for_logs() {
        assert_eq!(Target::from(Point::new(3, 4)).to_string(), "point (3, 4)");
    }

    #[test]
    fn missing_paths_pass_through_unresolved() {
        assert_eq!(
            absolute_path(Path::new("/no/such/file.png")),
            "/no/such/file.png"
        );
    }

    #[test]
    fn existing_paths_resolve_to_absolute_form() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("upload.txt");
        std::fs::write(&file, b"payload").expect("write file");
        let resolved = absolute_path(&file);
        assert!(Path::new(&resolved).is_absolute());
        assert!(Path::new(&resolved).exists());
    }
}
