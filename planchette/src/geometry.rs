//! Screen geometry: points, element bounding boxes, and the directional
//! predicates that power locator constraints such as `below` and
//! `to_right_of`.

use std::fmt;
use std::ops::{Add, Sub};

/// Slack applied to the directional filters, in CSS pixels.
///
/// Real layouts rarely align element edges exactly. A candidate that misses
/// the geometric condition by less than this band still qualifies.
pub const PROXIMITY_TOLERANCE: f64 = 5.0;

/// An integer screen coordinate.
///
/// Supports vector arithmetic with plain coordinate pairs and compares equal
/// to a pair with the same components:
///
/// ```
/// use planchette::Point;
///
/// let p = Point::new(10, 25);
/// assert_eq!(p + (10, 0), Point::new(20, 25));
/// assert_eq!(p - (0, 10), (10, 15));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add<(i32, i32)> for Point {
    type Output = Point;

    fn add(self, (dx, dy): (i32, i32)) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl Sub<(i32, i32)> for Point {
    type Output = Point;

    fn sub(self, (dx, dy): (i32, i32)) -> Point {
        Point::new(self.x - dx, self.y - dy)
    }
}

impl PartialEq<(i32, i32)> for Point {
    fn eq(&self, other: &(i32, i32)) -> bool {
        self.x == other.0 && self.y == other.1
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An element's bounding box in page coordinates, as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Top-left corner, rounded to whole pixels.
    pub fn top_left(&self) -> Point {
        Point::new(self.x.round() as i32, self.y.round() as i32)
    }

    fn overlaps_horizontally(&self, other: &Rect, tolerance: f64) -> bool {
        self.left() <= other.right() + tolerance && other.left() <= self.right() + tolerance
    }

    fn overlaps_vertically(&self, other: &Rect, tolerance: f64) -> bool {
        self.top() <= other.bottom() + tolerance && other.top() <= self.bottom() + tolerance
    }
}

impl From<(f64, f64, f64, f64)> for Rect {
    fn from((x, y, width, height): (f64, f64, f64, f64)) -> Self {
        Rect::new(x, y, width, height)
    }
}

/// The four spatial relations a locator constraint can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Below,
    Above,
    RightOf,
    LeftOf,
}

impl Direction {
    /// Phrase used when rendering a locator for error messages and logs.
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            Direction::Below => "below",
            Direction::Above => "above",
            Direction::RightOf => "to the right of",
            Direction::LeftOf => "to the left of",
        }
    }

    /// Whether `candidate` lies in this direction from `anchor`.
    ///
    /// A candidate must clear the anchor's edge on the constraint axis and
    /// share a band with the anchor on the other axis, both within
    /// `tolerance` pixels.
    pub(crate) fn admits(&self, candidate: &Rect, anchor: &Rect, tolerance: f64) -> bool {
        match self {
            Direction::Below => {
                candidate.top() >= anchor.bottom() - tolerance
                    && candidate.overlaps_horizontally(anchor, tolerance)
            }
            Direction::Above => {
                candidate.bottom() <= anchor.top() + tolerance
                    && candidate.overlaps_horizontally(anchor, tolerance)
            }
            Direction::RightOf => {
                candidate.left() >= anchor.right() - tolerance
                    && candidate.overlaps_vertically(anchor, tolerance)
            }
            Direction::LeftOf => {
                candidate.right() <= anchor.left() + tolerance
                    && candidate.overlaps_vertically(anchor, tolerance)
            }
        }
    }

    /// Gap between `candidate` and `anchor` along the constraint axis.
    ///
    /// Clamped at zero so a candidate inside the tolerance band never ranks
    /// with a negative distance.
    pub(crate) fn distance(&self, candidate: &Rect, anchor: &Rect) -> f64 {
        let gap = match self {
            Direction::Below => candidate.top() - anchor.bottom(),
            Direction::Above => anchor.top() - candidate.bottom(),
            Direction::RightOf => candidate.left() - anchor.right(),
            Direction::LeftOf => anchor.left() - candidate.right(),
        };
        gap.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn point_addition_with_a_pair() {
        assert_eq!(Point::new(10, 25) + (10, 0), Point::new(20, 25));
    }

    #[test]
    fn point_subtraction_with_a_pair() {
        assert_eq!(Point::new(10, 25) - (0, 10), Point::new(10, 15));
    }

    #[test]
    fn point_compares_equal_to_a_pair() {
        assert_eq!(Point::new(4, 7), (4, 7));
        assert_ne!(Point::new(4, 7), (7, 4));
    }

    #[test]
    fn equal_points_share_a_hash_bucket() {
        let mut set = HashSet::new();
        set.insert(Point::new(3, 9));
        set.insert(Point::new(3, 9));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&Point::new(3, 9)));
    }

    #[test]
    fn point_renders_as_a_pair() {
        assert_eq!(Point::new(-5, 12).to_string(), "(-5, 12)");
    }

    #[test]
    fn rect_edges_and_center() {
        let r = Rect::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(r.left(), 10.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.top(), 20.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.center(), (60.0, 40.0));
        assert_eq!(r.top_left(), Point::new(10, 20));
    }

    #[test]
    fn below_requires_clearing_the_anchor_bottom() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        let under = Rect::new(100.0, 130.0, 50.0, 20.0);
        let over = Rect::new(100.0, 50.0, 50.0, 20.0);
        assert!(Direction::Below.admits(&under, &anchor, PROXIMITY_TOLERANCE));
        assert!(!Direction::Below.admits(&over, &anchor, PROXIMITY_TOLERANCE));
    }

    #[test]
    fn below_requires_horizontal_overlap() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        let offside = Rect::new(300.0, 130.0, 50.0, 20.0);
        assert!(!Direction::Below.admits(&offside, &anchor, PROXIMITY_TOLERANCE));
    }

    #[test]
    fn tolerance_band_admits_slightly_overlapping_candidates() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        // Anchor bottom is 120; tops of 118 and 114 sit 2px and 6px into it.
        let close = Rect::new(100.0, 118.0, 50.0, 20.0);
        let too_deep = Rect::new(100.0, 114.0, 50.0, 20.0);
        assert!(Direction::Below.admits(&close, &anchor, 5.0));
        assert!(!Direction::Below.admits(&too_deep, &anchor, 5.0));
    }

    #[test]
    fn right_of_mirrors_below_on_the_other_axis() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        let right = Rect::new(170.0, 100.0, 50.0, 20.0);
        let left = Rect::new(10.0, 100.0, 50.0, 20.0);
        let detached = Rect::new(170.0, 400.0, 50.0, 20.0);
        assert!(Direction::RightOf.admits(&right, &anchor, PROXIMITY_TOLERANCE));
        assert!(!Direction::RightOf.admits(&left, &anchor, PROXIMITY_TOLERANCE));
        assert!(!Direction::RightOf.admits(&detached, &anchor, PROXIMITY_TOLERANCE));
    }

    #[test]
    fn above_and_left_of_mirror_their_opposites() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        let over = Rect::new(100.0, 50.0, 50.0, 20.0);
        let left = Rect::new(10.0, 100.0, 50.0, 20.0);
        assert!(Direction::Above.admits(&over, &anchor, PROXIMITY_TOLERANCE));
        assert!(Direction::LeftOf.admits(&left, &anchor, PROXIMITY_TOLERANCE));
    }

    #[test]
    fn distance_measures_the_gap_on_the_constraint_axis() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        let near = Rect::new(100.0, 130.0, 50.0, 20.0);
        let far = Rect::new(100.0, 200.0, 50.0, 20.0);
        assert_eq!(Direction::Below.distance(&near, &anchor), 10.0);
        assert_eq!(Direction::Below.distance(&far, &anchor), 80.0);
    }

    #[test]
    fn distance_clamps_to_zero_inside_the_tolerance_band() {
        let anchor = Rect::new(100.0, 100.0, 50.0, 20.0);
        let touching = Rect::new(100.0, 118.0, 50.0, 20.0);
        assert_eq!(Direction::Below.distance(&touching, &anchor), 0.0);
    }
}
