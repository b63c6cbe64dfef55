//! Geometric primitives for scene graph coordinates and viewport math.
//!
//! This module provides the value types every element of a Meridian scene is
//! measured in.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate
//! - [`Dimensions`] - Width and height
//! - [`Rect`] - An axis-aligned rectangle defined by its top-left corner and dimensions
//! - [`Padding`] - Spacing values for four sides
//! - [`Translatable`] - Geometry that can be moved and scaled between coordinate spaces
//!
//! # Coordinate System
//!
//! Meridian uses screen coordinates:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Node bounds live in graph space. The graph maps graph space into viewport
//! (absolute) space by scaling and then offsetting by its pan position, which
//! is why every type here implements [`Translatable`].
//!
//! All values are `f64` so that model coordinates survive a load/save cycle
//! unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Geometry that can be moved between coordinate spaces.
///
/// Implementations must be plain values: each method returns the converted
/// value and leaves `self` untouched.
///
/// # Examples
///
/// ```
/// # use meridian_core::geometry::{Point, Rect, Translatable};
/// let p = Point::new(10.0, 20.0).scale(2.0).translate(5.0, 5.0);
/// assert_eq!(p, Point::new(25.0, 45.0));
///
/// let r = Rect::new(0.0, 0.0, 10.0, 10.0).scale(3.0);
/// assert_eq!(r.width(), 30.0);
/// ```
pub trait Translatable: Copy {
    /// Moves the value by the given offsets.
    fn translate(self, dx: f64, dy: f64) -> Self;

    /// Multiplies the value by a uniform factor around the origin.
    fn scale(self, factor: f64) -> Self;
}

/// A 2D point.
///
/// # Examples
///
/// ```
/// # use meridian_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f64 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f64 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f64) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f64) -> Self {
        self.y = y;
        self
    }

    /// Checks if both x and y coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Translatable for Point {
    fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dimensions {
    width: f64,
    height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension
    pub fn width(self) -> f64 {
        self.width
    }

    /// Returns the height dimension
    pub fn height(self) -> f64 {
        self.height
    }

    /// Returns true when either side has no extent
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Returns new dimensions with the maximum width and height of both
    pub fn max(self, other: Dimensions) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Returns dimensions grown by the given padding on every side
    pub fn add_padding(self, padding: Padding) -> Self {
        Self {
            width: self.width + padding.horizontal_sum(),
            height: self.height + padding.vertical_sum(),
        }
    }
}

impl Translatable for Dimensions {
    /// Dimensions have no location, so translation is the identity.
    fn translate(self, _dx: f64, _dy: f64) -> Self {
        self
    }

    fn scale(self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// An axis-aligned rectangle described by its top-left corner and size.
///
/// # Examples
///
/// ```
/// # use meridian_core::geometry::Rect;
/// let header = Rect::new(0.0, 0.0, 100.0, 30.0);
/// let content = Rect::new(10.0, 40.0, 120.0, 80.0);
///
/// let combined = header.union(&content);
/// assert_eq!(combined.x(), 0.0);
/// assert_eq!(combined.width(), 130.0);
/// assert_eq!(combined.height(), 120.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from a top-left point and dimensions
    pub fn from_parts(position: Point, dimensions: Dimensions) -> Self {
        Self::new(
            position.x,
            position.y,
            dimensions.width,
            dimensions.height,
        )
    }

    /// Creates the normalized rectangle spanned by two arbitrary corners.
    ///
    /// Useful for drag selections where the end point may be above or to the
    /// left of the start point.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (b.x - a.x).abs(),
            (b.y - a.y).abs(),
        )
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn width(self) -> f64 {
        self.width
    }

    pub fn height(self) -> f64 {
        self.height
    }

    /// Returns the x-coordinate of the right edge
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    /// Returns the y-coordinate of the bottom edge
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// Returns the top-left corner
    pub fn position(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Returns the size of the rectangle
    pub fn dimensions(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Returns the center point of the rectangle
    pub fn center(self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns a copy moved so that its top-left corner is at `position`
    pub fn with_position(mut self, position: Point) -> Self {
        self.x = position.x;
        self.y = position.y;
        self
    }

    /// Returns a copy resized to `dimensions`, keeping the top-left corner
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.width = dimensions.width;
        self.height = dimensions.height;
        self
    }

    /// Returns true when the rectangle has no area
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Returns the smallest rectangle containing both rectangles.
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Returns true when the two rectangles overlap with a positive area.
    ///
    /// Rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Returns true when the point lies inside or on the border of the rectangle
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Returns true when `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.right() <= self.right()
            && other.y >= self.y
            && other.bottom() <= self.bottom()
    }

    /// Expands the rectangle outward by the given padding.
    pub fn add_padding(&self, padding: Padding) -> Self {
        Self {
            x: self.x - padding.left,
            y: self.y - padding.top,
            width: self.width + padding.horizontal_sum(),
            height: self.height + padding.vertical_sum(),
        }
    }
}

impl Translatable for Rect {
    fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Spacing around an element with potentially different values for each side.
///
/// Deserializes from CSS shorthand: a single number, or an array of one to
/// four numbers (`[all]`, `[vertical, horizontal]`,
/// `[top, horizontal, bottom]`, `[top, right, bottom, left]`).
///
/// # Examples
///
/// ```
/// # use meridian_core::geometry::Padding;
/// let padding: Padding = serde_json::from_str("[10, 20]").unwrap();
/// assert_eq!(padding.top(), 10.0);
/// assert_eq!(padding.left(), 20.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PaddingRepr", into = "PaddingRepr")]
pub struct Padding {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

impl Padding {
    /// Creates padding with specified values for each side
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates uniform padding with the same value for all sides
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn top(self) -> f64 {
        self.top
    }

    pub fn right(self) -> f64 {
        self.right
    }

    pub fn bottom(self) -> f64 {
        self.bottom
    }

    pub fn left(self) -> f64 {
        self.left
    }

    /// Returns the sum of left and right padding
    pub fn horizontal_sum(self) -> f64 {
        self.left + self.right
    }

    /// Returns the sum of top and bottom padding
    pub fn vertical_sum(self) -> f64 {
        self.top + self.bottom
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PaddingRepr {
    Uniform(f64),
    Sides(Vec<f64>),
}

impl TryFrom<PaddingRepr> for Padding {
    type Error = String;

    fn try_from(repr: PaddingRepr) -> Result<Self, Self::Error> {
        match repr {
            PaddingRepr::Uniform(value) => Ok(Self::uniform(value)),
            PaddingRepr::Sides(sides) => match sides.as_slice() {
                [all] => Ok(Self::uniform(*all)),
                [vertical, horizontal] => {
                    Ok(Self::new(*vertical, *horizontal, *vertical, *horizontal))
                }
                [top, horizontal, bottom] => Ok(Self::new(*top, *horizontal, *bottom, *horizontal)),
                [top, right, bottom, left] => Ok(Self::new(*top, *right, *bottom, *left)),
                other => Err(format!(
                    "padding expects 1 to 4 values, got {}",
                    other.len()
                )),
            },
        }
    }
}

impl From<Padding> for PaddingRepr {
    fn from(padding: Padding) -> Self {
        PaddingRepr::Sides(vec![
            padding.top,
            padding.right,
            padding.bottom,
            padding.left,
        ])
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn rect_strategy() -> impl Strategy<Value = Rect> {
        (
            -1000.0f64..1000.0,
            -1000.0f64..1000.0,
            1.0f64..500.0,
            1.0f64..500.0,
        )
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f64..1000.0, -1000.0f64..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    fn scale_strategy() -> impl Strategy<Value = f64> {
        0.1f64..10.0
    }

    /// Scaling then unscaling should return approximately the original point.
    fn check_scale_inverse_roundtrip(p: Point, scale: f64) -> Result<(), TestCaseError> {
        let unscaled = p.scale(scale).scale(1.0 / scale);

        prop_assert!(approx_eq!(f64, unscaled.x(), p.x(), epsilon = 1e-9));
        prop_assert!(approx_eq!(f64, unscaled.y(), p.y(), epsilon = 1e-9));
        Ok(())
    }

    /// Union should be commutative.
    fn check_union_is_commutative(a: Rect, b: Rect) -> Result<(), TestCaseError> {
        let u1 = a.union(&b);
        let u2 = b.union(&a);

        prop_assert!(approx_eq!(f64, u1.x(), u2.x()));
        prop_assert!(approx_eq!(f64, u1.y(), u2.y()));
        prop_assert!(approx_eq!(f64, u1.right(), u2.right()));
        prop_assert!(approx_eq!(f64, u1.bottom(), u2.bottom()));
        Ok(())
    }

    /// The union contains both inputs.
    fn check_union_contains_both(a: Rect, b: Rect) -> Result<(), TestCaseError> {
        let union = a.union(&b);

        for rect in [a, b] {
            prop_assert!(union.x() <= rect.x() + 1e-9);
            prop_assert!(union.y() <= rect.y() + 1e-9);
            prop_assert!(union.right() >= rect.right() - 1e-9);
            prop_assert!(union.bottom() >= rect.bottom() - 1e-9);
        }
        Ok(())
    }

    /// Intersection is symmetric.
    fn check_intersects_is_symmetric(a: Rect, b: Rect) -> Result<(), TestCaseError> {
        prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        Ok(())
    }

    /// Translating then translating back returns the original rectangle.
    fn check_translate_roundtrip(rect: Rect, offset: Point) -> Result<(), TestCaseError> {
        let roundtrip = rect
            .translate(offset.x(), offset.y())
            .translate(-offset.x(), -offset.y());

        prop_assert!(approx_eq!(f64, roundtrip.x(), rect.x(), epsilon = 1e-9));
        prop_assert!(approx_eq!(f64, roundtrip.y(), rect.y(), epsilon = 1e-9));
        prop_assert!(approx_eq!(f64, roundtrip.width(), rect.width()));
        prop_assert!(approx_eq!(f64, roundtrip.height(), rect.height()));
        Ok(())
    }

    proptest! {
        #[test]
        fn scale_inverse_roundtrip(p in point_strategy(), scale in scale_strategy()) {
            check_scale_inverse_roundtrip(p, scale)?;
        }

        #[test]
        fn union_is_commutative(a in rect_strategy(), b in rect_strategy()) {
            check_union_is_commutative(a, b)?;
        }

        #[test]
        fn union_contains_both(a in rect_strategy(), b in rect_strategy()) {
            check_union_contains_both(a, b)?;
        }

        #[test]
        fn intersects_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
            check_intersects_is_symmetric(a, b)?;
        }

        #[test]
        fn translate_roundtrip(rect in rect_strategy(), offset in point_strategy()) {
            check_translate_roundtrip(rect, offset)?;
        }
    }
}
