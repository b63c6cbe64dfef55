//! Edge anchors.
//!
//! An anchor decides where an edge attaches to a node. It is a stateless
//! strategy: the node's current bounds and a reference point (where the edge
//! comes from) are passed in on every call, so no geometry is ever cached.
//!
//! # Overview
//!
//! - [`AnchorEnd`] - Which edge end an anchor serves
//! - [`Anchor`] - The strategy trait
//! - [`CenterAnchor`] - Attaches at the center of the node
//! - [`RectAnchor`] - Attaches where the ray from the center meets the bounding rectangle
//! - [`EllipseAnchor`] - Attaches where the ray from the center meets the inscribed ellipse

use std::fmt;

use meridian_core::geometry::{Point, Rect};

/// The edge end an anchor is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorEnd {
    Target,
    Source,
    /// Registers the anchor for both ends. Lookups treat it as `Source`.
    Both,
}

/// Strategy computing the connection point of an edge on a node.
pub trait Anchor: fmt::Debug {
    /// Returns the point on the node where an edge heading towards
    /// `reference` attaches.
    fn location(&self, bounds: Rect, reference: Point) -> Point;

    /// Returns the point other edge ends should aim at.
    fn reference_point(&self, bounds: Rect) -> Point {
        bounds.center()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CenterAnchor;

impl Anchor for CenterAnchor {
    fn location(&self, bounds: Rect, _reference: Point) -> Point {
        bounds.center()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RectAnchor;

impl Anchor for RectAnchor {
    fn location(&self, bounds: Rect, reference: Point) -> Point {
        let center = bounds.center();
        let delta = reference.sub_point(center);
        if delta.is_zero() {
            return center;
        }

        let half_width = bounds.width() / 2.0;
        let half_height = bounds.height() / 2.0;
        let tx = if delta.x() == 0.0 {
            f64::INFINITY
        } else {
            half_width / delta.x().abs()
        };
        let ty = if delta.y() == 0.0 {
            f64::INFINITY
        } else {
            half_height / delta.y().abs()
        };
        let t = tx.min(ty);

        Point::new(center.x() + delta.x() * t, center.y() + delta.y() * t)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EllipseAnchor;

impl Anchor for EllipseAnchor {
    fn location(&self, bounds: Rect, reference: Point) -> Point {
        let center = bounds.center();
        let delta = reference.sub_point(center);
        let rx = bounds.width() / 2.0;
        let ry = bounds.height() / 2.0;
        if delta.is_zero() || rx <= 0.0 || ry <= 0.0 {
            return center;
        }

        let t = 1.0 / ((delta.x() / rx).powi(2) + (delta.y() / ry).powi(2)).sqrt();
        Point::new(center.x() + delta.x() * t, center.y() + delta.y() * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 100.0, 50.0)
    }

    #[test]
    fn test_center_anchor() {
        let anchor = CenterAnchor;
        assert_eq!(
            anchor.location(bounds(), Point::new(500.0, 500.0)),
            Point::new(50.0, 25.0)
        );
        assert_eq!(anchor.reference_point(bounds()), Point::new(50.0, 25.0));
    }

    #[test]
    fn test_rect_anchor_hits_nearest_side() {
        let anchor = RectAnchor;
        assert_eq!(
            anchor.location(bounds(), Point::new(150.0, 25.0)),
            Point::new(100.0, 25.0)
        );
        assert_eq!(
            anchor.location(bounds(), Point::new(50.0, -25.0)),
            Point::new(50.0, 0.0)
        );
        // Diagonal towards a far corner hits the shorter side first.
        assert_eq!(
            anchor.location(bounds(), Point::new(150.0, 125.0)),
            Point::new(75.0, 50.0)
        );
    }

    #[test]
    fn test_rect_anchor_reference_at_center() {
        assert_eq!(
            RectAnchor.location(bounds(), Point::new(50.0, 25.0)),
            Point::new(50.0, 25.0)
        );
    }

    #[test]
    fn test_ellipse_anchor() {
        let anchor = EllipseAnchor;
        assert_eq!(
            anchor.location(bounds(), Point::new(150.0, 25.0)),
            Point::new(100.0, 25.0)
        );
        assert_eq!(
            anchor.location(bounds(), Point::new(50.0, 125.0)),
            Point::new(50.0, 50.0)
        );
    }

    #[test]
    fn test_ellipse_anchor_degenerate_bounds() {
        let flat = Rect::new(0.0, 0.0, 10.0, 0.0);
        assert_eq!(
            EllipseAnchor.location(flat, Point::new(100.0, 100.0)),
            Point::new(5.0, 0.0)
        );
    }
}
