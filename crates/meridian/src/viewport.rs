//! Viewport algebra.
//!
//! Pure functions computing the graph's pan offset and scale for zoom, fit
//! and pan operations. The graph maps content space to viewport space with
//! `viewport = content * scale + position`; every function here returns the
//! new [`ViewportTransform`] (or offset) and leaves applying it, and
//! announcing the change, to the controller.

use meridian_core::{
    geometry::{Dimensions, Point, Rect, Translatable},
    model::ScaleExtent,
};

/// Selections narrower or shorter than this, in content units, are ignored
/// by zoom-to-selection.
pub const MIN_SELECTION_SIZE: f64 = 10.0;

/// Scale and pan offset of a graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub scale: f64,
    pub position: Point,
}

impl ViewportTransform {
    pub fn new(scale: f64, position: Point) -> Self {
        Self { scale, position }
    }

    /// Maps a content-space value to viewport space.
    pub fn apply<T: Translatable>(self, value: T) -> T {
        value
            .scale(self.scale)
            .translate(self.position.x(), self.position.y())
    }

    /// Maps a viewport-space value to content space.
    pub fn invert<T: Translatable>(self, value: T) -> T {
        value
            .translate(-self.position.x(), -self.position.y())
            .scale(1.0 / self.scale)
    }
}

fn clamp([min, max]: ScaleExtent, scale: f64) -> f64 {
    scale.clamp(min, max)
}

/// Zooms by `factor` keeping the content under `focal` (viewport space)
/// in place. The resulting scale is clamped to `extent`.
pub fn scale_about(
    current: ViewportTransform,
    factor: f64,
    focal: Point,
    extent: ScaleExtent,
) -> ViewportTransform {
    let content = current.invert(focal);
    let scale = clamp(extent, current.scale * factor);
    let position = focal.sub_point(content.scale(scale));
    ViewportTransform::new(scale, position)
}

/// Computes the transform that centers `content` in the viewport at the
/// largest scale that fits it inside `viewport - padding`.
///
/// Returns `None` for content without area.
pub fn fit_transform(
    content: Rect,
    viewport: Dimensions,
    padding: f64,
    extent: ScaleExtent,
) -> Option<ViewportTransform> {
    if content.width() <= 0.0 || content.height() <= 0.0 {
        return None;
    }

    let available_width = (viewport.width() - padding).max(1.0);
    let available_height = (viewport.height() - padding).max(1.0);
    let ratio = (content.width() / available_width).max(content.height() / available_height);
    let scale = clamp(extent, 1.0 / ratio);
    Some(ViewportTransform::new(
        scale,
        center_offset(content.center(), scale, viewport),
    ))
}

/// Returns the pan offset that puts a content point at the viewport center.
pub fn center_offset(content_point: Point, scale: f64, viewport: Dimensions) -> Point {
    Point::new(
        viewport.width() / 2.0 - content_point.x() * scale,
        viewport.height() / 2.0 - content_point.y() * scale,
    )
}

/// Computes the smallest pan that brings a node into view.
///
/// `bounds` is the node rectangle in viewport space. A side is corrected
/// when less than `minimum_visible` content units of the node remain on
/// screen; the node is then moved fully inside, `offset` content units away
/// from the edge. Returns `None` when no pan is needed.
pub fn pan_into_view(
    current: ViewportTransform,
    bounds: Rect,
    viewport: Dimensions,
    offset: f64,
    minimum_visible: f64,
) -> Option<Point> {
    let pan_offset = offset * current.scale;
    let min_visible = minimum_visible * current.scale;
    let mut x = current.position.x();
    let mut y = current.position.y();
    let mut moved = false;

    if bounds.right() - min_visible < 0.0 {
        x -= bounds.x() - pan_offset;
        moved = true;
    }
    if bounds.x() + min_visible > viewport.width() {
        x -= bounds.right() - viewport.width() + pan_offset;
        moved = true;
    }
    if bounds.bottom() - min_visible < 0.0 {
        y -= bounds.y() - pan_offset;
        moved = true;
    }
    if bounds.y() + min_visible > viewport.height() {
        y -= bounds.bottom() - viewport.height() + pan_offset;
        moved = true;
    }

    moved.then(|| Point::new(x, y))
}

/// Computes the transform that fits the selection spanned by two viewport
/// points. Returns `None` when the selection is smaller than
/// [`MIN_SELECTION_SIZE`] in either direction.
pub fn zoom_to_selection(
    current: ViewportTransform,
    start: Point,
    end: Point,
    viewport: Dimensions,
    extent: ScaleExtent,
) -> Option<ViewportTransform> {
    let selection = current.invert(Rect::from_corners(start, end));
    if selection.width() < MIN_SELECTION_SIZE || selection.height() < MIN_SELECTION_SIZE {
        return None;
    }
    fit_transform(selection, viewport, 0.0, extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENT: ScaleExtent = [0.25, 4.0];

    fn identity() -> ViewportTransform {
        ViewportTransform::new(1.0, Point::default())
    }

    #[test]
    fn test_scale_about_keeps_focal_point() {
        let current = ViewportTransform::new(1.0, Point::new(10.0, 0.0));
        let next = scale_about(current, 2.0, Point::new(50.0, 50.0), EXTENT);

        assert_eq!(next.scale, 2.0);
        assert_eq!(next.position, Point::new(-30.0, -50.0));
        assert_eq!(
            current.invert(Point::new(50.0, 50.0)),
            next.invert(Point::new(50.0, 50.0))
        );
    }

    #[test]
    fn test_scale_about_clamps() {
        let next = scale_about(identity(), 100.0, Point::default(), EXTENT);
        assert_eq!(next.scale, 4.0);
        let next = scale_about(identity(), 0.001, Point::default(), EXTENT);
        assert_eq!(next.scale, 0.25);
    }

    #[test]
    fn test_fit_single_box() {
        let content = Rect::new(10.0, 10.0, 100.0, 50.0);
        let fit = fit_transform(content, Dimensions::new(300.0, 100.0), 0.0, EXTENT).unwrap();

        // Ratios are 3 and 2; the smaller one wins.
        assert_eq!(fit.scale, 2.0);
        assert_eq!(fit.apply(content.center()), Point::new(150.0, 50.0));
    }

    #[test]
    fn test_fit_with_padding() {
        let content = Rect::new(0.0, 0.0, 100.0, 100.0);
        let fit = fit_transform(content, Dimensions::new(300.0, 300.0), 100.0, EXTENT).unwrap();
        assert_eq!(fit.scale, 2.0);
        assert_eq!(fit.position, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_fit_empty_box_is_none() {
        let viewport = Dimensions::new(100.0, 100.0);
        assert!(fit_transform(Rect::new(5.0, 5.0, 0.0, 10.0), viewport, 0.0, EXTENT).is_none());
    }

    #[test]
    fn test_center_offset() {
        let position = center_offset(Point::new(100.0, 50.0), 2.0, Dimensions::new(400.0, 200.0));
        assert_eq!(position, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_pan_into_view_left() {
        let bounds = Rect::new(-200.0, 10.0, 50.0, 50.0);
        let position = pan_into_view(identity(), bounds, Dimensions::new(500.0, 500.0), 20.0, 0.0);
        assert_eq!(position, Some(Point::new(220.0, 0.0)));
    }

    #[test]
    fn test_pan_into_view_right_and_bottom() {
        let bounds = Rect::new(600.0, 550.0, 50.0, 50.0);
        let position = pan_into_view(identity(), bounds, Dimensions::new(500.0, 500.0), 0.0, 0.0);
        assert_eq!(position, Some(Point::new(-150.0, -100.0)));
    }

    #[test]
    fn test_pan_into_view_visible_node_does_not_move() {
        let bounds = Rect::new(10.0, 10.0, 50.0, 50.0);
        let position = pan_into_view(identity(), bounds, Dimensions::new(500.0, 500.0), 0.0, 0.0);
        assert_eq!(position, None);
    }

    #[test]
    fn test_pan_into_view_minimum_visible() {
        // 10 units remain on screen, 20 are required.
        let bounds = Rect::new(-40.0, 10.0, 50.0, 50.0);
        let viewport = Dimensions::new(500.0, 500.0);
        assert!(pan_into_view(identity(), bounds, viewport, 0.0, 20.0).is_some());
        assert!(pan_into_view(identity(), bounds, viewport, 0.0, 5.0).is_none());
    }

    #[test]
    fn test_zoom_to_selection_ignores_small_rects() {
        let viewport = Dimensions::new(400.0, 400.0);
        let result = zoom_to_selection(
            identity(),
            Point::new(0.0, 0.0),
            Point::new(9.0, 100.0),
            viewport,
            EXTENT,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_zoom_to_selection_fits_selection() {
        let viewport = Dimensions::new(400.0, 400.0);
        let result = zoom_to_selection(
            identity(),
            Point::new(300.0, 300.0),
            Point::new(100.0, 100.0),
            viewport,
            EXTENT,
        )
        .unwrap();

        assert_eq!(result.scale, 2.0);
        assert_eq!(result.apply(Point::new(200.0, 200.0)), Point::new(200.0, 200.0));
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    const EXTENT: ScaleExtent = [0.25, 4.0];

    fn transform_strategy() -> impl Strategy<Value = ViewportTransform> {
        (0.25f64..4.0, -500.0f64..500.0, -500.0f64..500.0)
            .prop_map(|(scale, x, y)| ViewportTransform::new(scale, Point::new(x, y)))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f64..1000.0, -1000.0f64..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    /// Zooming keeps the content under the focal point fixed.
    fn check_scale_about_focal_invariant(
        current: ViewportTransform,
        factor: f64,
        focal: Point,
    ) -> Result<(), TestCaseError> {
        let next = scale_about(current, factor, focal, EXTENT);
        let before = current.invert(focal);
        let after = next.invert(focal);

        prop_assert!(approx_eq!(f64, before.x(), after.x(), epsilon = 1e-6));
        prop_assert!(approx_eq!(f64, before.y(), after.y(), epsilon = 1e-6));
        prop_assert!(next.scale >= EXTENT[0] && next.scale <= EXTENT[1]);
        Ok(())
    }

    /// A fit centers the content and keeps the scale inside the extent.
    fn check_fit_centers_content(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), TestCaseError> {
        let content = Rect::new(x, y, width, height);
        let viewport = Dimensions::new(800.0, 600.0);
        let fit = fit_transform(content, viewport, 0.0, EXTENT).unwrap();
        let center = fit.apply(content.center());

        prop_assert!(approx_eq!(f64, center.x(), 400.0, epsilon = 1e-6));
        prop_assert!(approx_eq!(f64, center.y(), 300.0, epsilon = 1e-6));
        prop_assert!(fit.scale >= EXTENT[0] && fit.scale <= EXTENT[1]);
        Ok(())
    }

    /// Applying then inverting a transform is the identity.
    fn check_apply_invert_roundtrip(
        transform: ViewportTransform,
        point: Point,
    ) -> Result<(), TestCaseError> {
        let roundtrip = transform.invert(transform.apply(point));
        prop_assert!(approx_eq!(f64, roundtrip.x(), point.x(), epsilon = 1e-6));
        prop_assert!(approx_eq!(f64, roundtrip.y(), point.y(), epsilon = 1e-6));
        Ok(())
    }

    proptest! {
        #[test]
        fn scale_about_focal_invariant(
            current in transform_strategy(),
            factor in 0.1f64..10.0,
            focal in point_strategy(),
        ) {
            check_scale_about_focal_invariant(current, factor, focal)?;
        }

        #[test]
        fn fit_centers_content(
            x in -1000.0f64..1000.0,
            y in -1000.0f64..1000.0,
            width in 1.0f64..2000.0,
            height in 1.0f64..2000.0,
        ) {
            check_fit_centers_content(x, y, width, height)?;
        }

        #[test]
        fn apply_invert_roundtrip(transform in transform_strategy(), point in point_strategy()) {
            check_apply_invert_roundtrip(transform, point)?;
        }
    }
}
