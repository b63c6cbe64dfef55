use std::{collections::HashMap, rc::Rc};

use meridian_core::{
    geometry::{Dimensions, Point, Rect, Translatable},
    model::{LabelPosition, NodeShape, NodeStatus},
};

use crate::anchor::{Anchor, AnchorEnd, CenterAnchor};

/// A positioned box in the scene, optionally grouping other nodes.
///
/// The stored bounds are the rectangle last assigned to the node. An
/// expanded group with node children is drawn around its children instead;
/// use [`Scene::node_bounds`](crate::Scene::node_bounds) for the effective
/// rectangle.
///
/// The positioned and dimensions-initialized flags only ever go from `false`
/// to `true`, on the first explicit placement or sizing.
#[derive(Debug, Clone, Default)]
pub struct Node {
    bounds: Rect,
    group: bool,
    collapsed: bool,
    shape: NodeShape,
    status: NodeStatus,
    label_position: LabelPosition,
    dimensions_initialized: bool,
    positioned: bool,
    anchors: HashMap<(AnchorEnd, String), Rc<dyn Anchor>>,
}

impl Node {
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self.positioned = true;
        self.dimensions_initialized = true;
        self
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.place(position);
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.resize(dimensions);
        self
    }

    pub fn with_group(mut self, group: bool) -> Self {
        self.group = group;
        self
    }

    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    pub fn with_shape(mut self, shape: NodeShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_anchor(mut self, anchor: impl Anchor + 'static, end: AnchorEnd, edge_type: &str) -> Self {
        self.set_anchor(anchor, end, edge_type);
        self
    }

    /// Returns the stored bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn position(&self) -> Point {
        self.bounds.position()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.bounds.dimensions()
    }

    pub fn is_group(&self) -> bool {
        self.group
    }

    pub fn set_group(&mut self, group: bool) {
        self.group = group;
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: NodeShape) {
        self.shape = shape;
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
    }

    pub fn label_position(&self) -> LabelPosition {
        self.label_position
    }

    pub fn set_label_position(&mut self, label_position: LabelPosition) {
        self.label_position = label_position;
    }

    pub fn is_dimensions_initialized(&self) -> bool {
        self.dimensions_initialized
    }

    pub fn is_positioned(&self) -> bool {
        self.positioned
    }

    /// Registers an anchor for edges of `edge_type` at the given end.
    ///
    /// An empty `edge_type` registers the fallback for that end;
    /// [`AnchorEnd::Both`] registers the anchor for sources and targets.
    pub fn set_anchor(&mut self, anchor: impl Anchor + 'static, end: AnchorEnd, edge_type: &str) {
        let anchor: Rc<dyn Anchor> = Rc::new(anchor);
        let ends: &[AnchorEnd] = match end {
            AnchorEnd::Both => &[AnchorEnd::Source, AnchorEnd::Target],
            AnchorEnd::Source => &[AnchorEnd::Source],
            AnchorEnd::Target => &[AnchorEnd::Target],
        };
        for end in ends {
            self.anchors
                .insert((*end, edge_type.to_string()), Rc::clone(&anchor));
        }
    }

    /// Resolves the anchor for an edge end.
    ///
    /// Looks up `(end, edge_type)`, then `(end, "")`, and falls back to a
    /// [`CenterAnchor`].
    pub fn anchor(&self, end: AnchorEnd, edge_type: &str) -> Rc<dyn Anchor> {
        let end = match end {
            AnchorEnd::Both => AnchorEnd::Source,
            end => end,
        };
        self.anchors
            .get(&(end, edge_type.to_string()))
            .or_else(|| self.anchors.get(&(end, String::new())))
            .map(Rc::clone)
            .unwrap_or_else(|| Rc::new(CenterAnchor))
    }

    /// Moves the node. Returns true on the node's first positioning.
    pub(crate) fn place(&mut self, position: Point) -> bool {
        self.bounds = self.bounds.with_position(position);
        !std::mem::replace(&mut self.positioned, true)
    }

    pub(crate) fn resize(&mut self, dimensions: Dimensions) {
        self.bounds = self.bounds.with_dimensions(dimensions);
        self.dimensions_initialized = true;
    }

    /// Replaces the bounds, setting each flag only if its half of the
    /// rectangle changed. Returns true on the node's first positioning.
    pub(crate) fn assign_bounds(&mut self, bounds: Rect) -> bool {
        if bounds.dimensions() != self.bounds.dimensions() {
            self.dimensions_initialized = true;
        }
        let moved = bounds.position() != self.bounds.position();
        let first = moved && !self.positioned;
        self.positioned |= moved;
        self.bounds = bounds;
        first
    }

    /// Moves the stored bounds by an offset without touching the flags.
    pub(crate) fn shift(&mut self, dx: f64, dy: f64) {
        self.bounds = self.bounds.translate(dx, dy);
    }

    /// Returns true when the flag changed.
    pub(crate) fn set_collapsed_flag(&mut self, collapsed: bool) -> bool {
        let changed = self.collapsed != collapsed;
        self.collapsed = collapsed;
        changed
    }

    /// Overwrites the stored bounds and both flags, as loaded from a model.
    pub(crate) fn restore(&mut self, bounds: Rect, positioned: bool, dimensions_initialized: bool) {
        self.bounds = bounds;
        self.positioned = positioned;
        self.dimensions_initialized = dimensions_initialized;
    }
}

#[cfg(test)]
mod tests {
    use crate::anchor::RectAnchor;

    use super::*;

    #[test]
    fn test_flags_start_false() {
        let node = Node::default();
        assert!(!node.is_positioned());
        assert!(!node.is_dimensions_initialized());
        assert_eq!(node.shape(), NodeShape::Ellipse);
    }

    #[test]
    fn test_place_reports_first_positioning() {
        let mut node = Node::default();
        assert!(node.place(Point::new(1.0, 2.0)));
        assert!(!node.place(Point::new(3.0, 4.0)));
        assert_eq!(node.position(), Point::new(3.0, 4.0));
        assert!(node.is_positioned());
    }

    #[test]
    fn test_assign_bounds_only_sets_changed_flags() {
        let mut node = Node::default();
        assert!(!node.assign_bounds(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(node.is_dimensions_initialized());
        assert!(!node.is_positioned());

        assert!(node.assign_bounds(Rect::new(5.0, 0.0, 10.0, 10.0)));
        assert!(node.is_positioned());
    }

    #[test]
    fn test_resize_keeps_position() {
        let mut node = Node::default().with_position(Point::new(7.0, 8.0));
        node.resize(Dimensions::new(20.0, 30.0));
        assert_eq!(node.bounds(), Rect::new(7.0, 8.0, 20.0, 30.0));
        assert!(node.is_dimensions_initialized());
    }

    #[test]
    fn test_anchor_resolution_order() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        let far_right = Point::new(150.0, 25.0);

        let mut node = Node::default();
        // No anchors: center.
        assert_eq!(
            node.anchor(AnchorEnd::Source, "link").location(bounds, far_right),
            Point::new(50.0, 25.0)
        );

        // Fallback for the end.
        node.set_anchor(RectAnchor, AnchorEnd::Source, "");
        assert_eq!(
            node.anchor(AnchorEnd::Source, "link").location(bounds, far_right),
            Point::new(100.0, 25.0)
        );
        assert_eq!(
            node.anchor(AnchorEnd::Target, "link").location(bounds, far_right),
            Point::new(50.0, 25.0)
        );

        // Exact match wins over the fallback.
        node.set_anchor(CenterAnchor, AnchorEnd::Source, "link");
        assert_eq!(
            node.anchor(AnchorEnd::Source, "link").location(bounds, far_right),
            Point::new(50.0, 25.0)
        );
    }

    #[test]
    fn test_anchor_both_registers_each_end() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        let node = Node::default().with_anchor(RectAnchor, AnchorEnd::Both, "");
        let reference = Point::new(150.0, 25.0);

        for end in [AnchorEnd::Source, AnchorEnd::Target] {
            assert_eq!(
                node.anchor(end, "").location(bounds, reference),
                Point::new(100.0, 25.0)
            );
        }
    }
}
