//! Viewport operations on the graph.
//!
//! Every operation that moves the view computes the new transform with the
//! functions in [`crate::viewport`], applies it, and then fires a single
//! `graph-position-change`.

use log::{debug, trace};

use meridian_core::{
    geometry::{Dimensions, Point, Rect},
    identifier::Id,
    model::ScaleDetailsLevel,
};

use crate::{
    element::Node,
    error::GraphError,
    event::Event,
    viewport::{self, ViewportTransform},
};

use super::Controller;

impl Controller {
    /// Returns the graph's current scale and pan offset.
    pub fn viewport_transform(&self) -> Option<ViewportTransform> {
        self.scene
            .graph()
            .map(|graph| ViewportTransform::new(graph.scale(), graph.position()))
    }

    fn apply_transform(&mut self, transform: ViewportTransform) -> Result<(), GraphError> {
        let graph_id = self.require_graph()?;
        if let Some(graph) = self.scene.graph_mut() {
            graph.set_scale(transform.scale);
            graph.set_position(transform.position);
        }
        trace!(scale = transform.scale, x = transform.position.x(), y = transform.position.y(); "Viewport moved");
        self.emit(Event::GraphPositionChanged { graph: graph_id });
        Ok(())
    }

    fn current_transform(&self) -> Result<ViewportTransform, GraphError> {
        self.viewport_transform()
            .ok_or_else(|| GraphError::InvalidState("controller has no graph".to_string()))
    }

    /// Pans the graph.
    pub fn set_graph_position(&mut self, position: Point) -> Result<(), GraphError> {
        let current = self.current_transform()?;
        self.apply_transform(ViewportTransform::new(current.scale, position))
    }

    /// Sets the graph scale, clamped to its scale extent.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] unless `scale` is a positive
    /// finite number.
    pub fn set_graph_scale(&mut self, scale: f64) -> Result<(), GraphError> {
        let current = self.current_transform()?;
        require_positive("scale", scale)?;
        let scale = self
            .scene
            .graph()
            .map_or(scale, |graph| graph.clamp_scale(scale));
        self.apply_transform(ViewportTransform::new(scale, current.position))
    }

    /// Sets the viewport size the graph is shown in.
    pub fn set_graph_dimensions(&mut self, dimensions: Dimensions) -> Result<(), GraphError> {
        self.require_graph()?;
        if let Some(graph) = self.scene.graph_mut() {
            graph.set_dimensions(dimensions);
        }
        Ok(())
    }

    /// Zooms by `factor`, keeping the content under `focal` in place.
    /// The focal point is in viewport coordinates and defaults to the
    /// viewport center.
    pub fn scale_by(&mut self, factor: f64, focal: Option<Point>) -> Result<(), GraphError> {
        let current = self.current_transform()?;
        require_positive("scale factor", factor)?;
        let Some(graph) = self.scene.graph() else {
            return Ok(());
        };
        let focal = focal
            .unwrap_or_else(|| Rect::from_parts(Point::default(), graph.dimensions()).center());
        let next = viewport::scale_about(current, factor, focal, graph.scale_extent());
        self.apply_transform(next)
    }

    /// Fits content into the viewport, leaving `padding` pixels around it.
    ///
    /// With a node, the content is the node's positionable children or, when
    /// it has none, the node itself. Without one, it is every visible
    /// top-level node. Empty content leaves the view untouched.
    pub fn fit(&mut self, padding: f64, node: Option<Id>) -> Result<(), GraphError> {
        let graph_id = self.require_graph()?;
        let content = match node {
            Some(node) => {
                if self.scene.node(node).is_none() {
                    return Err(GraphError::InvalidOperation(format!(
                        "`{node}` is not a node"
                    )));
                }
                let children = self.scene.positionable_children(node);
                if children.is_empty() {
                    self.scene.node_bounds(node)
                } else {
                    self.union_bounds(children)
                }
            }
            None => {
                let top_level: Vec<Id> = self
                    .scene
                    .children(graph_id)
                    .iter()
                    .copied()
                    .filter(|child| {
                        self.scene
                            .element(*child)
                            .is_some_and(|element| element.as_node().is_some() && element.is_visible())
                    })
                    .collect();
                self.union_bounds(top_level)
            }
        };

        let Some(content) = content else {
            debug!("Nothing to fit");
            return Ok(());
        };
        let Some(graph) = self.scene.graph() else {
            return Ok(());
        };
        match viewport::fit_transform(content, graph.dimensions(), padding, graph.scale_extent()) {
            Some(next) => self.apply_transform(next),
            None => {
                debug!("Fit content has no area");
                Ok(())
            }
        }
    }

    fn union_bounds(&self, nodes: Vec<Id>) -> Option<Rect> {
        nodes
            .into_iter()
            .filter_map(|id| self.scene.node_bounds(id))
            .reduce(|acc, bounds| acc.union(&bounds))
    }

    /// Pans so the node's center lands at the viewport center.
    pub fn center_in_view(&mut self, node: Id) -> Result<(), GraphError> {
        let current = self.current_transform()?;
        let bounds = self.require_node_bounds(node)?;
        let Some(graph) = self.scene.graph() else {
            return Ok(());
        };
        let position = viewport::center_offset(bounds.center(), current.scale, graph.dimensions());
        self.apply_transform(ViewportTransform::new(current.scale, position))
    }

    /// Applies the smallest pan that shows at least `minimum_visible`
    /// content units of the node, keeping it `offset` units from the
    /// viewport edge. Does nothing when the node is already visible enough.
    pub fn pan_into_view(
        &mut self,
        node: Id,
        offset: f64,
        minimum_visible: f64,
    ) -> Result<(), GraphError> {
        let current = self.current_transform()?;
        self.require_node_bounds(node)?;
        let (Some(bounds), Some(graph)) = (self.scene.node_viewport_bounds(node), self.scene.graph())
        else {
            return Ok(());
        };
        match viewport::pan_into_view(current, bounds, graph.dimensions(), offset, minimum_visible) {
            Some(position) => self.apply_transform(ViewportTransform::new(current.scale, position)),
            None => Ok(()),
        }
    }

    /// Fits the rectangle spanned by two viewport points. Selections smaller
    /// than [`viewport::MIN_SELECTION_SIZE`] content units are ignored.
    pub fn zoom_to_selection(&mut self, start: Point, end: Point) -> Result<(), GraphError> {
        let current = self.current_transform()?;
        let Some(graph) = self.scene.graph() else {
            return Ok(());
        };
        match viewport::zoom_to_selection(current, start, end, graph.dimensions(), graph.scale_extent()) {
            Some(next) => self.apply_transform(next),
            None => {
                debug!("Selection too small, ignoring zoom");
                Ok(())
            }
        }
    }

    /// Returns the displayed nodes intersecting the selection spanned by two
    /// viewport points, in draw order.
    pub fn nodes_in_selection(&self, start: Point, end: Point) -> Vec<Id> {
        self.scene.nodes_in_selection(start, end)
    }

    /// Returns true when the node overlaps the viewport grown by `padding`
    /// pixels.
    pub fn is_node_in_view(&self, node: Id, padding: f64) -> bool {
        self.scene.is_node_in_view(node, padding)
    }

    pub fn details_level(&self) -> ScaleDetailsLevel {
        self.scene.details_level()
    }

    /// Expands every group, outermost first.
    pub fn expand_all(&mut self) -> Result<(), GraphError> {
        self.set_all_collapsed(false)
    }

    /// Collapses every group, outermost first.
    pub fn collapse_all(&mut self) -> Result<(), GraphError> {
        self.set_all_collapsed(true)
    }

    fn set_all_collapsed(&mut self, collapsed: bool) -> Result<(), GraphError> {
        let graph_id = self.require_graph()?;
        let groups: Vec<Id> = self
            .scene
            .descendants(graph_id)
            .into_iter()
            .filter(|id| self.scene.node(*id).is_some_and(Node::is_group))
            .collect();

        let mut events = Vec::new();
        for group in groups {
            self.change_collapsed(group, collapsed, &mut events);
        }
        debug!(collapsed, changed = events.len(); "Changed collapse state of all groups");
        self.emit_all(events);
        Ok(())
    }

    /// Restores scale 1 with the content origin at the viewport origin.
    pub fn reset(&mut self) -> Result<(), GraphError> {
        self.apply_transform(ViewportTransform::new(1.0, Point::default()))
    }

    fn require_node_bounds(&self, node: Id) -> Result<Rect, GraphError> {
        self.scene
            .node_bounds(node)
            .ok_or_else(|| GraphError::InvalidOperation(format!("`{node}` is not a node")))
    }
}

fn require_positive(what: &str, value: f64) -> Result<(), GraphError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidOperation(format!(
            "{what} must be a positive number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use meridian_core::model::{GraphModel, Model, NodeModel, ScaleDetailsThresholds};

    use crate::event::EventType;

    use super::super::tests::{recorder, two_nodes};
    use super::*;

    #[test]
    fn test_scale_by_keeps_focal_point() {
        let mut controller = two_nodes();
        let focal = Point::new(50.0, 50.0);
        let before = controller.scene().translate_from_absolute(Id::new("g"), focal);

        controller.scale_by(2.0, Some(focal)).unwrap();

        let after = controller.scene().translate_from_absolute(Id::new("g"), focal);
        assert_approx_eq!(f64, before.x(), after.x());
        assert_approx_eq!(f64, before.y(), after.y());
        assert_eq!(controller.graph().unwrap().scale(), 2.0);
    }

    #[test]
    fn test_scale_by_clamps_to_extent() {
        let mut controller = two_nodes();
        controller.scale_by(100.0, None).unwrap();
        assert_eq!(controller.graph().unwrap().scale(), 4.0);
        assert!(controller.scale_by(0.0, None).is_err());
        assert!(controller.scale_by(f64::NAN, None).is_err());
    }

    #[test]
    fn test_viewport_ops_fire_one_event() {
        let mut controller = two_nodes();
        let events = recorder(&mut controller, &[EventType::GraphPositionChanged]);

        controller.scale_by(2.0, None).unwrap();
        controller.fit(0.0, None).unwrap();
        controller.reset().unwrap();

        assert_eq!(events.borrow().len(), 3);
        let graph = controller.graph().unwrap();
        assert_eq!(graph.scale(), 1.0);
        assert_eq!(graph.position(), Point::default());
    }

    #[test]
    fn test_fit_group_uses_positionable_children() {
        let mut controller = Controller::new();
        let model = Model {
            graph: Some(GraphModel::new("g", "graph")),
            nodes: vec![
                NodeModel::new("grp", "group").with_children(["a"]),
                NodeModel::new("a", "node")
                    .with_position(0.0, 0.0)
                    .with_dimensions(200.0, 100.0),
                NodeModel::new("far", "node")
                    .with_position(5000.0, 5000.0)
                    .with_dimensions(10.0, 10.0),
            ],
            edges: vec![],
        };
        controller.from_model(&model, false).unwrap();
        controller
            .set_graph_dimensions(Dimensions::new(400.0, 400.0))
            .unwrap();

        controller.fit(0.0, Some(Id::new("grp"))).unwrap();

        let graph = controller.graph().unwrap();
        assert_eq!(graph.scale(), 2.0);
        assert_eq!(graph.position(), Point::new(0.0, 100.0));
    }

    #[test]
    fn test_fit_without_content_is_noop() {
        let mut controller = Controller::new();
        let model = Model {
            graph: Some(GraphModel::new("g", "graph")),
            ..Model::default()
        };
        controller.from_model(&model, false).unwrap();
        let events = recorder(&mut controller, &[EventType::GraphPositionChanged]);

        controller.fit(10.0, None).unwrap();
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_center_in_view() {
        let mut controller = two_nodes();
        controller.center_in_view(Id::new("b")).unwrap();
        // Center (250,125) lands on (400,300).
        assert_eq!(
            controller.graph().unwrap().position(),
            Point::new(150.0, 175.0)
        );
    }

    #[test]
    fn test_pan_into_view() {
        let mut controller = two_nodes();
        controller
            .set_graph_position(Point::new(-500.0, 0.0))
            .unwrap();
        // `a` spans -500..-400 on screen.
        controller.pan_into_view(Id::new("a"), 10.0, 20.0).unwrap();
        assert_eq!(
            controller.graph().unwrap().position(),
            Point::new(10.0, 0.0)
        );

        let events = recorder(&mut controller, &[EventType::GraphPositionChanged]);
        controller.pan_into_view(Id::new("a"), 10.0, 20.0).unwrap();
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_zoom_to_selection_ignores_small_boxes() {
        let mut controller = two_nodes();
        controller
            .zoom_to_selection(Point::new(0.0, 0.0), Point::new(5.0, 50.0))
            .unwrap();
        assert_eq!(controller.graph().unwrap().scale(), 1.0);

        controller
            .zoom_to_selection(Point::new(0.0, 0.0), Point::new(400.0, 300.0))
            .unwrap();
        assert_eq!(controller.graph().unwrap().scale(), 2.0);
    }

    #[test]
    fn test_nodes_in_selection() {
        let controller = two_nodes();
        assert_eq!(
            controller.nodes_in_selection(Point::new(150.0, 90.0), Point::new(210.0, 110.0)),
            vec![Id::new("b")]
        );
        assert_eq!(
            controller.nodes_in_selection(Point::new(0.0, 0.0), Point::new(800.0, 600.0)),
            vec![Id::new("a"), Id::new("b")]
        );
    }

    #[test]
    fn test_details_level_follows_scale() {
        let mut controller = two_nodes();
        assert_eq!(controller.details_level(), ScaleDetailsLevel::High);

        controller
            .graph_mut()
            .unwrap()
            .set_details_thresholds(Some(ScaleDetailsThresholds { low: 0.5, medium: 1.5 }));
        assert_eq!(controller.details_level(), ScaleDetailsLevel::Medium);
        controller.set_graph_scale(0.25).unwrap();
        assert_eq!(controller.details_level(), ScaleDetailsLevel::Low);
        controller.set_graph_scale(2.0).unwrap();
        assert_eq!(controller.details_level(), ScaleDetailsLevel::High);
    }

    #[test]
    fn test_collapse_all_snapshots_group_bounds() {
        let mut controller = Controller::new();
        let model = Model {
            graph: Some(GraphModel::new("g", "graph")),
            nodes: vec![
                NodeModel::new("grp", "group").with_children(["a"]),
                NodeModel::new("a", "node")
                    .with_position(10.0, 20.0)
                    .with_dimensions(30.0, 40.0),
            ],
            edges: vec![],
        };
        controller.from_model(&model, false).unwrap();

        controller.collapse_all().unwrap();

        let group = controller.node(Id::new("grp")).unwrap();
        assert!(group.is_collapsed());
        assert_eq!(group.bounds(), Rect::new(10.0, 20.0, 30.0, 40.0));
        assert!(!controller.scene().is_displayed(Id::new("a")));
    }

    #[test]
    fn test_group_move_carries_children() {
        let mut controller = Controller::new();
        let model = Model {
            graph: Some(GraphModel::new("g", "graph")),
            nodes: vec![
                NodeModel::new("grp", "group").with_children(["a"]),
                NodeModel::new("a", "node")
                    .with_position(10.0, 20.0)
                    .with_dimensions(30.0, 40.0),
            ],
            edges: vec![],
        };
        controller.from_model(&model, false).unwrap();

        controller
            .set_node_position(Id::new("grp"), Point::new(110.0, 20.0))
            .unwrap();

        assert_eq!(
            controller.node_bounds(Id::new("a")).unwrap(),
            Rect::new(110.0, 20.0, 30.0, 40.0)
        );
        assert_eq!(
            controller.node_bounds(Id::new("grp")).unwrap(),
            Rect::new(110.0, 20.0, 30.0, 40.0)
        );
    }
}
