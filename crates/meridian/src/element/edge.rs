use meridian_core::{
    geometry::Point,
    identifier::Id,
    model::{EdgeAnimationSpeed, EdgeStyle},
};

/// A connection between a source and a target node.
///
/// An edge is only valid once both endpoints are set. Endpoints are changed
/// through the controller, which checks that they name nodes; bendpoints
/// and explicit end points can be edited directly.
#[derive(Debug, Clone, Default)]
pub struct Edge {
    source: Option<Id>,
    target: Option<Id>,
    start_point: Option<Point>,
    end_point: Option<Point>,
    bendpoints: Vec<Point>,
    edge_style: EdgeStyle,
    animation_speed: EdgeAnimationSpeed,
}

impl Edge {
    pub fn new(source: impl Into<Id>, target: impl Into<Id>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn with_bendpoints(mut self, bendpoints: Vec<Point>) -> Self {
        self.bendpoints = bendpoints;
        self
    }

    pub fn source(&self) -> Option<Id> {
        self.source
    }

    pub fn target(&self) -> Option<Id> {
        self.target
    }

    /// Returns true when both endpoints are set.
    pub fn is_valid(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }

    /// Returns the start point set explicitly, bypassing anchor resolution.
    pub fn explicit_start_point(&self) -> Option<Point> {
        self.start_point
    }

    pub fn set_start_point(&mut self, point: Option<Point>) {
        self.start_point = point;
    }

    /// Returns the end point set explicitly, bypassing anchor resolution.
    pub fn explicit_end_point(&self) -> Option<Point> {
        self.end_point
    }

    pub fn set_end_point(&mut self, point: Option<Point>) {
        self.end_point = point;
    }

    pub fn bendpoints(&self) -> &[Point] {
        &self.bendpoints
    }

    pub fn set_bendpoints(&mut self, bendpoints: Vec<Point>) {
        self.bendpoints = bendpoints;
    }

    /// Removes the bendpoint at `index`. Returns false when out of range.
    pub fn remove_bendpoint(&mut self, index: usize) -> bool {
        if index >= self.bendpoints.len() {
            return false;
        }
        self.bendpoints.remove(index);
        true
    }

    /// Removes the first bendpoint equal to `point`. Returns false when
    /// no bendpoint matches.
    pub fn remove_bendpoint_by_value(&mut self, point: Point) -> bool {
        match self.bendpoints.iter().position(|bendpoint| *bendpoint == point) {
            Some(index) => self.remove_bendpoint(index),
            None => false,
        }
    }

    pub fn edge_style(&self) -> EdgeStyle {
        self.edge_style
    }

    pub fn set_edge_style(&mut self, edge_style: EdgeStyle) {
        self.edge_style = edge_style;
    }

    pub fn animation_speed(&self) -> EdgeAnimationSpeed {
        self.animation_speed
    }

    pub fn set_animation_speed(&mut self, animation_speed: EdgeAnimationSpeed) {
        self.animation_speed = animation_speed;
    }

    pub(crate) fn set_source(&mut self, source: Option<Id>) {
        self.source = source;
    }

    pub(crate) fn set_target(&mut self, target: Option<Id>) {
        self.target = target;
    }

    /// Clears every endpoint referring to `node`. Returns true if any did.
    pub(crate) fn detach_node(&mut self, node: Id) -> bool {
        let mut changed = false;
        if self.source == Some(node) {
            self.source = None;
            changed = true;
        }
        if self.target == Some(node) {
            self.target = None;
            changed = true;
        }
        changed
    }

    /// Rewrites every endpoint referring to `from` to `to`.
    pub(crate) fn rename_node(&mut self, from: Id, to: Id) {
        if self.source == Some(from) {
            self.source = Some(to);
        }
        if self.target == Some(from) {
            self.target = Some(to);
        }
    }
}
