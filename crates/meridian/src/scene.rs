//! Read-only view of the element tree.
//!
//! The [`Scene`] is the element registry owned by the
//! [`Controller`](crate::Controller). It answers every structural and
//! geometric query: lookups, tree walks, coordinate transforms, effective
//! node bounds and edge end points. Event listeners and layouts receive a
//! `&Scene`, so everything here works on shared references.
//!
//! # Overview
//!
//! - Lookups: [`Scene::element`], [`Scene::node`], [`Scene::edge`], [`Scene::graph`]
//! - Tree walks: [`Scene::ancestors`], [`Scene::descendants`], [`Scene::order_key`]
//! - Transforms: [`Scene::translate_to_absolute`], [`Scene::translate_from_absolute`]
//! - Nodes: [`Scene::node_bounds`], [`Scene::positionable_children`], [`Scene::source_edges`]
//! - Edges: [`Scene::edge_start_point`], [`Scene::edge_end_point`]
//! - Viewport queries: [`Scene::is_node_in_view`], [`Scene::nodes_in_selection`]

use indexmap::IndexMap;
use log::warn;

use meridian_core::{
    geometry::{Padding, Point, Rect, Translatable},
    identifier::Id,
    model::{ModelKind, ScaleDetailsLevel},
};

use crate::{
    anchor::AnchorEnd,
    element::{Edge, Element, Graph, Node},
};

/// Style key holding the padding a group keeps around its children.
pub const GROUP_PADDING_STYLE: &str = "padding";

/// Element registry in insertion order.
#[derive(Debug, Default)]
pub struct Scene {
    elements: IndexMap<Id, Element>,
    graph: Option<Id>,
}

impl Scene {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    pub fn graph_id(&self) -> Option<Id> {
        self.graph
    }

    /// Iterates over all elements in registry order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn element(&self, id: Id) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.element(id).and_then(Element::as_node)
    }

    pub fn edge(&self, id: Id) -> Option<&Edge> {
        self.element(id).and_then(Element::as_edge)
    }

    pub fn graph_element(&self) -> Option<&Element> {
        self.graph.and_then(|id| self.element(id))
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph_element().and_then(Element::as_graph)
    }

    /// Iterates over node elements in registry order.
    pub fn nodes(&self) -> impl Iterator<Item = &Element> {
        self.elements()
            .filter(|element| element.kind() == ModelKind::Node)
    }

    /// Iterates over edge elements in registry order.
    pub fn edges(&self) -> impl Iterator<Item = &Element> {
        self.elements()
            .filter(|element| element.kind() == ModelKind::Edge)
    }

    pub fn parent(&self, id: Id) -> Option<Id> {
        self.element(id).and_then(Element::parent)
    }

    pub fn children(&self, id: Id) -> &[Id] {
        self.element(id)
            .map(Element::children)
            .unwrap_or_default()
    }

    /// Iterates over the parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Returns true when `ancestor` is `id` itself or one of its ancestors.
    pub fn is_self_or_ancestor(&self, ancestor: Id, id: Id) -> bool {
        ancestor == id || self.ancestors(id).any(|current| current == ancestor)
    }

    /// Returns the graph the element belongs to, found by walking parents.
    pub fn graph_of(&self, id: Id) -> Option<Id> {
        let root = self.ancestors(id).last().unwrap_or(id);
        (self.element(root)?.kind() == ModelKind::Graph).then_some(root)
    }

    /// Returns true when the element is reachable from the root graph.
    pub fn is_attached(&self, id: Id) -> bool {
        self.graph.is_some() && self.graph_of(id) == self.graph
    }

    /// Returns the descendants of `id` in depth-first pre-order, excluding `id`.
    pub fn descendants(&self, id: Id) -> Vec<Id> {
        let mut result = Vec::new();
        let mut stack: Vec<Id> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        result
    }

    /// Returns the sibling-index path from the element's root to the element.
    ///
    /// Keys compare lexicographically in depth-first pre-order, which gives
    /// a total draw order over one tree.
    pub fn order_key(&self, id: Id) -> Option<Vec<usize>> {
        self.element(id)?;
        let mut key = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let index = self
                .children(parent)
                .iter()
                .position(|child| *child == current)?;
            key.push(index);
            current = parent;
        }
        key.reverse();
        Some(key)
    }

    /// Converts a value from the element's local space to its parent's.
    ///
    /// Only graphs transform: scale first, then offset by the pan position.
    pub fn translate_to_parent<T: Translatable>(&self, id: Id, value: T) -> T {
        match self.element(id).and_then(Element::as_graph) {
            Some(graph) => {
                let position = graph.position();
                value
                    .scale(graph.scale())
                    .translate(position.x(), position.y())
            }
            None => value,
        }
    }

    /// Inverse of [`Scene::translate_to_parent`].
    pub fn translate_from_parent<T: Translatable>(&self, id: Id, value: T) -> T {
        match self.element(id).and_then(Element::as_graph) {
            Some(graph) => {
                let position = graph.position();
                value
                    .translate(-position.x(), -position.y())
                    .scale(1.0 / graph.scale())
            }
            None => value,
        }
    }

    /// Converts a value from the element's local space to viewport space.
    pub fn translate_to_absolute<T: Translatable>(&self, id: Id, value: T) -> T {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .fold(value, |value, current| self.translate_to_parent(current, value))
    }

    /// Converts a value from viewport space to the element's local space.
    pub fn translate_from_absolute<T: Translatable>(&self, id: Id, value: T) -> T {
        let chain: Vec<Id> = std::iter::once(id).chain(self.ancestors(id)).collect();
        chain
            .into_iter()
            .rev()
            .fold(value, |value, current| self.translate_from_parent(current, value))
    }

    /// Returns true when the node is an expanded group whose bounds are
    /// derived from its children.
    pub fn has_derived_bounds(&self, id: Id) -> bool {
        self.node(id)
            .is_some_and(|node| node.is_group() && !node.is_collapsed())
            && self.visible_child_nodes(id).next().is_some()
    }

    /// Returns the effective bounds of a node in graph space.
    ///
    /// An expanded group with visible node children spans the union of their
    /// bounds grown by its `padding` style. Every other node uses its stored
    /// bounds.
    pub fn node_bounds(&self, id: Id) -> Option<Rect> {
        let node = self.node(id)?;
        if !node.is_group() || node.is_collapsed() {
            return Some(node.bounds());
        }

        let union = self
            .visible_child_nodes(id)
            .filter_map(|child| self.node_bounds(child))
            .reduce(|acc, bounds| acc.union(&bounds));
        match union {
            Some(union) => Some(union.add_padding(self.group_padding(id))),
            None => Some(node.bounds()),
        }
    }

    fn visible_child_nodes(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        self.children(id).iter().copied().filter(|child| {
            self.element(*child)
                .is_some_and(|element| element.kind() == ModelKind::Node && element.is_visible())
        })
    }

    fn group_padding(&self, id: Id) -> Padding {
        let Some(element) = self.element(id) else {
            return Padding::default();
        };
        match element.style_value::<Padding>(GROUP_PADDING_STYLE) {
            Ok(padding) => padding.unwrap_or_default(),
            Err(err) => {
                warn!(node:% = id, err:%; "Ignoring malformed group padding");
                Padding::default()
            }
        }
    }

    /// Returns all descendant nodes regardless of collapse state, in
    /// depth-first pre-order.
    ///
    /// With `leaf_only`, groups that contain nodes are skipped and only their
    /// leaves (and empty groups) are returned.
    pub fn all_node_children(&self, id: Id, leaf_only: bool) -> Vec<Id> {
        let mut result = Vec::new();
        self.collect_node_children(id, leaf_only, &mut result);
        result
    }

    fn collect_node_children(&self, id: Id, leaf_only: bool, result: &mut Vec<Id>) {
        for child in self.child_nodes(id) {
            let has_node_children = self.child_nodes(child).next().is_some();
            if !leaf_only || !has_node_children {
                result.push(child);
            }
            self.collect_node_children(child, leaf_only, result);
        }
    }

    fn child_nodes(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.node(*child).is_some())
    }

    /// Returns the nodes a layout may place independently.
    ///
    /// Leaf nodes and collapsed groups count as single units; expanded groups
    /// are descended into.
    pub fn positionable_children(&self, id: Id) -> Vec<Id> {
        let mut result = Vec::new();
        for child in self.child_nodes(id) {
            match self.node(child) {
                Some(node) if node.is_group() && !node.is_collapsed() => {
                    result.extend(self.positionable_children(child));
                }
                _ => result.push(child),
            }
        }
        result
    }

    /// Returns the edges of the node's graph whose source is the node.
    pub fn source_edges(&self, node: Id) -> Vec<Id> {
        self.edges_of(node, Edge::source)
    }

    /// Returns the edges of the node's graph whose target is the node.
    pub fn target_edges(&self, node: Id) -> Vec<Id> {
        self.edges_of(node, Edge::target)
    }

    fn edges_of(&self, node: Id, endpoint: fn(&Edge) -> Option<Id>) -> Vec<Id> {
        let graph = self.graph_of(node);
        self.edges()
            .filter(|element| self.graph_of(element.id()) == graph)
            .filter(|element| element.as_edge().and_then(endpoint) == Some(node))
            .map(Element::id)
            .collect()
    }

    /// Returns the node that draws `node`: the outermost collapsed group
    /// containing it, or the node itself.
    pub fn anchor_node(&self, node: Id) -> Id {
        self.ancestors(node)
            .filter(|ancestor| self.node(*ancestor).is_some_and(Node::is_collapsed))
            .last()
            .unwrap_or(node)
    }

    /// Resolves where an edge starts, in graph space.
    ///
    /// An explicit start point wins. Otherwise the source anchor is aimed at
    /// the first bendpoint, the explicit end point, or the target anchor's
    /// reference point, in that order.
    pub fn edge_start_point(&self, edge_id: Id) -> Option<Point> {
        let element = self.element(edge_id)?;
        let edge = element.as_edge()?;
        if let Some(point) = edge.explicit_start_point() {
            return Some(point);
        }

        let source = self.anchor_node(edge.source()?);
        let reference = edge
            .bendpoints()
            .first()
            .copied()
            .or(edge.explicit_end_point())
            .or_else(|| {
                let target = self.anchor_node(edge.target()?);
                self.anchor_reference(target, AnchorEnd::Target, element.element_type())
            });
        self.anchor_location(source, AnchorEnd::Source, element.element_type(), reference)
    }

    /// Resolves where an edge ends, in graph space.
    ///
    /// Mirror image of [`Scene::edge_start_point`], aiming at the last
    /// bendpoint, the explicit start point, or the source reference point.
    pub fn edge_end_point(&self, edge_id: Id) -> Option<Point> {
        let element = self.element(edge_id)?;
        let edge = element.as_edge()?;
        if let Some(point) = edge.explicit_end_point() {
            return Some(point);
        }

        let target = self.anchor_node(edge.target()?);
        let reference = edge
            .bendpoints()
            .last()
            .copied()
            .or(edge.explicit_start_point())
            .or_else(|| {
                let source = self.anchor_node(edge.source()?);
                self.anchor_reference(source, AnchorEnd::Source, element.element_type())
            });
        self.anchor_location(target, AnchorEnd::Target, element.element_type(), reference)
    }

    fn anchor_reference(&self, node: Id, end: AnchorEnd, edge_type: &str) -> Option<Point> {
        let bounds = self.node_bounds(node)?;
        Some(self.node(node)?.anchor(end, edge_type).reference_point(bounds))
    }

    fn anchor_location(
        &self,
        node: Id,
        end: AnchorEnd,
        edge_type: &str,
        reference: Option<Point>,
    ) -> Option<Point> {
        let bounds = self.node_bounds(node)?;
        let anchor = self.node(node)?.anchor(end, edge_type);
        let reference = reference.unwrap_or_else(|| anchor.reference_point(bounds));
        Some(anchor.location(bounds, reference))
    }

    /// Returns the node's effective bounds in viewport space.
    pub fn node_viewport_bounds(&self, id: Id) -> Option<Rect> {
        let bounds = self.node_bounds(id)?;
        let parent = self.parent(id)?;
        Some(self.translate_to_absolute(parent, bounds))
    }

    /// Returns true when the node's viewport rectangle overlaps the viewport
    /// grown by `padding` on every side.
    pub fn is_node_in_view(&self, id: Id, padding: f64) -> bool {
        let (Some(bounds), Some(graph)) = (self.node_viewport_bounds(id), self.graph()) else {
            return false;
        };
        let view = graph.dimensions();
        bounds.right() > -padding
            && bounds.x() < view.width() + padding
            && bounds.bottom() > -padding
            && bounds.y() < view.height() + padding
    }

    /// Returns true when the element and all of its ancestors are visible and
    /// it is not folded into a collapsed group.
    pub fn is_displayed(&self, id: Id) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        element.is_visible()
            && self.ancestors(id).all(|ancestor| {
                self.element(ancestor).is_some_and(|element| {
                    element.is_visible() && !element.as_node().is_some_and(Node::is_collapsed)
                })
            })
    }

    /// Returns the displayed nodes whose bounds intersect the selection
    /// rectangle spanned by two viewport points, in draw order.
    pub fn nodes_in_selection(&self, start: Point, end: Point) -> Vec<Id> {
        let Some(graph_id) = self.graph else {
            return Vec::new();
        };
        let selection = self.translate_from_absolute(graph_id, Rect::from_corners(start, end));

        let mut selected: Vec<(Vec<usize>, Id)> = self
            .nodes()
            .map(Element::id)
            .filter(|id| self.graph_of(*id) == Some(graph_id) && self.is_displayed(*id))
            .filter(|id| {
                self.node_bounds(*id)
                    .is_some_and(|bounds| bounds.intersects(&selection))
            })
            .filter_map(|id| Some((self.order_key(id)?, id)))
            .collect();
        selected.sort_by(|(a, _), (b, _)| a.cmp(b));
        selected.into_iter().map(|(_, id)| id).collect()
    }

    /// Returns the graph's detail level, or `High` without a graph.
    pub fn details_level(&self) -> ScaleDetailsLevel {
        self.graph()
            .map_or(ScaleDetailsLevel::High, Graph::details_level)
    }

    pub(crate) fn element_mut(&mut self, id: Id) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub(crate) fn node_mut(&mut self, id: Id) -> Option<&mut Node> {
        self.element_mut(id).and_then(Element::as_node_mut)
    }

    pub(crate) fn edge_mut(&mut self, id: Id) -> Option<&mut Edge> {
        self.element_mut(id).and_then(Element::as_edge_mut)
    }

    pub(crate) fn graph_mut(&mut self) -> Option<&mut Graph> {
        let id = self.graph?;
        self.element_mut(id).and_then(Element::as_graph_mut)
    }

    pub(crate) fn insert(&mut self, element: Element) {
        if element.kind() == ModelKind::Graph {
            self.graph = Some(element.id());
        }
        self.elements.insert(element.id(), element);
    }

    pub(crate) fn take(&mut self, id: Id) -> Option<Element> {
        if self.graph == Some(id) {
            self.graph = None;
        }
        self.elements.shift_remove(&id)
    }

    /// Replaces the element stored under `id`, keeping its registry slot.
    pub(crate) fn replace(&mut self, id: Id, element: Element) {
        if element.kind() == ModelKind::Graph {
            self.graph = Some(id);
        } else if self.graph == Some(id) {
            self.graph = None;
        }
        if let Some(slot) = self.elements.get_mut(&id) {
            *slot = element;
        }
    }

    /// Renames a registry key in place, keeping its slot.
    pub(crate) fn rekey(&mut self, from: Id, to: Id) {
        let Some(index) = self.elements.get_index_of(&from) else {
            return;
        };
        let Some(mut element) = self.elements.shift_remove(&from) else {
            return;
        };
        element.set_id(to);
        self.elements.shift_insert(index, to, element);
        if self.graph == Some(from) {
            self.graph = Some(to);
        }
    }

    /// Reorders the registry to follow `order`. Ids missing from `order`
    /// keep their relative order after the listed ones.
    pub(crate) fn reorder(&mut self, order: &[Id]) {
        let position: std::collections::HashMap<Id, usize> = order
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();
        let rank = |id: &Id| position.get(id).copied().unwrap_or(usize::MAX);
        self.elements.sort_by(|a, _, b, _| rank(a).cmp(&rank(b)));
    }

    pub(crate) fn clear(&mut self) {
        self.elements.clear();
        self.graph = None;
    }
}
