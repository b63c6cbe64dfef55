//! Loading and saving [`Model`]s.
//!
//! Loading is split in two phases. Planning validates the
//! model against the current scene and computes the complete target tree
//! without touching anything: element kinds, fresh elements, child lists and
//! edge endpoints. Only a successful plan is committed, so a rejected model
//! leaves the scene exactly as it was.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use petgraph::{algo::toposort, graph::DiGraph};

use meridian_core::{
    geometry::{Dimensions, Point, Rect},
    identifier::Id,
    model::{EdgeModel, ElementModel, GraphModel, Model, ModelKind, NodeModel},
};

use crate::{
    element::{validate_scale_extent, Element},
    error::GraphError,
    event::Event,
};

use super::Controller;

/// The validated target tree of a model load.
struct Plan {
    merge: bool,
    graph: Id,
    /// Final ids in registry order: graph, nodes, edges.
    order: Vec<Id>,
    kinds: HashMap<Id, ModelKind>,
    /// Elements to create, or to recreate when their kind or type changed.
    fresh: HashMap<Id, Element>,
    children: HashMap<Id, Vec<Id>>,
    parents: HashMap<Id, Id>,
    endpoints: HashMap<Id, (Option<Id>, Option<Id>)>,
    /// Existing ids that are not part of the model.
    removed: Vec<Id>,
}

impl Controller {
    /// Builds or updates the scene from a model.
    ///
    /// Without `merge` the current scene is dropped and rebuilt. With
    /// `merge`, elements are matched by id: matches are updated in place
    /// with the fields present in the model, elements whose kind or type
    /// changed are recreated, new ids are created and ids missing from the
    /// model are removed. Children follow each element's `children` list;
    /// elements left without a parent are appended to the graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidModel`] for duplicate or empty ids,
    /// unknown child or endpoint references, endpoints that are not nodes,
    /// elements claimed by two parents, containment cycles, a missing graph,
    /// invalid scale settings or types no factory can build. The scene is
    /// left untouched in that case.
    pub fn from_model(&mut self, model: &Model, merge: bool) -> Result<(), GraphError> {
        let plan = self.plan_model(model, merge)?;
        self.commit_model(model, plan);
        Ok(())
    }

    fn plan_model(&self, model: &Model, merge: bool) -> Result<Plan, GraphError> {
        let existing_graph = if merge { self.scene.graph_id() } else { None };
        let graph = match (&model.graph, existing_graph) {
            (Some(graph), _) => Id::new(&graph.element.id),
            (None, Some(existing)) => existing,
            (None, None) => {
                return Err(GraphError::InvalidModel(
                    "the model has no graph".to_string(),
                ));
            }
        };

        let entries: Vec<(&ElementModel, ModelKind)> = model
            .graph
            .iter()
            .map(|graph| (&graph.element, ModelKind::Graph))
            .chain(model.nodes.iter().map(|node| (&node.element, ModelKind::Node)))
            .chain(model.edges.iter().map(|edge| (&edge.element, ModelKind::Edge)))
            .collect();

        let mut order = Vec::with_capacity(entries.len() + 1);
        let mut kinds = HashMap::with_capacity(entries.len() + 1);
        if model.graph.is_none() {
            order.push(graph);
            kinds.insert(graph, ModelKind::Graph);
        }
        for (element, kind) in &entries {
            if element.id.is_empty() {
                return Err(GraphError::InvalidModel(format!(
                    "a {kind} in the model has an empty id"
                )));
            }
            let id = Id::new(&element.id);
            if kinds.insert(id, *kind).is_some() {
                return Err(GraphError::InvalidModel(format!("duplicate id `{id}`")));
            }
            order.push(id);
        }

        let mut fresh = HashMap::new();
        for (element, kind) in &entries {
            let id = Id::new(&element.id);
            let unchanged = merge
                && self.scene.element(id).is_some_and(|existing| {
                    existing.kind() == *kind && existing.element_type() == element.element_type
                });
            if unchanged {
                continue;
            }
            let created = self
                .create_element(*kind, &element.element_type, id)
                .ok_or_else(|| {
                    GraphError::InvalidModel(format!(
                        "no factory builds a {kind} of type `{}`",
                        element.element_type
                    ))
                })?;
            if created.kind() != *kind || created.id() != id {
                return Err(GraphError::InvalidModel(format!(
                    "the factory for type `{}` returned {} `{}` instead of {kind} `{id}`",
                    element.element_type,
                    created.kind(),
                    created.id()
                )));
            }
            fresh.insert(id, created);
        }

        let (children, parents) = self.plan_children(&entries, &order, &kinds, graph, merge)?;
        check_acyclic(&order, &children)?;
        let endpoints = self.plan_endpoints(model, &kinds, &fresh, merge)?;

        if let Some(graph_model) = &model.graph {
            if let Some(scale) = graph_model.scale {
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(GraphError::InvalidModel(format!(
                        "graph scale must be a positive number, got {scale}"
                    )));
                }
            }
            if let Some(extent) = graph_model.scale_extent {
                validate_scale_extent(extent)
                    .map_err(|err| GraphError::InvalidModel(err.to_string()))?;
            }
        }

        let removed = if merge {
            self.scene
                .elements()
                .map(Element::id)
                .filter(|id| !kinds.contains_key(id))
                .collect()
        } else {
            Vec::new()
        };

        Ok(Plan {
            merge,
            graph,
            order,
            kinds,
            fresh,
            children,
            parents,
            endpoints,
            removed,
        })
    }

    /// Computes every element's final child list and parent.
    ///
    /// Explicit `children` lists win. In a merge, an element without one
    /// keeps its current children that survive and are not claimed
    /// elsewhere. Whatever is left without a parent goes to the graph.
    fn plan_children(
        &self,
        entries: &[(&ElementModel, ModelKind)],
        order: &[Id],
        kinds: &HashMap<Id, ModelKind>,
        graph: Id,
        merge: bool,
    ) -> Result<(HashMap<Id, Vec<Id>>, HashMap<Id, Id>), GraphError> {
        let mut children: HashMap<Id, Vec<Id>> = HashMap::new();
        let mut parents: HashMap<Id, Id> = HashMap::new();

        for (element, _) in entries {
            let Some(list) = &element.children else {
                continue;
            };
            let parent = Id::new(&element.id);
            let mut resolved = Vec::with_capacity(list.len());
            for child in list {
                let child = Id::new(child);
                match kinds.get(&child) {
                    None => {
                        return Err(GraphError::InvalidModel(format!(
                            "`{parent}` lists unknown child `{child}`"
                        )));
                    }
                    Some(ModelKind::Graph) => {
                        return Err(GraphError::InvalidModel(format!(
                            "`{parent}` lists the graph `{child}` as a child"
                        )));
                    }
                    Some(_) => {}
                }
                if let Some(other) = parents.insert(child, parent) {
                    return Err(GraphError::InvalidModel(format!(
                        "`{child}` is claimed by both `{other}` and `{parent}`"
                    )));
                }
                resolved.push(child);
            }
            children.insert(parent, resolved);
        }

        if merge {
            let explicit: HashSet<Id> = children.keys().copied().collect();
            for id in order {
                if explicit.contains(id) {
                    continue;
                }
                let kept: Vec<Id> = self
                    .scene
                    .children(*id)
                    .iter()
                    .copied()
                    .filter(|child| {
                        kinds.get(child).is_some_and(|kind| *kind != ModelKind::Graph)
                            && !parents.contains_key(child)
                    })
                    .collect();
                for child in &kept {
                    parents.insert(*child, *id);
                }
                if !kept.is_empty() {
                    children.insert(*id, kept);
                }
            }
        }

        let orphans: Vec<Id> = order
            .iter()
            .copied()
            .filter(|id| *id != graph && !parents.contains_key(id))
            .collect();
        for orphan in &orphans {
            parents.insert(*orphan, graph);
        }
        children.entry(graph).or_default().extend(orphans);

        Ok((children, parents))
    }

    /// Resolves each edge's final endpoints.
    ///
    /// Endpoints given in the model must name nodes of the model. Endpoints
    /// kept from an existing edge are dropped when their node is gone.
    fn plan_endpoints(
        &self,
        model: &Model,
        kinds: &HashMap<Id, ModelKind>,
        fresh: &HashMap<Id, Element>,
        merge: bool,
    ) -> Result<HashMap<Id, (Option<Id>, Option<Id>)>, GraphError> {
        let is_node = |id: &Id| kinds.get(id) == Some(&ModelKind::Node);
        let mut endpoints = HashMap::with_capacity(model.edges.len());

        for edge_model in &model.edges {
            let id = Id::new(&edge_model.element.id);
            let existing = if merge && !fresh.contains_key(&id) {
                self.scene.edge(id)
            } else {
                None
            };

            let resolve = |given: &Option<String>, current: Option<Id>| match given {
                Some(node) => {
                    let node = Id::new(node);
                    if is_node(&node) {
                        Ok(Some(node))
                    } else {
                        Err(GraphError::InvalidModel(format!(
                            "edge `{id}` refers to `{node}`, which is not a node of the model"
                        )))
                    }
                }
                None => Ok(current.filter(is_node)),
            };
            let source = resolve(&edge_model.source, existing.and_then(|edge| edge.source()))?;
            let target = resolve(&edge_model.target, existing.and_then(|edge| edge.target()))?;
            endpoints.insert(id, (source, target));
        }
        Ok(endpoints)
    }

    fn commit_model(&mut self, model: &Model, mut plan: Plan) {
        let old_parents: HashMap<Id, Id> = self
            .scene
            .elements()
            .filter_map(|element| Some((element.id(), element.parent()?)))
            .collect();
        let mut structure = Vec::new();
        let mut state = Vec::new();

        if plan.merge {
            let graph_replaced = self.scene.graph_id().is_some_and(|graph| {
                plan.removed.contains(&graph) || plan.fresh.contains_key(&graph)
            });
            if graph_replaced {
                self.teardown_layout();
            }
            for id in &plan.removed {
                if let Some(parent) = old_parents.get(id) {
                    if plan.kinds.contains_key(parent) {
                        structure.push(Event::ChildRemoved {
                            target: *parent,
                            child: *id,
                        });
                    }
                }
                self.scene.take(*id);
            }
        } else {
            self.teardown_layout();
            self.scene.clear();
        }

        let mut fresh: Vec<(Id, Element)> = plan.fresh.drain().collect();
        fresh.sort_by_key(|(id, _)| plan.order.iter().position(|other| other == id));
        let fresh_ids: HashSet<Id> = fresh.iter().map(|(id, _)| *id).collect();
        for (id, mut element) in fresh {
            if let Some(graph) = element.as_graph_mut() {
                if let Err(err) = graph.set_scale_extent(self.config.viewport().scale_extent()) {
                    warn!(err:%; "Ignoring configured scale extent");
                }
                graph.set_details_thresholds(self.config.viewport().details_thresholds());
            }
            if self.scene.contains(id) {
                self.scene.replace(id, element);
            } else {
                self.scene.insert(element);
            }
        }
        let is_kept = |id: Id| plan.merge && !fresh_ids.contains(&id);

        for id in &plan.order {
            let parent = plan.parents.get(id).copied();
            let children = plan.children.remove(id).unwrap_or_default();
            if let Some(element) = self.scene.element_mut(*id) {
                element.set_parent(parent);
                *element.children_mut() = children;
            }

            let old_parent = if plan.merge {
                old_parents.get(id).copied()
            } else {
                None
            };
            if old_parent == parent {
                continue;
            }
            if let Some(old_parent) = old_parent {
                if plan.kinds.contains_key(&old_parent) {
                    structure.push(Event::ChildRemoved {
                        target: old_parent,
                        child: *id,
                    });
                }
            }
            if let Some(parent) = parent {
                structure.push(Event::ChildAdded {
                    target: parent,
                    child: *id,
                });
            }
        }

        if let Some(graph_model) = &model.graph {
            self.apply_graph(graph_model, is_kept(plan.graph), &mut state);
        }
        for node_model in &model.nodes {
            let id = Id::new(&node_model.element.id);
            self.apply_node(id, node_model, is_kept(id), &mut state);
        }
        for edge_model in &model.edges {
            let id = Id::new(&edge_model.element.id);
            let (source, target) = plan.endpoints.get(&id).copied().unwrap_or_default();
            self.apply_edge(id, edge_model, source, target, is_kept(id), &mut state);
        }

        self.scene.reorder(&plan.order);

        info!(
            merge = plan.merge,
            elements = plan.order.len(),
            created = fresh_ids.len(),
            removed = plan.removed.len();
            "Loaded model"
        );
        self.emit_all(structure);
        self.emit_all(state);
    }

    fn apply_element(&mut self, id: Id, model: &ElementModel, kept: bool, state: &mut Vec<Event>) {
        let Some(element) = self.scene.element_mut(id) else {
            return;
        };
        if let Some(label) = &model.label {
            element.set_label(Some(label.clone()));
        }
        if let Some(visible) = model.visible {
            if element.set_visible_flag(visible) && kept {
                state.push(Event::VisibilityChanged {
                    element: id,
                    visible,
                });
            }
        }
        if let Some(data) = &model.data {
            element.set_data(Some(data.clone()));
        }
        if let Some(style) = &model.style {
            *element.style_mut() = style.clone();
        }
    }

    fn apply_graph(&mut self, model: &GraphModel, kept: bool, state: &mut Vec<Event>) {
        let id = Id::new(&model.element.id);
        self.apply_element(id, &model.element, kept, state);
        let Some(graph) = self.scene.graph_mut() else {
            return;
        };

        if let Some(extent) = model.scale_extent {
            if let Err(err) = graph.set_scale_extent(extent) {
                warn!(graph:% = id, err:%; "Ignoring invalid scale extent");
            }
        }
        if let Some(layers) = &model.layers {
            graph.set_layers(layers.clone());
        }

        let before = (graph.scale(), graph.position());
        if let Some(scale) = model.scale {
            let scale = graph.clamp_scale(scale);
            graph.set_scale(scale);
        }
        if model.x.is_some() || model.y.is_some() {
            let current = graph.position();
            graph.set_position(Point::new(
                model.x.unwrap_or(current.x()),
                model.y.unwrap_or(current.y()),
            ));
        }
        let moved = before != (graph.scale(), graph.position());

        let layout_changed = model.layout.is_some() && graph.layout() != model.layout.as_deref();
        if layout_changed {
            graph.set_layout(model.layout.clone());
        }

        if layout_changed && kept {
            self.teardown_layout();
        }
        if moved && kept {
            state.push(Event::GraphPositionChanged { graph: id });
        }
    }

    fn apply_node(&mut self, id: Id, model: &NodeModel, kept: bool, state: &mut Vec<Event>) {
        self.apply_element(id, &model.element, kept, state);

        // Collapsing snapshots derived bounds, which depend on the group flag.
        if let Some(group) = model.group {
            if let Some(node) = self.scene.node_mut(id) {
                node.set_group(group);
            }
        }
        if let Some(collapsed) = model.collapsed {
            if kept {
                self.change_collapsed(id, collapsed, state);
            } else if let Some(node) = self.scene.node_mut(id) {
                node.set_collapsed_flag(collapsed);
            }
        }

        let Some(node) = self.scene.node_mut(id) else {
            return;
        };
        if let Some(shape) = model.shape {
            node.set_shape(shape);
        }
        if let Some(status) = model.status {
            node.set_status(status);
        }
        if let Some(label_position) = model.label_position {
            node.set_label_position(label_position);
        }

        let has_position = model.x.is_some() || model.y.is_some();
        let has_dimensions = model.width.is_some() || model.height.is_some();
        let current = node.bounds();
        let position = Point::new(
            model.x.unwrap_or(current.x()),
            model.y.unwrap_or(current.y()),
        );
        let dimensions = Dimensions::new(
            model.width.unwrap_or(current.width()),
            model.height.unwrap_or(current.height()),
        );

        if kept {
            if has_dimensions {
                node.resize(dimensions);
            }
            if has_position && node.place(position) {
                state.push(Event::NodePositioned { node: id });
            }
        } else {
            node.restore(
                Rect::from_parts(position, dimensions),
                has_position,
                has_dimensions,
            );
        }
    }

    fn apply_edge(
        &mut self,
        id: Id,
        model: &EdgeModel,
        source: Option<Id>,
        target: Option<Id>,
        kept: bool,
        state: &mut Vec<Event>,
    ) {
        self.apply_element(id, &model.element, kept, state);
        let Some(edge) = self.scene.edge_mut(id) else {
            return;
        };
        edge.set_source(source);
        edge.set_target(target);
        if let Some(edge_style) = model.edge_style {
            edge.set_edge_style(edge_style);
        }
        if let Some(animation_speed) = model.animation_speed {
            edge.set_animation_speed(animation_speed);
        }
        if let Some(bendpoints) = &model.bendpoints {
            edge.set_bendpoints(
                bendpoints
                    .iter()
                    .map(|[x, y]| Point::new(*x, *y))
                    .collect(),
            );
        }
    }

    /// Serializes the attached tree.
    ///
    /// Nodes and edges appear in registry order. Scalar fields are always
    /// written; collections only when non-empty. Node coordinates are
    /// written once the node was positioned and sizes once they were set.
    /// Groups write their stored bounds, so reloading the model restores
    /// them exactly. Edge endpoints on detached nodes are written as unset.
    pub fn to_model(&self) -> Model {
        let Some(graph_id) = self.scene.graph_id() else {
            return Model::default();
        };
        let mut model = Model::default();
        let mut detached = 0usize;
        // Endpoints on detached nodes would not resolve when the model is loaded.
        let attached_endpoint = |end: Option<Id>| {
            end.filter(|node| self.scene.is_attached(*node))
                .map(String::from)
        };

        for element in self.scene.elements() {
            if !self.scene.is_attached(element.id()) {
                detached += 1;
                continue;
            }
            if let Some(graph) = element.as_graph() {
                let position = graph.position();
                model.graph = Some(GraphModel {
                    element: element_model(element),
                    layout: graph.layout().map(str::to_string),
                    x: Some(position.x()),
                    y: Some(position.y()),
                    scale: Some(graph.scale()),
                    scale_extent: Some(graph.scale_extent()),
                    layers: (!graph.layers().is_empty()).then(|| graph.layers().to_vec()),
                });
            } else if let Some(node) = element.as_node() {
                let bounds = node.bounds();
                let positioned = node.is_positioned();
                let sized = node.is_dimensions_initialized();
                model.nodes.push(NodeModel {
                    element: element_model(element),
                    x: positioned.then_some(bounds.x()),
                    y: positioned.then_some(bounds.y()),
                    width: sized.then_some(bounds.width()),
                    height: sized.then_some(bounds.height()),
                    group: Some(node.is_group()),
                    shape: Some(node.shape()),
                    status: Some(node.status()),
                    collapsed: Some(node.is_collapsed()),
                    label_position: Some(node.label_position()),
                });
            } else if let Some(edge) = element.as_edge() {
                model.edges.push(EdgeModel {
                    element: element_model(element),
                    source: attached_endpoint(edge.source()),
                    target: attached_endpoint(edge.target()),
                    edge_style: Some(edge.edge_style()),
                    animation_speed: Some(edge.animation_speed()),
                    bendpoints: (!edge.bendpoints().is_empty()).then(|| {
                        edge.bendpoints()
                            .iter()
                            .map(|point| [point.x(), point.y()])
                            .collect()
                    }),
                });
            }
        }

        if detached > 0 {
            debug!(graph:% = graph_id, detached; "Skipped detached elements");
        }
        model
    }
}

fn element_model(element: &Element) -> ElementModel {
    let children = element.children();
    ElementModel {
        id: String::from(element.id()),
        element_type: element.element_type().to_string(),
        label: element.label().map(str::to_string),
        visible: Some(element.is_visible()),
        children: (!children.is_empty())
            .then(|| children.iter().copied().map(String::from).collect()),
        data: element.data().cloned(),
        style: (!element.style().is_empty()).then(|| element.style().clone()),
    }
}

/// Rejects child lists that form a containment cycle.
fn check_acyclic(order: &[Id], children: &HashMap<Id, Vec<Id>>) -> Result<(), GraphError> {
    let mut containment = DiGraph::<Id, ()>::with_capacity(order.len(), order.len());
    let indices: HashMap<Id, _> = order
        .iter()
        .map(|id| (*id, containment.add_node(*id)))
        .collect();
    for (parent, list) in children {
        let Some(&parent_index) = indices.get(parent) else {
            continue;
        };
        for child in list {
            if let Some(&child_index) = indices.get(child) {
                containment.add_edge(parent_index, child_index, ());
            }
        }
    }

    toposort(&containment, None).map(|_| ()).map_err(|cycle| {
        let id = containment[cycle.node_id()];
        GraphError::InvalidModel(format!("containment cycle through `{id}`"))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use meridian_core::model::{EdgeStyle, NodeShape};

    use crate::{element::Edge, event::EventType};

    use super::super::tests::recorder;
    use super::*;

    fn base() -> Model {
        Model {
            graph: Some(GraphModel::new("g", "graph")),
            nodes: vec![
                NodeModel::new("grp", "group").with_children(["a", "b"]),
                NodeModel::new("a", "node").with_position(0.0, 0.0),
                NodeModel::new("b", "node").with_position(50.0, 0.0),
                NodeModel::new("c", "node"),
            ],
            edges: vec![EdgeModel::new("e", "edge", "a", "c")],
        }
    }

    fn children(controller: &Controller, id: &str) -> Vec<String> {
        controller
            .scene()
            .children(Id::new(id))
            .iter()
            .copied()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_build_from_scratch() {
        let mut controller = Controller::new();
        let events = recorder(&mut controller, &[EventType::ChildAdded, EventType::NodePositioned]);

        controller.from_model(&base(), false).unwrap();

        assert_eq!(children(&controller, "g"), ["grp", "c", "e"]);
        assert_eq!(children(&controller, "grp"), ["a", "b"]);
        assert!(controller.node(Id::new("a")).unwrap().is_positioned());
        assert!(!controller.node(Id::new("c")).unwrap().is_positioned());
        // One child-add per attachment, no positioning events for loaded nodes.
        assert_eq!(events.borrow().len(), 5);
        assert!(events
            .borrow()
            .iter()
            .all(|event| event.event_type() == EventType::ChildAdded));
    }

    #[test]
    fn test_rejects_bad_models() {
        let mut controller = Controller::new();

        let mut no_graph = base();
        no_graph.graph = None;
        assert!(matches!(
            controller.from_model(&no_graph, false),
            Err(GraphError::InvalidModel(_))
        ));

        let mut duplicate = base();
        duplicate.edges.push(EdgeModel::new("a", "edge", "a", "c"));
        assert!(controller.from_model(&duplicate, false).is_err());

        let mut two_parents = base();
        two_parents.nodes[3] = NodeModel::new("c", "node").with_children(["a"]);
        assert!(controller.from_model(&two_parents, false).is_err());

        let mut cycle = base();
        cycle.nodes[1] = NodeModel::new("a", "node").with_children(["grp"]);
        assert!(controller.from_model(&cycle, false).is_err());

        let mut bad_endpoint = base();
        bad_endpoint.edges[0].target = Some("g".to_string());
        assert!(controller.from_model(&bad_endpoint, false).is_err());

        let mut unknown_child = base();
        unknown_child.nodes[0] = NodeModel::new("grp", "group").with_children(["zz"]);
        assert!(controller.from_model(&unknown_child, false).is_err());

        let mut bad_scale = base();
        if let Some(graph) = bad_scale.graph.as_mut() {
            graph.scale = Some(0.0);
        }
        assert!(controller.from_model(&bad_scale, false).is_err());

        assert!(!controller.has_graph());
    }

    #[test]
    fn test_factory_refusal_is_invalid_model() {
        let mut controller = Controller::new();
        controller.register_element_factory(|kind: ModelKind, element_type: &str, _id: Id| {
            (element_type == "edge").then(|| Element::of_kind(kind, Id::new("other"), element_type))
        });
        assert!(matches!(
            controller.from_model(&base(), false),
            Err(GraphError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_merge_updates_in_place() {
        let mut controller = Controller::new();
        controller.from_model(&base(), false).unwrap();
        controller
            .element_mut(Id::new("a"))
            .unwrap()
            .set_state(json!({"selected": true}).as_object().cloned().unwrap_or_default());
        let events = recorder(
            &mut controller,
            &[
                EventType::ChildAdded,
                EventType::ChildRemoved,
                EventType::VisibilityChanged,
                EventType::NodePositioned,
            ],
        );

        let mut update = NodeModel::new("a", "node");
        update.element.visible = Some(false);
        update.element.label = Some("A".to_string());
        let mut placed = NodeModel::new("c", "node").with_position(5.0, 5.0);
        placed.shape = Some(NodeShape::Rect);
        let patch = Model {
            graph: None,
            nodes: vec![
                NodeModel::new("grp", "group"),
                update,
                NodeModel::new("b", "node"),
                placed,
            ],
            edges: vec![EdgeModel::new("e", "edge", "a", "c")],
        };
        controller.from_model(&patch, true).unwrap();

        let a = controller.element(Id::new("a")).unwrap();
        assert_eq!(a.label(), Some("A"));
        assert!(!a.is_visible());
        assert_eq!(a.state().get("selected"), Some(&json!(true)));
        assert_eq!(children(&controller, "grp"), ["a", "b"]);
        assert_eq!(controller.node(Id::new("c")).unwrap().shape(), NodeShape::Rect);
        assert_eq!(
            *events.borrow(),
            vec![
                Event::VisibilityChanged {
                    element: Id::new("a"),
                    visible: false
                },
                Event::NodePositioned {
                    node: Id::new("c")
                },
            ]
        );
    }

    #[test]
    fn test_merge_moves_removes_and_recreates() {
        let mut controller = Controller::new();
        controller.from_model(&base(), false).unwrap();
        let events = recorder(&mut controller, &[EventType::ChildAdded, EventType::ChildRemoved]);

        let patch = Model {
            graph: None,
            nodes: vec![
                NodeModel::new("grp", "group").with_children(["c"]),
                NodeModel::new("a", "node"),
                NodeModel::new("c", "database"),
            ],
            edges: vec![EdgeModel::new("e", "edge", "a", "c")],
        };
        controller.from_model(&patch, true).unwrap();

        assert!(!controller.scene().contains(Id::new("b")));
        assert_eq!(children(&controller, "grp"), ["c"]);
        assert_eq!(children(&controller, "g"), ["grp", "e", "a"]);
        assert_eq!(
            controller.element(Id::new("c")).unwrap().element_type(),
            "database"
        );
        // The recreated node is still the edge's target.
        assert_eq!(controller.edge(Id::new("e")).unwrap().target(), Some(Id::new("c")));

        let events = events.borrow();
        assert!(events.contains(&Event::ChildRemoved {
            target: Id::new("grp"),
            child: Id::new("b")
        }));
        assert!(events.contains(&Event::ChildRemoved {
            target: Id::new("grp"),
            child: Id::new("a")
        }));
        assert!(events.contains(&Event::ChildAdded {
            target: Id::new("g"),
            child: Id::new("a")
        }));
        assert!(events.contains(&Event::ChildAdded {
            target: Id::new("grp"),
            child: Id::new("c")
        }));
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_merge_keeps_endpoints_and_drops_dangling_ones() {
        let mut controller = Controller::new();
        controller.from_model(&base(), false).unwrap();

        let mut edge = EdgeModel::new("e", "edge", "a", "c");
        edge.source = None;
        edge.target = None;
        let patch = Model {
            graph: None,
            nodes: vec![NodeModel::new("a", "node")],
            edges: vec![edge],
        };
        controller.from_model(&patch, true).unwrap();

        let edge = controller.edge(Id::new("e")).unwrap();
        assert_eq!(edge.source(), Some(Id::new("a")));
        assert_eq!(edge.target(), None);
    }

    #[test]
    fn test_rebuild_drops_previous_scene() {
        let mut controller = Controller::new();
        controller.from_model(&base(), false).unwrap();

        let other = Model {
            graph: Some(GraphModel::new("g2", "graph")),
            nodes: vec![NodeModel::new("x", "node")],
            edges: vec![],
        };
        controller.from_model(&other, false).unwrap();

        assert_eq!(controller.graph_id(), Some(Id::new("g2")));
        assert_eq!(controller.scene().len(), 2);
    }

    #[test]
    fn test_to_model_writes_scalars_and_skips_empty_collections() {
        let mut controller = Controller::new();
        controller.from_model(&base(), false).unwrap();
        if let Some(edge) = controller.edge_mut(Id::new("e")) {
            edge.set_edge_style(EdgeStyle::Dashed);
        }

        let model = controller.to_model();

        let graph = model.graph.unwrap();
        assert_eq!(graph.scale, Some(1.0));
        assert_eq!(graph.layers, Some(vec!["default".to_string()]));
        assert_eq!(
            graph.element.children,
            Some(vec!["grp".to_string(), "c".to_string(), "e".to_string()])
        );

        let c = &model.nodes[3];
        assert_eq!(c.id(), "c");
        assert_eq!(c.x, None);
        assert_eq!(c.width, None);
        assert_eq!(c.element.children, None);
        assert_eq!(c.element.style, None);
        assert_eq!(c.group, Some(false));

        assert_eq!(model.edges[0].edge_style, Some(EdgeStyle::Dashed));
        assert_eq!(model.edges[0].bendpoints, None);
    }

    #[test]
    fn test_to_model_skips_detached_elements() {
        let mut controller = Controller::new();
        controller.from_model(&base(), false).unwrap();
        controller.remove(Id::new("c")).unwrap();
        controller
            .add_element(Element::new("f", "edge", Edge::default()), None)
            .unwrap();

        let model = controller.to_model();
        assert!(model.nodes.iter().all(|node| node.id() != "c"));
        assert_eq!(model.edges.len(), 2);
        assert_eq!(model.edges[0].source.as_deref(), Some("a"));
        assert_eq!(model.edges[0].target, None);

        let mut reloaded = Controller::new();
        reloaded.from_model(&model, false).unwrap();
        assert_eq!(reloaded.edge(Id::new("e")).unwrap().target(), None);
    }

    #[test]
    fn test_merge_groups_before_collapsing() {
        let model = Model {
            graph: Some(GraphModel::new("g", "graph")),
            nodes: vec![
                NodeModel::new("p", "node")
                    .with_children(["c"])
                    .with_position(0.0, 0.0)
                    .with_dimensions(10.0, 10.0),
                NodeModel::new("c", "node")
                    .with_position(100.0, 100.0)
                    .with_dimensions(50.0, 20.0),
            ],
            edges: vec![],
        };
        let mut controller = Controller::new();
        controller.from_model(&model, false).unwrap();

        let mut update = model.clone();
        update.nodes[0].group = Some(true);
        update.nodes[0].collapsed = Some(true);
        update.nodes[0].x = None;
        update.nodes[0].y = None;
        update.nodes[0].width = None;
        update.nodes[0].height = None;
        controller.from_model(&update, true).unwrap();

        // The collapsed group keeps the extent its child gave it.
        let group = controller.node(Id::new("p")).unwrap();
        assert!(group.is_group());
        assert!(group.is_collapsed());
        assert_eq!(group.bounds(), Rect::new(100.0, 100.0, 50.0, 20.0));
    }
}
