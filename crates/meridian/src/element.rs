//! Scene graph elements.
//!
//! Every item in a scene is an [`Element`]: a set of fields shared by all
//! kinds (id, type, label, visibility, style, data, state and tree links)
//! plus a kind-specific [`ElementPart`].
//!
//! # Overview
//!
//! - [`Element`] - The common element record
//! - [`ElementPart`] - Kind-specific payload
//! - [`Node`] - Positioned box, optionally a group of other nodes
//! - [`Edge`] - Connection between two nodes
//! - [`Graph`] - Root of the tree, owning the viewport transform
//!
//! Tree links are plain ids. The parent link is a lookup aid only; ownership
//! is expressed by membership in the parent's children list, and both are
//! maintained together by the [`Controller`](crate::Controller). The fields
//! that carry tree or event semantics (parent, children, visibility, node
//! placement, edge endpoints, graph viewport) are changed through the
//! controller, everything else can be edited directly through
//! [`Controller::element_mut`](crate::Controller::element_mut).

mod edge;
mod graph;
mod node;

pub use edge::Edge;
pub use graph::Graph;
pub use node::Node;

pub(crate) use graph::validate_scale_extent;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use meridian_core::{
    identifier::Id,
    model::{ModelKind, StyleMap},
};

use crate::error::GraphError;

/// Kind-specific part of an element.
#[derive(Debug, Clone)]
pub enum ElementPart {
    Graph(Graph),
    Node(Node),
    Edge(Edge),
}

impl ElementPart {
    /// Creates the default part for a kind.
    pub fn for_kind(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Graph => Self::Graph(Graph::default()),
            ModelKind::Node => Self::Node(Node::default()),
            ModelKind::Edge => Self::Edge(Edge::default()),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Graph(_) => ModelKind::Graph,
            Self::Node(_) => ModelKind::Node,
            Self::Edge(_) => ModelKind::Edge,
        }
    }
}

impl From<Graph> for ElementPart {
    fn from(graph: Graph) -> Self {
        Self::Graph(graph)
    }
}

impl From<Node> for ElementPart {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Edge> for ElementPart {
    fn from(edge: Edge) -> Self {
        Self::Edge(edge)
    }
}

/// A graph, node or edge in the scene.
///
/// # Examples
///
/// ```
/// # use meridian::element::{Element, Node};
/// # use meridian_core::geometry::Rect;
/// # use meridian_core::model::ModelKind;
/// let element = Element::new("db", "database", Node::default().with_bounds(Rect::new(0.0, 0.0, 80.0, 40.0)))
///     .with_label("Primary DB");
///
/// assert_eq!(element.kind(), ModelKind::Node);
/// assert_eq!(element.label(), Some("Primary DB"));
/// assert!(element.as_node().unwrap().is_positioned());
/// ```
#[derive(Debug, Clone)]
pub struct Element {
    id: Id,
    element_type: String,
    label: Option<String>,
    visible: bool,
    data: Option<Value>,
    style: StyleMap,
    state: Map<String, Value>,
    parent: Option<Id>,
    children: Vec<Id>,
    part: ElementPart,
}

impl Element {
    pub fn new(
        id: impl Into<Id>,
        element_type: impl Into<String>,
        part: impl Into<ElementPart>,
    ) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            label: None,
            visible: true,
            data: None,
            style: StyleMap::new(),
            state: Map::new(),
            parent: None,
            children: Vec::new(),
            part: part.into(),
        }
    }

    /// Creates an element of the given kind with default kind-specific fields.
    pub fn of_kind(kind: ModelKind, id: impl Into<Id>, element_type: impl Into<String>) -> Self {
        Self::new(id, element_type, ElementPart::for_kind(kind))
    }

    pub fn graph(id: impl Into<Id>, element_type: impl Into<String>) -> Self {
        Self::new(id, element_type, Graph::default())
    }

    pub fn node(id: impl Into<Id>, element_type: impl Into<String>) -> Self {
        Self::new(id, element_type, Node::default())
    }

    pub fn edge(id: impl Into<Id>, element_type: impl Into<String>) -> Self {
        Self::new(id, element_type, Edge::default())
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_style(mut self, style: StyleMap) -> Self {
        self.style = style;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> ModelKind {
        self.part.kind()
    }

    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// Changes the type string. Factories are not consulted again.
    pub fn set_element_type(&mut self, element_type: impl Into<String>) {
        self.element_type = element_type.into();
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: Option<Value>) {
        self.data = data;
    }

    pub fn style(&self) -> &StyleMap {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut StyleMap {
        &mut self.style
    }

    /// Reads a style entry as a typed value.
    ///
    /// Returns `Ok(None)` when the key is not set.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Style`] when the stored value does not
    /// deserialize into `T`.
    pub fn style_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, GraphError> {
        self.style
            .get(key)
            .map(|value| {
                T::deserialize(value).map_err(|err| GraphError::Style {
                    key: key.to_string(),
                    message: err.to_string(),
                })
            })
            .transpose()
    }

    /// Stores a typed value in the style map.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Style`] when the value cannot be serialized.
    pub fn set_style_value<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), GraphError> {
        let value = serde_json::to_value(value).map_err(|err| GraphError::Style {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        self.style.insert(key.to_string(), value);
        Ok(())
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    /// Merges the given entries into the state bag, replacing existing keys.
    pub fn set_state(&mut self, state: Map<String, Value>) {
        self.state.extend(state);
    }

    /// Returns the id of the element whose children list holds this element.
    pub fn parent(&self) -> Option<Id> {
        self.parent
    }

    pub fn children(&self) -> &[Id] {
        &self.children
    }

    pub fn part(&self) -> &ElementPart {
        &self.part
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match &self.part {
            ElementPart::Graph(graph) => Some(graph),
            _ => None,
        }
    }

    pub fn as_graph_mut(&mut self) -> Option<&mut Graph> {
        match &mut self.part {
            ElementPart::Graph(graph) => Some(graph),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match &self.part {
            ElementPart::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match &mut self.part {
            ElementPart::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match &self.part {
            ElementPart::Edge(edge) => Some(edge),
            _ => None,
        }
    }

    pub fn as_edge_mut(&mut self) -> Option<&mut Edge> {
        match &mut self.part {
            ElementPart::Edge(edge) => Some(edge),
            _ => None,
        }
    }

    pub(crate) fn set_id(&mut self, id: Id) {
        self.id = id;
    }

    /// Returns true when the flag changed.
    pub(crate) fn set_visible_flag(&mut self, visible: bool) -> bool {
        let changed = self.visible != visible;
        self.visible = visible;
        changed
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Id>) {
        self.parent = parent;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Id> {
        &mut self.children
    }
}
