//! Wire model exchanged with the controller.
//!
//! A [`Model`] is the only persisted/exchanged representation of a scene. It
//! is a flat description: every element is keyed by a globally unique string
//! id and containment is expressed through `children` id lists. The
//! controller turns a model into a live element tree and back.
//!
//! Optional fields follow "absent means unchanged" semantics when a model is
//! merged into an existing scene, and "absent means default" when a scene is
//! built from scratch. Absent fields are omitted when serializing.
//!
//! # Example
//!
//! ```
//! # use meridian_core::model::{EdgeModel, GraphModel, Model, NodeModel};
//! let model = Model {
//!     graph: Some(GraphModel::new("g", "graph")),
//!     nodes: vec![
//!         NodeModel::new("a", "node").with_position(0.0, 0.0),
//!         NodeModel::new("b", "node").with_position(100.0, 0.0),
//!     ],
//!     edges: vec![EdgeModel::new("a-b", "edge", "a", "b")],
//! };
//!
//! let json = serde_json::to_string(&model).unwrap();
//! let parsed: Model = serde_json::from_str(&json).unwrap();
//! assert_eq!(parsed, model);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `[x, y]` pair used for bendpoints on the wire.
pub type PointTuple = [f64; 2];

/// `[min scale, max scale]`.
pub type ScaleExtent = [f64; 2];

/// Free-form style map attached to an element.
pub type StyleMap = Map<String, Value>;

/// The fixed category of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Graph,
    Node,
    Edge,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Graph => "graph",
            ModelKind::Node => "node",
            ModelKind::Edge => "edge",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    /// Kept for older models; rendered like an ellipse.
    Circle,
    #[default]
    Ellipse,
    Rect,
    Rhombus,
    Trapezoid,
    Hexagon,
    Octagon,
    Stadium,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Default,
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeStyle {
    #[default]
    Default,
    Solid,
    Dotted,
    Dashed,
    DashedMd,
    DashedLg,
    DashedXl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeAnimationSpeed {
    #[default]
    None,
    Slow,
    MediumSlow,
    Medium,
    MediumFast,
    Fast,
}

/// Where a node's label is drawn relative to the node body.
///
/// Unlike the other enumerations this one travels as its index:
/// `0` top, `1` left, `2` right, `3` bottom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum LabelPosition {
    Top,
    Left,
    Right,
    #[default]
    Bottom,
}

impl From<LabelPosition> for u8 {
    fn from(position: LabelPosition) -> Self {
        match position {
            LabelPosition::Top => 0,
            LabelPosition::Left => 1,
            LabelPosition::Right => 2,
            LabelPosition::Bottom => 3,
        }
    }
}

impl TryFrom<u8> for LabelPosition {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(LabelPosition::Top),
            1 => Ok(LabelPosition::Left),
            2 => Ok(LabelPosition::Right),
            3 => Ok(LabelPosition::Bottom),
            other => Err(format!("label position must be 0 to 3, got {other}")),
        }
    }
}

/// Rendering-fidelity tier derived from the graph scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleDetailsLevel {
    #[default]
    High,
    Medium,
    Low,
}

/// Scale cutoffs used to derive a [`ScaleDetailsLevel`].
///
/// A scale at or above `medium` renders at high detail, at or above `low`
/// renders at medium detail, anything smaller renders at low detail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleDetailsThresholds {
    pub low: f64,
    pub medium: f64,
}

/// Fields shared by every element model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementModel {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleMap>,
}

impl ElementModel {
    pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeModel {
    #[serde(flatten)]
    pub element: ElementModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<NodeShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_position: Option<LabelPosition>,
}

impl NodeModel {
    pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            element: ElementModel::new(id, element_type),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_dimensions(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Marks the node as a group containing the given child ids.
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group = Some(true);
        self.element.children = Some(children.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = Some(collapsed);
        self
    }

    pub fn id(&self) -> &str {
        &self.element.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeModel {
    #[serde(flatten)]
    pub element: ElementModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_style: Option<EdgeStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_speed: Option<EdgeAnimationSpeed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bendpoints: Option<Vec<PointTuple>>,
}

impl EdgeModel {
    pub fn new(
        id: impl Into<String>,
        element_type: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            element: ElementModel::new(id, element_type),
            source: Some(source.into()),
            target: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn with_bendpoints(mut self, bendpoints: Vec<PointTuple>) -> Self {
        self.bendpoints = Some(bendpoints);
        self
    }

    pub fn id(&self) -> &str {
        &self.element.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphModel {
    #[serde(flatten)]
    pub element: ElementModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_extent: Option<ScaleExtent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,
}

impl GraphModel {
    pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            element: ElementModel::new(id, element_type),
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.element.id
    }
}

/// A complete scene description.
///
/// Absent and empty `nodes`/`edges` lists are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeModel>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_node_model_wire_names() {
        let node = NodeModel {
            label_position: Some(LabelPosition::Right),
            shape: Some(NodeShape::Rhombus),
            ..NodeModel::new("n1", "service").with_position(1.0, 2.0)
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "n1",
                "type": "service",
                "x": 1.0,
                "y": 2.0,
                "shape": "rhombus",
                "labelPosition": 2
            })
        );
    }

    #[test]
    fn test_label_position_travels_as_index() {
        let node: NodeModel = serde_json::from_value(json!({
            "id": "n1",
            "type": "service",
            "labelPosition": 0
        }))
        .unwrap();
        assert_eq!(node.label_position, Some(LabelPosition::Top));

        let out_of_range = serde_json::from_value::<NodeModel>(json!({
            "id": "n1",
            "type": "service",
            "labelPosition": 4
        }));
        assert!(out_of_range.is_err());

        let by_name = serde_json::from_value::<NodeModel>(json!({
            "id": "n1",
            "type": "service",
            "labelPosition": "top"
        }));
        assert!(by_name.is_err());
    }

    #[test]
    fn test_edge_model_parses_bendpoints() {
        let edge: EdgeModel = serde_json::from_value(json!({
            "id": "e1",
            "type": "edge",
            "source": "a",
            "target": "b",
            "edgeStyle": "dashedMd",
            "animationSpeed": "mediumFast",
            "bendpoints": [[0, 0], [5, 5]]
        }))
        .unwrap();

        assert_eq!(edge.source.as_deref(), Some("a"));
        assert_eq!(edge.edge_style, Some(EdgeStyle::DashedMd));
        assert_eq!(edge.animation_speed, Some(EdgeAnimationSpeed::MediumFast));
        assert_eq!(edge.bendpoints, Some(vec![[0.0, 0.0], [5.0, 5.0]]));
    }

    #[test]
    fn test_graph_model_scale_extent() {
        let graph: GraphModel = serde_json::from_value(json!({
            "id": "g",
            "type": "graph",
            "scaleExtent": [0.5, 2],
            "layers": ["bottom", "top"]
        }))
        .unwrap();

        assert_eq!(graph.scale_extent, Some([0.5, 2.0]));
        assert_eq!(graph.layers.as_deref(), Some(&["bottom".to_string(), "top".to_string()][..]));
    }

    #[test]
    fn test_model_empty_lists_are_omitted() {
        let model = Model {
            graph: Some(GraphModel::new("g", "graph")),
            ..Model::default()
        };

        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value, json!({ "graph": { "id": "g", "type": "graph" } }));

        let parsed: Model = serde_json::from_value(json!({ "nodes": [] })).unwrap();
        assert!(parsed.nodes.is_empty());
        assert!(parsed.graph.is_none());
    }

    #[test]
    fn test_with_children_marks_group() {
        let group = NodeModel::new("g1", "group").with_children(["a", "b"]);
        assert_eq!(group.group, Some(true));
        assert_eq!(
            group.element.children,
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_model_kind_display() {
        assert_eq!(ModelKind::Graph.to_string(), "graph");
        assert_eq!(ModelKind::Edge.to_string(), "edge");
    }
}
