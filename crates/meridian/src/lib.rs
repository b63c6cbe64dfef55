//! Meridian - the structural core of an interactive diagram engine.
//!
//! A scene is a tree of nodes and edges under a single root graph. The
//! [`Controller`] owns that tree: it loads and saves it as a
//! [`Model`](model::Model), keeps parent and child links consistent under
//! edits, drives pluggable layouts, moves the viewport and tells observers
//! about every change through a typed event bus. Drawing is left to the
//! host, which only sees read-only [`Scene`] views and opaque components.
//!
//! # Example
//!
//! ```
//! use meridian::{Controller, event::EventType, geometry::Dimensions};
//! use meridian::model::{EdgeModel, GraphModel, Model, NodeModel};
//!
//! let model = Model {
//!     graph: Some(GraphModel::new("g", "graph")),
//!     nodes: vec![
//!         NodeModel::new("a", "node").with_position(0.0, 0.0).with_dimensions(100.0, 50.0),
//!         NodeModel::new("b", "node").with_position(200.0, 0.0).with_dimensions(100.0, 50.0),
//!     ],
//!     edges: vec![EdgeModel::new("a-b", "edge", "a", "b")],
//! };
//!
//! let mut controller = Controller::new();
//! controller.add_event_listener(EventType::GraphPositionChanged, |event, scene| {
//!     println!("{} moved, scale {:?}", event.event_type(), scene.graph().map(|g| g.scale()));
//!     Ok(())
//! });
//!
//! controller.from_model(&model, false).unwrap();
//! controller.set_graph_dimensions(Dimensions::new(600.0, 100.0)).unwrap();
//! controller.fit(0.0, None).unwrap();
//!
//! assert_eq!(controller.graph().unwrap().scale(), 2.0);
//! assert_eq!(controller.to_model(), {
//!     let mut reloaded = Controller::new();
//!     reloaded.from_model(&controller.to_model(), false).unwrap();
//!     reloaded.to_model()
//! });
//! ```

pub mod anchor;
pub mod config;
pub mod element;
pub mod event;
pub mod factory;
pub mod layout;
pub mod render;
pub mod scene;
pub mod viewport;

mod controller;
mod error;

pub use meridian_core::{geometry, identifier, model};

pub use controller::Controller;
pub use error::GraphError;
pub use scene::Scene;
