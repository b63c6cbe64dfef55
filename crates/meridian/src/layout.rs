//! Layout contract.
//!
//! Concrete layout algorithms live outside this crate. They plug in through
//! the [`Layout`] trait and are created on demand by registered
//! [`LayoutFactory`](crate::factory::LayoutFactory) instances.
//!
//! A layout never touches the scene directly. It reads through a
//! [`LayoutScope`] and stages node placements on it; the controller commits
//! the staged placements only after the call returns successfully, so a
//! failed or interrupted step never leaves a half-placed node behind.
//!
//! # Lifecycle
//!
//! [`LayoutSession`] wraps a layout instance and enforces its state machine:
//!
//! ```text
//! Uninitialized ──run──► Running ──settled / stop──► Stopped ──run──► Running
//!        │                  │                           │
//!        └──────────────────┴─────────destroy───────────┴──► Destroyed
//! ```
//!
//! Every call on a destroyed session fails with
//! [`GraphError::InvalidState`].

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use meridian_core::{
    geometry::{Dimensions, Point, Rect},
    identifier::Id,
};

use crate::{error::GraphError, scene::Scene};

/// Whether a layout run has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStatus {
    Settled,
    /// More work remains; the host should call `step` again.
    Pending,
}

/// A layout algorithm.
pub trait Layout {
    /// Starts a run. Incremental layouts return [`LayoutStatus::Pending`]
    /// and continue in [`Layout::step`].
    fn layout(&mut self, scope: &mut LayoutScope<'_>) -> Result<LayoutStatus, GraphError>;

    /// Advances an incremental run.
    fn step(&mut self, _scope: &mut LayoutScope<'_>) -> Result<LayoutStatus, GraphError> {
        Ok(LayoutStatus::Settled)
    }

    /// Halts the current run. Outstanding work is discarded.
    fn stop(&mut self) {}

    /// Releases any resources held by the layout.
    fn destroy(&mut self) {}

    /// Returns algorithm-specific options, if the layout exposes any.
    fn options(&self) -> Option<Value> {
        None
    }
}

/// Lifecycle state of a [`LayoutSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    Uninitialized,
    Running,
    Stopped,
    Destroyed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Placement {
    pub(crate) position: Option<Point>,
    pub(crate) dimensions: Option<Dimensions>,
}

/// Read access to the scene plus a staging area for node placements.
pub struct LayoutScope<'a> {
    scene: &'a Scene,
    graph: Id,
    placements: IndexMap<Id, Placement>,
}

impl<'a> LayoutScope<'a> {
    pub(crate) fn new(scene: &'a Scene, graph: Id) -> Self {
        Self {
            scene,
            graph,
            placements: IndexMap::new(),
        }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn graph(&self) -> Id {
        self.graph
    }

    /// Returns the viewport size of the graph being laid out.
    pub fn viewport(&self) -> Dimensions {
        self.scene
            .graph()
            .map(|graph| graph.dimensions())
            .unwrap_or_default()
    }

    /// Returns the nodes the layout should place.
    pub fn nodes(&self) -> Vec<Id> {
        self.scene.positionable_children(self.graph)
    }

    /// Returns the node's bounds including placements staged so far.
    pub fn bounds(&self, id: Id) -> Option<Rect> {
        let mut bounds = self.scene.node_bounds(id)?;
        if let Some(placement) = self.placements.get(&id) {
            if let Some(position) = placement.position {
                bounds = bounds.with_position(position);
            }
            if let Some(dimensions) = placement.dimensions {
                bounds = bounds.with_dimensions(dimensions);
            }
        }
        Some(bounds)
    }

    /// Stages a new position for a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when `id` is not a node.
    pub fn set_position(&mut self, id: Id, position: Point) -> Result<(), GraphError> {
        self.placement_mut(id)?.position = Some(position);
        Ok(())
    }

    /// Stages new dimensions for a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when `id` is not a node.
    pub fn set_dimensions(&mut self, id: Id, dimensions: Dimensions) -> Result<(), GraphError> {
        self.placement_mut(id)?.dimensions = Some(dimensions);
        Ok(())
    }

    pub fn staged_len(&self) -> usize {
        self.placements.len()
    }

    fn placement_mut(&mut self, id: Id) -> Result<&mut Placement, GraphError> {
        if self.scene.node(id).is_none() {
            return Err(GraphError::InvalidOperation(format!(
                "layout cannot place `{id}`: not a node"
            )));
        }
        Ok(self.placements.entry(id).or_default())
    }

    pub(crate) fn into_placements(self) -> IndexMap<Id, Placement> {
        self.placements
    }
}

/// A layout instance bound to its lifecycle state.
pub struct LayoutSession {
    layout_type: String,
    layout: Box<dyn Layout>,
    state: LayoutState,
}

impl LayoutSession {
    pub fn new(layout_type: impl Into<String>, layout: Box<dyn Layout>) -> Self {
        Self {
            layout_type: layout_type.into(),
            layout,
            state: LayoutState::Uninitialized,
        }
    }

    pub fn layout_type(&self) -> &str {
        &self.layout_type
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    /// Returns the layout's options.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidState`] after [`LayoutSession::destroy`].
    pub fn options(&self) -> Result<Option<Value>, GraphError> {
        self.ensure_alive("options")?;
        Ok(self.layout.options())
    }

    /// Starts a run, from any state but `Destroyed`.
    pub fn run(&mut self, scope: &mut LayoutScope<'_>) -> Result<LayoutStatus, GraphError> {
        self.ensure_alive("layout")?;
        self.state = LayoutState::Running;
        debug!(layout_type = self.layout_type.as_str(); "Starting layout run");
        let result = self.layout.layout(scope);
        self.settle(result)
    }

    /// Advances a running layout.
    ///
    /// A stopped session reports [`LayoutStatus::Settled`] without calling
    /// the layout.
    pub fn step(&mut self, scope: &mut LayoutScope<'_>) -> Result<LayoutStatus, GraphError> {
        match self.state {
            LayoutState::Destroyed => Err(self.destroyed_error("step")),
            LayoutState::Uninitialized => Err(GraphError::InvalidState(format!(
                "layout `{}` has not been started",
                self.layout_type
            ))),
            LayoutState::Stopped => Ok(LayoutStatus::Settled),
            LayoutState::Running => {
                let result = self.layout.step(scope);
                self.settle(result)
            }
        }
    }

    /// Halts the run. Idempotent from every state but `Destroyed`.
    pub fn stop(&mut self) -> Result<(), GraphError> {
        self.ensure_alive("stop")?;
        if self.state == LayoutState::Running {
            self.layout.stop();
            debug!(layout_type = self.layout_type.as_str(); "Layout stopped");
        }
        self.state = LayoutState::Stopped;
        Ok(())
    }

    /// Releases the layout. The session is unusable afterwards.
    pub fn destroy(&mut self) -> Result<(), GraphError> {
        self.ensure_alive("destroy")?;
        if self.state == LayoutState::Running {
            self.layout.stop();
        }
        self.layout.destroy();
        self.state = LayoutState::Destroyed;
        debug!(layout_type = self.layout_type.as_str(); "Layout destroyed");
        Ok(())
    }

    fn settle(
        &mut self,
        result: Result<LayoutStatus, GraphError>,
    ) -> Result<LayoutStatus, GraphError> {
        match result {
            Ok(LayoutStatus::Pending) => Ok(LayoutStatus::Pending),
            Ok(LayoutStatus::Settled) => {
                self.state = LayoutState::Stopped;
                Ok(LayoutStatus::Settled)
            }
            Err(err) => {
                self.state = LayoutState::Stopped;
                Err(err)
            }
        }
    }

    fn ensure_alive(&self, operation: &str) -> Result<(), GraphError> {
        if self.state == LayoutState::Destroyed {
            return Err(self.destroyed_error(operation));
        }
        Ok(())
    }

    fn destroyed_error(&self, operation: &str) -> GraphError {
        GraphError::InvalidState(format!(
            "cannot {operation}: layout `{}` has been destroyed",
            self.layout_type
        ))
    }
}

impl fmt::Debug for LayoutSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutSession")
            .field("layout_type", &self.layout_type)
            .field("state", &self.state)
            .finish()
    }
}
