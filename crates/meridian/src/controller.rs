//! The scene controller.
//!
//! [`Controller`] is the single owner of a scene: it holds the element
//! registry, the event bus, the factory chains, the key/value store and the
//! active layout session. Every edit that has tree or event semantics goes
//! through it, and each such edit fires its events only after the change is
//! complete.
//!
//! The implementation is split by concern:
//!
//! - `tree` - attaching, detaching, reordering and renaming elements
//! - `model_sync` - loading and saving [`Model`](meridian_core::model::Model)s
//! - `viewport` - zoom, pan, fit and collapse operations on the graph

mod model_sync;
mod tree;
mod viewport;

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde_json::{Map, Value};

use meridian_core::{
    geometry::{Dimensions, Point, Rect},
    identifier::Id,
    model::ModelKind,
};

use crate::{
    config::ControllerConfig,
    element::{Edge, Element, Graph, Node},
    error::GraphError,
    event::{Dispatch, Event, EventBus, EventType, ListenerError, ListenerId},
    factory::{
        ComponentFactory, ComponentHandle, DefaultElementFactory, ElementFactory, FactoryChain,
        LayoutFactory,
    },
    layout::{Layout, LayoutScope, LayoutSession, LayoutState, LayoutStatus, Placement},
    render::{RenderConstraint, ViewPaddingSettings},
    scene::Scene,
};

/// Owner of one scene graph.
///
/// # Examples
///
/// ```
/// # use meridian::Controller;
/// # use meridian_core::model::{GraphModel, Model, NodeModel};
/// let mut controller = Controller::new();
/// let model = Model {
///     graph: Some(GraphModel::new("g", "graph")),
///     nodes: vec![NodeModel::new("a", "node").with_position(10.0, 20.0)],
///     edges: vec![],
/// };
///
/// controller.from_model(&model, false).unwrap();
/// assert!(controller.has_graph());
/// assert_eq!(controller.node_bounds("a".into()).unwrap().x(), 10.0);
/// ```
pub struct Controller {
    scene: Scene,
    bus: EventBus,
    element_factories: FactoryChain<dyn ElementFactory>,
    layout_factories: FactoryChain<dyn LayoutFactory>,
    component_factories: FactoryChain<dyn ComponentFactory>,
    store: Map<String, Value>,
    state: Map<String, Value>,
    layout_session: Option<LayoutSession>,
    render_constraint: RenderConstraint,
    fit_on_layout: Option<f64>,
    config: ControllerConfig,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Creates a controller with the default configuration.
    pub fn new() -> Self {
        let mut element_factories: FactoryChain<dyn ElementFactory> = FactoryChain::default();
        element_factories.register(Box::new(DefaultElementFactory));

        Self {
            scene: Scene::default(),
            bus: EventBus::new(),
            element_factories,
            layout_factories: FactoryChain::default(),
            component_factories: FactoryChain::default(),
            store: Map::new(),
            state: Map::new(),
            layout_session: None,
            render_constraint: RenderConstraint::default(),
            fit_on_layout: None,
            config: ControllerConfig::default(),
        }
    }

    /// Creates a controller from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidViewPadding`] when the render section
    /// carries conflicting padding settings.
    pub fn with_config(config: ControllerConfig) -> Result<Self, GraphError> {
        let padding = config.render().view_padding()?;
        let mut controller = Self::new();
        controller.render_constraint = RenderConstraint::new(config.render().constrained(), padding);
        controller.fit_on_layout = config
            .layout()
            .fit_on_layout()
            .then(|| config.layout().fit_padding());
        controller.config = config;
        Ok(controller)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns the read-only element registry.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn has_graph(&self) -> bool {
        self.scene.has_graph()
    }

    pub fn graph_id(&self) -> Option<Id> {
        self.scene.graph_id()
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.scene.graph()
    }

    /// Returns the graph for direct edits of event-free settings such as
    /// the viewport size, scale extent and layers.
    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.scene.graph_mut()
    }

    pub fn element(&self, id: Id) -> Option<&Element> {
        self.scene.element(id)
    }

    /// Returns an element for direct edits of its event-free fields.
    pub fn element_mut(&mut self, id: Id) -> Option<&mut Element> {
        self.scene.element_mut(id)
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.scene.node(id)
    }

    pub fn node_mut(&mut self, id: Id) -> Option<&mut Node> {
        self.scene.node_mut(id)
    }

    pub fn edge(&self, id: Id) -> Option<&Edge> {
        self.scene.edge(id)
    }

    pub fn edge_mut(&mut self, id: Id) -> Option<&mut Edge> {
        self.scene.edge_mut(id)
    }

    /// Returns the effective bounds of a node. See [`Scene::node_bounds`].
    pub fn node_bounds(&self, id: Id) -> Option<Rect> {
        self.scene.node_bounds(id)
    }

    pub fn store(&self) -> &Map<String, Value> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.store
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    /// Merges the given entries into the controller state.
    pub fn set_state(&mut self, state: Map<String, Value>) {
        self.state.extend(state);
    }

    // Events

    pub fn add_event_listener<F>(&mut self, event_type: EventType, listener: F) -> ListenerId
    where
        F: FnMut(&Event, &Scene) -> Result<(), ListenerError> + 'static,
    {
        self.bus.add_listener(event_type, listener)
    }

    pub fn remove_event_listener(&mut self, event_type: EventType, id: ListenerId) -> bool {
        self.bus.remove_listener(event_type, id)
    }

    /// Delivers a host-originated event, such as canvas dragging or an area
    /// selection, to the registered listeners.
    pub fn fire_event(&mut self, event: Event) -> Dispatch {
        self.bus.fire(&event, &self.scene)
    }

    fn emit(&mut self, event: Event) {
        self.bus.fire(&event, &self.scene);
    }

    fn emit_all(&mut self, events: Vec<Event>) {
        for event in events {
            self.emit(event);
        }
    }

    // Factories

    /// Registers an element factory. Newer factories take precedence.
    pub fn register_element_factory(&mut self, factory: impl ElementFactory + 'static) {
        self.element_factories.register(Box::new(factory));
    }

    /// Registers a layout factory. Newer factories take precedence.
    pub fn register_layout_factory(&mut self, factory: impl LayoutFactory + 'static) {
        self.layout_factories.register(Box::new(factory));
    }

    /// Registers a component factory. Newer factories take precedence.
    pub fn register_component_factory(&mut self, factory: impl ComponentFactory + 'static) {
        self.component_factories.register(Box::new(factory));
    }

    /// Creates a layout of the given type for the current graph from the
    /// factory chain. Returns `None` without a graph.
    pub fn get_layout(&self, layout_type: &str) -> Option<Box<dyn Layout>> {
        let graph = self.scene.graph_element()?;
        self.layout_factories
            .resolve(|factory| factory.create(layout_type, graph))
    }

    /// Creates a renderer component from the factory chain.
    pub fn get_component(&self, kind: ModelKind, element_type: &str) -> Option<ComponentHandle> {
        self.component_factories
            .resolve(|factory| factory.create(kind, element_type))
    }

    fn create_element(&self, kind: ModelKind, element_type: &str, id: Id) -> Option<Element> {
        self.element_factories
            .resolve(|factory| factory.create(kind, element_type, id))
    }

    // Render constraint

    /// Limits rendering to nodes near the viewport.
    ///
    /// Without explicit padding the current padding is kept.
    pub fn set_render_constraint(&mut self, constrained: bool, padding: Option<ViewPaddingSettings>) {
        let padding = padding.unwrap_or(self.render_constraint.padding());
        self.render_constraint = RenderConstraint::new(constrained, padding);
    }

    pub fn render_constraint(&self) -> RenderConstraint {
        self.render_constraint
    }

    /// Returns false only when rendering is constrained and the node lies
    /// entirely outside the padded viewport.
    pub fn should_render_node(&self, id: Id) -> bool {
        if !self.render_constraint.constrained() {
            return true;
        }
        let Some(graph) = self.scene.graph() else {
            return true;
        };
        let padding = self.render_constraint.padding().resolve(graph.dimensions());
        self.scene.is_node_in_view(id, padding)
    }

    // Element state with events

    /// Shows or hides an element. Fires `element-visibility-change` when
    /// the flag changes.
    pub fn set_visible(&mut self, id: Id, visible: bool) -> Result<(), GraphError> {
        let element = self.scene.element_mut(id).ok_or_else(|| unknown(id))?;
        if element.set_visible_flag(visible) {
            self.emit(Event::VisibilityChanged {
                element: id,
                visible,
            });
        }
        Ok(())
    }

    /// Moves a node. Moving an expanded group moves all of its descendants.
    pub fn set_node_position(&mut self, id: Id, position: Point) -> Result<(), GraphError> {
        self.require_node(id)?;
        let mut events = Vec::new();
        self.place_node(id, position, &mut events);
        self.emit_all(events);
        Ok(())
    }

    pub fn set_node_dimensions(&mut self, id: Id, dimensions: Dimensions) -> Result<(), GraphError> {
        self.require_node(id)?.resize(dimensions);
        Ok(())
    }

    /// Sets position and dimensions together.
    ///
    /// Each half only marks the node positioned or sized when it changes.
    pub fn set_node_bounds(&mut self, id: Id, bounds: Rect) -> Result<(), GraphError> {
        self.require_node(id)?;
        let mut events = Vec::new();
        if self.scene.has_derived_bounds(id) {
            self.place_node(id, bounds.position(), &mut events);
            if let Some(node) = self.scene.node_mut(id) {
                node.resize(bounds.dimensions());
            }
        } else if let Some(node) = self.scene.node_mut(id) {
            if node.assign_bounds(bounds) {
                events.push(Event::NodePositioned { node: id });
            }
        }
        self.emit_all(events);
        Ok(())
    }

    /// Collapses or expands a node. Fires `node-collapse-change` when the
    /// flag changes.
    ///
    /// A group keeps the rectangle it spanned while expanded when it is
    /// collapsed.
    pub fn set_collapsed(&mut self, id: Id, collapsed: bool) -> Result<(), GraphError> {
        self.require_node(id)?;
        let mut events = Vec::new();
        self.change_collapsed(id, collapsed, &mut events);
        self.emit_all(events);
        Ok(())
    }

    fn change_collapsed(&mut self, id: Id, collapsed: bool, events: &mut Vec<Event>) {
        let snapshot = if collapsed && self.scene.has_derived_bounds(id) {
            self.scene.node_bounds(id)
        } else {
            None
        };
        let Some(node) = self.scene.node_mut(id) else {
            return;
        };
        if node.set_collapsed_flag(collapsed) {
            if let Some(bounds) = snapshot {
                node.assign_bounds(bounds);
            }
            events.push(Event::NodeCollapseChanged { node: id, collapsed });
        }
    }

    /// Sets or clears an edge's source node.
    pub fn set_edge_source(&mut self, edge: Id, source: Option<Id>) -> Result<(), GraphError> {
        self.check_endpoint(edge, source)?;
        if let Some(edge) = self.scene.edge_mut(edge) {
            edge.set_source(source);
        }
        Ok(())
    }

    /// Sets or clears an edge's target node.
    pub fn set_edge_target(&mut self, edge: Id, target: Option<Id>) -> Result<(), GraphError> {
        self.check_endpoint(edge, target)?;
        if let Some(edge) = self.scene.edge_mut(edge) {
            edge.set_target(target);
        }
        Ok(())
    }

    fn check_endpoint(&self, edge: Id, endpoint: Option<Id>) -> Result<(), GraphError> {
        if self.scene.edge(edge).is_none() {
            return Err(GraphError::InvalidOperation(format!("`{edge}` is not an edge")));
        }
        match endpoint {
            Some(node) if self.scene.node(node).is_none() => Err(GraphError::InvalidOperation(
                format!("edge endpoint `{node}` is not a node"),
            )),
            _ => Ok(()),
        }
    }

    fn require_node(&mut self, id: Id) -> Result<&mut Node, GraphError> {
        self.scene
            .node_mut(id)
            .ok_or_else(|| GraphError::InvalidOperation(format!("`{id}` is not a node")))
    }

    fn require_graph(&self) -> Result<Id, GraphError> {
        self.scene
            .graph_id()
            .ok_or_else(|| GraphError::InvalidState("controller has no graph".to_string()))
    }

    /// Moves a node's stored bounds, carrying the descendants of an expanded
    /// group along.
    fn place_node(&mut self, id: Id, position: Point, events: &mut Vec<Event>) {
        if self.scene.has_derived_bounds(id) {
            if let Some(current) = self.scene.node_bounds(id) {
                let dx = position.x() - current.x();
                let dy = position.y() - current.y();
                if dx != 0.0 || dy != 0.0 {
                    for descendant in self.scene.all_node_children(id, false) {
                        if let Some(node) = self.scene.node_mut(descendant) {
                            node.shift(dx, dy);
                        }
                    }
                }
            }
        }

        if let Some(node) = self.scene.node_mut(id) {
            if node.place(position) {
                events.push(Event::NodePositioned { node: id });
            }
        }
    }

    // Layout

    /// Returns the layout type that [`Controller::layout`] would run.
    pub fn layout_type(&self) -> Option<String> {
        self.scene
            .graph()
            .and_then(Graph::layout)
            .or(self.config.layout().default_layout())
            .map(str::to_string)
    }

    /// Returns the state of the current layout session, if any.
    pub fn layout_state(&self) -> Option<LayoutState> {
        self.layout_session.as_ref().map(LayoutSession::state)
    }

    /// Changes the graph's layout type, destroying the active session.
    pub fn set_graph_layout(&mut self, layout: Option<String>) -> Result<(), GraphError> {
        self.require_graph()?;
        if let Some(graph) = self.scene.graph_mut() {
            graph.set_layout(layout);
        }
        self.teardown_layout();
        Ok(())
    }

    /// Fits the graph to the viewport after every settled layout run.
    pub fn set_fit_to_screen_on_layout(&mut self, fit: bool, padding: f64) {
        self.fit_on_layout = fit.then_some(padding);
    }

    /// Runs the graph's layout.
    ///
    /// Reuses the current session when its type still matches, otherwise a
    /// fresh layout is created from the factory chain. Without a layout type
    /// nothing happens. `graph-layout-end` fires when the run settles.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidState`] without a graph and
    /// [`GraphError::InvalidOperation`] when no factory knows the layout
    /// type. Errors raised by the layout are passed through; placements
    /// staged by a failing call are discarded.
    pub fn layout(&mut self) -> Result<LayoutStatus, GraphError> {
        let graph = self.require_graph()?;
        let Some(layout_type) = self.layout_type() else {
            debug!("No layout type set, skipping layout");
            return Ok(LayoutStatus::Settled);
        };

        let mut session = match self.layout_session.take() {
            Some(session)
                if session.layout_type() == layout_type
                    && session.state() != LayoutState::Destroyed =>
            {
                session
            }
            previous => {
                if let Some(mut previous) = previous {
                    destroy_session(&mut previous);
                }
                let layout = self.get_layout(&layout_type).ok_or_else(|| {
                    GraphError::InvalidOperation(format!(
                        "no layout registered for type `{layout_type}`"
                    ))
                })?;
                LayoutSession::new(layout_type, layout)
            }
        };

        let mut scope = LayoutScope::new(&self.scene, graph);
        let result = session.run(&mut scope);
        let placements = scope.into_placements();
        self.layout_session = Some(session);

        let status = result?;
        self.commit_placements(placements);
        if status == LayoutStatus::Settled {
            self.finish_layout(graph)?;
        }
        Ok(status)
    }

    /// Advances an incremental layout run.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidState`] when no layout was started or the
    /// session was destroyed.
    pub fn step_layout(&mut self) -> Result<LayoutStatus, GraphError> {
        let graph = self.require_graph()?;
        let mut session = self
            .layout_session
            .take()
            .ok_or_else(|| GraphError::InvalidState("no layout has been started".to_string()))?;
        let was_running = session.state() == LayoutState::Running;

        let mut scope = LayoutScope::new(&self.scene, graph);
        let result = session.step(&mut scope);
        let placements = scope.into_placements();
        self.layout_session = Some(session);

        let status = result?;
        self.commit_placements(placements);
        if was_running && status == LayoutStatus::Settled {
            self.finish_layout(graph)?;
        }
        Ok(status)
    }

    /// Stops the current layout run. Does nothing without a session.
    pub fn stop_layout(&mut self) -> Result<(), GraphError> {
        match self.layout_session.as_mut() {
            Some(session) => session.stop(),
            None => Ok(()),
        }
    }

    /// Destroys the current layout session. Later `step_layout` and
    /// `stop_layout` calls fail until a new run is started.
    pub fn destroy_layout(&mut self) -> Result<(), GraphError> {
        match self.layout_session.as_mut() {
            Some(session) => session.destroy(),
            None => Ok(()),
        }
    }

    fn commit_placements(&mut self, placements: IndexMap<Id, Placement>) {
        let mut events = Vec::new();
        for (id, placement) in placements {
            if let Some(dimensions) = placement.dimensions {
                if let Some(node) = self.scene.node_mut(id) {
                    node.resize(dimensions);
                }
            }
            if let Some(position) = placement.position {
                self.place_node(id, position, &mut events);
            }
        }
        self.emit_all(events);
    }

    fn finish_layout(&mut self, graph: Id) -> Result<(), GraphError> {
        info!(graph:% = graph; "Layout settled");
        self.emit(Event::GraphLayoutEnd { graph });
        if let Some(padding) = self.fit_on_layout {
            self.fit(padding, None)?;
        }
        Ok(())
    }

    fn teardown_layout(&mut self) {
        if let Some(mut session) = self.layout_session.take() {
            destroy_session(&mut session);
        }
    }

    /// Tears the scene down: destroys the layout session, drops every
    /// element and removes all listeners.
    pub fn destroy(&mut self) {
        self.teardown_layout();
        let count = self.scene.len();
        self.scene.clear();
        self.bus.clear();
        info!(elements = count; "Controller destroyed");
    }
}

fn destroy_session(session: &mut LayoutSession) {
    if session.state() == LayoutState::Destroyed {
        return;
    }
    if let Err(err) = session.destroy() {
        warn!(err:%; "Failed to destroy layout session");
    }
}

fn unknown(id: Id) -> GraphError {
    GraphError::InvalidOperation(format!("unknown element `{id}`"))
}
