//! Tree edits: attaching, detaching, reordering and renaming elements.

use log::debug;

use meridian_core::{identifier::Id, model::ModelKind};

use crate::{element::Element, error::GraphError, event::Event};

use super::{unknown, Controller};

impl Controller {
    /// Registers a new element and attaches it to `parent`, or to the graph
    /// when no parent is given. Fires one `element-add-child`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for a duplicate id, a graph
    /// element, an unknown parent or an edge endpoint that is not a node,
    /// and [`GraphError::InvalidState`] when no parent is given and the
    /// controller has no graph.
    pub fn add_element(&mut self, mut element: Element, parent: Option<Id>) -> Result<(), GraphError> {
        let id = element.id();
        if self.scene.contains(id) {
            return Err(GraphError::InvalidOperation(format!(
                "an element with id `{id}` already exists"
            )));
        }
        if element.kind() == ModelKind::Graph {
            return Err(GraphError::InvalidOperation(format!(
                "graph `{id}` cannot be added as a child"
            )));
        }
        if let Some(edge) = element.as_edge() {
            for endpoint in [edge.source(), edge.target()].into_iter().flatten() {
                if self.scene.node(endpoint).is_none() {
                    return Err(GraphError::InvalidOperation(format!(
                        "edge `{id}` refers to `{endpoint}`, which is not a node"
                    )));
                }
            }
        }
        let parent = match parent {
            Some(parent) => parent,
            None => self.require_graph()?,
        };
        if !self.scene.contains(parent) {
            return Err(unknown(parent));
        }

        element.set_parent(Some(parent));
        element.children_mut().clear();
        self.scene.insert(element);
        if let Some(parent_element) = self.scene.element_mut(parent) {
            parent_element.children_mut().push(id);
        }

        debug!(element_id:% = id, parent:% = parent; "Added element");
        self.emit(Event::ChildAdded {
            target: parent,
            child: id,
        });
        Ok(())
    }

    /// Detaches an element and drops it and its whole subtree from the
    /// registry. Edges pointing at removed nodes lose that endpoint. Fires
    /// one `element-remove-child` when the element was attached.
    pub fn remove_element(&mut self, id: Id) -> Result<(), GraphError> {
        let Some(element) = self.scene.element(id) else {
            return Err(unknown(id));
        };
        if element.kind() == ModelKind::Graph {
            return Err(GraphError::InvalidOperation(format!(
                "graph `{id}` cannot be removed, destroy the controller instead"
            )));
        }
        let parent = element.parent();

        if let Some(parent) = parent {
            if let Some(parent_element) = self.scene.element_mut(parent) {
                parent_element.children_mut().retain(|child| *child != id);
            }
        }

        let mut removed = vec![id];
        removed.extend(self.scene.descendants(id));
        for removed_id in &removed {
            self.scene.take(*removed_id);
        }
        self.clear_dangling_endpoints(&removed);

        debug!(element_id:% = id, removed = removed.len(); "Removed element");
        if let Some(parent) = parent {
            self.emit(Event::ChildRemoved {
                target: parent,
                child: id,
            });
        }
        Ok(())
    }

    pub(super) fn clear_dangling_endpoints(&mut self, removed: &[Id]) {
        let edges: Vec<Id> = self.scene.edges().map(Element::id).collect();
        for edge_id in edges {
            if let Some(edge) = self.scene.edge_mut(edge_id) {
                for node in removed {
                    if edge.detach_node(*node) {
                        debug!(edge:% = edge_id, node:% = node; "Cleared dangling edge endpoint");
                    }
                }
            }
        }
    }

    /// Inserts `child` into `parent`'s children at `index`, clamped to the
    /// children length.
    ///
    /// Re-inserting under the current parent only reorders and fires
    /// nothing. Otherwise `element-add-child` fires once.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for unknown ids, a graph
    /// child, a child that already has another parent, or a parent inside
    /// the child's own subtree.
    pub fn insert_child(&mut self, parent: Id, child: Id, index: usize) -> Result<(), GraphError> {
        if !self.scene.contains(parent) {
            return Err(unknown(parent));
        }
        let Some(child_element) = self.scene.element(child) else {
            return Err(unknown(child));
        };
        if child_element.kind() == ModelKind::Graph {
            return Err(GraphError::InvalidOperation(format!(
                "graph `{child}` cannot be a child"
            )));
        }
        let current_parent = child_element.parent();
        if self.scene.is_self_or_ancestor(child, parent) {
            return Err(GraphError::InvalidOperation(format!(
                "cannot insert `{child}` into its own subtree at `{parent}`"
            )));
        }
        match current_parent {
            Some(current) if current == parent => {
                if let Some(parent_element) = self.scene.element_mut(parent) {
                    let children = parent_element.children_mut();
                    children.retain(|existing| *existing != child);
                    let index = index.min(children.len());
                    children.insert(index, child);
                }
                return Ok(());
            }
            Some(current) => {
                return Err(GraphError::InvalidOperation(format!(
                    "`{child}` already belongs to `{current}`, remove it first"
                )));
            }
            None => {}
        }

        if let Some(parent_element) = self.scene.element_mut(parent) {
            let children = parent_element.children_mut();
            let index = index.min(children.len());
            children.insert(index, child);
        }
        if let Some(child_element) = self.scene.element_mut(child) {
            child_element.set_parent(Some(parent));
        }

        debug!(element_id:% = child, parent:% = parent; "Inserted child");
        self.emit(Event::ChildAdded {
            target: parent,
            child,
        });
        Ok(())
    }

    /// Appends `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: Id, child: Id) -> Result<(), GraphError> {
        self.insert_child(parent, child, usize::MAX)
    }

    /// Detaches `child` from `parent`. The child and its subtree stay
    /// registered and can be inserted again. Fires one
    /// `element-remove-child`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] when `child` is not a child
    /// of `parent`.
    pub fn remove_child(&mut self, parent: Id, child: Id) -> Result<(), GraphError> {
        if self.scene.parent(child) != Some(parent) {
            return Err(GraphError::InvalidOperation(format!(
                "`{child}` is not a child of `{parent}`"
            )));
        }
        if let Some(parent_element) = self.scene.element_mut(parent) {
            parent_element.children_mut().retain(|existing| *existing != child);
        }
        if let Some(child_element) = self.scene.element_mut(child) {
            child_element.set_parent(None);
        }

        debug!(element_id:% = child, parent:% = parent; "Removed child");
        self.emit(Event::ChildRemoved {
            target: parent,
            child,
        });
        Ok(())
    }

    /// Detaches an element from its parent. Removing the graph or an
    /// element without a parent does nothing.
    pub fn remove(&mut self, id: Id) -> Result<(), GraphError> {
        match self.scene.parent(id) {
            Some(parent) => self.remove_child(parent, id),
            None => {
                debug!(element_id:% = id; "Element has no parent, nothing to remove");
                Ok(())
            }
        }
    }

    /// Moves an element to the end of its parent's children, drawing it on
    /// top of its siblings.
    pub fn raise(&mut self, id: Id) -> Result<(), GraphError> {
        match self.scene.parent(id) {
            Some(parent) => self.insert_child(parent, id, usize::MAX),
            None if self.scene.contains(id) => Ok(()),
            None => Err(unknown(id)),
        }
    }

    /// Renames an element, rewriting every reference to it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for an unknown old id or an
    /// empty or taken new id.
    pub fn set_element_id(&mut self, old: Id, new: Id) -> Result<(), GraphError> {
        if old == new {
            return Ok(());
        }
        let Some(element) = self.scene.element(old) else {
            return Err(unknown(old));
        };
        if new.is_empty() {
            return Err(GraphError::InvalidOperation(
                "element ids must not be empty".to_string(),
            ));
        }
        if self.scene.contains(new) {
            return Err(GraphError::InvalidOperation(format!(
                "an element with id `{new}` already exists"
            )));
        }
        let parent = element.parent();
        let children = element.children().to_vec();

        self.scene.rekey(old, new);
        if let Some(parent) = parent {
            if let Some(parent_element) = self.scene.element_mut(parent) {
                for child in parent_element.children_mut() {
                    if *child == old {
                        *child = new;
                    }
                }
            }
        }
        for child in children {
            if let Some(child_element) = self.scene.element_mut(child) {
                child_element.set_parent(Some(new));
            }
        }
        let edges: Vec<Id> = self.scene.edges().map(Element::id).collect();
        for edge_id in edges {
            if let Some(edge) = self.scene.edge_mut(edge_id) {
                edge.rename_node(old, new);
            }
        }

        debug!(old:% = old, new:% = new; "Renamed element");
        Ok(())
    }
}
