//! Factories resolving element types to implementations.
//!
//! The controller keeps one chain per factory kind. When asked for an
//! instance it walks the chain from the most recently registered factory to
//! the oldest and uses the first one that answers.
//!
//! # Overview
//!
//! - [`ElementFactory`] - Builds runtime elements for model entries
//! - [`LayoutFactory`] - Builds [`Layout`] instances by layout type
//! - [`ComponentFactory`] - Builds opaque renderer components by kind and type
//! - [`DefaultElementFactory`] - Fallback building plain elements of any kind
//! - [`TypedElementFactory`] - Table of per-`(kind, type)` element initializers
//!
//! All three traits are implemented for matching closures.

use std::{any::Any, collections::HashMap, fmt, rc::Rc};

use meridian_core::{identifier::Id, model::ModelKind};

use crate::{element::Element, error::GraphError, layout::Layout};

/// Builds the runtime element for a model entry.
pub trait ElementFactory {
    /// Returns `None` when this factory does not handle `(kind, element_type)`.
    fn create(&self, kind: ModelKind, element_type: &str, id: Id) -> Option<Element>;
}

impl<F> ElementFactory for F
where
    F: Fn(ModelKind, &str, Id) -> Option<Element>,
{
    fn create(&self, kind: ModelKind, element_type: &str, id: Id) -> Option<Element> {
        self(kind, element_type, id)
    }
}

/// Builds layouts by type name.
///
/// `graph` is the graph element the layout will run on, so a factory can
/// read its style or data to configure the instance.
pub trait LayoutFactory {
    fn create(&self, layout_type: &str, graph: &Element) -> Option<Box<dyn Layout>>;
}

impl<F> LayoutFactory for F
where
    F: Fn(&str, &Element) -> Option<Box<dyn Layout>>,
{
    fn create(&self, layout_type: &str, graph: &Element) -> Option<Box<dyn Layout>> {
        self(layout_type, graph)
    }
}

/// Opaque renderer component. The controller never looks inside.
pub type ComponentHandle = Rc<dyn Any>;

/// Builds renderer components by element kind and type.
pub trait ComponentFactory {
    fn create(&self, kind: ModelKind, element_type: &str) -> Option<ComponentHandle>;
}

impl<F> ComponentFactory for F
where
    F: Fn(ModelKind, &str) -> Option<ComponentHandle>,
{
    fn create(&self, kind: ModelKind, element_type: &str) -> Option<ComponentHandle> {
        self(kind, element_type)
    }
}

/// Builds a plain element of the requested kind for any type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultElementFactory;

impl ElementFactory for DefaultElementFactory {
    fn create(&self, kind: ModelKind, element_type: &str, id: Id) -> Option<Element> {
        Some(Element::of_kind(kind, id, element_type))
    }
}

type Initializer = Box<dyn Fn(&mut Element)>;

/// Element factory keyed by exact `(kind, type)` pairs.
///
/// Each entry receives a default element of the right kind, id and type and
/// customizes it, for example by registering anchors or style defaults.
///
/// # Examples
///
/// ```
/// # use meridian::anchor::{AnchorEnd, RectAnchor};
/// # use meridian::factory::{ElementFactory, TypedElementFactory};
/// # use meridian_core::{identifier::Id, model::ModelKind};
/// let mut factory = TypedElementFactory::new();
/// factory
///     .register(ModelKind::Node, "server", |element| {
///         if let Some(node) = element.as_node_mut() {
///             node.set_anchor(RectAnchor, AnchorEnd::Both, "");
///         }
///     })
///     .unwrap();
///
/// assert!(factory.create(ModelKind::Node, "server", Id::new("s1")).is_some());
/// assert!(factory.create(ModelKind::Node, "client", Id::new("c1")).is_none());
/// assert!(factory.register(ModelKind::Node, "server", |_| {}).is_err());
/// ```
#[derive(Default)]
pub struct TypedElementFactory {
    initializers: HashMap<(ModelKind, String), Initializer>,
}

impl TypedElementFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an initializer for `(kind, element_type)`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] for an empty type or a pair
    /// that is already registered.
    pub fn register<F>(
        &mut self,
        kind: ModelKind,
        element_type: &str,
        initializer: F,
    ) -> Result<(), GraphError>
    where
        F: Fn(&mut Element) + 'static,
    {
        if element_type.is_empty() {
            return Err(GraphError::InvalidOperation(format!(
                "cannot register a {kind} factory for an empty type"
            )));
        }
        let key = (kind, element_type.to_string());
        if self.initializers.contains_key(&key) {
            return Err(GraphError::InvalidOperation(format!(
                "a {kind} factory for type `{element_type}` is already registered"
            )));
        }
        self.initializers.insert(key, Box::new(initializer));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.initializers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.initializers.is_empty()
    }
}

impl ElementFactory for TypedElementFactory {
    fn create(&self, kind: ModelKind, element_type: &str, id: Id) -> Option<Element> {
        let initializer = self.initializers.get(&(kind, element_type.to_string()))?;
        let mut element = Element::of_kind(kind, id, element_type);
        initializer(&mut element);
        Some(element)
    }
}

impl fmt::Debug for TypedElementFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedElementFactory")
            .field("entries", &self.initializers.len())
            .finish()
    }
}

/// Ordered factory chain, newest registration first.
pub(crate) struct FactoryChain<F: ?Sized> {
    factories: Vec<Box<F>>,
}

impl<F: ?Sized> Default for FactoryChain<F> {
    fn default() -> Self {
        Self {
            factories: Vec::new(),
        }
    }
}

impl<F: ?Sized> FactoryChain<F> {
    pub(crate) fn register(&mut self, factory: Box<F>) {
        self.factories.push(factory);
    }

    /// Returns the first answer, asking the newest factory first.
    pub(crate) fn resolve<T>(&self, mut create: impl FnMut(&F) -> Option<T>) -> Option<T> {
        self.factories
            .iter()
            .rev()
            .find_map(|factory| create(&**factory))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.factories.len()
    }
}

impl<F: ?Sized> fmt::Debug for FactoryChain<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryChain")
            .field("len", &self.factories.len())
            .finish()
    }
}
