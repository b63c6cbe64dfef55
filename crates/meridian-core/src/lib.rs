//! Core value types for the Meridian scene graph.
//!
//! This crate holds everything that is shared between the scene graph library
//! and its consumers without pulling in any runtime behavior:
//!
//! - [`geometry`] - points, dimensions, rectangles, padding and the
//!   [`Translatable`](geometry::Translatable) trait used for coordinate
//!   transforms
//! - [`identifier`] - interned element identifiers
//! - [`model`] - the serde wire model a scene is loaded from and saved to

pub mod geometry;
pub mod identifier;
pub mod model;
