use meridian_core::{
    geometry::{Dimensions, Point, Rect},
    model::{ScaleDetailsLevel, ScaleDetailsThresholds, ScaleExtent},
};

use crate::{config::DEFAULT_SCALE_EXTENT, error::GraphError};

/// Layer every graph starts with.
pub const DEFAULT_LAYER: &str = "default";

/// The root of a scene and owner of the viewport transform.
///
/// The bounds hold the pan offset as position and the viewport size as
/// dimensions. Graph space maps to viewport space by multiplying by the
/// scale and then adding the pan offset.
#[derive(Debug, Clone)]
pub struct Graph {
    bounds: Rect,
    scale: f64,
    scale_extent: ScaleExtent,
    layout: Option<String>,
    layers: Vec<String>,
    details_thresholds: Option<ScaleDetailsThresholds>,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            bounds: Rect::default(),
            scale: 1.0,
            scale_extent: DEFAULT_SCALE_EXTENT,
            layout: None,
            layers: vec![DEFAULT_LAYER.to_string()],
            details_thresholds: None,
        }
    }
}

impl Graph {
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.bounds = self.bounds.with_dimensions(dimensions);
        self
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns the pan offset.
    pub fn position(&self) -> Point {
        self.bounds.position()
    }

    /// Returns the viewport size.
    pub fn dimensions(&self) -> Dimensions {
        self.bounds.dimensions()
    }

    /// Sets the viewport size.
    pub fn set_dimensions(&mut self, dimensions: Dimensions) {
        self.bounds = self.bounds.with_dimensions(dimensions);
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn scale_extent(&self) -> ScaleExtent {
        self.scale_extent
    }

    /// Sets the `[min, max]` scale bounds used by zoom operations.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`] unless `0 < min <= max`.
    pub fn set_scale_extent(&mut self, scale_extent: ScaleExtent) -> Result<(), GraphError> {
        validate_scale_extent(scale_extent)?;
        self.scale_extent = scale_extent;
        Ok(())
    }

    /// Clamps a scale into the extent.
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        let [min, max] = self.scale_extent;
        scale.clamp(min, max)
    }

    /// Returns the layout type name, if any.
    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn set_layers(&mut self, layers: Vec<String>) {
        self.layers = layers;
    }

    pub fn details_thresholds(&self) -> Option<ScaleDetailsThresholds> {
        self.details_thresholds
    }

    pub fn set_details_thresholds(&mut self, thresholds: Option<ScaleDetailsThresholds>) {
        self.details_thresholds = thresholds;
    }

    /// Derives the rendering detail level from the current scale.
    ///
    /// Without thresholds the level is always [`ScaleDetailsLevel::High`].
    pub fn details_level(&self) -> ScaleDetailsLevel {
        match self.details_thresholds {
            None => ScaleDetailsLevel::High,
            Some(thresholds) if self.scale >= thresholds.medium => ScaleDetailsLevel::High,
            Some(thresholds) if self.scale >= thresholds.low => ScaleDetailsLevel::Medium,
            Some(_) => ScaleDetailsLevel::Low,
        }
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.bounds = self.bounds.with_position(position);
    }

    pub(crate) fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub(crate) fn set_layout(&mut self, layout: Option<String>) {
        self.layout = layout;
    }
}

pub(crate) fn validate_scale_extent([min, max]: ScaleExtent) -> Result<(), GraphError> {
    if !(min > 0.0 && min <= max && max.is_finite()) {
        return Err(GraphError::InvalidOperation(format!(
            "scale extent must satisfy 0 < min <= max, got [{min}, {max}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let graph = Graph::default();
        assert_eq!(graph.scale(), 1.0);
        assert_eq!(graph.scale_extent(), [0.25, 4.0]);
        assert_eq!(graph.layers(), &[DEFAULT_LAYER.to_string()]);
        assert!(graph.layout().is_none());
    }

    #[test]
    fn test_clamp_scale() {
        let graph = Graph::default();
        assert_eq!(graph.clamp_scale(10.0), 4.0);
        assert_eq!(graph.clamp_scale(0.1), 0.25);
        assert_eq!(graph.clamp_scale(2.0), 2.0);
    }

    #[test]
    fn test_set_scale_extent_validation() {
        let mut graph = Graph::default();
        assert!(graph.set_scale_extent([0.5, 2.0]).is_ok());
        assert!(graph.set_scale_extent([2.0, 0.5]).is_err());
        assert!(graph.set_scale_extent([0.0, 1.0]).is_err());
        assert_eq!(graph.scale_extent(), [0.5, 2.0]);
    }

    #[test]
    fn test_details_level() {
        let mut graph = Graph::default();
        assert_eq!(graph.details_level(), ScaleDetailsLevel::High);

        graph.set_details_thresholds(Some(ScaleDetailsThresholds {
            low: 0.3,
            medium: 0.6,
        }));
        graph.set_scale(0.6);
        assert_eq!(graph.details_level(), ScaleDetailsLevel::High);
        graph.set_scale(0.3);
        assert_eq!(graph.details_level(), ScaleDetailsLevel::Medium);
        graph.set_scale(0.29);
        assert_eq!(graph.details_level(), ScaleDetailsLevel::Low);
    }
}
