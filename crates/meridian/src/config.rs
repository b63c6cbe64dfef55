//! Configuration types for a scene controller.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! external sources. Every section falls back to its defaults when absent.
//!
//! # Overview
//!
//! - [`ControllerConfig`] - Top-level configuration combining all sections.
//! - [`ViewportConfig`] - Scale bounds and detail-level thresholds for new graphs.
//! - [`RenderConfig`] - Render constraint and its viewport padding.
//! - [`LayoutConfig`] - Default layout type and fit-after-layout behavior.
//!
//! # Example
//!
//! ```
//! # use meridian::config::ControllerConfig;
//! let config = ControllerConfig::default();
//! assert_eq!(config.viewport().scale_extent(), [0.25, 4.0]);
//! assert!(!config.render().constrained());
//! ```

use serde::Deserialize;

use meridian_core::model::{ScaleDetailsThresholds, ScaleExtent};

use crate::{error::GraphError, render::ViewPaddingSettings};

/// Scale extent applied to graphs that do not carry their own.
pub const DEFAULT_SCALE_EXTENT: ScaleExtent = [0.25, 4.0];

/// Top-level controller configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerConfig {
    /// Viewport configuration section.
    #[serde(default)]
    viewport: ViewportConfig,

    /// Render constraint configuration section.
    #[serde(default)]
    render: RenderConfig,

    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl ControllerConfig {
    /// Creates a new [`ControllerConfig`] from its sections.
    pub fn new(viewport: ViewportConfig, render: RenderConfig, layout: LayoutConfig) -> Self {
        Self {
            viewport,
            render,
            layout,
        }
    }

    /// Returns the viewport configuration.
    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    /// Returns the render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

/// Viewport defaults for graphs created by the controller.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_scale_extent")]
    scale_extent: ScaleExtent,

    #[serde(default)]
    details_thresholds: Option<ScaleDetailsThresholds>,
}

fn default_scale_extent() -> ScaleExtent {
    DEFAULT_SCALE_EXTENT
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            scale_extent: DEFAULT_SCALE_EXTENT,
            details_thresholds: None,
        }
    }
}

impl ViewportConfig {
    pub fn new(
        scale_extent: ScaleExtent,
        details_thresholds: Option<ScaleDetailsThresholds>,
    ) -> Self {
        Self {
            scale_extent,
            details_thresholds,
        }
    }

    /// Returns the `[min, max]` scale bounds.
    pub fn scale_extent(&self) -> ScaleExtent {
        self.scale_extent
    }

    /// Returns the detail-level thresholds, if configured.
    pub fn details_thresholds(&self) -> Option<ScaleDetailsThresholds> {
        self.details_thresholds
    }
}

/// Render constraint configuration.
///
/// `padding` (pixels) and `padding_percentage` are mutually exclusive. When
/// neither is set the default of 50% applies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    constrained: bool,

    #[serde(default)]
    padding: Option<f64>,

    #[serde(default)]
    padding_percentage: Option<f64>,
}

impl RenderConfig {
    pub fn new(constrained: bool, padding: Option<ViewPaddingSettings>) -> Self {
        let (padding, padding_percentage) = match padding {
            Some(ViewPaddingSettings::Pixels(value)) => (Some(value), None),
            Some(ViewPaddingSettings::Percentage(value)) => (None, Some(value)),
            None => (None, None),
        };
        Self {
            constrained,
            padding,
            padding_percentage,
        }
    }

    /// Returns whether rendering is limited to nodes near the viewport.
    pub fn constrained(&self) -> bool {
        self.constrained
    }

    /// Returns the configured view padding.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidViewPadding`] when both `padding` and
    /// `padding_percentage` are set, or when the value is negative.
    pub fn view_padding(&self) -> Result<ViewPaddingSettings, GraphError> {
        match (self.padding, self.padding_percentage) {
            (None, None) => Ok(ViewPaddingSettings::default()),
            (padding, padding_percentage) => {
                ViewPaddingSettings::from_parts(padding, padding_percentage)
            }
        }
    }
}

/// Layout configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutConfig {
    /// Layout type used when the graph does not name one.
    #[serde(default)]
    default_layout: Option<String>,

    #[serde(default)]
    fit_on_layout: bool,

    #[serde(default)]
    fit_padding: f64,
}

impl LayoutConfig {
    pub fn new(default_layout: Option<String>, fit_on_layout: bool, fit_padding: f64) -> Self {
        Self {
            default_layout,
            fit_on_layout,
            fit_padding,
        }
    }

    /// Returns the layout type used when the graph does not name one.
    pub fn default_layout(&self) -> Option<&str> {
        self.default_layout.as_deref()
    }

    /// Returns whether the graph is fit to the viewport after each layout.
    pub fn fit_on_layout(&self) -> bool {
        self.fit_on_layout
    }

    /// Returns the padding used when fitting after a layout.
    pub fn fit_padding(&self) -> f64 {
        self.fit_padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.viewport().scale_extent(), DEFAULT_SCALE_EXTENT);
        assert!(config.viewport().details_thresholds().is_none());
        assert_eq!(
            config.render().view_padding().unwrap(),
            ViewPaddingSettings::Percentage(50.0)
        );
        assert!(config.layout().default_layout().is_none());
        assert!(!config.layout().fit_on_layout());
    }

    #[test]
    fn test_deserialize_sections() {
        let config: ControllerConfig = serde_json::from_value(serde_json::json!({
            "viewport": {
                "scale_extent": [0.5, 2.0],
                "details_thresholds": { "low": 0.3, "medium": 0.6 }
            },
            "render": { "constrained": true, "padding": 20.0 },
            "layout": { "default_layout": "grid", "fit_on_layout": true, "fit_padding": 40.0 }
        }))
        .unwrap();

        assert_eq!(config.viewport().scale_extent(), [0.5, 2.0]);
        assert_eq!(
            config.viewport().details_thresholds(),
            Some(ScaleDetailsThresholds {
                low: 0.3,
                medium: 0.6
            })
        );
        assert!(config.render().constrained());
        assert_eq!(
            config.render().view_padding().unwrap(),
            ViewPaddingSettings::Pixels(20.0)
        );
        assert_eq!(config.layout().default_layout(), Some("grid"));
        assert_eq!(config.layout().fit_padding(), 40.0);
    }

    #[test]
    fn test_partial_viewport_keeps_default_extent() {
        let config: ControllerConfig =
            serde_json::from_value(serde_json::json!({ "viewport": {} })).unwrap();
        assert_eq!(config.viewport().scale_extent(), DEFAULT_SCALE_EXTENT);
    }

    #[test]
    fn test_render_padding_conflict() {
        let config: RenderConfig = serde_json::from_value(serde_json::json!({
            "padding": 10.0,
            "padding_percentage": 20.0
        }))
        .unwrap();

        assert!(matches!(
            config.view_padding(),
            Err(GraphError::InvalidViewPadding(_))
        ));
    }

    #[test]
    fn test_render_config_new_roundtrip() {
        let config = RenderConfig::new(true, Some(ViewPaddingSettings::Percentage(25.0)));
        assert_eq!(
            config.view_padding().unwrap(),
            ViewPaddingSettings::Percentage(25.0)
        );
    }
}
