//! Render constraint settings.
//!
//! A constrained controller only renders nodes that fall inside the viewport
//! grown by a padding margin. The margin is either a fixed number of pixels
//! or a percentage of the larger viewport side.

use serde::Deserialize;

use meridian_core::geometry::Dimensions;

use crate::error::GraphError;

/// Padding added around the viewport when deciding what to render.
///
/// The boundary form is an object with exactly one of `padding` (pixels) or
/// `paddingPercentage`. Supplying both, or neither, is rejected.
///
/// # Examples
///
/// ```
/// # use meridian::render::ViewPaddingSettings;
/// let pixels: ViewPaddingSettings = serde_json::from_str(r#"{"padding": 20}"#).unwrap();
/// assert_eq!(pixels, ViewPaddingSettings::Pixels(20.0));
///
/// let both = serde_json::from_str::<ViewPaddingSettings>(
///     r#"{"padding": 20, "paddingPercentage": 10}"#,
/// );
/// assert!(both.is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawViewPadding")]
pub enum ViewPaddingSettings {
    Pixels(f64),
    Percentage(f64),
}

impl Default for ViewPaddingSettings {
    fn default() -> Self {
        Self::Percentage(50.0)
    }
}

impl ViewPaddingSettings {
    /// Builds settings from the two mutually exclusive boundary fields.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidViewPadding`] unless exactly one field is
    /// set to a finite, non-negative value.
    pub fn from_parts(
        padding: Option<f64>,
        padding_percentage: Option<f64>,
    ) -> Result<Self, GraphError> {
        let settings = match (padding, padding_percentage) {
            (Some(pixels), None) => Self::Pixels(pixels),
            (None, Some(percentage)) => Self::Percentage(percentage),
            (Some(_), Some(_)) => {
                return Err(GraphError::InvalidViewPadding(
                    "`padding` and `paddingPercentage` are mutually exclusive".to_string(),
                ));
            }
            (None, None) => {
                return Err(GraphError::InvalidViewPadding(
                    "one of `padding` or `paddingPercentage` is required".to_string(),
                ));
            }
        };

        let value = match settings {
            Self::Pixels(value) | Self::Percentage(value) => value,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(GraphError::InvalidViewPadding(format!(
                "padding must be a non-negative number, got {value}"
            )));
        }

        Ok(settings)
    }

    /// Resolves the settings to a pixel margin for the given viewport.
    pub fn resolve(self, viewport: Dimensions) -> f64 {
        match self {
            Self::Pixels(pixels) => pixels,
            Self::Percentage(percentage) => {
                viewport.width().max(viewport.height()) * percentage / 100.0
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawViewPadding {
    #[serde(default)]
    padding: Option<f64>,
    #[serde(default, alias = "padding_percentage")]
    padding_percentage: Option<f64>,
}

impl TryFrom<RawViewPadding> for ViewPaddingSettings {
    type Error = GraphError;

    fn try_from(raw: RawViewPadding) -> Result<Self, Self::Error> {
        Self::from_parts(raw.padding, raw.padding_percentage)
    }
}

/// Whether rendering is limited to the padded viewport, and by how much.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderConstraint {
    constrained: bool,
    padding: ViewPaddingSettings,
}

impl RenderConstraint {
    pub fn new(constrained: bool, padding: ViewPaddingSettings) -> Self {
        Self {
            constrained,
            padding,
        }
    }

    pub fn constrained(self) -> bool {
        self.constrained
    }

    pub fn padding(self) -> ViewPaddingSettings {
        self.padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_variants_are_legal() {
        let pixels: ViewPaddingSettings = serde_json::from_str(r#"{"padding": 12}"#).unwrap();
        assert_eq!(pixels, ViewPaddingSettings::Pixels(12.0));

        let percentage: ViewPaddingSettings =
            serde_json::from_str(r#"{"paddingPercentage": 30}"#).unwrap();
        assert_eq!(percentage, ViewPaddingSettings::Percentage(30.0));
    }

    #[test]
    fn test_raw_form_with_both_or_neither_is_rejected() {
        assert!(
            serde_json::from_str::<ViewPaddingSettings>(
                r#"{"padding": 1, "paddingPercentage": 2}"#
            )
            .is_err()
        );
        assert!(serde_json::from_str::<ViewPaddingSettings>("{}").is_err());
    }

    #[test]
    fn test_from_parts_rejects_negative() {
        let result = ViewPaddingSettings::from_parts(Some(-1.0), None);
        assert!(matches!(result, Err(GraphError::InvalidViewPadding(_))));
    }

    #[test]
    fn test_resolve() {
        let viewport = Dimensions::new(800.0, 600.0);
        assert_eq!(ViewPaddingSettings::Pixels(15.0).resolve(viewport), 15.0);
        assert_eq!(ViewPaddingSettings::default().resolve(viewport), 400.0);
        assert_eq!(ViewPaddingSettings::Percentage(10.0).resolve(viewport), 80.0);
    }
}
