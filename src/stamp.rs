//! The stamp being edited: text, position, size and color

use crate::config::{FontSizeRange, StampConfig};
use crate::layout::clamp_percent;

/// Complete description of one stamping operation.
///
/// A `StampSpec` is never changed in place. Each edit returns a new value, so a
/// stamping call always works on a consistent snapshot. Position is kept in
/// [0, 100] and font size within the configured range; the color string is
/// only validated when stamping.
#[derive(Debug, Clone, PartialEq)]
pub struct StampSpec {
    text: String,
    x_percent: f64,
    y_percent: f64,
    font_size_pt: f64,
    color_hex: String,
    font_size_range: FontSizeRange,
}

impl StampSpec {
    /// Create a spec, clamping position and font size (default 8–72pt range)
    pub fn new(
        text: impl Into<String>,
        x_percent: f64,
        y_percent: f64,
        font_size_pt: f64,
        color_hex: impl Into<String>,
    ) -> Self {
        let range = FontSizeRange::default();
        Self {
            text: text.into(),
            x_percent: clamp_percent(x_percent),
            y_percent: clamp_percent(y_percent),
            font_size_pt: range.clamp(font_size_pt),
            color_hex: color_hex.into(),
            font_size_range: range,
        }
    }

    /// The spec a freshly loaded document starts with: no text, default placement
    pub fn initial(config: &StampConfig) -> Self {
        let range = config.font_size_range;
        Self {
            text: String::new(),
            x_percent: clamp_percent(config.default_x_percent),
            y_percent: clamp_percent(config.default_y_percent),
            font_size_pt: range.clamp(config.default_font_size),
            color_hex: config.default_color.clone(),
            font_size_range: range,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn x_percent(&self) -> f64 {
        self.x_percent
    }

    pub fn y_percent(&self) -> f64 {
        self.y_percent
    }

    pub fn font_size_pt(&self) -> f64 {
        self.font_size_pt
    }

    pub fn color_hex(&self) -> &str {
        &self.color_hex
    }

    /// Whether the host should offer stamping (there is text to draw)
    pub fn is_stampable(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    pub fn with_position(&self, x_percent: f64, y_percent: f64) -> Self {
        Self {
            x_percent: clamp_percent(x_percent),
            y_percent: clamp_percent(y_percent),
            ..self.clone()
        }
    }

    pub fn with_font_size(&self, font_size_pt: f64) -> Self {
        Self {
            font_size_pt: self.font_size_range.clamp(font_size_pt),
            ..self.clone()
        }
    }

    pub fn with_color(&self, color_hex: impl Into<String>) -> Self {
        Self {
            color_hex: color_hex.into(),
            ..self.clone()
        }
    }
}
