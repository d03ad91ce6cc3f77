//! Configuration for rendering previews, editing stamps and requesting suggestions
//!
//! [`StampConfig::default()`] matches the behavior of the stamping tool; use
//! [`StampConfig::builder()`] to change individual values.

use crate::error::{Error, Result};

/// Inclusive range of allowed stamp font sizes in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizeRange {
    pub min: f64,
    pub max: f64,
}

impl FontSizeRange {
    /// Clamp a font size into the range. NaN becomes the minimum.
    pub fn clamp(&self, size: f64) -> f64 {
        if size.is_nan() {
            return self.min;
        }
        size.clamp(self.min, self.max)
    }
}

impl Default for FontSizeRange {
    fn default() -> Self {
        Self { min: 8.0, max: 72.0 }
    }
}

/// Settings shared by the rasterizer, the stamp editor and the suggestion adapter
#[derive(Debug, Clone, PartialEq)]
pub struct StampConfig {
    /// Pixels per PDF point used for the page preview
    pub render_scale: f64,
    /// Allowed stamp font sizes
    pub font_size_range: FontSizeRange,
    /// Initial horizontal stamp position (percent of page width)
    pub default_x_percent: f64,
    /// Initial vertical stamp position (percent of page height)
    pub default_y_percent: f64,
    /// Initial font size in points
    pub default_font_size: f64,
    /// Initial stamp color, `#RRGGBB`
    pub default_color: String,
    /// Characters of page text sent to the suggestion client
    pub suggestion_char_limit: usize,
    /// Page text shorter than this is not worth a suggestion request
    pub suggestion_min_chars: usize,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.5,
            font_size_range: FontSizeRange::default(),
            // Top right area of the page
            default_x_percent: 85.0,
            default_y_percent: 5.0,
            default_font_size: 16.0,
            default_color: "#FF0000".to_string(),
            suggestion_char_limit: 3000,
            suggestion_min_chars: 5,
        }
    }
}

impl StampConfig {
    /// Start building a config from the defaults
    pub fn builder() -> StampConfigBuilder {
        StampConfigBuilder {
            config: StampConfig::default(),
        }
    }
}

/// Builder for [`StampConfig`]; [`build`](StampConfigBuilder::build) validates the result
#[derive(Debug, Clone)]
pub struct StampConfigBuilder {
    config: StampConfig,
}

impl StampConfigBuilder {
    pub fn render_scale(mut self, scale: f64) -> Self {
        self.config.render_scale = scale;
        self
    }

    pub fn font_size_range(mut self, min: f64, max: f64) -> Self {
        self.config.font_size_range = FontSizeRange { min, max };
        self
    }

    pub fn default_position(mut self, x_percent: f64, y_percent: f64) -> Self {
        self.config.default_x_percent = x_percent;
        self.config.default_y_percent = y_percent;
        self
    }

    pub fn default_font_size(mut self, size: f64) -> Self {
        self.config.default_font_size = size;
        self
    }

    pub fn default_color(mut self, color: impl Into<String>) -> Self {
        self.config.default_color = color.into();
        self
    }

    pub fn suggestion_char_limit(mut self, limit: usize) -> Self {
        self.config.suggestion_char_limit = limit;
        self
    }

    pub fn suggestion_min_chars(mut self, min: usize) -> Self {
        self.config.suggestion_min_chars = min;
        self
    }

    /// Validate and return the config
    pub fn build(self) -> Result<StampConfig> {
        let c = self.config;

        if !(c.render_scale.is_finite() && c.render_scale > 0.0) {
            return Err(Error::General(format!(
                "render scale must be a positive number, got {}",
                c.render_scale
            )));
        }

        let range = c.font_size_range;
        if !(range.min > 0.0 && range.min <= range.max && range.max.is_finite()) {
            return Err(Error::General(format!(
                "invalid font size range {}..={}",
                range.min, range.max
            )));
        }

        if !(range.min..=range.max).contains(&c.default_font_size) {
            return Err(Error::General(format!(
                "default font size {} is outside {}..={}",
                c.default_font_size, range.min, range.max
            )));
        }

        for (axis, value) in [("x", c.default_x_percent), ("y", c.default_y_percent)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(Error::General(format!(
                    "default {} position {} is outside 0..=100",
                    axis, value
                )));
            }
        }

        // Only validated here, stamping validates again
        crate::color::RgbColor::parse_hex(&c.default_color)?;

        if c.suggestion_char_limit == 0 {
            return Err(Error::General("suggestion char limit must be positive".to_string()));
        }

        Ok(c)
    }
}
