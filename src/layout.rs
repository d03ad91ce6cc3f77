//! Coordinate mapping between the preview and PDF page space
//!
//! The preview reports stamp positions as percentages of the displayed page,
//! with the origin at the top-left and y growing downward. PDF drawing uses
//! points (1/72 inch) with the origin at the bottom-left and y growing upward.
//!
//! Every function here takes the page's native size in points, never the
//! pixel size of a rendered preview, so the mapping does not depend on the
//! scale the preview was rendered at.

/// Ratio of font size subtracted from y so the text baseline sits where the
/// preview shows the stamp. Fixed approximation of cap height, not font metrics.
pub const BASELINE_OFFSET_RATIO: f64 = 0.8;

/// Native page size in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f64,
    pub height_pt: f64,
}

impl PageSize {
    /// Create a page size from point dimensions
    pub fn new(width_pt: f64, height_pt: f64) -> Self {
        Self { width_pt, height_pt }
    }

    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self::new(210.0 * 72.0 / 25.4, 297.0 * 72.0 / 25.4)
    }

    /// Pixel dimensions of this page rendered at `scale` pixels per point
    pub fn scaled_pixels(&self, scale: f64) -> (u32, u32) {
        // Truncate like a canvas sized from a fractional viewport
        let width = (self.width_pt * scale).floor().max(0.0) as u32;
        let height = (self.height_pt * scale).floor().max(0.0) as u32;
        (width, height)
    }
}

/// Absolute position in PDF space (origin bottom-left, units of points)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPagePoint {
    pub x_pt: f64,
    pub y_pt: f64,
}

/// Map a normalized preview position to the PDF point where text is drawn.
///
/// `x_percent`/`y_percent` are expected in [0, 100]; callers clamp before
/// calling. The result is not clamped to the page: `y_percent = 100` yields a
/// negative y equal to `-font_size_pt * 0.8`.
pub fn to_pdf_point(x_percent: f64, y_percent: f64, font_size_pt: f64, page: PageSize) -> PdfPagePoint {
    let x_pt = (x_percent / 100.0) * page.width_pt;
    let y_pt = page.height_pt - (y_percent / 100.0) * page.height_pt - font_size_pt * BASELINE_OFFSET_RATIO;

    PdfPagePoint { x_pt, y_pt }
}

/// Inverse of [`to_pdf_point`]: recover the preview percentages for a draw point.
///
/// No clamping is applied, so points outside the page give values outside [0, 100].
pub fn to_percent(point: PdfPagePoint, font_size_pt: f64, page: PageSize) -> (f64, f64) {
    let x_percent = point.x_pt / page.width_pt * 100.0;
    let raw_y = page.height_pt - point.y_pt - font_size_pt * BASELINE_OFFSET_RATIO;
    let y_percent = raw_y / page.height_pt * 100.0;

    (x_percent, y_percent)
}

/// Clamp a percentage into [0, 100]. NaN becomes 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Convert a pointer position inside the displayed preview into clamped percentages.
///
/// `origin_px` is the top-left corner of the preview container and `size_px`
/// its displayed size, both in the host's pixel units. A degenerate container
/// (zero or negative size on an axis) maps that axis to 0.
pub fn percent_from_pointer(pointer_px: (f64, f64), origin_px: (f64, f64), size_px: (f64, f64)) -> (f64, f64) {
    let axis = |pointer: f64, origin: f64, size: f64| {
        if size <= 0.0 {
            0.0
        } else {
            clamp_percent((pointer - origin) / size * 100.0)
        }
    };

    (
        axis(pointer_px.0, origin_px.0, size_px.0),
        axis(pointer_px.1, origin_px.1, size_px.1),
    )
}
