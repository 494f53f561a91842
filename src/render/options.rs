//! Output options.

/// EMUs (English Metric Units) per inch, the DOCX drawing unit.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// How figures are sized on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbedOptions {
    /// Width tried first, in inches
    pub primary_width_in: f64,

    /// Width tried when the primary placement fails, in inches
    pub fallback_width_in: f64,

    /// Printable page height; taller placements fail, in inches
    pub max_height_in: f64,
}

impl EmbedOptions {
    /// Create new embed options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary width.
    pub fn with_primary_width(mut self, inches: f64) -> Self {
        self.primary_width_in = inches;
        self
    }

    /// Set the fallback width.
    pub fn with_fallback_width(mut self, inches: f64) -> Self {
        self.fallback_width_in = inches;
        self
    }

    /// Set the maximum height.
    pub fn with_max_height(mut self, inches: f64) -> Self {
        self.max_height_in = inches;
        self
    }

    /// Widths in the order they are attempted.
    pub fn widths(&self) -> [f64; 2] {
        [self.primary_width_in, self.fallback_width_in]
    }
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            primary_width_in: 6.5,
            fallback_width_in: 5.5,
            max_height_in: 9.0,
        }
    }
}
