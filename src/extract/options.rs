//! Extraction thresholds and heuristics.

/// Minimum size an embedded image must have to be kept.
///
/// All three bounds must hold: `width >= min_width`, `height >= min_height`
/// and `width * height >= min_area`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFilter {
    /// Minimum width in pixels
    pub min_width: u32,

    /// Minimum height in pixels
    pub min_height: u32,

    /// Minimum pixel count
    pub min_area: u64,
}

impl ImageFilter {
    /// Create a filter with default bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum width.
    pub fn with_min_width(mut self, px: u32) -> Self {
        self.min_width = px;
        self
    }

    /// Set the minimum height.
    pub fn with_min_height(mut self, px: u32) -> Self {
        self.min_height = px;
        self
    }

    /// Set the minimum area.
    pub fn with_min_area(mut self, px: u64) -> Self {
        self.min_area = px;
        self
    }

    /// Keep every image regardless of size.
    pub fn accept_all() -> Self {
        Self {
            min_width: 0,
            min_height: 0,
            min_area: 0,
        }
    }

    /// Whether an image of the given size passes.
    pub fn accepts(&self, width: u32, height: u32) -> bool {
        width >= self.min_width
            && height >= self.min_height
            && u64::from(width) * u64::from(height) >= self.min_area
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            min_width: 500,
            min_height: 500,
            min_area: 300_000,
        }
    }
}

/// Labels that open front-matter blocks set in large type.
pub const DEFAULT_REJECTED_PREFIXES: &[&str] = &[
    "Graphical abstract",
    "Highlights",
    "Article",
    "OPEN ACCESS",
    "Summary",
    "In brief",
    "STAR★METHODS",
    "REFERENCES",
];

/// Options for the largest-font title heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleOptions {
    /// Spans whose size differs from the largest by less than this are part
    /// of the title
    pub size_tolerance: f32,

    /// Candidates starting with any of these are not titles
    pub rejected_prefixes: Vec<String>,

    /// Whether the metadata `Title` entry is consulted first
    pub use_metadata: bool,
}

impl TitleOptions {
    /// Create new title options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font size tolerance.
    pub fn with_size_tolerance(mut self, tolerance: f32) -> Self {
        self.size_tolerance = tolerance;
        self
    }

    /// Replace the rejected prefix list.
    pub fn with_rejected_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rejected_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Skip the metadata title and always use the layout heuristic.
    pub fn ignore_metadata(mut self) -> Self {
        self.use_metadata = false;
        self
    }

    /// Whether `candidate` starts with a rejected label.
    pub fn is_rejected(&self, candidate: &str) -> bool {
        self.rejected_prefixes
            .iter()
            .any(|p| candidate.starts_with(p.as_str()))
    }
}

impl Default for TitleOptions {
    fn default() -> Self {
        Self {
            size_tolerance: 0.2,
            rejected_prefixes: DEFAULT_REJECTED_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            use_metadata: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_bounds() {
        let filter = ImageFilter::default();
        assert!(!filter.accepts(400, 600));
        assert!(filter.accepts(500, 600));
        assert!(filter.accepts(500, 600) && 500 * 600 == 300_000);
        assert!(!filter.accepts(600, 499));
    }

    #[test]
    fn test_filter_area_bound() {
        let filter = ImageFilter::new()
            .with_min_width(100)
            .with_min_height(100)
            .with_min_area(50_000);
        assert!(!filter.accepts(200, 200));
        assert!(filter.accepts(250, 200));
        assert!(ImageFilter::accept_all().accepts(1, 1));
    }

    #[test]
    fn test_title_rejection() {
        let options = TitleOptions::default();
        assert!(options.is_rejected("Highlights • Retina atlas"));
        assert!(options.is_rejected("STAR★METHODS"));
        assert!(!options.is_rejected("A single-cell atlas"));

        let custom = TitleOptions::new().with_rejected_prefixes(["Preprint"]);
        assert!(custom.is_rejected("Preprint version"));
        assert!(!custom.is_rejected("Highlights"));
    }
}
