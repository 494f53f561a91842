//! Markdown output.

use std::path::{Path, PathBuf};

use super::{ensure_parent, Composer, Placement};
use crate::error::Result;
use crate::model::{Caption, ImageRef};

/// HTML understood by Pandoc and most Markdown-to-print converters.
pub const PAGE_BREAK: &str = "<div style=\"page-break-before: always\"></div>";

/// Accumulates Markdown text; image links are relative to `base_dir`.
pub struct MarkdownComposer {
    base_dir: PathBuf,
    output: String,
}

impl MarkdownComposer {
    /// Create a composer whose document will live in `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            output: String::new(),
        }
    }

    /// The Markdown produced so far.
    pub fn as_str(&self) -> &str {
        &self.output
    }

    fn block(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push_str("\n\n");
    }

    fn link_target(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Composer for MarkdownComposer {
    fn heading(&mut self, text: &str, level: u8) {
        let hashes = "#".repeat(level.clamp(1, 6) as usize);
        self.block(&format!("{} {}", hashes, escape_markdown(text)));
    }

    fn paragraph(&mut self, text: &str) {
        self.block(&hard_breaks(&escape_markdown(text)));
    }

    fn citation_label(&mut self, label: &str, matched: bool) {
        let mut line = format!("**{}**", escape_markdown(label));
        if !matched {
            line.push_str("  *\\[UNMATCHED\\]*");
        }
        self.block(&line);
    }

    fn image(&mut self, image: &ImageRef, placement: &Placement) -> Result<()> {
        let line = format!(
            "![{}]({}){{width={}in}}",
            image.file_name(),
            self.link_target(&image.path),
            placement.width_in
        );
        self.block(&line);
        Ok(())
    }

    fn placeholder(&mut self, text: &str) {
        self.block(&escape_markdown(text));
    }

    fn caption(&mut self, caption: &Caption) {
        let line = match caption.split_label() {
            Some((label, body)) => format!("**{}**{}", label, escape_markdown(body)),
            None => escape_markdown(&caption.text),
        };
        self.block(&hard_breaks(&line));
    }

    fn annotation(&mut self, text: &str) {
        self.block(&format!("*{}*", escape_markdown(text)));
    }

    fn page_break(&mut self) {
        self.block(PAGE_BREAK);
    }

    fn finish(&mut self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        std::fs::write(path, &self.output)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Keep single newlines from caption text as hard line breaks.
fn hard_breaks(text: &str) -> String {
    text.replace('\n', "  \n")
}

/// Escape characters that would change inline formatting.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement() -> Placement {
        Placement {
            width_px: 1000,
            height_px: 800,
            width_in: 6.5,
            height_in: 5.2,
        }
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("[Image failed]"), "\\[Image failed\\]");
        assert_eq!(escape_markdown("p < 0.05"), "p < 0.05");
    }

    #[test]
    fn test_heading_and_label() {
        let mut md = MarkdownComposer::new("out");
        md.heading("Combined Figures & Captions", 1);
        md.heading("[1] a.pdf", 2);
        md.citation_label("a", false);
        assert_eq!(
            md.as_str(),
            "# Combined Figures & Captions\n\n## \\[1\\] a.pdf\n\n**a**  *\\[UNMATCHED\\]*\n\n"
        );
    }

    #[test]
    fn test_image_link_is_relative() {
        let mut md = MarkdownComposer::new("/data/out");
        let image = ImageRef {
            path: PathBuf::from("/data/out/_images_all/paper/p01_img02.png"),
            page: 1,
            index: 2,
            width: 1000,
            height: 800,
        };
        md.image(&image, &placement()).unwrap();
        assert_eq!(
            md.as_str(),
            "![p01_img02.png](_images_all/paper/p01_img02.png){width=6.5in}\n\n"
        );
    }

    #[test]
    fn test_caption_label_bold() {
        let mut md = MarkdownComposer::new("out");
        md.caption(&Caption::new("Figure 2: Cells\nin culture"));
        md.caption(&Caption::new("Plain text"));
        assert_eq!(
            md.as_str(),
            "**Figure 2**: Cells  \nin culture\n\nPlain text\n\n"
        );
    }

    #[test]
    fn test_page_break_and_annotation() {
        let mut md = MarkdownComposer::new("out");
        md.page_break();
        md.annotation("Title detected: N/A | Citation: N/A (score=0.00)");
        assert_eq!(
            md.as_str(),
            format!(
                "{}\n\n*Title detected: N/A \\| Citation: N/A (score=0.00)*\n\n",
                PAGE_BREAK
            )
        );
    }
}
