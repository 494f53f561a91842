//! DOCX output via docx-rs.

use std::fs::File;
use std::path::Path;

use docx_rs::{
    AlignmentType, BreakType, Docx, Paragraph, Pic, Run, RunFonts, Style, StyleType,
};

use super::{ensure_parent, Composer, Placement};
use crate::error::{Error, Result};
use crate::model::{Caption, ImageRef};

const BODY_FONT: &str = "Calibri";
/// Half-points: 11pt body, 16pt and 13pt headings.
const BODY_SIZE: usize = 22;
const HEADING1_SIZE: usize = 32;
const HEADING2_SIZE: usize = 26;

/// Builds a Word document in memory and writes it on [`Composer::finish`].
pub struct DocxComposer {
    docx: Docx,
}

impl DocxComposer {
    /// Create a document with Calibri 11pt body text and heading styles.
    pub fn new() -> Self {
        let fonts = RunFonts::new()
            .ascii(BODY_FONT)
            .hi_ansi(BODY_FONT)
            .east_asia(BODY_FONT)
            .cs(BODY_FONT);

        let docx = Docx::new()
            .default_fonts(fonts)
            .default_size(BODY_SIZE)
            .add_style(
                Style::new("Heading1", StyleType::Paragraph)
                    .name("Heading 1")
                    .size(HEADING1_SIZE)
                    .bold(),
            )
            .add_style(
                Style::new("Heading2", StyleType::Paragraph)
                    .name("Heading 2")
                    .size(HEADING2_SIZE)
                    .bold(),
            );

        Self { docx }
    }

    fn push(&mut self, paragraph: Paragraph) {
        let docx = std::mem::take(&mut self.docx);
        self.docx = docx.add_paragraph(paragraph);
    }
}

impl Default for DocxComposer {
    fn default() -> Self {
        Self::new()
    }
}

/// A run holding `text`, with embedded newlines turned into line breaks.
fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    run
}

impl Composer for DocxComposer {
    fn heading(&mut self, text: &str, level: u8) {
        let style = if level <= 1 { "Heading1" } else { "Heading2" };
        self.push(Paragraph::new().add_run(Run::new().add_text(text)).style(style));
    }

    fn paragraph(&mut self, text: &str) {
        self.push(Paragraph::new().add_run(text_run(text)));
    }

    fn citation_label(&mut self, label: &str, matched: bool) {
        let mut paragraph = Paragraph::new().add_run(Run::new().add_text(label).bold());
        if !matched {
            paragraph = paragraph.add_run(Run::new().add_text("  [UNMATCHED]").italic());
        }
        self.push(paragraph);
    }

    fn image(&mut self, image: &ImageRef, placement: &Placement) -> Result<()> {
        let bytes = std::fs::read(&image.path)
            .map_err(|e| Error::Embed(format!("{}: {}", image.path.display(), e)))?;
        let pic = Pic::new_with_dimensions(bytes, placement.width_px, placement.height_px)
            .size(placement.width_emu(), placement.height_emu());
        self.push(
            Paragraph::new()
                .add_run(Run::new().add_image(pic))
                .align(AlignmentType::Center),
        );
        Ok(())
    }

    fn placeholder(&mut self, text: &str) {
        self.paragraph(text);
    }

    fn caption(&mut self, caption: &Caption) {
        let paragraph = match caption.split_label() {
            Some((label, body)) => Paragraph::new()
                .add_run(Run::new().add_text(label).bold())
                .add_run(text_run(body)),
            None => Paragraph::new().add_run(text_run(&caption.text)),
        };
        self.push(paragraph);
    }

    fn annotation(&mut self, text: &str) {
        self.push(Paragraph::new().add_run(text_run(text).italic()));
    }

    fn page_break(&mut self) {
        self.push(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
    }

    fn finish(&mut self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let file = File::create(path)?;
        let docx = std::mem::take(&mut self.docx);
        docx.build()
            .pack(file)
            .map_err(|e| Error::Render(format!("{}: {}", path.display(), e)))?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn raw_contents(path: &Path) -> String {
        // entry names are stored uncompressed in the zip directory
        let mut bytes = Vec::new();
        File::open(path).unwrap().read_to_end(&mut bytes).unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn test_finish_writes_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.docx");

        let mut composer = DocxComposer::new();
        composer.heading("Combined Figures & Captions", 1);
        composer.citation_label("paper", false);
        composer.placeholder("[No large figures or captions detected.]");
        composer.page_break();
        composer.caption(&Caption::new("Figure 1. A cell."));
        composer.finish(&path).unwrap();

        let raw = raw_contents(&path);
        assert!(raw.starts_with("PK"));
        assert!(raw.contains("word/document.xml"));
    }

    #[test]
    fn test_image_unreadable_fails() {
        let mut composer = DocxComposer::new();
        let image = ImageRef {
            path: "/nonexistent/p01_img01.png".into(),
            page: 1,
            index: 1,
            width: 600,
            height: 600,
        };
        let placement = Placement {
            width_px: 600,
            height_px: 600,
            width_in: 6.5,
            height_in: 6.5,
        };
        assert!(matches!(
            composer.image(&image, &placement),
            Err(Error::Embed(_))
        ));
    }
}
