//! The batch pipeline: discover inputs, build records, write outputs.
//!
//! Records are built one file at a time (or on the rayon pool with
//! [`BatchOptions::with_parallel`]); composition always runs in input
//! order, so both modes write the same document.

mod compose;
mod discover;
mod options;
mod record;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

pub use compose::{
    annotation, compose_record, compose_records, embed_image, DOCUMENT_TITLE, INTRO, NO_CAPTION,
    NO_CITATION, NO_FIGURES, NO_IMAGE,
};
pub use discover::{discover_pdfs, image_dirs};
pub use options::{BatchOptions, DEFAULT_MATCH_THRESHOLD};
pub use record::build_record;

use crate::citations::load_citations;
use crate::error::Result;
use crate::model::{DocumentRecord, RecordStatus};
use crate::render::write_audit;

/// Progress notifications from [`run`].
#[derive(Debug, Clone, Copy)]
pub enum BatchEvent<'a> {
    /// Inputs were discovered.
    Started { total: usize },
    /// A file's record is complete; `done` counts finished files.
    FileDone { done: usize, path: &'a Path },
    /// The output document is being written.
    Writing { path: &'a Path },
}

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Input root that was searched
    pub pdf_root: PathBuf,
    /// Number of input files
    pub files: usize,
    /// Files whose title matched a citation
    pub matched: usize,
    /// Files with at least one failed stage
    pub degraded: usize,
    /// Images saved across all files
    pub images: usize,
    /// Captions found across all files
    pub captions: usize,
    /// The written document; `None` when there was no input
    pub output: Option<PathBuf>,
    /// The written audit CSV, if requested
    pub audit: Option<PathBuf>,
}

impl BatchSummary {
    /// Whether the run stopped because there were no inputs.
    pub fn is_empty(&self) -> bool {
        self.files == 0
    }

    /// Diagnostic for a run that found no inputs.
    pub fn no_input_message(&self) -> Option<String> {
        self.is_empty()
            .then(|| format!("No PDFs found under: {}", self.pdf_root.display()))
    }

    fn add(&mut self, record: &DocumentRecord) {
        self.files += 1;
        self.images += record.images.len();
        self.captions += record.captions.len();
        if record.citation.is_matched() {
            self.matched += 1;
        }
        if record.status() == RecordStatus::Degraded {
            self.degraded += 1;
        }
    }
}

/// Run the whole batch.
///
/// Fails only when the input root, the citation list, or an output cannot
/// be read or written. Finding no PDFs is not an error: nothing is written
/// and the summary reports it.
pub fn run<F>(options: &BatchOptions, on_event: F) -> Result<BatchSummary>
where
    F: Fn(BatchEvent<'_>) + Sync,
{
    let mut summary = BatchSummary {
        pdf_root: options.pdf_root.clone(),
        ..BatchSummary::default()
    };

    let files = discover_pdfs(&options.pdf_root)?;
    if files.is_empty() {
        log::warn!("No PDFs found under {}", options.pdf_root.display());
        return Ok(summary);
    }

    let citations = load_citations(&options.citations_path)?;
    let dirs = image_dirs(&options.images_root(), &files);

    on_event(BatchEvent::Started { total: files.len() });
    let records = build_records(&files, &dirs, &citations, options, &on_event);

    on_event(BatchEvent::Writing {
        path: &options.output_path,
    });
    let mut composer = options.output_format().composer(&options.output_path);
    compose_records(composer.as_mut(), &records, &options.embed);
    composer.finish(&options.output_path)?;
    summary.output = Some(options.output_path.clone());

    if let Some(audit_path) = &options.audit_path {
        write_audit(audit_path, &records)?;
        summary.audit = Some(audit_path.clone());
    }

    for record in &records {
        summary.add(record);
    }
    Ok(summary)
}

fn build_records<F>(
    files: &[PathBuf],
    dirs: &[PathBuf],
    citations: &[String],
    options: &BatchOptions,
    on_event: &F,
) -> Vec<DocumentRecord>
where
    F: Fn(BatchEvent<'_>) + Sync,
{
    let done = AtomicUsize::new(0);
    let build = |(file, dir): (&PathBuf, &PathBuf)| {
        let record = build_record(file, dir, citations, options);
        let done = done.fetch_add(1, Ordering::Relaxed) + 1;
        on_event(BatchEvent::FileDone { done, path: file });
        record
    };

    if options.parallel {
        files.par_iter().zip(dirs.par_iter()).map(build).collect()
    } else {
        files.iter().zip(dirs.iter()).map(build).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_input_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("pdfs");
        std::fs::create_dir_all(&root).unwrap();
        let output = dir.path().join("out/All.docx");
        let audit = dir.path().join("out/map.csv");

        // the citation list is never read when there is no input
        let options = BatchOptions::new(&root, dir.path().join("missing.txt"), &output)
            .with_audit(&audit);
        let summary = run(&options, |_| {}).unwrap();

        assert!(summary.is_empty());
        assert!(summary.output.is_none());
        assert!(!output.exists());
        assert!(!audit.exists());
        let message = summary.no_input_message().unwrap();
        assert!(message.contains(&root.display().to_string()));
    }

    #[test]
    fn test_missing_root_halts_naming_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("absent_pdf_root");
        let output = dir.path().join("out/All.docx");

        let options = BatchOptions::new(&root, dir.path().join("missing.txt"), &output);
        let summary = run(&options, |_| {}).unwrap();

        assert!(summary.is_empty());
        assert!(!output.exists());
        let message = summary.no_input_message().unwrap();
        assert!(message.contains("absent_pdf_root"));
    }

    #[test]
    fn test_missing_citations_is_fatal() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("pdfs");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("a.pdf"), b"%PDF-1.4 broken").unwrap();

        let options = BatchOptions::new(
            &root,
            dir.path().join("missing.txt"),
            dir.path().join("All.docx"),
        );
        assert!(run(&options, |_| {}).is_err());
    }

    #[test]
    fn test_broken_pdf_still_gets_output() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("pdfs");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("a.pdf"), b"%PDF-1.4 broken").unwrap();
        let citations = dir.path().join("Citations.txt");
        std::fs::write(&citations, "Some paper\n").unwrap();
        let output = dir.path().join("All.md");
        let audit = dir.path().join("map.csv");

        let options = BatchOptions::new(&root, &citations, &output).with_audit(&audit);
        let summary = run(&options, |_| {}).unwrap();

        assert_eq!(summary.files, 1);
        assert_eq!(summary.degraded, 1);
        let markdown = std::fs::read_to_string(&output).unwrap();
        assert!(markdown.contains("## \\[1\\] a.pdf"));
        assert!(markdown.contains("\\[No large figures or captions detected.\\]"));
        let csv = std::fs::read_to_string(&audit).unwrap();
        assert!(csv.lines().nth(1).unwrap().ends_with("a.pdf,N/A,N/A,0.00"));
    }
}
