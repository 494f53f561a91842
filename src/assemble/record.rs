//! Building one document record from one input file.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use super::options::BatchOptions;
use crate::error::{Error, Result};
use crate::extract::{extract_captions, extract_images, extract_title};
use crate::model::{DocumentRecord, Stage};
use crate::parser::PdfSource;
use crate::text::best_match;

/// Extract everything for `path` and match its title against `citations`.
///
/// Never fails: a stage that errors or panics leaves its fields empty and
/// adds a degradation. The opened document is dropped before returning.
pub fn build_record(
    path: &Path,
    image_dir: &Path,
    citations: &[String],
    options: &BatchOptions,
) -> DocumentRecord {
    let mut record = DocumentRecord::new(path);

    let source = match guarded(|| PdfSource::open(path)) {
        Ok(source) => source,
        Err(e) => {
            record.degrade(Stage::Open, e.to_string());
            return record;
        }
    };

    match guarded(|| extract_title(&source, &options.title)) {
        Ok(title) => record.title = title,
        Err(e) => record.degrade(Stage::Title, e.to_string()),
    }
    record.citation = best_match(
        record.title.as_deref().unwrap_or(""),
        citations,
        options.match_threshold,
    );

    match guarded(|| source.full_text()) {
        Ok(text) => record.captions = extract_captions(&text),
        Err(e) => record.degrade(Stage::Text, e.to_string()),
    }

    match guarded(|| extract_images(&source, image_dir, &options.image_filter)) {
        Ok(images) => record.images = images,
        Err(e) => record.degrade(Stage::Images, e.to_string()),
    }

    log::info!(
        "{}: {} images, {} captions, citation {}",
        path.display(),
        record.images.len(),
        record.captions.len(),
        match &record.citation.citation {
            Some(_) => format!("matched (score={:.2})", record.citation.score),
            None => "unmatched".to_string(),
        }
    );
    record
}

/// Run one extraction stage, turning a panic into an error.
fn guarded<T>(stage: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(stage))
        .unwrap_or_else(|payload| Err(Error::from_panic(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordStatus;
    use tempfile::TempDir;

    #[test]
    fn test_unopenable_file_is_degraded_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let record = build_record(
            &path,
            &dir.path().join("images"),
            &["Some citation".to_string()],
            &BatchOptions::default(),
        );

        assert_eq!(record.status(), RecordStatus::Degraded);
        assert_eq!(record.degradations[0].stage, Stage::Open);
        assert!(record.title.is_none());
        assert!(!record.citation.is_matched());
        assert_eq!(record.pair_count(), 0);
    }

    #[test]
    fn test_guarded_stage_turns_panic_into_error() {
        let result: Result<u32> = guarded(|| panic!("decoder overflow"));
        assert!(matches!(result, Err(Error::Panic(m)) if m == "decoder overflow"));

        assert_eq!(guarded(|| Ok(7)).unwrap(), 7);
    }
}
