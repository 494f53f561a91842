//! Input discovery and per-file image directory assignment.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::detect::is_pdf_path;
use crate::error::Result;

/// All PDF files below `root`, sorted by path.
///
/// A root that does not exist holds no PDFs. An existing root that cannot
/// be read is an error; unreadable entries further down are logged and
/// skipped.
pub fn discover_pdfs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        log::warn!("Input root {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && is_pdf_path(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    log::info!("Found {} PDF files under {}", files.len(), root.display());
    Ok(files)
}

/// One image directory per input: `<images_root>/<stem>`.
///
/// Repeated stems get `_2`, `_3`, … in input order so no two inputs share a
/// directory.
pub fn image_dirs(images_root: &Path, files: &[PathBuf]) -> Vec<PathBuf> {
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();

    files
        .iter()
        .map(|file| {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            let count = suffixes.entry(stem.clone()).or_insert(0);
            let mut name = stem.clone();
            while !used.insert(name.clone()) {
                *count += 1;
                name = format!("{}_{}", stem, *count + 1);
            }
            images_root.join(name)
        })
        .collect()
}
