//! Laying out records as figure/caption pairs.

use crate::model::{DocumentRecord, ImageRef};
use crate::render::{fit_to_width, Composer, EmbedOptions};

pub const DOCUMENT_TITLE: &str = "Combined Figures & Captions";
pub const INTRO: &str = "Automatically generated. Each figure image is followed by its caption, \
                         and each pair is preceded by its matched citation name.";
pub const NO_FIGURES: &str = "[No large figures or captions detected.]";
pub const NO_IMAGE: &str = "[Image not found for this caption]";
pub const NO_CAPTION: &str = "[Caption not detected for the above image]";
pub const NO_CITATION: &str = "[No citation matched]";

/// Append the whole document: title, intro, then every record in order.
pub fn compose_records(
    composer: &mut dyn Composer,
    records: &[DocumentRecord],
    embed: &EmbedOptions,
) {
    composer.heading(DOCUMENT_TITLE, 1);
    composer.paragraph(INTRO);

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            composer.page_break();
        }
        compose_record(composer, i + 1, record, embed);
    }
}

/// One file: heading, pairs (or the empty notice), then the annotation line.
pub fn compose_record(
    composer: &mut dyn Composer,
    number: usize,
    record: &DocumentRecord,
    embed: &EmbedOptions,
) {
    composer.heading(&format!("[{}] {}", number, record.file_name()), 2);

    let (label, matched) = record.display_label();
    let label = if label.is_empty() {
        NO_CITATION.to_string()
    } else {
        label
    };

    let pairs = record.pair_count();
    if pairs == 0 {
        composer.citation_label(&label, matched);
        composer.paragraph(NO_FIGURES);
    }
    for i in 0..pairs {
        composer.citation_label(&label, matched);

        match record.images.get(i) {
            Some(image) => embed_image(composer, image, embed),
            None => composer.placeholder(NO_IMAGE),
        }
        match record.captions.get(i) {
            Some(caption) => composer.caption(caption),
            None => composer.placeholder(NO_CAPTION),
        }
    }

    composer.annotation(&annotation(record));
}

/// Place an image at the primary width, then the fallback width, then give
/// up with a placeholder naming the file.
pub fn embed_image(composer: &mut dyn Composer, image: &ImageRef, embed: &EmbedOptions) {
    for width in embed.widths() {
        let placed = fit_to_width(&image.path, width, embed.max_height_in)
            .and_then(|placement| composer.image(image, &placement));
        match placed {
            Ok(()) => return,
            Err(e) => log::warn!("Cannot embed at {}in: {}", width, e),
        }
    }
    composer.placeholder(&format!("[Image failed: {}]", image.file_name()));
}

/// `Title detected: … | Citation: … (score=0.00)`
pub fn annotation(record: &DocumentRecord) -> String {
    let title = record
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("N/A");
    let citation = record.citation.citation.as_deref().unwrap_or("N/A");
    format!(
        "Title detected: {} | Citation: {} (score={:.2})",
        title, citation, record.citation.score
    )
}
