use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Error;
use crate::model::{Book, ExportMetadata, ExportOptions};

pub(super) const ZIP_MIME: &str = "application/zip";

fn metadata_sheet(book: &Book, options: &ExportOptions, metadata: &ExportMetadata) -> String {
    let trim = if options.classic {
        "A4 (classic)"
    } else {
        options.trim.label()
    };
    [
        format!("Title: {}", book.display_title()),
        format!("Author: {}", book.author.as_deref().unwrap_or_default()),
        format!("Language: {}", book.language),
        format!(
            "Generated: {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
        ),
        format!("Chapters: {}", book.chapters.len()),
        format!("Pages: {}", metadata.page_count),
        format!("Trim: {trim}"),
        format!("Bleed: {}", if options.bleed && !options.classic { "yes" } else { "no" }),
        format!(
            "Fonts embedded: {}",
            if metadata.fonts_embedded { "yes" } else { "no" }
        ),
    ]
    .join("\n")
}

/// Zip `interior.pdf` together with a plain-text `metadata.txt` sheet.
pub(super) fn kdp_bundle(
    book: &Book,
    options: &ExportOptions,
    interior: &[u8],
    metadata: &ExportMetadata,
) -> Result<Vec<u8>, Error> {
    let file_options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file("interior.pdf", file_options)?;
    zip.write_all(interior)?;
    zip.start_file("metadata.txt", file_options)?;
    zip.write_all(metadata_sheet(book, options, metadata).as_bytes())?;

    let bytes = zip.finish()?.into_inner();
    log::debug!("KDP bundle: {} bytes (interior {} bytes)", bytes.len(), interior.len());
    Ok(bytes)
}
