mod config;
mod error;
mod export;
mod fonts;
pub mod layout;
mod model;
mod pdf;
mod source;

pub use config::{DEFAULT_FAMILIES, FontConfig};
pub use error::Error;
pub use export::{PDF_MIME, export_book, export_chapter};
pub use fonts::FontSet;
pub use layout::{TextMeasure, compose_book, wrap_text};
pub use model::{
    Book, Chapter, CoverImage, CoverMode, ExportFormat, ExportMetadata, ExportOptions,
    ExportOutput, ImageFormat, TrimSize,
};
pub use source::{load_book, resolve_chapters};

use std::path::Path;
use std::time::Instant;

/// Load a book document, export it and write the result into `out_dir`
/// under the export's own filename. Returns the written path.
pub fn export_book_file(
    input: &Path,
    chapters_dir: Option<&Path>,
    out_dir: &Path,
    options: &ExportOptions,
    fonts: &FontSet,
) -> Result<std::path::PathBuf, Error> {
    let t0 = Instant::now();

    let book = load_book(input, chapters_dir)?;
    let t_load = t0.elapsed();

    let output = export_book(&book, options, fonts)?;
    let t_export = t0.elapsed();

    let path = out_dir.join(&output.filename);
    std::fs::write(&path, &output.bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: load={:.1}ms, export={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_load.as_secs_f64() * 1000.0,
        (t_export - t_load).as_secs_f64() * 1000.0,
        (t_total - t_export).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        output.bytes.len(),
    );

    Ok(path)
}
