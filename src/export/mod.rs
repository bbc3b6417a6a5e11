mod bundle;
mod text;

use std::time::Instant;

use crate::error::Error;
use crate::fonts::FontSet;
use crate::layout::compose_book;
use crate::model::{Book, ExportFormat, ExportMetadata, ExportOptions, ExportOutput};
use crate::pdf::{self, DocumentInfo};

pub const PDF_MIME: &str = "application/pdf";

fn render_pdf(
    book: &Book,
    options: &ExportOptions,
    fonts: &FontSet,
) -> Result<(Vec<u8>, ExportMetadata), Error> {
    let info = DocumentInfo {
        title: book.display_title(),
        author: book.author.as_deref(),
    };
    let mut layout = compose_book(book, options, fonts)?;
    let mut rendered = pdf::render(&layout, fonts, options.cover_image.as_ref(), &info)?;
    if fonts.fonts_embedded() && !rendered.fonts_embedded {
        // The writer fell back to Helvetica; lay out again with its metrics.
        log::warn!(
            "{} could not be embedded, repaginating with Helvetica",
            fonts.family()
        );
        let standard = FontSet::standard();
        layout = compose_book(book, options, &standard)?;
        rendered = pdf::render(&layout, &standard, options.cover_image.as_ref(), &info)?;
    }
    let metadata = ExportMetadata {
        page_count: layout.pages.len(),
        content_pages: layout.content_page_count(),
        fonts_embedded: rendered.fonts_embedded,
    };
    Ok((rendered.bytes, metadata))
}

fn export_as(
    book: &Book,
    stem: &str,
    options: &ExportOptions,
    fonts: &FontSet,
) -> Result<ExportOutput, Error> {
    if book.chapters.is_empty() {
        return Err(Error::EmptyBook(book.display_title().to_string()));
    }
    let t0 = Instant::now();

    let output = match options.format {
        ExportFormat::Pdf => {
            let (bytes, metadata) = render_pdf(book, options, fonts)?;
            ExportOutput {
                bytes,
                mime_type: PDF_MIME,
                filename: format!("{stem}.pdf"),
                metadata: Some(metadata),
            }
        }
        ExportFormat::Markdown => ExportOutput {
            bytes: text::markdown(book).into_bytes(),
            mime_type: text::MARKDOWN_MIME,
            filename: format!("{stem}.md"),
            metadata: None,
        },
        ExportFormat::Text => ExportOutput {
            bytes: text::plain_text(book).into_bytes(),
            mime_type: text::TEXT_MIME,
            filename: format!("{stem}.txt"),
            metadata: None,
        },
        ExportFormat::KdpBundle => {
            let (interior, metadata) = render_pdf(book, options, fonts)?;
            ExportOutput {
                bytes: bundle::kdp_bundle(book, options, &interior, &metadata)?,
                mime_type: bundle::ZIP_MIME,
                filename: format!("{stem}_kdp.zip"),
                metadata: Some(metadata),
            }
        }
    };

    log::info!(
        "Export {:?} of \"{}\": {} chapters, {} bytes in {:.1}ms",
        options.format,
        book.display_title(),
        book.chapters.len(),
        output.bytes.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(output)
}

/// Export a whole book in `options.format`.
///
/// Books without chapters are rejected for every format.
pub fn export_book(
    book: &Book,
    options: &ExportOptions,
    fonts: &FontSet,
) -> Result<ExportOutput, Error> {
    export_as(book, &book.file_stem(), options, fonts)
}

/// Export one chapter as a standalone document titled "<book> — <chapter>".
pub fn export_chapter(
    book: &Book,
    chapter_id: &str,
    options: &ExportOptions,
    fonts: &FontSet,
) -> Result<ExportOutput, Error> {
    let chapter = book
        .chapters
        .iter()
        .find(|c| c.id == chapter_id)
        .ok_or_else(|| Error::ChapterNotFound(chapter_id.to_string()))?;

    let single = Book {
        title: format!("{} — {}", book.display_title(), book.chapter_title(chapter)),
        chapters: vec![chapter.clone()],
        ..book.clone()
    };
    let stem = format!("{}_{}", book.file_stem(), slug::slugify(&chapter.id));
    export_as(&single, &stem, options, fonts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Chapter;

    fn sample() -> Book {
        let body = "Il vento soffiava forte sulla costa e le barche restavano in porto. ".repeat(120);
        Book {
            id: Some("vento".to_string()),
            title: "Vento".to_string(),
            author: None,
            language: "it".to_string(),
            chapters: vec![Chapter {
                id: "c1".to_string(),
                title: "Costa".to_string(),
                body,
                content_path: None,
            }],
        }
    }

    #[test]
    fn unembeddable_face_falls_back_to_helvetica_layout() {
        let _ = env_logger::builder().is_test(true).try_init();
        let book = sample();
        let options = ExportOptions::default();

        let (_, metadata) =
            render_pdf(&book, &options, &FontSet::with_unparseable_face()).expect("render");
        assert!(!metadata.fonts_embedded);

        let (_, standard) =
            render_pdf(&book, &options, &FontSet::standard()).expect("render standard");
        assert_eq!(metadata.page_count, standard.page_count);
        assert_eq!(metadata.content_pages, standard.content_pages);
    }
}
