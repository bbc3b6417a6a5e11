use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Error;

fn default_language() -> String {
    "it".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "ChapterRecord")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    /// Plain text; hard newlines are kept as line breaks.
    pub body: String,
    /// File holding the chapter text, relative to the chapters directory
    /// unless absolute. Takes precedence over `body` when readable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_path: Option<PathBuf>,
}

/// Chapter as stored by the editor. The text may sit under `body`,
/// `content` or `text`; the first non-empty one wins.
#[derive(Deserialize)]
struct ChapterRecord {
    #[serde(default, alias = "chapter_id", alias = "cid")]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "path")]
    content_path: Option<PathBuf>,
}

impl From<ChapterRecord> for Chapter {
    fn from(record: ChapterRecord) -> Self {
        let body = [record.body, record.content, record.text]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        Chapter {
            id: record.id,
            title: record.title,
            body,
            content_path: record.content_path,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, alias = "book_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn is_italian(&self) -> bool {
        self.language.trim().to_ascii_lowercase().starts_with("it")
    }

    pub fn display_title(&self) -> &str {
        match self.title.trim() {
            "" if self.is_italian() => "Senza titolo",
            "" => "Untitled",
            t => t,
        }
    }

    /// "by Author" / "di Autore", or `None` without an author.
    pub fn byline(&self) -> Option<String> {
        let author = self.author.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
        Some(if self.is_italian() {
            format!("di {author}")
        } else {
            format!("by {author}")
        })
    }

    /// Chapter title, or the localized placeholder when it is blank.
    pub fn chapter_title<'a>(&self, chapter: &'a Chapter) -> &'a str {
        match chapter.title.trim() {
            "" if self.is_italian() => "Senza titolo",
            "" => "Untitled",
            t => t,
        }
    }

    pub fn chapter_label(&self) -> &'static str {
        if self.is_italian() { "Capitolo" } else { "Chapter" }
    }

    /// Base name for exported files: a slug of the book id, else of the
    /// title. Never contains path separators or `..`.
    pub fn file_stem(&self) -> String {
        [self.id.as_deref().unwrap_or(""), self.display_title()]
            .into_iter()
            .map(slug::slugify)
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| "book".to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TrimSize {
    #[default]
    SixByNine,
    FiveByEight,
    FiveHalfByEightHalf,
    Letter,
    A4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CoverMode {
    None,
    #[default]
    Front,
    FrontAndBack,
}

impl CoverMode {
    pub fn has_front(self) -> bool {
        !matches!(self, CoverMode::None)
    }

    pub fn has_back(self) -> bool {
        matches!(self, CoverMode::FrontAndBack)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Markdown,
    Text,
    KdpBundle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

#[derive(Clone)]
pub struct CoverImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub grayscale: bool,
}

impl CoverImage {
    /// Sniffs the format and pixel size. Only JPEG and PNG are accepted.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        let format = match image::guess_format(&data)? {
            image::ImageFormat::Jpeg => ImageFormat::Jpeg,
            image::ImageFormat::Png => ImageFormat::Png,
            other => return Err(Error::UnsupportedImage(format!("{other:?}"))),
        };
        let decoded = image::load_from_memory(&data)?;
        Ok(CoverImage {
            pixel_width: decoded.width(),
            pixel_height: decoded.height(),
            grayscale: decoded.color().channel_count() <= 2,
            format,
            data,
        })
    }
}

#[derive(Clone)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub trim: TrimSize,
    pub bleed: bool,
    pub cover_mode: CoverMode,
    pub backcover_text: Option<String>,
    /// Plain A4 with fixed 2 cm margins, no gutter and no mirroring.
    pub classic: bool,
    pub page_numbers: bool,
    /// Start every chapter on an odd (right-hand) page.
    pub chapters_on_recto: bool,
    /// Margins in points, measured from the trim edge.
    pub outer_margin: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub cover_image: Option<CoverImage>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            format: ExportFormat::Pdf,
            trim: TrimSize::SixByNine,
            bleed: false,
            cover_mode: CoverMode::Front,
            backcover_text: None,
            classic: false,
            page_numbers: true,
            chapters_on_recto: false,
            outer_margin: 36.0,
            top_margin: 54.0,
            bottom_margin: 54.0,
            cover_image: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportMetadata {
    /// Every page in the PDF, covers included.
    pub page_count: usize,
    /// Numbered body pages (inserted blank pages count).
    pub content_pages: usize,
    pub fonts_embedded: bool,
}

#[derive(Clone, Debug)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub filename: String,
    pub metadata: Option<ExportMetadata>,
}
