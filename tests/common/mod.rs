#![allow(dead_code)]

use eccomibook_export::layout::{FontFace, Layout, PageKind, TextRole};
use eccomibook_export::{Book, Chapter, CoverImage, TextMeasure};

const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat",
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Every character advances by a fixed fraction of the font size.
pub struct FixedAdvance {
    pub regular_em: f32,
    pub bold_em: f32,
}

impl FixedAdvance {
    pub fn uniform(em: f32) -> Self {
        FixedAdvance {
            regular_em: em,
            bold_em: em,
        }
    }
}

impl TextMeasure for FixedAdvance {
    fn text_width(&self, text: &str, face: FontFace, font_size: f32) -> f32 {
        let em = match face {
            FontFace::Regular => self.regular_em,
            FontFace::Bold => self.bold_em,
        };
        text.chars().count() as f32 * em * font_size
    }
}

/// Deterministic Latin filler of at least `min_chars` characters.
pub fn latin_filler(min_chars: usize) -> String {
    let mut out = String::new();
    let mut i = 0;
    while out.len() < min_chars {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(LOREM[i % LOREM.len()]);
        i += 1;
    }
    out
}

pub fn chapter(id: &str, title: &str, body: &str) -> Chapter {
    Chapter {
        id: id.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        content_path: None,
    }
}

pub fn book(title: &str, chapters: Vec<Chapter>) -> Book {
    Book {
        id: Some("test-book".to_string()),
        title: title.to_string(),
        author: Some("Ada Rossi".to_string()),
        language: "it".to_string(),
        chapters,
    }
}

/// Two chapters of 3000 characters each.
pub fn two_chapter_book() -> Book {
    book(
        "Test",
        vec![
            chapter("c1", "Primo", &latin_filler(3000)),
            chapter("c2", "Secondo", &latin_filler(3000)),
        ],
    )
}

/// Body page numbers in emission order.
pub fn body_numbers(layout: &Layout) -> Vec<u32> {
    layout.body_pages().filter_map(|p| p.number).collect()
}

/// Numbers of the pages that carry a chapter title.
pub fn chapter_start_pages(layout: &Layout) -> Vec<u32> {
    layout
        .pages
        .iter()
        .filter(|p| p.kind == PageKind::Body)
        .filter(|p| p.text_ops().any(|t| t.role == TextRole::ChapterTitle))
        .filter_map(|p| p.number)
        .collect()
}

/// A solid-colour PNG of the given pixel size.
pub fn tiny_png_cover(width: u32, height: u32) -> CoverImage {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([180, 40, 40]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png).expect("encode png");
    CoverImage::from_bytes(bytes.into_inner()).expect("decode png")
}
