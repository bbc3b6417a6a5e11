use crate::error::Error;
use crate::model::{Book, ExportOptions};

use super::cover::{back_cover, front_cover};
use super::geometry::{Frame, PageGeometry, gutter_for_page_count};
use super::reflow::{TextMeasure, wrap_text};
use super::{DrawOp, FontFace, Layout, Page, PageKind, TextOp, TextRole};

/// Approximate ascent as a fraction of the font size, used to place the
/// baseline inside a line slot.
const ASCENT_RATIO: f32 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Typography {
    pub body_size: f32,
    pub body_leading: f32,
    pub title_size: f32,
    pub title_leading: f32,
    /// Space between the last title line and the first body line.
    pub title_gap: f32,
    pub footer_size: f32,
}

impl Typography {
    pub fn kdp() -> Typography {
        Typography {
            body_size: 11.0,
            body_leading: 14.0,
            title_size: 16.0,
            title_leading: 22.0,
            title_gap: 10.0,
            footer_size: 9.0,
        }
    }

    pub fn classic() -> Typography {
        Typography {
            body_size: 11.0,
            body_leading: 14.0,
            title_size: 14.0,
            title_leading: 20.0,
            title_gap: 0.0,
            footer_size: 9.0,
        }
    }
}

struct RenderCursor {
    page_number: u32,
    /// Top of the next line slot.
    y: f32,
    frame: Frame,
}

struct Composer<'a> {
    geometry: &'a PageGeometry,
    typo: &'a Typography,
    measure: &'a dyn TextMeasure,
    page_numbers: bool,
    chapters_on_recto: bool,
    cursor: RenderCursor,
    current: Vec<DrawOp>,
    pages: Vec<Page>,
}

impl<'a> Composer<'a> {
    fn new(
        geometry: &'a PageGeometry,
        typo: &'a Typography,
        measure: &'a dyn TextMeasure,
        options: &ExportOptions,
    ) -> Self {
        let frame = geometry.frame(1);
        Composer {
            geometry,
            typo,
            measure,
            page_numbers: options.page_numbers,
            chapters_on_recto: options.chapters_on_recto,
            cursor: RenderCursor {
                page_number: 1,
                y: frame.top,
                frame,
            },
            current: Vec::new(),
            pages: Vec::new(),
        }
    }

    fn at_page_top(&self) -> bool {
        (self.cursor.y - self.cursor.frame.top).abs() < 0.5
    }

    fn remaining(&self) -> f32 {
        self.cursor.y - self.cursor.frame.bottom
    }

    fn footer(&self) -> Option<DrawOp> {
        if !self.page_numbers {
            return None;
        }
        let size = self.typo.footer_size;
        let text = self.cursor.page_number.to_string();
        let w = self.measure.text_width(&text, FontFace::Regular, size);
        let frame = self.cursor.frame;
        // Outer edge: right on rectos, left on versos.
        let x = if !self.geometry.mirrored {
            frame.left + (frame.width() - w) / 2.0
        } else if self.cursor.page_number % 2 == 1 {
            frame.right - w
        } else {
            frame.left
        };
        Some(DrawOp::Text(TextOp {
            role: TextRole::Footer,
            face: FontFace::Regular,
            font_size: size,
            x,
            baseline_y: self.geometry.footer_baseline(size),
            text,
        }))
    }

    fn close_page(&mut self, kind: PageKind) {
        let mut ops = std::mem::take(&mut self.current);
        if kind == PageKind::Body
            && let Some(footer) = self.footer()
        {
            ops.push(footer);
        }
        self.pages.push(Page {
            kind,
            number: Some(self.cursor.page_number),
            frame: self.cursor.frame,
            ops,
        });
    }

    fn open_next_page(&mut self) {
        let number = self.cursor.page_number + 1;
        let frame = self.geometry.frame(number);
        self.cursor = RenderCursor {
            page_number: number,
            y: frame.top,
            frame,
        };
    }

    fn break_page(&mut self) {
        self.close_page(PageKind::Body);
        self.open_next_page();
    }

    fn place_line(&mut self, role: TextRole, face: FontFace, size: f32, leading: f32, text: String) {
        if !text.is_empty() {
            self.current.push(DrawOp::Text(TextOp {
                role,
                face,
                font_size: size,
                x: self.cursor.frame.left,
                baseline_y: self.cursor.y - size * ASCENT_RATIO,
                text,
            }));
        }
        self.cursor.y -= leading;
    }

    /// Place one chapter. `title` is already resolved to its placeholder
    /// when the chapter has none.
    fn chapter(&mut self, title: &str, body: &str, first: bool) {
        if !first {
            self.break_page();
        }
        if self.chapters_on_recto && self.cursor.page_number % 2 == 0 {
            self.close_page(PageKind::Blank);
            self.open_next_page();
        }

        let typo = *self.typo;
        let width = self.cursor.frame.width();
        let title_lines = wrap_text(title.trim(), width, FontFace::Bold, typo.title_size, self.measure);
        let body = body.trim();
        let body_lines = wrap_text(body, width, FontFace::Regular, typo.body_size, self.measure);

        // Title and first body line stay together.
        let title_h = title_lines.len() as f32 * typo.title_leading + typo.title_gap;
        if !self.at_page_top() && self.remaining() < title_h + typo.body_leading {
            self.break_page();
        }

        for line in title_lines {
            self.place_line(
                TextRole::ChapterTitle,
                FontFace::Bold,
                typo.title_size,
                typo.title_leading,
                line,
            );
        }
        self.cursor.y -= typo.title_gap;

        for line in body_lines {
            if self.remaining() < typo.body_leading && !self.at_page_top() {
                self.break_page();
            }
            self.place_line(
                TextRole::Body,
                FontFace::Regular,
                typo.body_size,
                typo.body_leading,
                line,
            );
        }
    }

    fn finish(mut self) -> Vec<Page> {
        self.close_page(PageKind::Body);
        self.pages
    }
}

/// Paginate the book's chapters into numbered body pages starting at page 1.
pub(crate) fn compose_body(
    book: &Book,
    geometry: &PageGeometry,
    typo: &Typography,
    measure: &dyn TextMeasure,
    options: &ExportOptions,
) -> Vec<Page> {
    let mut composer = Composer::new(geometry, typo, measure, options);
    for (i, chapter) in book.chapters.iter().enumerate() {
        composer.chapter(book.chapter_title(chapter), &chapter.body, i == 0);
    }
    composer.finish()
}

/// Lay out the whole book: optional front cover, body pages, optional back
/// cover.
///
/// KDP layouts resolve the gutter in two passes: the first paginates without
/// a gutter to estimate the page count, the second uses the gutter implied by
/// that estimate. The result is not re-checked against the band.
pub fn compose_book(
    book: &Book,
    options: &ExportOptions,
    measure: &dyn TextMeasure,
) -> Result<Layout, Error> {
    if book.chapters.is_empty() {
        return Err(Error::EmptyBook(book.display_title().to_string()));
    }

    let (geometry, typo, body) = if options.classic {
        let geometry = PageGeometry::classic();
        let typo = Typography::classic();
        let body = compose_body(book, &geometry, &typo, measure, options);
        (geometry, typo, body)
    } else {
        let typo = Typography::kdp();
        let provisional = PageGeometry::kdp(options, 0.0);
        let estimate = compose_body(book, &provisional, &typo, measure, options).len();
        let gutter = gutter_for_page_count(estimate);
        let geometry = provisional.with_gutter(gutter);
        let body = compose_body(book, &geometry, &typo, measure, options);
        if gutter_for_page_count(body.len()) != gutter {
            log::debug!(
                "Gutter band changed after second pass ({} → {} pages); keeping {:.1}pt",
                estimate,
                body.len(),
                gutter,
            );
        }
        log::debug!(
            "Pagination: estimate={} pages, final={} pages, gutter={:.1}pt",
            estimate,
            body.len(),
            gutter,
        );
        (geometry, typo, body)
    };

    let mut pages = Vec::with_capacity(body.len() + 2);
    if options.cover_mode.has_front() {
        pages.push(front_cover(book, &geometry, &typo, measure, options));
    }
    pages.extend(body);
    if options.cover_mode.has_back() {
        pages.push(back_cover(
            book,
            &geometry,
            &typo,
            measure,
            options.backcover_text.as_deref(),
        ));
    }

    Ok(Layout { geometry, pages })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HalfEm;

    impl TextMeasure for HalfEm {
        fn text_width(&self, text: &str, _face: FontFace, font_size: f32) -> f32 {
            text.chars().count() as f32 * 0.5 * font_size
        }
    }

    fn title_ops(page: &Page) -> Vec<&TextOp> {
        page.text_ops()
            .filter(|t| t.role == TextRole::ChapterTitle)
            .collect()
    }

    /// Run `chapter` with the cursor `room` points above the frame bottom.
    fn chapter_with_room(room: f32) -> Vec<Page> {
        let options = ExportOptions {
            page_numbers: false,
            ..ExportOptions::default()
        };
        let geometry = PageGeometry::kdp(&options, 27.0);
        let typo = Typography::kdp();
        let mut composer = Composer::new(&geometry, &typo, &HalfEm, &options);
        composer.cursor.y = composer.cursor.frame.bottom + room;
        composer.chapter("Titolo", "Prima riga.", true);
        composer.finish()
    }

    #[test]
    fn title_without_room_for_a_body_line_moves_to_next_page() {
        let typo = Typography::kdp();
        // the title fits, the first body line after it does not
        let room = typo.title_leading + typo.title_gap + typo.body_leading / 2.0;
        let pages = chapter_with_room(room);

        assert_eq!(pages.len(), 2);
        assert!(title_ops(&pages[0]).is_empty());
        assert!(pages[0].text_ops().next().is_none());

        let titles = title_ops(&pages[1]);
        assert_eq!(titles.len(), 1);
        assert_eq!(
            titles[0].baseline_y,
            pages[1].frame.top - typo.title_size * ASCENT_RATIO
        );
        assert!(pages[1].text_ops().any(|t| t.role == TextRole::Body));
    }

    #[test]
    fn title_with_room_for_a_body_line_stays() {
        let typo = Typography::kdp();
        let room = typo.title_leading + typo.title_gap + typo.body_leading + 1.0;
        let pages = chapter_with_room(room);

        assert_eq!(pages.len(), 1);
        assert_eq!(title_ops(&pages[0]).len(), 1);
        assert!(pages[0].text_ops().any(|t| t.role == TextRole::Body));
    }

    #[test]
    fn blank_title_gets_placeholder() {
        let options = ExportOptions::default();
        let geometry = PageGeometry::kdp(&options, 27.0);
        let mut book = Book {
            id: None,
            title: "Libro".to_string(),
            author: None,
            language: "it".to_string(),
            chapters: vec![crate::model::Chapter {
                id: "c1".to_string(),
                title: "   ".to_string(),
                body: "Testo.".to_string(),
                content_path: None,
            }],
        };
        let pages = compose_body(&book, &geometry, &Typography::kdp(), &HalfEm, &options);
        let titles: Vec<&str> = title_ops(&pages[0]).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(titles, vec!["Senza titolo"]);

        book.language = "en".to_string();
        let pages = compose_body(&book, &geometry, &Typography::kdp(), &HalfEm, &options);
        assert_eq!(title_ops(&pages[0])[0].text, "Untitled");
    }
}
