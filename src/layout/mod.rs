mod compose;
mod cover;
mod geometry;
mod reflow;

pub use compose::{Typography, compose_book};
pub use geometry::{
    BLEED, CLASSIC_MARGIN, Frame, POINTS_PER_INCH, PageGeometry, gutter_for_page_count,
};
pub use reflow::{TextMeasure, wrap_text};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRole {
    ChapterTitle,
    Body,
    Footer,
    CoverTitle,
    CoverAuthor,
    CoverStamp,
    BackCoverHeading,
    BackCoverBody,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextOp {
    pub role: TextRole,
    pub face: FontFace,
    pub font_size: f32,
    /// Left edge of the run, alignment already applied.
    pub x: f32,
    pub baseline_y: f32,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text(TextOp),
    /// The cover image, scaled into the given box.
    CoverImage {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    FrontCover,
    Body,
    /// Inserted so the next chapter opens on a recto.
    Blank,
    BackCover,
}

#[derive(Clone, Debug)]
pub struct Page {
    pub kind: PageKind,
    /// Body sequence number; covers carry none.
    pub number: Option<u32>,
    pub frame: Frame,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn text_ops(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(t) => Some(t),
            DrawOp::CoverImage { .. } => None,
        })
    }
}

/// A composed document: every page in emission order on one sheet size.
#[derive(Clone, Debug)]
pub struct Layout {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn body_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages
            .iter()
            .filter(|p| matches!(p.kind, PageKind::Body | PageKind::Blank))
    }

    pub fn content_page_count(&self) -> usize {
        self.body_pages().count()
    }
}
