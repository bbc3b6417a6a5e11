use crate::model::{Book, CoverImage, ExportOptions};

use super::compose::Typography;
use super::geometry::{Frame, PageGeometry};
use super::reflow::{TextMeasure, wrap_text};
use super::{DrawOp, FontFace, Page, PageKind, TextOp, TextRole};

const COVER_TITLE_SIZE: f32 = 24.0;
const COVER_TITLE_LEADING: f32 = 30.0;
const COVER_AUTHOR_SIZE: f32 = 14.0;
const COVER_STAMP_SIZE: f32 = 9.0;
const BACK_HEADING_SIZE: f32 = 18.0;
const BACK_HEADING_LEADING: f32 = 24.0;
/// Share of the frame height an image may take above the title block.
const COVER_IMAGE_SHARE: f32 = 0.55;

fn centered(
    frame: &Frame,
    measure: &dyn TextMeasure,
    role: TextRole,
    face: FontFace,
    font_size: f32,
    baseline_y: f32,
    text: String,
) -> DrawOp {
    let w = measure.text_width(&text, face, font_size);
    DrawOp::Text(TextOp {
        role,
        face,
        font_size,
        x: frame.left + (frame.width() - w) / 2.0,
        baseline_y,
        text,
    })
}

/// Fit the image inside `frame`'s width and the top share of its height,
/// keeping the aspect ratio. Returns the box as (x, y, w, h).
fn fit_cover_image(img: &CoverImage, frame: &Frame) -> (f32, f32, f32, f32) {
    let max_w = frame.width();
    let max_h = frame.height() * COVER_IMAGE_SHARE;
    let aspect = img.pixel_width.max(1) as f32 / img.pixel_height.max(1) as f32;
    let (w, h) = if max_w / aspect <= max_h {
        (max_w, max_w / aspect)
    } else {
        (max_h * aspect, max_h)
    };
    let x = frame.left + (max_w - w) / 2.0;
    (x, frame.top - h, w, h)
}

/// Centred title/author block, with the cover image above it when given.
/// The classic layout also stamps the generator line at the foot.
pub(super) fn front_cover(
    book: &Book,
    geometry: &PageGeometry,
    typo: &Typography,
    measure: &dyn TextMeasure,
    options: &ExportOptions,
) -> Page {
    let frame = geometry.cover_frame();
    let mut ops = Vec::new();

    let mut y = match &options.cover_image {
        Some(img) => {
            let (x, y, width, height) = fit_cover_image(img, &frame);
            ops.push(DrawOp::CoverImage {
                x,
                y,
                width,
                height,
            });
            y - COVER_TITLE_LEADING
        }
        None => frame.top - frame.height() / 4.0,
    };

    for line in wrap_text(
        book.display_title(),
        frame.width(),
        FontFace::Bold,
        COVER_TITLE_SIZE,
        measure,
    ) {
        ops.push(centered(
            &frame,
            measure,
            TextRole::CoverTitle,
            FontFace::Bold,
            COVER_TITLE_SIZE,
            y,
            line,
        ));
        y -= COVER_TITLE_LEADING;
    }

    if let Some(byline) = book.byline() {
        ops.push(centered(
            &frame,
            measure,
            TextRole::CoverAuthor,
            FontFace::Regular,
            COVER_AUTHOR_SIZE,
            y - typo.title_gap,
            byline,
        ));
    }

    if options.classic {
        let stamp = format!(
            "Generated with EccomiBook · {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
        );
        ops.push(centered(
            &frame,
            measure,
            TextRole::CoverStamp,
            FontFace::Regular,
            COVER_STAMP_SIZE,
            geometry.footer_baseline(COVER_STAMP_SIZE),
            stamp,
        ));
    }

    Page {
        kind: PageKind::FrontCover,
        number: None,
        frame,
        ops,
    }
}

/// Book title as heading, then the blurb wrapped in body type. Lines that do
/// not fit on the page are dropped.
pub(super) fn back_cover(
    book: &Book,
    geometry: &PageGeometry,
    typo: &Typography,
    measure: &dyn TextMeasure,
    blurb: Option<&str>,
) -> Page {
    let frame = geometry.cover_frame();
    let mut ops = Vec::new();
    let mut y = frame.top - BACK_HEADING_SIZE;

    for line in wrap_text(
        book.display_title(),
        frame.width(),
        FontFace::Bold,
        BACK_HEADING_SIZE,
        measure,
    ) {
        ops.push(centered(
            &frame,
            measure,
            TextRole::BackCoverHeading,
            FontFace::Bold,
            BACK_HEADING_SIZE,
            y,
            line,
        ));
        y -= BACK_HEADING_LEADING;
    }
    y -= typo.body_leading;

    let blurb = blurb.map(str::trim).unwrap_or_default();
    if !blurb.is_empty() {
        let lines = wrap_text(blurb, frame.width(), FontFace::Regular, typo.body_size, measure);
        let total = lines.len();
        let mut placed = 0usize;
        for line in lines {
            if y < frame.bottom {
                break;
            }
            if !line.is_empty() {
                ops.push(DrawOp::Text(TextOp {
                    role: TextRole::BackCoverBody,
                    face: FontFace::Regular,
                    font_size: typo.body_size,
                    x: frame.left,
                    baseline_y: y,
                    text: line,
                }));
            }
            y -= typo.body_leading;
            placed += 1;
        }
        if placed < total {
            log::warn!(
                "Back cover blurb truncated: {} of {} lines fit",
                placed,
                total
            );
        }
    }

    Page {
        kind: PageKind::BackCover,
        number: None,
        frame,
        ops,
    }
}
