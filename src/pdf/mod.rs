mod xobject;

use std::collections::{HashMap, HashSet};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::{FontSet, RegisteredFont, register_font};
use crate::layout::{DrawOp, FontFace, Layout};
use crate::model::CoverImage;

use xobject::embed_cover_image;

const COVER_IMAGE_NAME: &str = "Im1";

/// Document information dictionary entries.
pub(crate) struct DocumentInfo<'a> {
    pub title: &'a str,
    pub author: Option<&'a str>,
}

/// Serialised PDF plus what actually went into it.
pub(crate) struct RenderedPdf {
    pub bytes: Vec<u8>,
    /// Every font resource is an embedded TrueType/OpenType subset.
    pub fonts_embedded: bool,
}

fn rect([x0, y0, x1, y1]: [f32; 4]) -> Rect {
    Rect::new(x0, y0, x1, y1)
}

/// Serialise a composed layout. Every page shares one sheet size; when the
/// layout carries bleed, pages also get TrimBox and BleedBox entries.
pub(crate) fn render(
    layout: &Layout,
    fonts: &FontSet,
    cover_image: Option<&CoverImage>,
    info: &DocumentInfo<'_>,
) -> Result<RenderedPdf, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: subset each face to the characters it actually draws
    let mut used_chars: HashMap<FontFace, HashSet<char>> = HashMap::new();
    for op in layout.pages.iter().flat_map(|p| p.text_ops()) {
        used_chars
            .entry(fonts.resolve(op.face))
            .or_default()
            .extend(op.text.chars());
    }
    for chars in used_chars.values_mut() {
        chars.insert(' ');
    }

    let mut registered: HashMap<FontFace, RegisteredFont> = HashMap::new();
    for (face, pdf_name) in [(FontFace::Regular, "F1"), (FontFace::Bold, "F2")] {
        let Some(chars) = used_chars.get(&face) else {
            continue;
        };
        let entry = register_font(
            &mut pdf,
            fonts.source(face),
            pdf_name.to_string(),
            &mut alloc,
            chars,
        );
        registered.insert(face, entry);
    }

    let fonts_embedded =
        !registered.is_empty() && registered.values().all(RegisteredFont::is_embedded);
    let t_fonts = t0.elapsed();

    let draws_image = layout
        .pages
        .iter()
        .flat_map(|p| p.ops.iter())
        .any(|op| matches!(op, DrawOp::CoverImage { .. }));
    let image_ref = match cover_image {
        Some(img) if draws_image => Some(embed_cover_image(&mut pdf, img, &mut alloc)?),
        _ => None,
    };

    let t_images = t0.elapsed();

    // Phase 2: one content stream per page
    let mut contents: Vec<Content> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let mut content = Content::new();
        for op in &page.ops {
            match op {
                DrawOp::Text(t) => {
                    if t.text.is_empty() {
                        continue;
                    }
                    let Some(font) = registered.get(&fonts.resolve(t.face)) else {
                        continue;
                    };
                    let bytes = font.encode(&t.text);
                    content
                        .begin_text()
                        .set_font(Name(font.pdf_name.as_bytes()), t.font_size)
                        .next_line(t.x, t.baseline_y)
                        .show(Str(&bytes))
                        .end_text();
                }
                DrawOp::CoverImage {
                    x,
                    y,
                    width,
                    height,
                } => {
                    if image_ref.is_none() {
                        continue;
                    }
                    content.save_state();
                    content.transform([*width, 0.0, 0.0, *height, *x, *y]);
                    content.x_object(Name(COVER_IMAGE_NAME.as_bytes()));
                    content.restore_state();
                }
            }
        }
        contents.push(content);
    }

    let t_content = t0.elapsed();

    // Phase 3: page tree
    let n = contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let mut font_pairs: Vec<(&str, Ref)> = registered
        .values()
        .map(|f| (f.pdf_name.as_str(), f.font_ref))
        .collect();
    font_pairs.sort_unstable_by_key(|&(name, _)| name);

    let geometry = &layout.geometry;
    let sheet = Rect::new(0.0, 0.0, geometry.width, geometry.height);
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(sheet).parent(pages_id).contents(content_ids[i]);
        if geometry.bleed_margin > 0.0 {
            page.trim_box(rect(geometry.trim_box()));
            page.bleed_box(sheet);
        }
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if let Some(image_ref) = image_ref {
            resources
                .x_objects()
                .pair(Name(COVER_IMAGE_NAME.as_bytes()), image_ref);
        }
    }

    {
        let mut doc_info = pdf.document_info(info_id);
        doc_info.title(TextStr(info.title));
        if let Some(author) = info.author {
            doc_info.author(TextStr(author));
        }
        doc_info.creator(TextStr("EccomiBook"));
        doc_info.producer(TextStr(concat!("eccomibook-export ", env!("CARGO_PKG_VERSION"))));
    }

    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: font_embed={:.1}ms, images={:.1}ms, content={:.1}ms, assembly={:.1}ms ({} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_content - t_images).as_secs_f64() * 1000.0,
        (t_assembly - t_content).as_secs_f64() * 1000.0,
        n,
    );

    Ok(RenderedPdf {
        bytes: pdf.finish(),
        fonts_embedded,
    })
}
