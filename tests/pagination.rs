mod common;

use common::{FixedAdvance, body_numbers, book, chapter, chapter_start_pages, latin_filler};
use eccomibook_export::layout::{
    CLASSIC_MARGIN, DrawOp, PageKind, TextRole, gutter_for_page_count,
};
use eccomibook_export::{CoverMode, Error, ExportOptions, FontSet, compose_book};

#[test]
fn two_chapter_test_book_on_six_by_nine() {
    common::init_logging();
    let fonts = FontSet::standard();
    let layout = compose_book(&common::two_chapter_book(), &ExportOptions::default(), &fonts)
        .expect("compose");

    let first = &layout.pages[0];
    assert_eq!(first.kind, PageKind::FrontCover);
    assert_eq!(first.number, None);
    assert!(first.text_ops().all(|t| t.role != TextRole::Footer));

    let numbers = body_numbers(&layout);
    let expected: Vec<u32> = (1..=numbers.len() as u32).collect();
    assert_eq!(numbers, expected);

    let starts = chapter_start_pages(&layout);
    assert_eq!(starts.len(), 2);
    assert_eq!(starts[0], 1);
    // each chapter spans at least two pages
    assert!(starts[1] >= 3);
    assert!(numbers.len() as u32 - starts[1] + 1 >= 2);

    for page in layout.body_pages() {
        let footer: Vec<_> = page
            .text_ops()
            .filter(|t| t.role == TextRole::Footer)
            .collect();
        assert_eq!(footer.len(), 1);
        assert_eq!(footer[0].text, page.number.unwrap_or_default().to_string());
    }
}

#[test]
fn numbering_stays_contiguous_across_many_chapters() {
    let measure = FixedAdvance::uniform(0.5);
    let chapters = (0..12)
        .map(|i| chapter(&format!("c{i}"), &format!("Capitolo {i}"), &latin_filler(200 + i * 700)))
        .collect();
    let options = ExportOptions {
        cover_mode: CoverMode::FrontAndBack,
        backcover_text: Some("Una storia breve.".to_string()),
        ..ExportOptions::default()
    };
    let layout = compose_book(&book("Molti", chapters), &options, &measure).expect("compose");

    let numbers = body_numbers(&layout);
    assert_eq!(numbers, (1..=numbers.len() as u32).collect::<Vec<_>>());
    assert_eq!(layout.pages.last().map(|p| p.kind), Some(PageKind::BackCover));
    assert_eq!(layout.content_page_count(), numbers.len());
}

#[test]
fn chapter_titles_open_their_page_above_body_text() {
    let measure = FixedAdvance::uniform(0.5);
    let chapters = (0..20)
        .map(|i| chapter(&format!("c{i}"), "Titolo", &latin_filler(150 + i * 97)))
        .collect::<Vec<_>>();
    let options = ExportOptions {
        cover_mode: CoverMode::None,
        ..ExportOptions::default()
    };
    let layout = compose_book(&book("Capitoli", chapters), &options, &measure).expect("compose");

    let mut titles = 0;
    for page in &layout.pages {
        let content: Vec<_> = page
            .text_ops()
            .filter(|t| t.role != TextRole::Footer)
            .collect();
        let Some(pos) = content.iter().position(|t| t.role == TextRole::ChapterTitle) else {
            continue;
        };
        titles += 1;
        assert_eq!(pos, 0, "page {:?}: title below other text", page.number);
        assert!(
            content[pos..].iter().any(|t| t.role == TextRole::Body),
            "page {:?} ends with a chapter title",
            page.number
        );
    }
    assert_eq!(titles, 20);
}

#[test]
fn untitled_chapter_shows_placeholder() {
    let measure = FixedAdvance::uniform(0.5);
    let options = ExportOptions {
        cover_mode: CoverMode::None,
        ..ExportOptions::default()
    };
    let layout = compose_book(
        &book("Libro", vec![chapter("c1", "", "Testo senza titolo.")]),
        &options,
        &measure,
    )
    .expect("compose");
    let title = layout.pages[0]
        .text_ops()
        .find(|t| t.role == TextRole::ChapterTitle)
        .expect("title line");
    assert_eq!(title.text, "Senza titolo");
}

#[test]
fn gutter_bands() {
    for pages in [1, 42, 150] {
        assert_eq!(gutter_for_page_count(pages), 27.0);
    }
    for pages in [151, 300] {
        assert_eq!(gutter_for_page_count(pages), 36.0);
    }
    for pages in [301, 500] {
        assert_eq!(gutter_for_page_count(pages), 45.0);
    }
    for pages in [501, 2000] {
        assert_eq!(gutter_for_page_count(pages), 54.0);
    }
}

#[test]
fn kdp_margins_mirror_and_classic_margins_do_not() {
    let fonts = FontSet::standard();
    let book = common::two_chapter_book();

    let kdp = compose_book(&book, &ExportOptions::default(), &fonts).expect("kdp");
    let g = kdp.geometry;
    assert_eq!(g.gutter_margin, gutter_for_page_count(kdp.content_page_count()));
    let body: Vec<_> = kdp.body_pages().collect();
    for pair in body.windows(2) {
        let (a, b) = (&pair[0].frame, &pair[1].frame);
        let a_right = g.width - a.right;
        let b_right = g.width - b.right;
        assert_eq!(a.left, b_right);
        assert_eq!(a_right, b.left);
        assert_ne!(a.left, b.left);
    }
    let recto = body[0].frame;
    assert_eq!(recto.left, g.outer_margin + g.gutter_margin);

    let classic_opts = ExportOptions {
        classic: true,
        ..ExportOptions::default()
    };
    let classic = compose_book(&book, &classic_opts, &fonts).expect("classic");
    for page in classic.body_pages() {
        assert!((page.frame.left - CLASSIC_MARGIN).abs() < 1e-3);
        assert!((classic.geometry.width - page.frame.right - CLASSIC_MARGIN).abs() < 1e-3);
        assert!((page.frame.bottom - CLASSIC_MARGIN).abs() < 1e-3);
    }
    assert!((classic.geometry.width - 595.28).abs() < 0.01);
}

#[test]
fn classic_cover_carries_generator_stamp() {
    let fonts = FontSet::standard();
    let options = ExportOptions {
        classic: true,
        ..ExportOptions::default()
    };
    let layout = compose_book(&common::two_chapter_book(), &options, &fonts).expect("compose");
    let cover = &layout.pages[0];
    assert!(
        cover
            .text_ops()
            .any(|t| t.role == TextRole::CoverStamp && t.text.starts_with("Generated with EccomiBook"))
    );
    assert!(cover.text_ops().any(|t| t.text == "di Ada Rossi"));
}

#[test]
fn recto_mode_opens_chapters_on_odd_pages() {
    let measure = FixedAdvance::uniform(0.5);
    let chapters = (0..5)
        .map(|i| chapter(&format!("c{i}"), &format!("Parte {i}"), &latin_filler(900 * (i + 1))))
        .collect();
    let options = ExportOptions {
        chapters_on_recto: true,
        cover_mode: CoverMode::None,
        ..ExportOptions::default()
    };
    let layout = compose_book(&book("Recto", chapters), &options, &measure).expect("compose");

    let starts = chapter_start_pages(&layout);
    assert_eq!(starts.len(), 5);
    assert!(starts.iter().all(|n| n % 2 == 1), "starts: {starts:?}");

    let numbers = body_numbers(&layout);
    assert_eq!(numbers, (1..=numbers.len() as u32).collect::<Vec<_>>());
    for blank in layout.pages.iter().filter(|p| p.kind == PageKind::Blank) {
        assert!(blank.ops.is_empty());
        assert_eq!(blank.number.map(|n| n % 2), Some(0));
    }
}

#[test]
fn footers_sit_on_outer_edge() {
    let fonts = FontSet::standard();
    let layout = compose_book(&common::two_chapter_book(), &ExportOptions::default(), &fonts)
        .expect("compose");
    for page in layout.body_pages() {
        let Some(footer) = page.text_ops().find(|t| t.role == TextRole::Footer) else {
            continue;
        };
        let n = page.number.unwrap_or_default();
        if n % 2 == 1 {
            assert!(footer.x > page.frame.left + page.frame.width() / 2.0);
        } else {
            assert_eq!(footer.x, page.frame.left);
        }
    }
}

#[test]
fn page_numbers_can_be_turned_off() {
    let fonts = FontSet::standard();
    let options = ExportOptions {
        page_numbers: false,
        ..ExportOptions::default()
    };
    let layout = compose_book(&common::two_chapter_book(), &options, &fonts).expect("compose");
    assert!(
        layout
            .pages
            .iter()
            .flat_map(|p| p.text_ops())
            .all(|t| t.role != TextRole::Footer)
    );
    assert!(body_numbers(&layout).len() >= 4);
}

#[test]
fn cover_image_box_sits_inside_cover_frame() {
    let fonts = FontSet::standard();
    let options = ExportOptions {
        cover_image: Some(common::tiny_png_cover(40, 60)),
        ..ExportOptions::default()
    };
    let layout = compose_book(&common::two_chapter_book(), &options, &fonts).expect("compose");
    let cover = &layout.pages[0];
    let (x, y, w, h) = cover
        .ops
        .iter()
        .find_map(|op| match op {
            DrawOp::CoverImage {
                x,
                y,
                width,
                height,
            } => Some((*x, *y, *width, *height)),
            DrawOp::Text(_) => None,
        })
        .expect("image placed");
    assert!(x >= cover.frame.left - 1e-3);
    assert!(x + w <= cover.frame.right + 1e-3);
    assert!((y + h - cover.frame.top).abs() < 1e-3);
    assert!((w / h - 40.0 / 60.0).abs() < 1e-3);
}

#[test]
fn empty_book_is_rejected() {
    let fonts = FontSet::standard();
    let err = compose_book(&book("Vuoto", Vec::new()), &ExportOptions::default(), &fonts)
        .expect_err("no chapters");
    assert!(matches!(err, Error::EmptyBook(ref title) if title == "Vuoto"));
}
