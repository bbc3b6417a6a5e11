mod common;

use eccomibook_export::layout::FontFace;
use eccomibook_export::{FontConfig, FontSet, TextMeasure};

fn isolated_config(dir: &std::path::Path) -> FontConfig {
    FontConfig {
        font_dirs: vec![dir.to_path_buf()],
        include_system_dirs: false,
        ..FontConfig::default()
    }
}

#[test]
fn empty_font_dir_falls_back_to_helvetica() {
    common::init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let fonts = FontSet::discover(&isolated_config(dir.path()));
    assert!(!fonts.fonts_embedded());
    assert_eq!(fonts.family(), "Helvetica");
}

#[test]
fn garbage_font_files_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("broken.ttf"), b"definitely not a font").expect("write");
    std::fs::create_dir(dir.path().join("nested")).expect("mkdir");
    std::fs::write(dir.path().join("nested/also-broken.otf"), [0u8; 64]).expect("write");

    let fonts = FontSet::discover(&isolated_config(dir.path()));
    assert!(!fonts.fonts_embedded());
}

#[test]
fn unusable_explicit_font_path_falls_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bogus = dir.path().join("Regular.ttf");
    std::fs::write(&bogus, b"nope").expect("write");
    let config = FontConfig {
        regular_path: Some(bogus),
        ..isolated_config(dir.path())
    };
    let fonts = FontSet::discover(&config);
    assert!(!fonts.fonts_embedded());
}

#[test]
fn standard_metrics_match_helvetica() {
    let fonts = FontSet::standard();
    // Helvetica: space 278, digits 556 per 1000 units
    assert!((fonts.text_width(" ", FontFace::Regular, 10.0) - 2.78).abs() < 1e-4);
    assert!((fonts.text_width("10", FontFace::Regular, 10.0) - 11.12).abs() < 1e-4);
    // characters outside WinAnsi do not advance
    assert_eq!(fonts.text_width("漢", FontFace::Regular, 10.0), 0.0);
    assert!(fonts.text_width("€", FontFace::Regular, 10.0) > 0.0);
}

#[test]
fn env_config_prepends_family_and_dirs() {
    // SAFETY: this is the only test in this binary touching these variables.
    unsafe {
        std::env::set_var("ECCOMIBOOK_FONT_FAMILY", "Gentium Plus");
        std::env::set_var("ECCOMIBOOK_FONTS", "/opt/fonts-a:/opt/fonts-b");
    }
    let config = FontConfig::from_env();
    unsafe {
        std::env::remove_var("ECCOMIBOOK_FONT_FAMILY");
        std::env::remove_var("ECCOMIBOOK_FONTS");
    }
    assert_eq!(config.families[0], "Gentium Plus");
    assert!(config.families.iter().any(|f| f == "DejaVu Serif"));
    if cfg!(not(windows)) {
        assert_eq!(
            config.font_dirs,
            vec![
                std::path::PathBuf::from("/opt/fonts-a"),
                std::path::PathBuf::from("/opt/fonts-b")
            ]
        );
    }
}
