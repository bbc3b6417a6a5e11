use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::config::FontConfig;
use crate::layout::{FontFace, TextMeasure};

/// Unicode ranges whose advances are cached at load time: Latin through
/// Latin Extended-B, General Punctuation, and the euro sign.
const MEASURED_RANGES: &[(u32, u32)] = &[(0x20, 0x24F), (0x2000, 0x206F), (0x20AC, 0x20AC)];

/// Windows-1252 bytes 0x80-0x9F that do not map to the same code point.
const WINANSI_HIGH: &[(u8, char)] = &[
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

/// Map a char to its WinAnsi byte, or `None` if it has no slot.
fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007E | 0x00A0..=0x00FF => Some(c as u8),
        _ => WINANSI_HIGH
            .iter()
            .find(|&&(_, ch)| ch == c)
            .map(|&(byte, _)| byte),
    }
}

/// Encode text for a standard font. Characters outside WinAnsi are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().filter_map(char_to_winansi).collect()
}

/// Encode text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Helvetica advance widths (AFM, 1000 units/em) for WinAnsi bytes 32..=255.
/// Unassigned slots carry the bullet width.
const HELVETICA_WIDTHS: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 350, // 112
    556, 350, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350, // 128
    350, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 350, 500, 667, // 144
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 160
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 176
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 192
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 208
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 224
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 240
];

/// Helvetica-Bold advance widths, laid out like [`HELVETICA_WIDTHS`].
const HELVETICA_BOLD_WIDTHS: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 32
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 48
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 64
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 80
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 96
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 350, // 112
    556, 350, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350, // 128
    350, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 350, 500, 667, // 144
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 160
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 176
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 192
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 208
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278, // 224
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556, // 240
];

const WINANSI_FIRST: u8 = 32;
const WINANSI_LAST: u8 = 255;

/// A TrueType/OpenType face read from disk, kept in memory for embedding.
pub(crate) struct LoadedFace {
    family: String,
    path: PathBuf,
    data: Vec<u8>,
    face_index: u32,
    widths_1000: HashMap<char, f32>,
    fallback_width_1000: f32,
}

impl LoadedFace {
    fn load(path: &Path, face_index: u32) -> Option<LoadedFace> {
        let data = match std::fs::read(path) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Cannot read font {}: {e}", path.display());
                return None;
            }
        };
        let face = Face::parse(&data, face_index).ok()?;
        let units = face.units_per_em() as f32;
        let family = font_family_name(&face).unwrap_or_else(|| path.display().to_string());

        let mut widths_1000 = HashMap::new();
        for &(start, end) in MEASURED_RANGES {
            for cp in start..=end {
                let Some(ch) = char::from_u32(cp) else {
                    continue;
                };
                if let Some(adv) = face.glyph_index(ch).and_then(|gid| face.glyph_hor_advance(gid)) {
                    widths_1000.insert(ch, adv as f32 / units * 1000.0);
                }
            }
        }
        let lower: Vec<f32> = ('a'..='z').filter_map(|c| widths_1000.get(&c).copied()).collect();
        let fallback_width_1000 = if lower.is_empty() {
            500.0
        } else {
            lower.iter().sum::<f32>() / lower.len() as f32
        };

        Some(LoadedFace {
            family,
            path: path.to_path_buf(),
            face_index,
            widths_1000,
            fallback_width_1000,
            data,
        })
    }
}

pub(crate) enum FontSource {
    Embedded(LoadedFace),
    /// One of the base-14 fonts; never embedded.
    Standard {
        base_font: &'static str,
        widths_1000: &'static [u16; 224],
    },
}

impl FontSource {
    fn char_width_1000(&self, ch: char) -> f32 {
        match self {
            FontSource::Embedded(face) => face
                .widths_1000
                .get(&ch)
                .copied()
                .unwrap_or(face.fallback_width_1000),
            FontSource::Standard { widths_1000, .. } => match char_to_winansi(ch) {
                Some(byte) => f32::from(widths_1000[usize::from(byte - WINANSI_FIRST)]),
                None => 0.0,
            },
        }
    }

    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    fn name(&self) -> &str {
        match self {
            FontSource::Embedded(face) => &face.family,
            FontSource::Standard { base_font, .. } => base_font,
        }
    }
}

/// The regular and bold faces used for a whole process.
///
/// Built once at startup; `fonts_embedded()` reports whether output PDFs will
/// carry an embedded font or fall back to the non-embedded Helvetica pair.
pub struct FontSet {
    regular: FontSource,
    bold: Option<FontSource>,
}

impl FontSet {
    pub fn standard() -> FontSet {
        FontSet {
            regular: FontSource::Standard {
                base_font: "Helvetica",
                widths_1000: &HELVETICA_WIDTHS,
            },
            bold: Some(FontSource::Standard {
                base_font: "Helvetica-Bold",
                widths_1000: &HELVETICA_BOLD_WIDTHS,
            }),
        }
    }

    /// Locate an embeddable family on the host. Never fails: if nothing
    /// usable is found the standard set is returned with a warning.
    pub fn discover(config: &FontConfig) -> FontSet {
        let t0 = std::time::Instant::now();

        if let Some(path) = &config.regular_path {
            if let Some(regular) = LoadedFace::load(path, 0) {
                let bold = config.bold_path.as_deref().and_then(|p| LoadedFace::load(p, 0));
                log::info!(
                    "Using configured font {} (bold: {})",
                    regular.path.display(),
                    bold.as_ref().map_or("none".to_string(), |b| b.path.display().to_string()),
                );
                return FontSet {
                    regular: FontSource::Embedded(regular),
                    bold: bold.map(FontSource::Embedded),
                };
            }
            log::warn!(
                "Configured font {} is not a usable TrueType/OpenType file",
                path.display()
            );
        }

        let index = scan_font_dirs(&config.search_dirs());
        for family in &config.families {
            let key = family.to_lowercase();
            let Some((path, face_index)) = index.get(&(key.clone(), false, false)) else {
                continue;
            };
            let Some(regular) = LoadedFace::load(path, *face_index) else {
                continue;
            };
            let bold = index
                .get(&(key, true, false))
                .and_then(|(p, i)| LoadedFace::load(p, *i));
            log::info!(
                "Font discovery: {:.1}ms, using {} ({}{})",
                t0.elapsed().as_secs_f64() * 1000.0,
                regular.family,
                regular.path.display(),
                if bold.is_some() { ", with bold" } else { ", no bold face" },
            );
            return FontSet {
                regular: FontSource::Embedded(regular),
                bold: bold.map(FontSource::Embedded),
            };
        }

        log::warn!(
            "No embeddable font found among {:?} — using Helvetica (not embedded)",
            config.families
        );
        FontSet::standard()
    }

    pub fn fonts_embedded(&self) -> bool {
        matches!(self.regular, FontSource::Embedded(_))
    }

    pub fn family(&self) -> &str {
        self.regular.name()
    }

    /// The face actually used for `face`; bold falls back to regular when
    /// the family has no bold face.
    pub(crate) fn resolve(&self, face: FontFace) -> FontFace {
        match face {
            FontFace::Bold if self.bold.is_some() => FontFace::Bold,
            _ => FontFace::Regular,
        }
    }

    pub(crate) fn source(&self, face: FontFace) -> &FontSource {
        match (face, &self.bold) {
            (FontFace::Bold, Some(bold)) => bold,
            _ => &self.regular,
        }
    }
}

impl TextMeasure for FontSet {
    fn text_width(&self, text: &str, face: FontFace, font_size: f32) -> f32 {
        self.source(face).text_width(text, font_size)
    }
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

fn font_family_name(face: &Face) -> Option<String> {
    // Name ID 1 keeps "DejaVu Serif Condensed" apart from "DejaVu Serif".
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn is_font_collection(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

fn scan_font_dirs(dirs: &[PathBuf]) -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut files_scanned = 0u32;
    let mut visited: HashSet<PathBuf> = HashSet::new();

    // Earlier directories win; the stack is popped from the end.
    let mut stack: Vec<PathBuf> = dirs.iter().rev().cloned().collect();
    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };

        let mut subdirs = Vec::new();
        let mut font_files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
            } else if is_font_file(&path) {
                font_files.push(path);
            }
        }
        font_files.sort();

        for file_path in font_files {
            files_scanned += 1;
            let Ok(file) = std::fs::File::open(&file_path) else {
                continue;
            };
            // SAFETY: the map is read-only and dropped before the next file.
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = if is_font_collection(&file_path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                let Ok(face) = Face::parse(&data, face_idx) else {
                    continue;
                };
                if let Some(family) = font_family_name(&face) {
                    index
                        .entry((family.to_lowercase(), face.is_bold(), face.is_italic()))
                        .or_insert((file_path.clone(), face_idx));
                }
            }
        }

        subdirs.sort();
        stack.extend(subdirs.into_iter().rev());
    }

    log::info!(
        "Font scan: {:.1}ms, {} dirs, {} files parsed → {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        visited.len(),
        files_scanned,
        index.len(),
    );

    index
}

/// A font written into a PDF, ready for content streams.
pub(crate) struct RegisteredFont {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    char_to_gid: Option<HashMap<char, u16>>,
}

impl RegisteredFont {
    /// False for base-14 fonts, including the Helvetica written when
    /// embedding a face failed.
    pub(crate) fn is_embedded(&self) -> bool {
        self.char_to_gid.is_some()
    }

    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

/// Embed a TrueType/OpenType face as a Type0 CIDFont with Identity-H
/// encoding, subset to `used_chars`. Returns the char → new glyph id map.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    loaded: &LoadedFace,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<HashMap<char, u16>> {
    let face = Face::parse(&loaded.data, loaded.face_index).ok()?;

    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;
    let ascent = to_1000(face.ascender() as f32);
    let descent = to_1000(face.descender() as f32);
    let cap_height = face
        .capital_height()
        .map(|h| to_1000(h as f32))
        .unwrap_or(700.0);
    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min as f32),
        to_1000(bb.y_min as f32),
        to_1000(bb.x_max as f32),
        to_1000(bb.y_max as f32),
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    let mut chars: Vec<char> = used_chars.iter().copied().collect();
    chars.sort_unstable();
    for ch in chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            char_to_gid.insert(ch, new_gid);
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| to_1000(adv as f32))
                .unwrap_or(0.0);
            gid_widths.push((new_gid, w));
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset_data = subsetter::subset(&loaded.data, loaded.face_index, &remapper)
        .unwrap_or_else(|e| {
            log::warn!("Font subsetting failed for {}: {e} — embedding full font", loaded.family);
            loaded.data.clone()
        });

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name: String = loaded.family.chars().filter(|c| !c.is_whitespace()).collect();

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(identity_system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(char_to_gid)
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    }
}

/// Base-14 font with an explicit /Widths array, so viewers advance glyphs by
/// the same amounts the line wrapper measured.
fn write_standard_font(pdf: &mut Pdf, font_ref: Ref, base_font: &str, widths_1000: &[u16; 224]) {
    pdf.type1_font(font_ref)
        .base_font(Name(base_font.as_bytes()))
        .encoding_predefined(Name(b"WinAnsiEncoding"))
        .first_char(WINANSI_FIRST)
        .last_char(WINANSI_LAST)
        .widths(widths_1000.iter().map(|&w| f32::from(w)));
}

pub(crate) fn register_font(
    pdf: &mut Pdf,
    source: &FontSource,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> RegisteredFont {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = match source {
        FontSource::Embedded(loaded) => {
            let map = embed_truetype(pdf, font_ref, loaded, used_chars, alloc);
            if map.is_none() {
                log::warn!("Embedding {} failed, using Helvetica", loaded.family);
                write_standard_font(pdf, font_ref, "Helvetica", &HELVETICA_WIDTHS);
            }
            map
        }
        FontSource::Standard {
            base_font,
            widths_1000,
        } => {
            write_standard_font(pdf, font_ref, base_font, widths_1000);
            None
        }
    };

    log::debug!(
        "register_font: {} as {pdf_name} ({} chars) → {:.1}ms",
        source.name(),
        used_chars.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    RegisteredFont {
        pdf_name,
        font_ref,
        char_to_gid,
    }
}

#[cfg(test)]
impl FontSet {
    /// A set whose regular face passed discovery but whose bytes no longer
    /// parse, so writing it into a PDF fails.
    pub(crate) fn with_unparseable_face() -> FontSet {
        FontSet {
            regular: FontSource::Embedded(LoadedFace {
                family: "Broken Serif".to_string(),
                path: PathBuf::from("broken.ttf"),
                data: b"not a font".to_vec(),
                face_index: 0,
                widths_1000: HashMap::new(),
                fallback_width_1000: 300.0,
            }),
            bold: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc_from(start: i32) -> impl FnMut() -> Ref {
        let mut next = start;
        move || {
            let r = Ref::new(next);
            next += 1;
            r
        }
    }

    #[test]
    fn standard_widths_follow_afm() {
        assert_eq!(HELVETICA_WIDTHS[usize::from(b'W' - WINANSI_FIRST)], 944);
        assert_eq!(HELVETICA_WIDTHS[usize::from(b'i' - WINANSI_FIRST)], 222);
        assert_eq!(HELVETICA_BOLD_WIDTHS[usize::from(b'@' - WINANSI_FIRST)], 975);
        // euro lives at 0x80
        let set = FontSet::standard();
        assert_eq!(set.source(FontFace::Regular).char_width_1000('€'), 556.0);
        assert_eq!(set.source(FontFace::Bold).char_width_1000('à'), 556.0);
    }

    #[test]
    fn failed_embedding_writes_helvetica_with_widths() {
        let broken = FontSet::with_unparseable_face();
        assert!(broken.fonts_embedded());

        let mut pdf = Pdf::new();
        let mut alloc = alloc_from(1);
        let chars: HashSet<char> = "abc ".chars().collect();
        let font = register_font(
            &mut pdf,
            broken.source(FontFace::Regular),
            "F1".to_string(),
            &mut alloc,
            &chars,
        );
        assert!(!font.is_embedded());
        assert_eq!(font.encode("abc"), b"abc".to_vec());

        let bytes = pdf.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("/FirstChar 32"));
        assert!(text.contains("/LastChar 255"));
        assert!(text.contains("/Widths ["));
    }
}
