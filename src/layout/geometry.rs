use crate::model::{ExportOptions, TrimSize};

pub const POINTS_PER_INCH: f32 = 72.0;
/// Print-on-demand bleed, 0.125 in on every side of the sheet.
pub const BLEED: f32 = 0.125 * POINTS_PER_INCH;
/// Classic layout margin, 2 cm on all sides.
pub const CLASSIC_MARGIN: f32 = 2.0 * POINTS_PER_INCH / 2.54;

const A4_WIDTH: f32 = 595.28;
const A4_HEIGHT: f32 = 841.89;

impl TrimSize {
    /// Accepts "6x9", "6×9", "5X8", "a4", "letter", ... Returns `None` for
    /// anything unrecognised.
    pub fn parse(name: &str) -> Option<TrimSize> {
        let normalized: String = name
            .trim()
            .to_ascii_lowercase()
            .replace(['×', '*'], "x")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        match normalized.as_str() {
            "6x9" => Some(TrimSize::SixByNine),
            "5x8" => Some(TrimSize::FiveByEight),
            "5.5x8.5" => Some(TrimSize::FiveHalfByEightHalf),
            "8.5x11" | "letter" => Some(TrimSize::Letter),
            "a4" => Some(TrimSize::A4),
            _ => None,
        }
    }

    /// Like [`TrimSize::parse`] but substitutes the default trim.
    pub fn from_name(name: &str) -> TrimSize {
        TrimSize::parse(name).unwrap_or_else(|| {
            log::warn!(
                "Unknown trim size {name:?} — using {}",
                TrimSize::default().label()
            );
            TrimSize::default()
        })
    }

    /// Trim width and height in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            TrimSize::SixByNine => (6.0 * POINTS_PER_INCH, 9.0 * POINTS_PER_INCH),
            TrimSize::FiveByEight => (5.0 * POINTS_PER_INCH, 8.0 * POINTS_PER_INCH),
            TrimSize::FiveHalfByEightHalf => (5.5 * POINTS_PER_INCH, 8.5 * POINTS_PER_INCH),
            TrimSize::Letter => (8.5 * POINTS_PER_INCH, 11.0 * POINTS_PER_INCH),
            TrimSize::A4 => (A4_WIDTH, A4_HEIGHT),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrimSize::SixByNine => "6x9",
            TrimSize::FiveByEight => "5x8",
            TrimSize::FiveHalfByEightHalf => "5.5x8.5",
            TrimSize::Letter => "8.5x11",
            TrimSize::A4 => "A4",
        }
    }
}

/// Inside-margin allowance for binding, by estimated page count.
pub fn gutter_for_page_count(pages: usize) -> f32 {
    match pages {
        0..=150 => 0.375 * POINTS_PER_INCH,
        151..=300 => 0.5 * POINTS_PER_INCH,
        301..=500 => 0.625 * POINTS_PER_INCH,
        _ => 0.75 * POINTS_PER_INCH,
    }
}

/// Content rectangle of one page, PDF user space (origin bottom-left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Frame {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    /// Sheet size, bleed included.
    pub width: f32,
    pub height: f32,
    pub outer_margin: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub gutter_margin: f32,
    pub bleed_margin: f32,
    /// Swap inner/outer margins with page parity.
    pub mirrored: bool,
}

impl PageGeometry {
    pub fn kdp(options: &ExportOptions, gutter_margin: f32) -> PageGeometry {
        let (trim_w, trim_h) = options.trim.dimensions();
        let bleed_margin = if options.bleed { BLEED } else { 0.0 };
        PageGeometry {
            width: trim_w + 2.0 * bleed_margin,
            height: trim_h + 2.0 * bleed_margin,
            outer_margin: options.outer_margin,
            top_margin: options.top_margin,
            bottom_margin: options.bottom_margin,
            gutter_margin,
            bleed_margin,
            mirrored: true,
        }
    }

    pub fn classic() -> PageGeometry {
        PageGeometry {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            outer_margin: CLASSIC_MARGIN,
            top_margin: CLASSIC_MARGIN,
            bottom_margin: CLASSIC_MARGIN,
            gutter_margin: 0.0,
            bleed_margin: 0.0,
            mirrored: false,
        }
    }

    pub fn with_gutter(self, gutter_margin: f32) -> PageGeometry {
        PageGeometry {
            gutter_margin,
            ..self
        }
    }

    pub fn inner_margin(&self) -> f32 {
        self.outer_margin + self.gutter_margin
    }

    /// Body frame for a numbered page. Odd pages are rectos, so the binding
    /// edge (inner margin) is on the left.
    pub fn frame(&self, page_number: u32) -> Frame {
        let (left_margin, right_margin) = if !self.mirrored {
            (self.outer_margin, self.outer_margin)
        } else if page_number % 2 == 1 {
            (self.inner_margin(), self.outer_margin)
        } else {
            (self.outer_margin, self.inner_margin())
        };
        Frame {
            left: self.bleed_margin + left_margin,
            right: self.width - self.bleed_margin - right_margin,
            top: self.height - self.bleed_margin - self.top_margin,
            bottom: self.bleed_margin + self.bottom_margin,
        }
    }

    /// Covers are not bound, so both side margins are the outer margin.
    pub fn cover_frame(&self) -> Frame {
        Frame {
            left: self.bleed_margin + self.outer_margin,
            right: self.width - self.bleed_margin - self.outer_margin,
            top: self.height - self.bleed_margin - self.top_margin,
            bottom: self.bleed_margin + self.bottom_margin,
        }
    }

    /// Trim rectangle `[x0, y0, x1, y1]` inside the bleed.
    pub fn trim_box(&self) -> [f32; 4] {
        [
            self.bleed_margin,
            self.bleed_margin,
            self.width - self.bleed_margin,
            self.height - self.bleed_margin,
        ]
    }

    /// Baseline for the page-number footer, centred in the bottom margin.
    pub fn footer_baseline(&self, font_size: f32) -> f32 {
        self.bleed_margin + (self.bottom_margin - font_size) / 2.0
    }
}
