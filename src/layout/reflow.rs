use super::FontFace;

/// Width of rendered text in points for a face and size.
///
/// Implemented by [`crate::FontSet`] from real font metrics; tests supply
/// fixed-advance measurers so wrapping can be checked without a font on disk.
pub trait TextMeasure {
    fn text_width(&self, text: &str, face: FontFace, font_size: f32) -> f32;

    fn space_width(&self, face: FontFace, font_size: f32) -> f32 {
        self.text_width(" ", face, font_size)
    }
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn text_width(&self, text: &str, face: FontFace, font_size: f32) -> f32 {
        (**self).text_width(text, face, font_size)
    }

    fn space_width(&self, face: FontFace, font_size: f32) -> f32 {
        (**self).space_width(face, font_size)
    }
}

/// Wrap text into lines no wider than `max_width`.
///
/// Hard newlines split the text into units that wrap independently, so blank
/// lines survive as empty strings. Within a unit words are packed greedily; a
/// word that overflows starts the next line. A word wider than the column is
/// emitted alone and unsplit. Empty input gives one empty line.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    face: FontFace,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let space_w = measure.space_width(face, font_size);
    let mut lines: Vec<String> = Vec::new();

    for unit in text.lines() {
        let mut current = String::new();
        let mut current_x: f32 = 0.0;

        for word in unit.split_whitespace() {
            let ww = measure.text_width(word, face, font_size);
            if current.is_empty() {
                current.push_str(word);
                current_x = ww;
                continue;
            }
            let proposed_x = current_x + space_w + ww;
            if proposed_x > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_x = ww;
            } else {
                current.push(' ');
                current.push_str(word);
                current_x = proposed_x;
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
