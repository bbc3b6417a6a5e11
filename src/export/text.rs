use crate::model::Book;

pub(super) const MARKDOWN_MIME: &str = "text/markdown; charset=utf-8";
pub(super) const TEXT_MIME: &str = "text/plain; charset=utf-8";

/// `# Title`, an italic byline, then one `##` section per chapter.
pub(super) fn markdown(book: &Book) -> String {
    let mut parts = vec![format!("# {}", book.display_title())];
    if let Some(byline) = book.byline() {
        parts.push(format!("_{byline}_"));
    }
    parts.push(String::new());
    for (i, chapter) in book.chapters.iter().enumerate() {
        parts.push(format!(
            "## {} {}: {}",
            book.chapter_label(),
            i + 1,
            book.chapter_title(chapter)
        ));
        parts.push(chapter.body.clone());
        parts.push(String::new());
    }
    parts.join("\n")
}

pub(super) fn plain_text(book: &Book) -> String {
    let mut lines = vec![book.display_title().to_string()];
    if let Some(byline) = book.byline() {
        lines.push(byline);
    }
    lines.push(String::new());
    for (i, chapter) in book.chapters.iter().enumerate() {
        lines.push(format!(
            "{} {}: {}",
            book.chapter_label(),
            i + 1,
            book.chapter_title(chapter)
        ));
        lines.push(chapter.body.clone());
        lines.push(String::new());
    }
    lines.join("\n")
}
