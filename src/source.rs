use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::{Book, Chapter};

fn read_if_present(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("Cannot read chapter file {}: {e}", path.display());
            None
        }
    }
}

/// Resolve one chapter's text: an explicit `content_path` first (relative
/// paths are taken from `chapters_dir`), then
/// `<chapters_dir>/<book_id>/<chapter_id>.txt`, then the inline body.
fn resolve_body(book_id: Option<&str>, chapter: &Chapter, chapters_dir: Option<&Path>) -> Option<String> {
    if let Some(path) = &chapter.content_path {
        let full: PathBuf = match chapters_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.clone(),
        };
        if let Some(text) = read_if_present(&full) {
            return Some(text);
        }
        log::debug!(
            "Chapter {}: content_path {} not found",
            chapter.id,
            full.display()
        );
    }

    let dir = chapters_dir?;
    let book_id = book_id.filter(|id| !id.is_empty())?;
    if chapter.id.is_empty() {
        return None;
    }
    read_if_present(&dir.join(book_id).join(format!("{}.txt", chapter.id)))
}

/// Fill in chapter bodies from disk where the book document points to them.
pub fn resolve_chapters(book: &mut Book, chapters_dir: Option<&Path>) {
    let book_id = book.id.clone();
    for chapter in &mut book.chapters {
        if let Some(text) = resolve_body(book_id.as_deref(), chapter, chapters_dir) {
            chapter.body = text;
        }
    }
}

/// Read a book JSON document and resolve its chapter bodies.
pub fn load_book(path: &Path, chapters_dir: Option<&Path>) -> Result<Book, Error> {
    let data = std::fs::read(path)?;
    let mut book: Book = serde_json::from_slice(&data)?;
    resolve_chapters(&mut book, chapters_dir);
    log::debug!(
        "Loaded book {:?} from {} ({} chapters)",
        book.display_title(),
        path.display(),
        book.chapters.len()
    );
    Ok(book)
}
