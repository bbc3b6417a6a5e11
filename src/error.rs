use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid book document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("book \"{0}\" has no chapters to export")]
    EmptyBook(String),

    #[error("chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("cover image could not be decoded: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported cover image format: {0} (use JPEG or PNG)")]
    UnsupportedImage(String),

    #[error("failed to write KDP bundle: {0}")]
    Zip(#[from] zip::result::ZipError),
}
