use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use eccomibook_export::{
    CoverImage, CoverMode, Error, ExportFormat, ExportOptions, FontConfig, FontSet, TrimSize,
    export_book, export_book_file, export_chapter, load_book,
};

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Md,
    Txt,
    Kdp,
}

#[derive(Clone, Copy, ValueEnum)]
enum CoverArg {
    None,
    Front,
    FrontBack,
}

#[derive(Parser)]
#[command(name = "eccomibook-export")]
#[command(version, about = "Export an EccomiBook book as PDF, Markdown, text or a KDP bundle", long_about = None)]
#[command(after_help = "EXAMPLES:
    eccomibook-export book.json                       KDP 6x9 PDF in the current directory
    eccomibook-export book.json --bleed --trim 5x8    5x8 interior with bleed
    eccomibook-export book.json --format kdp -o out/  Upload bundle into out/")]
struct Cli {
    /// Book JSON document
    #[arg(value_name = "BOOK_JSON")]
    input: PathBuf,

    /// Output file or directory (defaults to the current directory)
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "pdf")]
    format: FormatArg,

    /// Trim size: 6x9, 5x8, 5.5x8.5, 8.5x11 (letter) or A4
    #[arg(long, default_value = "6x9")]
    trim: String,

    /// Add 0.125in bleed on every side
    #[arg(long)]
    bleed: bool,

    #[arg(long, value_enum, default_value = "front")]
    cover: CoverArg,

    /// Blurb for the back cover (with --cover front-back)
    #[arg(long, value_name = "TEXT")]
    backcover_text: Option<String>,

    /// Plain A4 layout with 2cm margins and no gutter
    #[arg(long)]
    classic: bool,

    #[arg(long)]
    no_page_numbers: bool,

    /// Start every chapter on a right-hand page
    #[arg(long)]
    chapters_on_recto: bool,

    /// Export a single chapter by id
    #[arg(long, value_name = "ID")]
    chapter: Option<String>,

    /// Directory holding <book_id>/<chapter_id>.txt files
    #[arg(long, value_name = "DIR")]
    chapters_dir: Option<PathBuf>,

    /// JPEG or PNG placed on the front cover
    #[arg(long, value_name = "PATH")]
    cover_image: Option<PathBuf>,

    /// Skip font discovery and use non-embedded Helvetica
    #[arg(long)]
    standard_fonts: bool,
}

impl Cli {
    fn options(&self) -> Result<ExportOptions, Error> {
        let cover_image = match &self.cover_image {
            Some(path) => Some(CoverImage::from_bytes(std::fs::read(path)?)?),
            None => None,
        };
        Ok(ExportOptions {
            format: match self.format {
                FormatArg::Pdf => ExportFormat::Pdf,
                FormatArg::Md => ExportFormat::Markdown,
                FormatArg::Txt => ExportFormat::Text,
                FormatArg::Kdp => ExportFormat::KdpBundle,
            },
            trim: TrimSize::from_name(&self.trim),
            bleed: self.bleed,
            cover_mode: match self.cover {
                CoverArg::None => CoverMode::None,
                CoverArg::Front => CoverMode::Front,
                CoverArg::FrontBack => CoverMode::FrontAndBack,
            },
            backcover_text: self.backcover_text.clone(),
            classic: self.classic,
            page_numbers: !self.no_page_numbers,
            chapters_on_recto: self.chapters_on_recto,
            cover_image,
            ..ExportOptions::default()
        })
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<PathBuf, Error> {
    let options = cli.options()?;
    let fonts = if cli.standard_fonts {
        FontSet::standard()
    } else {
        FontSet::discover(&FontConfig::from_env())
    };

    let out = cli.output.clone().unwrap_or_else(|| PathBuf::from("."));
    let chapters_dir = cli.chapters_dir.as_deref();
    let into_dir = names_directory(&out);
    if into_dir {
        std::fs::create_dir_all(&out)?;
    }

    if cli.chapter.is_none() && into_dir {
        return export_book_file(&cli.input, chapters_dir, &out, &options, &fonts);
    }

    let book = load_book(&cli.input, chapters_dir)?;
    let output = match &cli.chapter {
        Some(id) => export_chapter(&book, id, &options, &fonts)?,
        None => export_book(&book, &options, &fonts)?,
    };
    let path = if into_dir {
        out.join(&output.filename)
    } else {
        out
    };
    write_output(&path, &output.bytes)?;
    Ok(path)
}

/// `-o` names a directory when it exists as one or ends with a separator.
fn names_directory(out: &Path) -> bool {
    out.is_dir() || out.as_os_str().to_string_lossy().ends_with(std::path::is_separator)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
