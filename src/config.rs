use std::path::PathBuf;

/// Families tried in order when looking for an embeddable body font.
pub const DEFAULT_FAMILIES: &[&str] = &[
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "Georgia",
    "Times New Roman",
    "DejaVu Sans",
    "Liberation Sans",
    "Arial",
];

/// Where to look for fonts. Resolved once at startup by
/// [`crate::FontSet::discover`].
#[derive(Clone, Debug)]
pub struct FontConfig {
    /// Extra directories, searched before the platform ones.
    pub font_dirs: Vec<PathBuf>,
    pub include_system_dirs: bool,
    pub families: Vec<String>,
    /// Explicit font files; when set, no directory scan happens.
    pub regular_path: Option<PathBuf>,
    pub bold_path: Option<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        FontConfig {
            font_dirs: Vec::new(),
            include_system_dirs: true,
            families: DEFAULT_FAMILIES.iter().map(|f| f.to_string()).collect(),
            regular_path: None,
            bold_path: None,
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl FontConfig {
    /// Reads `ECCOMIBOOK_FONTS` (path list of directories),
    /// `ECCOMIBOOK_FONT_FAMILY` (tried before the defaults),
    /// `ECCOMIBOOK_FONT_REGULAR` and `ECCOMIBOOK_FONT_BOLD`.
    pub fn from_env() -> Self {
        let mut config = FontConfig::default();

        if let Ok(val) = std::env::var("ECCOMIBOOK_FONTS") {
            let sep = if cfg!(windows) { ';' } else { ':' };
            config.font_dirs.extend(
                val.split(sep)
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from),
            );
        }

        if let Ok(family) = std::env::var("ECCOMIBOOK_FONT_FAMILY") {
            let family = family.trim();
            if !family.is_empty() {
                config.families.insert(0, family.to_string());
            }
        }

        config.regular_path = env_path("ECCOMIBOOK_FONT_REGULAR");
        config.bold_path = env_path("ECCOMIBOOK_FONT_BOLD");
        config
    }

    pub(crate) fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.font_dirs.clone();
        if self.include_system_dirs {
            dirs.extend(system_font_dirs());
        }
        dirs
    }
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}
