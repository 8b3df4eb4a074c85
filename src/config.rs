use std::path::Path;

use tracing::{debug, warn};

use crate::VaultPath;

/// Daily-notes plugin settings, relative to the vault root.
pub const DAILY_NOTES_CONFIG: &str = ".obsidian/daily-notes.json";

/// Obsidian's default daily-note format.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Moment.js format used for the note's name.
    pub date_format: String,
    /// Folder for new daily notes; `None` is the vault root.
    pub folder: Option<VaultPath>,
    /// Template path relative to the vault root, with or without `.md`.
    pub template: Option<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.into(),
            folder: None,
            template: None,
        }
    }
}

/// On-disk shape of `daily-notes.json`. Obsidian writes every key, often as
/// an empty string, and may add keys of its own.
#[derive(Debug, Default, serde::Deserialize)]
struct DailyNotesFile {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    template: Option<String>,
}

impl VaultConfig {
    /// Reads the vault's daily-note settings. Never fails: a missing or
    /// unreadable file yields the defaults.
    pub fn load(vault_root: &Path) -> Self {
        let path = vault_root.join(DAILY_NOTES_CONFIG);
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "daily notes config not found; using defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read daily notes config");
                return Self::default();
            }
        };

        match Self::from_json_str(&text) {
            Ok(cfg) => {
                debug!(path = %path.display(), format = %cfg.date_format, "daily notes config loaded");
                cfg
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to parse daily notes config");
                Self::default()
            }
        }
    }

    pub fn from_json_str(input: &str) -> std::result::Result<Self, serde_json::Error> {
        let file: DailyNotesFile = serde_json::from_str(input)?;
        let mut cfg = Self::default();

        if let Some(format) = non_blank(file.format) {
            cfg.date_format = format;
        }
        if let Some(folder) = non_blank(file.folder) {
            cfg.folder = normalize_folder(&folder);
        }
        if let Some(template) = non_blank(file.template) {
            cfg.template = Some(template.trim_start_matches('/').to_string());
        }

        Ok(cfg)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_folder(raw: &str) -> Option<VaultPath> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match VaultPath::try_from(Path::new(trimmed)) {
        Ok(folder) => Some(folder),
        Err(err) => {
            warn!(folder = raw, error = %err, "ignoring daily notes folder; using vault root");
            None
        }
    }
}
