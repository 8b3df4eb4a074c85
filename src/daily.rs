use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use crate::template::{RenderContext, Template};
use crate::{DateFormat, Error, Result, Vault, VaultConfig, VaultPath};

/// Outcome of a daily-note request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNote {
    /// Absolute path of the note.
    pub path: PathBuf,
    pub rel_path: VaultPath,
    /// `false` when the note already existed and nothing was written.
    pub created: bool,
    /// Rendered body, present only when the note was created.
    pub content: Option<String>,
}

impl Vault {
    /// Today's daily note by the host's local clock.
    pub fn today(&self) -> Result<ResolvedNote> {
        self.daily_note(Local::now().naive_local())
    }

    /// Finds or creates the daily note for `now`.
    ///
    /// The note's path is the configured folder plus the vault's date format
    /// rendered for `now`, with `.md` appended. An existing note is returned
    /// untouched; otherwise the template is rendered and written. Missing
    /// configuration and templates fall back to defaults, so only an invalid
    /// date format or a filesystem failure is an error.
    pub fn daily_note(&self, now: NaiveDateTime) -> Result<ResolvedNote> {
        let cfg = self.config();
        let format = DateFormat::compile(&cfg.date_format)?;
        let name = format.render(now);
        let rel_path = note_rel_path(&cfg, &format, &name)?;
        let path = self.to_abs(&rel_path);

        let dir = path.parent().unwrap_or(self.root());
        std::fs::create_dir_all(dir).map_err(|e| Error::storage(dir, e))?;

        if path.exists() {
            info!(path = %path.display(), "daily note found");
            return Ok(found(path, rel_path));
        }

        let template = Template::resolve(self.root(), &cfg);
        debug!(source = ?template.source, "rendering daily note");
        let title = name.rsplit('/').next().unwrap_or(&name).to_string();
        let ctx = RenderContext::new(title, now).with_note_format(format);
        let content = template.render(&ctx);

        match write_new(&path, &content) {
            Ok(()) => {
                info!(path = %path.display(), "daily note created");
                Ok(ResolvedNote {
                    path,
                    rel_path,
                    created: true,
                    content: Some(content),
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                info!(path = %path.display(), "daily note appeared while rendering");
                Ok(found(path, rel_path))
            }
            Err(err) => Err(Error::storage(path, err)),
        }
    }
}

fn found(path: PathBuf, rel_path: VaultPath) -> ResolvedNote {
    ResolvedNote {
        path,
        rel_path,
        created: false,
        content: None,
    }
}

/// `folder/<rendered>.md`. A `/` in the rendered name nests the note in
/// subfolders.
fn note_rel_path(cfg: &VaultConfig, format: &DateFormat, name: &str) -> Result<VaultPath> {
    let file = VaultPath::note(name).map_err(|err| {
        Error::format(
            format.source(),
            format!("rendered note name is not a valid file path: {err}"),
        )
    })?;
    Ok(match &cfg.folder {
        Some(folder) => folder.join(&file),
        None => file,
    })
}

pub(crate) fn write_new(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}
