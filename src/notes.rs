//! Notes outside the daily-note flow: creating a titled note at the vault
//! root, listing recently modified notes and searching titles and bodies.

use std::cmp::Reverse;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::NaiveDateTime;
use nucleo::{
    Matcher, Utf32Str,
    pattern::{CaseMatching, Normalization, Pattern},
};
use tracing::{debug, info};

use crate::daily::write_new;
use crate::template::{RenderContext, render_template};
use crate::{Error, ResolvedNote, Result, Vault, VaultPath};

/// Body of a note created with [`Vault::new_note`].
pub const NEW_NOTE_TEMPLATE: &str =
    "# {{title}}\n\nCreated: {{date:YYYY-MM-DD HH:mm:ss}}\n\n## Content\n\n- \n\n";

const PREVIEW_CHARS: usize = 100;

/// A markdown note found while walking the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    pub path: PathBuf,
    pub rel_path: VaultPath,
    /// File name without `.md`.
    pub title: String,
    pub modified: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMatch {
    /// The title matched; higher scores are closer matches.
    Title { score: u32 },
    /// Only the body contains the query.
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteHit {
    pub note: NoteFile,
    pub matched: NoteMatch,
    /// First line of the note, cut to 100 characters.
    pub preview: String,
}

impl Vault {
    /// Creates `<title>.md` at the vault root. Characters Obsidian cannot use
    /// in file names become `_`; if the name is taken, ` 1`, ` 2`, ... is
    /// appended until a free one is found. Existing files are never touched.
    pub fn new_note(&self, title: &str, now: NaiveDateTime) -> Result<ResolvedNote> {
        let title = title.trim();
        let stem = sanitize_file_stem(title);
        VaultPath::note(&stem).map_err(|_| Error::InvalidTitle(title.to_string()))?;

        let content = render_template(NEW_NOTE_TEMPLATE, &RenderContext::new(title, now));
        let mut suffix = 0u32;
        loop {
            let name = match suffix {
                0 => stem.clone(),
                n => format!("{stem} {n}"),
            };
            let rel_path = VaultPath::note(&name)?;
            let path = self.to_abs(&rel_path);
            match write_new(&path, &content) {
                Ok(()) => {
                    info!(path = %path.display(), "note created");
                    return Ok(ResolvedNote {
                        path,
                        rel_path,
                        created: true,
                        content: Some(content),
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "note name taken");
                    suffix += 1;
                }
                Err(err) => return Err(Error::storage(path, err)),
            }
        }
    }

    /// Every `.md` note, skipping `.obsidian` and other dot-directories.
    pub fn list_notes(&self) -> Vec<NoteFile> {
        walkdir::WalkDir::new(self.root())
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|entry| {
                let path = entry.path();
                if !path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
                {
                    return None;
                }
                let rel_path = VaultPath::try_from(path.strip_prefix(self.root()).ok()?).ok()?;
                let title = path.file_stem()?.to_string_lossy().to_string();
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                Some(NoteFile {
                    path: path.to_path_buf(),
                    rel_path,
                    title,
                    modified,
                })
            })
            .collect()
    }

    /// Most recently modified notes first.
    pub fn recent_notes(&self, limit: usize) -> Vec<NoteFile> {
        let mut notes = self.list_notes();
        notes.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.rel_path.cmp(&b.rel_path))
        });
        notes.truncate(limit);
        notes
    }

    /// Notes whose title fuzzy-matches `query` or whose body contains it
    /// (case-insensitive). Title hits come first, best score first; ties and
    /// body hits are ordered by modification time, newest first.
    pub fn search_notes(&self, query: &str, limit: usize) -> Vec<NoteHit> {
        let q = query.trim();
        if q.is_empty() || limit == 0 {
            return Vec::new();
        }

        let pattern = Pattern::parse(q, CaseMatching::Smart, Normalization::Smart);
        let mut matcher = Matcher::new(nucleo::Config::DEFAULT);
        let mut utf32_buf = Vec::new();
        let needle = q.to_lowercase();
        let mut hits = Vec::new();

        for note in self.list_notes() {
            let content = match std::fs::read_to_string(&note.path) {
                Ok(c) => c,
                Err(err) => {
                    debug!(path = %note.path.display(), error = %err, "skipping unreadable note");
                    continue;
                }
            };
            let matched = match pattern.score(Utf32Str::new(&note.title, &mut utf32_buf), &mut matcher)
            {
                Some(score) => NoteMatch::Title { score },
                None if content.to_lowercase().contains(&needle) => NoteMatch::Content,
                None => continue,
            };
            hits.push(NoteHit {
                preview: preview(&content),
                note,
                matched,
            });
        }

        hits.sort_by(|a, b| {
            rank(a.matched)
                .cmp(&rank(b.matched))
                .then_with(|| b.note.modified.cmp(&a.note.modified))
                .then_with(|| a.note.rel_path.cmp(&b.note.rel_path))
        });
        hits.truncate(limit);
        hits
    }
}

fn rank(matched: NoteMatch) -> (u8, Reverse<u32>) {
    match matched {
        NoteMatch::Title { score } => (0, Reverse(score)),
        NoteMatch::Content => (1, Reverse(0)),
    }
}

fn sanitize_file_stem(title: &str) -> String {
    title.replace(
        |c| matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'),
        "_",
    )
}

fn preview(content: &str) -> String {
    let first = content.lines().next().unwrap_or_default();
    if first.chars().count() > PREVIEW_CHARS {
        let cut: String = first.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        first.to_string()
    }
}
