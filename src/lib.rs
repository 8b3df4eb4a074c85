mod config;
mod daily;
mod error;
mod format;
mod notes;
mod registry;
mod template;
mod vault;

pub use crate::config::{DAILY_NOTES_CONFIG, DEFAULT_DATE_FORMAT, VaultConfig};
pub use crate::daily::ResolvedNote;
pub use crate::error::{Error, Result};
pub use crate::format::{DateFormat, Segment, Token};
pub use crate::notes::{NEW_NOTE_TEMPLATE, NoteFile, NoteHit, NoteMatch};
pub use crate::registry::{VaultEntry, VaultRegistry};
pub use crate::template::{
    BUILTIN_TEMPLATE, RenderContext, Template, TemplateSource, render_template,
};
pub use crate::vault::{Vault, VaultPath};
