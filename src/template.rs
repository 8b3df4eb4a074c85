use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Months, NaiveDateTime, TimeDelta};
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::{DateFormat, VaultConfig, VaultPath};

/// Body used when a vault has no usable template.
pub const BUILTIN_TEMPLATE: &str = "# {{title}}\n\n{{date}}\n";

/// `{{name}}`, `{{name+1d}}`, `{{name:FORMAT}}` and `{{name-2w:FORMAT}}`.
/// Names are matched case-insensitively; variables never span lines.
static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{[ \t]*(?i:(date|time|title|yesterday|tomorrow))[ \t]*(?:([+-]\d+)([yqMwdhms]))?[ \t]*(?::([^{}\n]+?))?[ \t]*\}\}",
    )
    .expect("variable pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(PathBuf),
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub source: TemplateSource,
    pub text: String,
}

/// Values available to template variables for one note.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub title: String,
    pub now: NaiveDateTime,
    /// Format for `{{yesterday}}` and `{{tomorrow}}`; `YYYY-MM-DD` when unset.
    pub note_format: Option<DateFormat>,
}

impl RenderContext {
    pub fn new(title: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            now,
            note_format: None,
        }
    }

    pub fn with_note_format(mut self, format: DateFormat) -> Self {
        self.note_format = Some(format);
        self
    }
}

impl Template {
    pub fn builtin() -> Self {
        Self {
            source: TemplateSource::Builtin,
            text: BUILTIN_TEMPLATE.to_string(),
        }
    }

    /// Finds the vault's daily-note template. Tries the configured path as
    /// written, then with `.md` appended. Falls back to [`BUILTIN_TEMPLATE`]
    /// rather than failing.
    pub fn resolve(vault_root: &Path, cfg: &VaultConfig) -> Self {
        let Some(raw) = cfg.template.as_deref() else {
            return Self::builtin();
        };

        let rel = match VaultPath::try_from(Path::new(raw)) {
            Ok(rel) => rel,
            Err(err) => {
                warn!(template = raw, error = %err, "ignoring template path");
                return Self::builtin();
            }
        };

        for candidate in template_candidates(vault_root, &rel) {
            if !candidate.is_file() {
                continue;
            }
            match std::fs::read_to_string(&candidate) {
                Ok(text) => {
                    debug!(path = %candidate.display(), "template resolved");
                    return Self {
                        source: TemplateSource::File(candidate),
                        text,
                    };
                }
                Err(err) => {
                    warn!(path = %candidate.display(), error = %err, "failed to read template");
                }
            }
        }

        debug!(template = raw, "template not found; using builtin body");
        Self::builtin()
    }

    pub fn render(&self, ctx: &RenderContext) -> String {
        render_template(&self.text, ctx)
    }
}

fn template_candidates(vault_root: &Path, rel: &VaultPath) -> Vec<PathBuf> {
    let as_given = vault_root.join(rel.as_path());
    let has_md = rel
        .as_path()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
    if has_md {
        return vec![as_given];
    }

    let mut with_ext = as_given.clone().into_os_string();
    with_ext.push(".md");
    vec![as_given, PathBuf::from(with_ext)]
}

/// Replaces known `{{...}}` variables in one pass. Anything unrecognized, an
/// embedded format that fails to compile, or an offset outside the calendar
/// is left as written. Substituted values are never rescanned.
pub fn render_template(text: &str, ctx: &RenderContext) -> String {
    VARIABLE
        .replace_all(text, |caps: &Captures<'_>| {
            substitute(caps, ctx).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn substitute(caps: &Captures<'_>, ctx: &RenderContext) -> Option<String> {
    let name = caps[1].to_ascii_lowercase();
    let offset = caps.get(2).zip(caps.get(3));
    let format = caps.get(4).map(|m| m.as_str().trim());

    match name.as_str() {
        "title" if offset.is_none() && format.is_none() => Some(ctx.title.clone()),
        "yesterday" | "tomorrow" if offset.is_none() && format.is_none() => {
            let days = if name == "yesterday" { -1 } else { 1 };
            let at = ctx.now.checked_add_signed(TimeDelta::try_days(days)?)?;
            Some(match &ctx.note_format {
                Some(fmt) => fmt.render(at),
                None => at.format("%Y-%m-%d").to_string(),
            })
        }
        "date" | "time" => {
            let at = match offset {
                Some((amount, unit)) => shift(ctx.now, amount.as_str(), unit.as_str())?,
                None => ctx.now,
            };
            match format {
                Some(fmt) => match DateFormat::compile(fmt) {
                    Ok(program) => Some(program.render(at)),
                    Err(err) => {
                        debug!(variable = &caps[0], error = %err, "leaving variable unexpanded");
                        None
                    }
                },
                None if name == "date" => Some(at.format("%Y-%m-%d").to_string()),
                None => Some(at.format("%H:%M").to_string()),
            }
        }
        _ => None,
    }
}

fn shift(at: NaiveDateTime, amount: &str, unit: &str) -> Option<NaiveDateTime> {
    let amount: i64 = amount.parse().ok()?;
    match unit {
        "y" => shift_months(at, amount.checked_mul(12)?),
        "q" => shift_months(at, amount.checked_mul(3)?),
        "M" => shift_months(at, amount),
        "w" => at.checked_add_signed(TimeDelta::try_weeks(amount)?),
        "d" => at.checked_add_signed(TimeDelta::try_days(amount)?),
        "h" => at.checked_add_signed(TimeDelta::try_hours(amount)?),
        "m" => at.checked_add_signed(TimeDelta::try_minutes(amount)?),
        "s" => at.checked_add_signed(TimeDelta::try_seconds(amount)?),
        _ => None,
    }
}

fn shift_months(at: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let n = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        at.checked_add_months(n)
    } else {
        at.checked_sub_months(n)
    }
}
