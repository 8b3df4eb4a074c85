use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nucleo::{
    Matcher, Utf32Str,
    pattern::{CaseMatching, Normalization, Pattern},
};
use tracing::debug;

use crate::{Error, Result};

/// One known vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    pub root: PathBuf,
    pub name: String,
}

impl VaultEntry {
    /// Names the vault after its root folder, as Obsidian does.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| root.to_string_lossy().to_string());
        Self { root, name }
    }

    pub fn with_name(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }
}

/// Ordered list of vaults handed over by discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultRegistry {
    entries: Vec<VaultEntry>,
}

#[derive(Debug, serde::Deserialize)]
struct ObsidianJson {
    #[serde(default)]
    vaults: BTreeMap<String, RegisteredVault>,
}

#[derive(Debug, serde::Deserialize)]
struct RegisteredVault {
    path: PathBuf,
    /// Last opened, in milliseconds since the epoch.
    #[serde(default)]
    ts: u64,
}

impl VaultRegistry {
    pub fn new(entries: Vec<VaultEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[VaultEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Location of Obsidian's own vault list for this platform.
    pub fn obsidian_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("obsidian").join("obsidian.json"))
    }

    /// Vaults registered with the local Obsidian install. Empty when Obsidian
    /// has never run here.
    pub fn from_obsidian_config() -> Result<Self> {
        match Self::obsidian_config_path() {
            Some(path) => Self::load_obsidian(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parses an `obsidian.json`, most recently opened vault first.
    pub fn load_obsidian(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "obsidian registry not found");
                return Ok(Self::default());
            }
            Err(err) => return Err(Error::io(path, err)),
        };
        let parsed: ObsidianJson = serde_json::from_str(&text).map_err(|source| {
            Error::RegistryJson {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut vaults: Vec<RegisteredVault> = parsed.vaults.into_values().collect();
        vaults.sort_by(|a, b| b.ts.cmp(&a.ts).then_with(|| a.path.cmp(&b.path)));
        let entries = vaults.into_iter().map(|v| VaultEntry::new(v.path)).collect();
        Ok(Self { entries })
    }

    /// Picks the vault to act on.
    ///
    /// Without a name there must be exactly one vault. With a name, an exact
    /// case-insensitive match wins, else the single best fuzzy match.
    pub fn select(&self, name: Option<&str>) -> Result<&VaultEntry> {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return match self.entries.as_slice() {
                [] => Err(Error::NoVaults),
                [only] => Ok(only),
                many => Err(ambiguous(many.iter())),
            };
        };

        let exact: Vec<&VaultEntry> = self
            .entries
            .iter()
            .filter(|e| e.name.to_lowercase() == name.to_lowercase())
            .collect();
        match exact.as_slice() {
            [only] => return Ok(*only),
            [] => {}
            many => return Err(ambiguous(many.iter().copied())),
        }

        let pattern = Pattern::parse(name, CaseMatching::Smart, Normalization::Smart);
        let mut matcher = Matcher::new(nucleo::Config::DEFAULT);
        let mut utf32_buf = Vec::new();
        let mut scored: Vec<(u32, &VaultEntry)> = self
            .entries
            .iter()
            .filter_map(|e| {
                pattern
                    .score(Utf32Str::new(&e.name, &mut utf32_buf), &mut matcher)
                    .map(|score| (score, e))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        match scored.as_slice() {
            [] => Err(Error::VaultNotFoundByName(name.to_string())),
            [(best, entry), rest @ ..] => {
                let tied: Vec<&VaultEntry> = rest
                    .iter()
                    .take_while(|(score, _)| score == best)
                    .map(|(_, e)| *e)
                    .collect();
                if tied.is_empty() {
                    Ok(*entry)
                } else {
                    Err(ambiguous(std::iter::once(*entry).chain(tied)))
                }
            }
        }
    }
}

fn ambiguous<'a>(entries: impl Iterator<Item = &'a VaultEntry>) -> Error {
    Error::AmbiguousVault {
        candidates: entries
            .map(|e| format!("{} ({})", e.name, e.root.display()))
            .collect(),
    }
}
