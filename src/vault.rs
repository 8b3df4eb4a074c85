use std::path::{Component, Path, PathBuf};

use crate::{Error, Result, VaultConfig};

/// A path relative to a vault root, free of absolute and `..` components.
/// `.` components are dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VaultPath(PathBuf);

impl VaultPath {
    /// `<name>.md` for a note name in which `/` nests folders. Unlike a
    /// general path, every segment must be a plain name: blank segments and
    /// `.` are rejected rather than collapsed.
    pub fn note(name: &str) -> Result<Self> {
        if let Some(seg) = name
            .split('/')
            .find(|seg| seg.trim().is_empty() || *seg == "." || *seg == "..")
        {
            return Err(Error::InvalidVaultPath(format!(
                "note name {name:?} has an unusable segment {seg:?}"
            )));
        }
        Self::try_from(Path::new(&format!("{name}.md")))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn as_str_lossy(&self) -> String {
        self.0.to_string_lossy().to_string()
    }

    pub fn join(&self, rel: &VaultPath) -> VaultPath {
        VaultPath(self.0.join(&rel.0))
    }
}

fn invalid(reason: &str) -> Error {
    Error::InvalidVaultPath(reason.into())
}

impl TryFrom<&Path> for VaultPath {
    type Error = Error;

    fn try_from(value: &Path) -> Result<Self> {
        let mut cleaned = PathBuf::new();
        for c in value.components() {
            match c {
                Component::Normal(part) => cleaned.push(part),
                Component::CurDir => {}
                Component::ParentDir => return Err(invalid("path traversal is not allowed")),
                Component::Prefix(_) | Component::RootDir => {
                    return Err(invalid("absolute paths are not allowed"));
                }
            }
        }
        if cleaned.as_os_str().is_empty() {
            return Err(invalid("empty path"));
        }
        Ok(Self(cleaned))
    }
}

impl TryFrom<&str> for VaultPath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::try_from(Path::new(value))
    }
}

#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::VaultNotFound(root));
        }
        let root = std::fs::canonicalize(&root).map_err(|e| Error::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Daily-note settings, read from disk on every call so edits made in
    /// Obsidian take effect immediately.
    pub fn config(&self) -> VaultConfig {
        VaultConfig::load(&self.root)
    }

    pub fn to_abs(&self, rel: &VaultPath) -> PathBuf {
        self.root.join(rel.as_path())
    }
}
