// File: src/scrape/registry.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use prepabot_common::Error;

/// Persisted set of image links already announced, kept as a flat JSON
/// array. Loaded once at startup; every addition rewrites the whole file so
/// a crash never loses more than the in-flight entry.
pub struct PostedMenuRegistry {
    path: PathBuf,
    entries: Vec<String>,
}

impl PostedMenuRegistry {
    /// Load the registry, creating an empty file when absent.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "[]")?;
            info!("created empty posted-menu registry at {}", path.display());
            return Ok(Self { path, entries: Vec::new() });
        }

        let raw = fs::read_to_string(&path)?;
        let entries: Vec<String> = serde_json::from_str(&raw)?;
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.entries.iter().any(|e| e == link)
    }

    /// Append one link and persist immediately (write-through).
    pub fn insert(&mut self, link: impl Into<String>) -> Result<(), Error> {
        self.entries.push(link.into());
        let raw = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
