use anyhow::{Result, Context, anyhow};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a file, treating a missing file as `None`
    pub fn read_if_exists<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read file: {:?}", path.as_ref())),
        }
    }

    /// Write a file so readers see either the old content or the new, never a
    /// partial write: the data goes to a temp file in the same directory which
    /// is then renamed over the target.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temp file in {:?}", parent))?;
        temp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write temp file for {:?}", path))?;
        temp.flush()?;

        temp.persist(path)
            .map_err(|e| anyhow!("Failed to move temp file into place at {:?}: {}", path, e.error))?;

        Ok(())
    }

    /// Move a file into place, falling back to copy + delete across filesystems
    pub fn move_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow!("Source file does not exist: {:?}", from));
        }

        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        if fs::rename(from, to).is_err() {
            let content = fs::read_to_string(from)
                .with_context(|| format!("Failed to read {:?}", from))?;
            Self::write_atomic(to, &content)?;
            fs::remove_file(from)
                .with_context(|| format!("Failed to remove {:?} after copy", from))?;
        }

        Ok(())
    }
}
