//! Backup-Aware File Writer
//!
//! Writes rewritten source back to disk. A file is written exactly once per
//! generation pass, after all of its insertions are computed, so a canceled
//! batch never leaves a half-written file. Optional `.bak` snapshots allow
//! rolling an aborted batch back.

use std::path::{Path, PathBuf};

use crate::types::Result;

#[derive(Debug, Clone)]
pub struct FileWriter {
    backup: bool,
    dry_run: bool,
}

impl FileWriter {
    pub fn new(backup: bool, dry_run: bool) -> Self {
        Self { backup, dry_run }
    }

    /// `{path}.bak` next to the original
    pub fn backup_path(path: &Path) -> PathBuf {
        let mut os = path.as_os_str().to_os_string();
        os.push(".bak");
        PathBuf::from(os)
    }

    /// Write the full new content for one file. Returns the backup path when
    /// a snapshot was taken. Dry runs touch nothing and return `None`.
    pub fn write(&self, path: &Path, content: &str) -> Result<Option<PathBuf>> {
        if self.dry_run {
            tracing::debug!(path = %path.display(), "dry run, skipping write");
            return Ok(None);
        }

        let backup = if self.backup && path.exists() {
            let backup = Self::backup_path(path);
            std::fs::copy(path, &backup)?;
            Some(backup)
        } else {
            None
        };

        std::fs::write(path, content)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote file");
        Ok(backup)
    }

    /// Restore a file from its `.bak` snapshot, keeping the snapshot
    pub fn restore(path: &Path) -> Result<()> {
        let backup = Self::backup_path(path);
        std::fs::copy(&backup, path)?;
        Ok(())
    }

    /// Delete the `.bak` snapshot if one exists
    pub fn remove_backup(path: &Path) -> Result<()> {
        let backup = Self::backup_path(path);
        if backup.exists() {
            std::fs::remove_file(&backup)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, "original\n").unwrap();

        let writer = FileWriter::new(true, false);
        let backup = writer.write(&file, "rewritten\n").unwrap().unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "rewritten\n");
        assert_eq!(fs::read_to_string(&backup).unwrap(), "original\n");
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, "original\n").unwrap();

        let writer = FileWriter::new(true, true);
        assert!(writer.write(&file, "rewritten\n").unwrap().is_none());
        assert_eq!(fs::read_to_string(&file).unwrap(), "original\n");
        assert!(!FileWriter::backup_path(&file).exists());
    }

    #[test]
    fn restore_and_remove_backup() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, "original\n").unwrap();

        let writer = FileWriter::new(true, false);
        writer.write(&file, "rewritten\n").unwrap();

        FileWriter::restore(&file).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "original\n");

        FileWriter::remove_backup(&file).unwrap();
        assert!(!FileWriter::backup_path(&file).exists());
    }
}
