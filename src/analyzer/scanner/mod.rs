//! Python File Discovery
//!
//! Walks a directory tree collecting Python files, honoring gitignore rules,
//! include/exclude glob patterns, and the file size limit.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::constants::analysis::MAX_FILE_SIZE;
use crate::types::Result;

/// Directories that never contain documentable project code
const DEFAULT_SKIP_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "node_modules",
    "build",
    "dist",
    "site-packages",
];

pub struct FileScanner {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
    max_file_size: u64,
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let exclude = DEFAULT_SKIP_DIRS
            .iter()
            .map(|d| format!("**/{}/**", d))
            .collect();
        Self {
            root: root.as_ref().to_path_buf(),
            include: vec!["**/*.py".to_string()],
            exclude,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn with_include(mut self, patterns: Vec<String>) -> Self {
        if !patterns.is_empty() {
            self.include = patterns;
        }
        self
    }

    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude.extend(patterns);
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Collect matching Python files, sorted for deterministic processing
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        // A single file target bypasses the walk entirely
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false) // Security: prevent symlink traversal attacks
            .build();

        let mut files = Vec::new();
        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("py") {
                continue;
            }
            if !self.matches_include(path) || self.should_exclude(path) {
                continue;
            }
            match path.metadata() {
                Ok(m) if m.len() <= self.max_file_size => files.push(path.to_path_buf()),
                Ok(m) => {
                    tracing::warn!(path = %path.display(), size = m.len(), "skipping oversized file");
                }
                Err(_) => continue,
            }
        }

        files.sort();
        tracing::debug!(root = %self.root.display(), count = files.len(), "scan complete");
        Ok(files)
    }

    fn relative_str(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn matches_include(&self, path: &Path) -> bool {
        let rel = self.relative_str(path);
        self.include.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&rel))
                .unwrap_or(false)
        })
    }

    fn should_exclude(&self, path: &Path) -> bool {
        let rel = self.relative_str(path);
        let full = path.to_string_lossy();
        self.exclude.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&rel) || p.matches(&full))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scans_python_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("b.txt"), "not python\n").unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/c.py"), "y = 2\n").unwrap();

        let files = FileScanner::new(dir.path()).scan().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.py", "c.py"]);
    }

    #[test]
    fn skips_default_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("__pycache__")).unwrap();
        fs::write(dir.path().join("__pycache__/cached.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("real.py"), "y = 2\n").unwrap();

        let files = FileScanner::new(dir.path()).scan().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("real.py"));
    }

    #[test]
    fn exclude_patterns_apply() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("test_skip.py"), "y = 2\n").unwrap();

        let files = FileScanner::new(dir.path())
            .with_exclude(vec!["test_*.py".to_string()])
            .scan()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep.py"));
    }

    #[test]
    fn single_file_target() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("single.py");
        fs::write(&file, "x = 1\n").unwrap();

        let files = FileScanner::new(&file).scan().unwrap();
        assert_eq!(files, vec![file]);
    }
}
