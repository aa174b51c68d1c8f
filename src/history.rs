//! Plain-text command history, one command per line.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::{tlog_debug, Result};

pub struct History {
    path: PathBuf,
    entries: Vec<String>,
    limit: usize,
}

impl History {
    /// Load history from `path`. A missing file is an empty history.
    pub fn load(path: impl Into<PathBuf>, limit: usize) -> Result<Self> {
        let path = path.into();
        let limit = limit.max(1);
        let mut entries: Vec<String> = match fs::read_to_string(&path) {
            Ok(text) => text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        if entries.len() > limit {
            entries.drain(..entries.len() - limit);
        }
        tlog_debug!("History loaded {} entries from {}", entries.len(), path.display());
        Ok(Self {
            path,
            entries,
            limit,
        })
    }

    /// Empty history that will write to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Record a command. Blank lines and repeats of the previous entry are
    /// skipped. Returns whether the entry was added; the in-memory history is
    /// updated even when the file write fails.
    pub fn add(&mut self, command: &str) -> Result<bool> {
        let command = command.trim();
        if command.is_empty() || self.entries.last().map(String::as_str) == Some(command) {
            return Ok(false);
        }
        self.entries.push(command.to_string());
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.save()?;
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut text = self.entries.join("\n");
        text.push('\n');
        fs::write(&self.path, text)?;
        Ok(())
    }

    /// Most recent entry starting with `prefix`.
    pub fn recent(&self, prefix: &str) -> Option<&str> {
        if prefix.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .rev()
            .find(|e| e.starts_with(prefix))
            .map(String::as_str)
    }

    pub fn all(&self) -> &[String] {
        &self.entries
    }

    /// Numbered listing, 1-based.
    pub fn listing(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, cmd)| format!("{}: {}", i + 1, cmd))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn history_in(dir: &TempDir, limit: usize) -> History {
        History::load(dir.path().join("history"), limit).unwrap()
    }

    #[test]
    fn test_skips_blank_and_consecutive_duplicates() {
        let dir = TempDir::new().unwrap();
        let mut h = history_in(&dir, 10);
        assert!(h.add("ls").unwrap());
        assert!(!h.add("ls").unwrap());
        assert!(!h.add("   ").unwrap());
        assert!(h.add("pwd").unwrap());
        assert!(h.add("ls").unwrap());
        assert_eq!(h.all(), &["ls", "pwd", "ls"]);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let dir = TempDir::new().unwrap();
        let mut h = history_in(&dir, 3);
        for cmd in ["a", "b", "c", "d", "e"] {
            h.add(cmd).unwrap();
        }
        assert_eq!(h.all(), &["c", "d", "e"]);

        let on_disk = fs::read_to_string(h.path()).unwrap();
        assert_eq!(on_disk, "c\nd\ne\n");
    }

    #[test]
    fn test_reload_from_disk() {
        let dir = TempDir::new().unwrap();
        {
            let mut h = history_in(&dir, 10);
            h.add("git status").unwrap();
            h.add("cargo fmt").unwrap();
        }
        let h = history_in(&dir, 10);
        assert_eq!(h.all(), &["git status", "cargo fmt"]);
    }

    #[test]
    fn test_load_skips_blank_lines_and_caps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, "a\n\n  \nb\nc\n").unwrap();
        let h = History::load(&path, 2).unwrap();
        assert_eq!(h.all(), &["b", "c"]);
    }

    #[test]
    fn test_recent_prefix() {
        let dir = TempDir::new().unwrap();
        let mut h = history_in(&dir, 10);
        h.add("git status").unwrap();
        h.add("git push").unwrap();
        h.add("ls").unwrap();
        assert_eq!(h.recent("git"), Some("git push"));
        assert_eq!(h.recent("git s"), Some("git status"));
        assert_eq!(h.recent("docker"), None);
        assert_eq!(h.recent(""), None);
    }

    #[test]
    fn test_listing() {
        let dir = TempDir::new().unwrap();
        let mut h = history_in(&dir, 10);
        h.add("one").unwrap();
        h.add("two").unwrap();
        assert_eq!(h.listing(), "1: one\n2: two");
    }

    #[test]
    fn test_write_failure_keeps_memory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let mut h = History::empty(blocker.join("history"));
        assert!(h.add("ls").is_err());
        assert_eq!(h.all(), &["ls"]);
    }
}
