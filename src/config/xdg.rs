//! XDG Base Directory support.

use std::path::{Path, PathBuf};

/// XDG directory paths for Codepad.
pub struct XdgDirs {
    /// Cache directory (~/.cache/codepad or XDG_CACHE_HOME/codepad)
    pub cache: PathBuf,
    /// State directory (~/.local/state/codepad or XDG_STATE_HOME/codepad)
    pub state: PathBuf,
}

impl XdgDirs {
    /// Get XDG directories, respecting environment variables.
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            cache: std::env::var("XDG_CACHE_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join(".cache"))
                .join("codepad"),
            state: std::env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join(".local/state"))
                .join("codepad"),
        }
    }

    /// Directories nested under a single root, used with `--db` and in tests.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            cache: root.join("cache"),
            state: root.join("state"),
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.cache, &self.state] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Where the capture shim for the interpreter is installed.
    pub fn runtime_dir(&self) -> PathBuf {
        self.cache.join("runtime")
    }

    /// REPL history file.
    pub fn history_file(&self) -> PathBuf {
        self.state.join("history.txt")
    }
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_xdg_dirs_end_with_codepad() {
        let dirs = XdgDirs::new();
        assert!(dirs.cache.ends_with("codepad"), "{:?}", dirs.cache);
        assert!(dirs.state.ends_with("codepad"), "{:?}", dirs.state);
    }

    #[test]
    fn test_rooted_at_nests_under_root() {
        let tmp = TempDir::new().unwrap();
        let dirs = XdgDirs::rooted_at(tmp.path());
        assert!(dirs.cache.starts_with(tmp.path()));
        assert!(dirs.state.starts_with(tmp.path()));
        assert_ne!(dirs.cache, dirs.state);
    }

    #[test]
    fn test_ensure_dirs_creates_all_directories() {
        let tmp = TempDir::new().unwrap();
        let dirs = XdgDirs::rooted_at(&tmp.path().join("nested"));

        dirs.ensure_dirs().unwrap();
        dirs.ensure_dirs().unwrap();

        assert!(dirs.cache.is_dir());
        assert!(dirs.state.is_dir());
    }

    #[test]
    fn test_derived_paths() {
        let dirs = XdgDirs::rooted_at(Path::new("/tmp/codepad-test"));
        assert_eq!(dirs.runtime_dir(), PathBuf::from("/tmp/codepad-test/cache/runtime"));
        assert_eq!(dirs.history_file(), PathBuf::from("/tmp/codepad-test/state/history.txt"));
    }
}
