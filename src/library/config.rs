//! Library configuration.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Configuration for a library.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Root directory; each immediate subdirectory is a publication.
    pub library_dir: PathBuf,

    /// Directory for the catalog store.
    pub data_dir: PathBuf,
}

impl LibraryConfig {
    pub fn new(library_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            library_dir,
            data_dir,
        }
    }

    /// Create the library and data directories if missing.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(&self.library_dir)?;
        Ok(())
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let data_dir = directories::ProjectDirs::from("org", "bindery", "bindery")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".bindery"));
        let library_dir = data_dir.join("library");

        Self::new(library_dir, data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_library_lives_under_data_dir() {
        let config = LibraryConfig::default();
        assert_eq!(config.library_dir, config.data_dir.join("library"));
    }

    #[test]
    fn test_ensure_dirs() {
        let root = tempdir().unwrap();
        let config = LibraryConfig::new(
            root.path().join("nested/library"),
            root.path().join("data"),
        );

        config.ensure_dirs().unwrap();
        assert!(config.data_dir.is_dir());
        assert!(config.library_dir.is_dir());
    }
}
