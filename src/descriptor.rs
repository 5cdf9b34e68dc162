//! Sidecar descriptor parsing.
//!
//! A publication directory may carry two optional JSON descriptors:
//! - `details.json` with publication metadata
//! - `chapters.json` with the ordered installment list
//!
//! A missing descriptor is not an error. A descriptor that exists but cannot
//! be read or parsed is.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::catalog::PublicationMetadata;

/// Publication descriptor file name.
pub const PUBLICATION_DESCRIPTOR: &str = "details.json";

/// Installment descriptor file name.
pub const INSTALLMENT_DESCRIPTOR: &str = "chapters.json";

/// Errors reading a descriptor that exists.
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to read descriptor {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, DescriptorError>;

/// One entry of `chapters.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentEntry {
    /// Installment name; matches the archive stem.
    pub title: String,

    /// Creation time in milliseconds since the Unix epoch.
    pub date: i64,

    #[serde(default)]
    pub chapter_number: Option<f32>,

    #[serde(default)]
    pub scanlator: Option<String>,
}

impl InstallmentEntry {
    /// Entry for an archive discovered on disk.
    pub fn inferred(title: impl Into<String>, date: i64) -> Self {
        Self {
            title: title.into(),
            date,
            chapter_number: None,
            scanlator: None,
        }
    }
}

/// Wire form of `details.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PublicationDescriptor {
    source_id: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    author: Option<String>,
    description: Option<String>,
    genre: Vec<String>,
    status: Option<String>,
}

/// Read `details.json` from a publication directory.
///
/// Returns `Ok(None)` when the file does not exist. When the descriptor has
/// no title, the directory name stands in.
pub fn read_publication(dir: &Path) -> Result<Option<PublicationMetadata>> {
    let path = dir.join(PUBLICATION_DESCRIPTOR);
    let Some(bytes) = read_optional(&path)? else {
        return Ok(None);
    };

    let descriptor: PublicationDescriptor =
        serde_json::from_slice(&bytes).map_err(|source| DescriptorError::Parse {
            path: path.clone(),
            source,
        })?;

    let fallback_title = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!(path = %path.display(), "Parsed publication descriptor");

    Ok(Some(PublicationMetadata {
        source_id: descriptor.source_id.unwrap_or_default(),
        title: descriptor
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(fallback_title),
        artist: descriptor.artist.unwrap_or_default(),
        author: descriptor.author.unwrap_or_default(),
        description: descriptor.description.unwrap_or_default(),
        genre: descriptor.genre,
        status: normalize_status(descriptor.status.as_deref().unwrap_or_default()),
    }))
}

/// Read `chapters.json` from a publication directory.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_installments(dir: &Path) -> Result<Option<Vec<InstallmentEntry>>> {
    let path = dir.join(INSTALLMENT_DESCRIPTOR);
    let Some(bytes) = read_optional(&path)? else {
        return Ok(None);
    };

    let entries: Vec<InstallmentEntry> =
        serde_json::from_slice(&bytes).map_err(|source| DescriptorError::Parse {
            path: path.clone(),
            source,
        })?;

    debug!(path = %path.display(), count = entries.len(), "Parsed installment descriptor");

    Ok(Some(entries))
}

/// Status values are stored uppercase.
pub fn normalize_status(status: &str) -> String {
    status.trim().to_uppercase()
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_descriptors() {
        let dir = tempdir().unwrap();

        assert!(read_publication(dir.path()).unwrap().is_none());
        assert!(read_installments(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_publication_descriptor() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(PUBLICATION_DESCRIPTOR),
            r#"{
                "sourceId": "local",
                "title": "Dorohedoro",
                "artist": "Q Hayashida",
                "genre": ["Action", "Comedy"],
                "status": "Completed"
            }"#,
        )
        .unwrap();

        let metadata = read_publication(dir.path()).unwrap().unwrap();
        assert_eq!(metadata.title, "Dorohedoro");
        assert_eq!(metadata.source_id, "local");
        assert_eq!(metadata.artist, "Q Hayashida");
        assert_eq!(metadata.author, "");
        assert_eq!(metadata.genre, vec!["Action", "Comedy"]);
        assert_eq!(metadata.status, "COMPLETED");
    }

    #[test]
    fn test_publication_descriptor_without_title() {
        let root = tempdir().unwrap();
        let dir = root.path().join("Kaiji");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(PUBLICATION_DESCRIPTOR), r#"{"status": "ongoing"}"#).unwrap();

        let metadata = read_publication(&dir).unwrap().unwrap();
        assert_eq!(metadata.title, "Kaiji");
        assert_eq!(metadata.status, "ONGOING");
    }

    #[test]
    fn test_malformed_publication_descriptor() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PUBLICATION_DESCRIPTOR), "{ not json").unwrap();

        let err = read_publication(dir.path()).unwrap_err();
        assert!(matches!(err, DescriptorError::Parse { .. }));
    }

    #[test]
    fn test_installment_descriptor() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(INSTALLMENT_DESCRIPTOR),
            r#"[
                {"title": "Chapter 2", "date": 1700000100000, "chapterNumber": 2, "scanlator": "scans"},
                {"title": "Chapter 1", "date": 1700000000000}
            ]"#,
        )
        .unwrap();

        let entries = read_installments(dir.path()).unwrap().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Chapter 2");
        assert_eq!(entries[0].chapter_number, Some(2.0));
        assert_eq!(entries[0].scanlator.as_deref(), Some("scans"));
        assert_eq!(entries[1], InstallmentEntry::inferred("Chapter 1", 1_700_000_000_000));
    }

    #[test]
    fn test_malformed_installment_descriptor() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(INSTALLMENT_DESCRIPTOR), r#"{"title": "x"}"#).unwrap();

        assert!(matches!(
            read_installments(dir.path()),
            Err(DescriptorError::Parse { .. })
        ));
    }

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status("ongoing"), "ONGOING");
        assert_eq!(normalize_status(" Hiatus "), "HIATUS");
        assert_eq!(normalize_status(""), "");
    }
}
