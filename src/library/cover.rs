//! Cover art lookup.
//!
//! A publication's cover is any file in its directory whose name contains
//! `cover`. When several match, the name-sorted first one wins. Covers are
//! served as stored; no resizing or caching.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::archive::{self, Page};
use crate::catalog::PublicationId;

use super::{Library, LibraryError, Result};

/// Reserved file name token for cover art.
pub const COVER_TOKEN: &str = "cover";

impl Library {
    /// Cover image of a publication.
    pub fn thumbnail(&self, publication_id: &PublicationId) -> Result<Page> {
        let publication = self.publication(publication_id)?;
        let dir = self.publication_dir(&publication);

        let path = find_cover(&dir).ok_or_else(|| LibraryError::ThumbnailMissing(publication_id.clone()))?;

        let bytes = fs::read(&path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to read cover");
            LibraryError::ThumbnailMissing(publication_id.clone())
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(publication = %publication.name, cover = %name, "Serving cover");

        Ok(Page {
            bytes,
            content_type: archive::image_content_type(&name),
        })
    }
}

fn find_cover(dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Cannot list publication directory");
            return None;
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| entry.file_name().to_string_lossy().contains(COVER_TOKEN))
        .map(|entry| entry.path())
        .collect();

    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::Fixture;

    #[test]
    fn test_thumbnail() {
        let mut fixture = Fixture::new();
        let dir = fixture.publication_dir("Nausicaa");
        fs::write(dir.join("cover.png"), b"png-bytes").unwrap();

        let report = fixture.library.scan().unwrap();
        let thumbnail = fixture.library.thumbnail(&report.entries[0].id).unwrap();

        assert_eq!(thumbnail.bytes, b"png-bytes");
        assert_eq!(thumbnail.content_type, "image/png");
    }

    #[test]
    fn test_first_cover_by_name_wins() {
        let fixture = Fixture::new();
        let dir = fixture.publication_dir("Mushishi");
        fs::write(dir.join("cover_b.jpg"), b"b").unwrap();
        fs::write(dir.join("alt-cover.jpg"), b"a").unwrap();

        assert_eq!(find_cover(&dir), Some(dir.join("alt-cover.jpg")));
    }

    #[test]
    fn test_missing_thumbnail() {
        let mut fixture = Fixture::new();
        let dir = fixture.publication_dir("Planetes");
        fs::write(dir.join("ch1.cbz"), b"zip").unwrap();

        let report = fixture.library.scan().unwrap();
        let err = fixture.library.thumbnail(&report.entries[0].id).unwrap_err();

        assert!(matches!(err, LibraryError::ThumbnailMissing(_)));
        assert!(err.is_client_error());
    }
}
