//! Page archive reader.
//!
//! Installments are stored as zip archives (`.cbz`). Every file entry is a
//! page except embedded metadata (`*.xml`, e.g. `ComicInfo.xml`) and
//! directory entries. Pages keep the archive's own entry order; nothing is
//! re-sorted here.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

/// Extension of installment archives, without the dot.
pub const ARCHIVE_EXTENSION: &str = "cbz";

/// Entries with this suffix are metadata, not pages.
const METADATA_SUFFIX: &str = ".xml";

/// Largest page that will be read into memory.
pub const MAX_PAGE_BYTES: u64 = 64 * 1024 * 1024;

/// Errors reading a page archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid archive {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to read page {index} of {path}: {source}")]
    Read {
        path: PathBuf,
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error("Page {index} of {path} exceeds {limit} bytes")]
    PageTooLarge {
        path: PathBuf,
        index: usize,
        limit: u64,
    },

    #[error("Page {index} out of range ({count} pages)")]
    PageOutOfRange { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Raw bytes of one page or image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// An open page archive.
pub struct PageArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
    /// Archive entry index of each page, in page order.
    pages: Vec<usize>,
    names: Vec<String>,
}

impl PageArchive {
    /// Open an archive and index its pages.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|source| ArchiveError::Open {
            path: path.clone(),
            source,
        })?;
        let mut archive = ZipArchive::new(file).map_err(|source| ArchiveError::Zip {
            path: path.clone(),
            source,
        })?;

        let mut pages = Vec::new();
        let mut names = Vec::new();
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index).map_err(|source| ArchiveError::Zip {
                path: path.clone(),
                source,
            })?;
            if is_page(entry.name(), entry.is_dir()) {
                pages.push(index);
                names.push(entry.name().to_string());
            }
        }

        debug!(path = %path.display(), pages = pages.len(), "Indexed page archive");

        Ok(Self {
            path,
            archive,
            pages,
            names,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Read page `index` (0-based).
    pub fn read_page(&mut self, index: usize) -> Result<Page> {
        let count = self.page_count();
        let entry_index = *self
            .pages
            .get(index)
            .ok_or(ArchiveError::PageOutOfRange { index, count })?;

        let entry = self
            .archive
            .by_index(entry_index)
            .map_err(|source| ArchiveError::Zip {
                path: self.path.clone(),
                source,
            })?;

        let declared = entry.size();
        let bytes = read_capped(entry, declared, MAX_PAGE_BYTES)
            .map_err(|source| ArchiveError::Read {
                path: self.path.clone(),
                index,
                source,
            })?
            .ok_or_else(|| ArchiveError::PageTooLarge {
                path: self.path.clone(),
                index,
                limit: MAX_PAGE_BYTES,
            })?;

        Ok(Page {
            bytes,
            content_type: image_content_type(&self.names[index]),
        })
    }
}

/// Page count of the archive at `path`, or `None` if it is missing or
/// unreadable.
pub fn probe(path: &Path) -> Option<usize> {
    match PageArchive::open(path) {
        Ok(archive) => Some(archive.page_count()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Archive unavailable");
            None
        }
    }
}

/// Path of the archive backing installment `name` in `dir`.
pub fn archive_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, ARCHIVE_EXTENSION))
}

/// Content type for an image file, derived from its extension.
pub fn image_content_type(name: &str) -> String {
    let extension = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some("svg") => "image/svg+xml".to_string(),
        Some(ext) if !ext.is_empty() => format!("image/{}", ext),
        _ => "application/octet-stream".to_string(),
    }
}

/// Read all of `reader`, or `None` once it yields more than `limit` bytes.
///
/// `declared` is the size the archive header claims and only sizes the
/// initial buffer.
fn read_capped(reader: impl Read, declared: u64, limit: u64) -> io::Result<Option<Vec<u8>>> {
    let mut bytes = Vec::with_capacity(declared.min(limit) as usize);
    reader.take(limit + 1).read_to_end(&mut bytes)?;

    if bytes.len() as u64 > limit {
        return Ok(None);
    }
    Ok(Some(bytes))
}

fn is_page(name: &str, is_dir: bool) -> bool {
    !is_dir && !name.to_lowercase().ends_with(METADATA_SUFFIX)
}
