//! Library synchronization and content resolution.
//!
//! [`Library`] owns the catalog store and the library root. It handles:
//! - Directory scans that reconcile publication directories with the catalog
//! - Installment synchronization and availability refresh
//! - Page and cover lookups for serving content
//! - Category membership
//!
//! `Library` is not internally synchronized; callers serialize access.

pub mod categories;
pub mod config;
pub mod cover;
pub mod installments;
pub mod scan;
pub mod snapshot;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::archive::ArchiveError;
use crate::catalog::{Category, CategoryId, Installment, Publication, PublicationId};
use crate::descriptor::DescriptorError;
use crate::store::{Document, DocumentStore, Filter, StoreError};

pub use config::LibraryConfig;
pub use cover::COVER_TOKEN;
pub use scan::{ScanEntry, ScanReport};
pub use snapshot::CatalogSnapshot;

/// Errors that can occur in library operations.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Library root {path} is unreadable: {source}")]
    LibraryRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Publication ordinal {0} is out of range")]
    PublicationOutOfRange(i64),

    #[error("Publication not found: {0}")]
    PublicationNotFound(PublicationId),

    #[error("Installment ordinal {ordinal} is out of range for publication {publication}")]
    InstallmentOutOfRange {
        publication: PublicationId,
        ordinal: i64,
    },

    #[error("Installment {0} is not available")]
    InstallmentUnavailable(String),

    #[error("Page {page} is out of range ({count} pages)")]
    PageOutOfRange { page: i64, count: usize },

    #[error("Publication {0} has no cover image")]
    ThumbnailMissing(PublicationId),

    #[error("Category ordinal {0} is out of range")]
    CategoryOutOfRange(i64),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Invalid category name: {0:?}")]
    InvalidCategoryName(String),
}

impl LibraryError {
    /// Whether the error is caused by the request rather than the library
    /// or its storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LibraryError::PublicationOutOfRange(_)
                | LibraryError::PublicationNotFound(_)
                | LibraryError::InstallmentOutOfRange { .. }
                | LibraryError::InstallmentUnavailable(_)
                | LibraryError::PageOutOfRange { .. }
                | LibraryError::ThumbnailMissing(_)
                | LibraryError::CategoryOutOfRange(_)
                | LibraryError::CategoryNotFound(_)
                | LibraryError::InvalidCategoryName(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

/// A media library backed by a directory tree and a catalog store.
pub struct Library {
    config: LibraryConfig,
    store: DocumentStore,
}

impl Library {
    /// Open the catalog store for `config`.
    pub fn open(config: LibraryConfig) -> Result<Self> {
        let mut store = DocumentStore::open(&config.data_dir)?;
        store.create_collection(Publication::COLLECTION)?;
        store.create_collection(Installment::COLLECTION)?;
        store.create_collection(Category::COLLECTION)?;

        let mut library = Self { config, store };
        library.ensure_default_category()?;

        info!(
            library_dir = %library.config.library_dir.display(),
            publications = library.store.count(Publication::COLLECTION)?,
            installments = library.store.count(Installment::COLLECTION)?,
            categories = library.store.count(Category::COLLECTION)?,
            "Library opened"
        );

        Ok(library)
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Get a publication by identifier.
    pub fn publication(&self, id: &PublicationId) -> Result<Publication> {
        self.store
            .get(id)?
            .ok_or_else(|| LibraryError::PublicationNotFound(id.clone()))
    }

    /// Publications in snapshot order.
    pub fn publications(&self, snapshot: &CatalogSnapshot) -> Result<Vec<Publication>> {
        snapshot.ids().iter().map(|id| self.publication(id)).collect()
    }

    /// Look up a publication by directory name.
    pub fn find_publication(&self, name: &str) -> Result<Option<Publication>> {
        Ok(self.store.find_first(&Filter::eq("name", name))?)
    }

    /// Directory backing a publication.
    pub fn publication_dir(&self, publication: &Publication) -> PathBuf {
        self.config.library_dir.join(&publication.name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    pub(crate) use crate::archive::tests::write_archive;

    /// A library over a temporary directory tree.
    pub(crate) struct Fixture {
        pub root: TempDir,
        pub library: Library,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let config = LibraryConfig::new(root.path().join("library"), root.path().join("data"));
            config.ensure_dirs().unwrap();
            let library = Library::open(config).unwrap();
            Self { root, library }
        }

        pub(crate) fn library_dir(&self) -> &Path {
            &self.library.config().library_dir
        }

        /// Create a publication directory and return its path.
        pub(crate) fn publication_dir(&self, name: &str) -> PathBuf {
            let dir = self.library_dir().join(name);
            fs::create_dir_all(&dir).unwrap();
            dir
        }

        /// Reopen the library over the same directories.
        pub(crate) fn reopen(self) -> Self {
            let config = self.library.config().clone();
            drop(self.library);
            Self {
                root: self.root,
                library: Library::open(config).unwrap(),
            }
        }
    }

    #[test]
    fn test_open_empty_library() {
        let fixture = Fixture::new();
        assert!(fixture.library.find_publication("nothing").unwrap().is_none());
    }

    #[test]
    fn test_publication_not_found() {
        let mut fixture = Fixture::new();
        fixture.publication_dir("Monster");
        let report = fixture.library.scan().unwrap();
        let known = report.entries[0].id.clone();

        let other = Fixture::new();
        let err = other.library.publication(&known).unwrap_err();
        assert!(matches!(err, LibraryError::PublicationNotFound(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_fatal_errors_are_not_client_errors() {
        let err = LibraryError::LibraryRoot {
            path: PathBuf::from("/missing"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(!err.is_client_error());
        assert!(LibraryError::PublicationOutOfRange(-1).is_client_error());
    }
}
