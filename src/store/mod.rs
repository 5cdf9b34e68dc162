//! Document store for catalog records.
//!
//! Documents are JSON objects grouped into named collections and addressed
//! by generated identifiers. Each collection lives in its own file under the
//! store directory and is rewritten atomically after every mutation.
//!
//! Entity types derive `Serialize`/`Deserialize` and implement [`Document`]
//! to name their collection and expose their identifier. The identifier is
//! serialized as `_id` and kept out of the stored field map.

pub mod filter;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

pub use filter::Filter;

/// Name of the identifier field in a serialized document.
pub const ID_FIELD: &str = "_id";

/// Top-level fields of a stored document, excluding its identifier.
pub type Fields = serde_json::Map<String, Value>;

/// Errors that can occur in store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to persist collection: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Document {id} not found in {collection}")]
    NotFound { collection: String, id: DocumentId },

    #[error("Malformed document {id} in {collection}: {reason}")]
    Malformed {
        collection: String,
        id: DocumentId,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Store-generated document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A type that can be stored as a document.
///
/// The serialized form must be a JSON object carrying the identifier under
/// [`ID_FIELD`] (`#[serde(rename = "_id")]`).
pub trait Document: Serialize + DeserializeOwned {
    /// Collection holding documents of this type.
    const COLLECTION: &'static str;

    /// Identifier assigned by the store.
    fn id(&self) -> &DocumentId;
}

/// On-disk layout of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(rename = "_id")]
    id: DocumentId,

    #[serde(flatten)]
    fields: Fields,
}

impl StoredDocument {
    fn encode<D: Document>(doc: &D) -> Result<Self> {
        let id = doc.id().clone();
        let mut fields = match serde_json::to_value(doc)? {
            Value::Object(fields) => fields,
            other => {
                return Err(StoreError::Malformed {
                    collection: D::COLLECTION.to_string(),
                    id,
                    reason: format!("expected a JSON object, got {}", other),
                })
            }
        };
        fields.remove(ID_FIELD);

        Ok(Self { id, fields })
    }

    fn decode<D: Document>(&self) -> Result<D> {
        let mut fields = self.fields.clone();
        fields.insert(ID_FIELD.to_string(), serde_json::to_value(&self.id)?);

        serde_json::from_value(Value::Object(fields)).map_err(|e| StoreError::Malformed {
            collection: D::COLLECTION.to_string(),
            id: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug)]
struct Collection {
    path: PathBuf,
    documents: Vec<StoredDocument>,
    /// Number of times the collection file has been rewritten.
    writes: u64,
}

impl Collection {
    fn load(path: PathBuf) -> Result<Self> {
        let documents = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path,
            documents,
            writes: 0,
        })
    }

    fn position(&self, id: &DocumentId) -> Option<usize> {
        self.documents.iter().position(|d| &d.id == id)
    }

    fn flush(&mut self) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let bytes = serde_json::to_vec(&self.documents)?;

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        file.write_all(&bytes).map_err(|source| StoreError::Io {
            path: file.path().to_path_buf(),
            source,
        })?;
        file.persist(&self.path)?;

        self.writes += 1;
        debug!(
            path = %self.path.display(),
            documents = self.documents.len(),
            bytes = bytes.len(),
            writes = self.writes,
            "Collection written"
        );

        Ok(())
    }

    /// Append documents and persist them. On failure the collection is left
    /// as it was.
    fn append(&mut self, documents: Vec<StoredDocument>) -> Result<()> {
        let before = self.documents.len();
        self.documents.extend(documents);

        if let Err(e) = self.flush() {
            self.documents.truncate(before);
            return Err(e);
        }

        Ok(())
    }
}

/// File-backed document store with named collections.
#[derive(Debug)]
pub struct DocumentStore {
    dir: PathBuf,
    collections: BTreeMap<String, Collection>,
}

impl DocumentStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        info!(dir = %dir.display(), "Opened document store");

        Ok(Self {
            dir,
            collections: BTreeMap::new(),
        })
    }

    /// Create a collection, loading previously persisted documents.
    ///
    /// Creating an existing collection is a no-op.
    pub fn create_collection(&mut self, name: &str) -> Result<()> {
        if self.collections.contains_key(name) {
            return Ok(());
        }

        let collection = Collection::load(self.dir.join(format!("{}.json", name)))?;
        debug!(collection = %name, documents = collection.documents.len(), "Loaded collection");
        self.collections.insert(name.to_string(), collection);
        Ok(())
    }

    /// Insert a new document. The store assigns the identifier and passes it
    /// to `build`.
    pub fn insert<D: Document>(&mut self, build: impl FnOnce(DocumentId) -> D) -> Result<D> {
        let doc = build(DocumentId::generate());
        let stored = StoredDocument::encode(&doc)?;

        self.collection_mut(D::COLLECTION)?.append(vec![stored])?;

        debug!(collection = D::COLLECTION, id = %doc.id(), "Inserted document");
        Ok(doc)
    }

    /// Insert one document per item with a single collection write.
    ///
    /// Either every document is persisted or none is.
    pub fn insert_many<D: Document, T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        mut build: impl FnMut(DocumentId, T) -> D,
    ) -> Result<Vec<D>> {
        let docs: Vec<D> = items
            .into_iter()
            .map(|item| build(DocumentId::generate(), item))
            .collect();
        if docs.is_empty() {
            return Ok(docs);
        }

        let stored = docs
            .iter()
            .map(StoredDocument::encode)
            .collect::<Result<Vec<_>>>()?;

        self.collection_mut(D::COLLECTION)?.append(stored)?;

        debug!(collection = D::COLLECTION, count = docs.len(), "Inserted documents");
        Ok(docs)
    }

    /// Get a document by identifier.
    pub fn get<D: Document>(&self, id: &DocumentId) -> Result<Option<D>> {
        let collection = self.collection(D::COLLECTION)?;
        collection
            .documents
            .iter()
            .find(|d| &d.id == id)
            .map(StoredDocument::decode)
            .transpose()
    }

    /// First document (in insertion order) matching `filter`.
    pub fn find_first<D: Document>(&self, filter: &Filter) -> Result<Option<D>> {
        let collection = self.collection(D::COLLECTION)?;
        collection
            .documents
            .iter()
            .find(|d| filter.matches(&d.fields))
            .map(StoredDocument::decode)
            .transpose()
    }

    /// All documents matching `filter`, in insertion order.
    pub fn find_all<D: Document>(&self, filter: &Filter) -> Result<Vec<D>> {
        let collection = self.collection(D::COLLECTION)?;
        collection
            .documents
            .iter()
            .filter(|d| filter.matches(&d.fields))
            .map(StoredDocument::decode)
            .collect()
    }

    /// Apply `transform` to a stored document and persist the result.
    ///
    /// The collection file is only rewritten when the stored fields change.
    pub fn update<D: Document>(
        &mut self,
        id: &DocumentId,
        transform: impl FnOnce(&mut D),
    ) -> Result<D> {
        let collection = self.collection_mut(D::COLLECTION)?;
        let position = collection.position(id).ok_or_else(|| StoreError::NotFound {
            collection: D::COLLECTION.to_string(),
            id: id.clone(),
        })?;

        let mut doc: D = collection.documents[position].decode()?;
        transform(&mut doc);

        let mut updated = StoredDocument::encode(&doc)?;
        if &updated.id != id {
            return Err(StoreError::Malformed {
                collection: D::COLLECTION.to_string(),
                id: id.clone(),
                reason: format!("update changed the identifier to {}", updated.id),
            });
        }

        if updated.fields != collection.documents[position].fields {
            std::mem::swap(&mut collection.documents[position].fields, &mut updated.fields);
            if let Err(e) = collection.flush() {
                std::mem::swap(&mut collection.documents[position].fields, &mut updated.fields);
                return Err(e);
            }
            debug!(collection = D::COLLECTION, id = %id, "Updated document");
        }

        Ok(doc)
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.collection(collection)?.documents.len())
    }

    /// Number of times a collection file has been rewritten since it was
    /// loaded.
    #[cfg(test)]
    pub(crate) fn writes(&self, collection: &str) -> Result<u64> {
        Ok(self.collection(collection)?.writes)
    }

    fn collection(&self, name: &str) -> Result<&Collection> {
        self.collections
            .get(name)
            .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut Collection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))
    }
}
