//! Publication records.
//!
//! A publication is one directory under the library root. Its directory
//! name is the natural key used to recognise it across scans.

use serde::{Deserialize, Serialize};

use crate::store::{Document, DocumentId};

use super::InstallmentId;

/// Stable identifier of a publication.
pub type PublicationId = DocumentId;

/// Descriptor-sourced publication metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicationMetadata {
    pub source_id: String,
    pub title: String,
    pub artist: String,
    pub author: String,
    pub description: String,
    pub genre: Vec<String>,
    /// Publication status, always uppercase (e.g. "ONGOING").
    pub status: String,
}

impl PublicationMetadata {
    /// Metadata for a publication without a descriptor.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A cataloged publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    /// Identifier assigned by the store.
    #[serde(rename = "_id")]
    pub id: PublicationId,

    /// Directory name under the library root.
    pub name: String,

    /// Scan position when the record was created. Later scans report the
    /// current position without rewriting this field.
    pub scan_index: usize,

    #[serde(default)]
    pub metadata: PublicationMetadata,

    /// Installments in creation order. Append only.
    #[serde(default)]
    pub installments: Vec<InstallmentId>,
}

impl Publication {
    pub fn new(
        id: PublicationId,
        name: impl Into<String>,
        scan_index: usize,
        metadata: PublicationMetadata,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            scan_index,
            metadata,
            installments: Vec::new(),
        }
    }
}

impl Document for Publication {
    const COLLECTION: &'static str = "publications";

    fn id(&self) -> &DocumentId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentStore;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_titled_metadata() {
        let metadata = PublicationMetadata::titled("Blame!");
        assert_eq!(metadata.title, "Blame!");
        assert!(metadata.genre.is_empty());
        assert!(metadata.status.is_empty());
    }

    #[test]
    fn test_publication_document_mapping() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::open(dir.path()).unwrap();
        store.create_collection(Publication::COLLECTION).unwrap();

        let metadata = PublicationMetadata {
            title: "Vagabond".into(),
            author: "Takehiko Inoue".into(),
            genre: vec!["Historical".into(), "Action".into()],
            status: "HIATUS".into(),
            ..Default::default()
        };

        let created = store
            .insert(|id| Publication::new(id, "vagabond", 4, metadata.clone()))
            .unwrap();
        let fetched: Publication = store.get(&created.id).unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.metadata, metadata);
        assert_eq!(fetched.scan_index, 4);
    }

    #[test]
    fn test_stored_layout() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::open(dir.path()).unwrap();
        store.create_collection(Publication::COLLECTION).unwrap();

        let created = store
            .insert(|id| Publication::new(id, "blame", 0, PublicationMetadata::titled("Blame!")))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join("publications.json")).unwrap())
                .unwrap();
        assert_eq!(raw[0]["_id"], json!(created.id.to_string()));
        assert_eq!(raw[0]["scanIndex"], json!(0));
        assert_eq!(raw[0]["metadata"]["title"], json!("Blame!"));
        assert_eq!(raw[0]["installments"], json!([]));
    }
}
