//! Category records.
//!
//! Categories are named, user-managed groups of publications. Every new
//! publication joins the default category.

use serde::{Deserialize, Serialize};

use crate::store::{Document, DocumentId};

use super::PublicationId;

/// Stable identifier of a category.
pub type CategoryId = DocumentId;

/// Name of the category every new publication is added to.
pub const DEFAULT_CATEGORY: &str = "Default";

/// A cataloged category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,

    /// Unique display name.
    pub name: String,

    /// Creation position; categories are listed in this order.
    pub order: usize,

    #[serde(default)]
    pub default: bool,

    /// Members in the order they were added. No duplicates.
    #[serde(default)]
    pub publications: Vec<PublicationId>,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>, order: usize) -> Self {
        Self {
            id,
            name: name.into(),
            order,
            default: false,
            publications: Vec::new(),
        }
    }

    /// Add a member. Returns false if it was already present.
    pub fn add(&mut self, publication: &PublicationId) -> bool {
        if self.publications.contains(publication) {
            return false;
        }
        self.publications.push(publication.clone());
        true
    }
}

impl Document for Category {
    const COLLECTION: &'static str = "categories";

    fn id(&self) -> &DocumentId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentStore;
    use tempfile::tempdir;

    #[test]
    fn test_add_skips_duplicates() {
        let dir = tempdir().unwrap();
        let mut store = DocumentStore::open(dir.path()).unwrap();
        store.create_collection(Category::COLLECTION).unwrap();

        let created = store.insert(|id| Category::new(id, "Reading", 1)).unwrap();
        let member: PublicationId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();

        let updated: Category = store
            .update(&created.id, |c: &mut Category| {
                assert!(c.add(&member));
                assert!(!c.add(&member));
            })
            .unwrap();
        assert_eq!(updated.publications, vec![member]);

        let fetched: Category = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched, updated);
        assert!(!fetched.default);
    }
}
