//! Installment records.
//!
//! One installment per content unit of a publication, backed by an archive
//! named `<name>.cbz` in the publication directory.

use serde::{Deserialize, Serialize};

use crate::store::{Document, DocumentId};

use super::PublicationId;

/// Stable identifier of an installment.
pub type InstallmentId = DocumentId;

/// A cataloged installment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    #[serde(rename = "_id")]
    pub id: InstallmentId,

    /// Owning publication.
    pub publication_id: PublicationId,

    /// Archive stem; unique within the publication.
    pub name: String,

    /// Position in the installment list the record was created from.
    pub order_index: usize,

    /// Parent's scan position at creation time.
    pub publication_index: usize,

    /// Whether the backing archive was readable at the last check.
    pub available: bool,

    /// Page count at the last check; 0 while unavailable.
    pub page_count: usize,

    /// Upload time in milliseconds since the Unix epoch.
    pub upload_date: i64,

    /// Display number (e.g. 12.5).
    pub number: f32,

    /// Scanlation group or other attribution.
    #[serde(default)]
    pub scanlator: String,
}

impl Installment {
    /// Record the outcome of probing the backing archive.
    pub fn set_page_count(&mut self, page_count: Option<usize>) {
        self.available = page_count.is_some();
        self.page_count = page_count.unwrap_or(0);
    }
}

impl Document for Installment {
    const COLLECTION: &'static str = "installments";

    fn id(&self) -> &DocumentId {
        &self.id
    }
}
