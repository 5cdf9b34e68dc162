//! Catalog records for Bindery.
//!
//! Publications, installments and categories are the persisted entity
//! types. Each derives its serde mapping and names its collection through
//! [`crate::store::Document`].

pub mod category;
pub mod installment;
pub mod publication;

pub use category::{Category, CategoryId, DEFAULT_CATEGORY};
pub use installment::{Installment, InstallmentId};
pub use publication::{Publication, PublicationId, PublicationMetadata};
