//! Bindery - a catalog and page server for comic libraries.
//!
//! Bindery watches a library root where every subdirectory is one
//! publication and every `.cbz` archive inside it is one installment. It
//! keeps a persistent catalog of what it has seen and serves metadata,
//! covers and page images over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         REST API (axum)                         │
//! │  Ordinal addressing through the current CatalogSnapshot         │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┴─────────────────────────────────┐
//! │                           LIBRARY                               │
//! │  scan: directories → publications                               │
//! │  installments: descriptors/archives → installments              │
//! │  pages and covers: archive and file reads                       │
//! └───────────────┬───────────────────────────────┬─────────────────┘
//!                 │                               │
//! ┌───────────────┴───────────────┐ ┌─────────────┴─────────────────┐
//! │  CATALOG STORE                │ │  LIBRARY ROOT                 │
//! │  JSON document collections    │ │  details.json, chapters.json  │
//! │  publications, installments,  │ │  *.cbz, cover images          │
//! │  categories                   │ │                               │
//! └───────────────────────────────┘ └───────────────────────────────┘
//! ```

// === Core Modules ===

/// Document storage for catalog records.
pub mod store;

/// Publication and installment records.
pub mod catalog;

/// Page archives.
pub mod archive;

/// Metadata descriptor files.
pub mod descriptor;

/// Library scanning and content resolution.
pub mod library;

// === Service ===

/// Persisted server settings.
pub mod settings;

/// REST API.
pub mod api;

/// Background rescan worker.
pub mod worker;

// === Re-exports ===

pub use catalog::{
    Category, CategoryId, Installment, InstallmentId, Publication, PublicationId,
    PublicationMetadata,
};
pub use library::{CatalogSnapshot, Library, LibraryConfig, LibraryError, ScanReport};
