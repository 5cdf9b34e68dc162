//! Directory scanning.
//!
//! A scan lists the immediate subdirectories of the library root, most
//! recently modified first, and reconciles each one with the catalog by
//! directory name. Known publications are reused as-is; new ones are
//! created in one batch, join the default category and get a first
//! installment sync.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{Publication, PublicationId, PublicationMetadata};
use crate::descriptor;
use crate::store::Filter;

use super::{Library, LibraryError, Result};

/// One publication's position in a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanEntry {
    pub id: PublicationId,
    pub name: String,
    /// 0-based position, most recently modified first.
    pub scan_index: usize,
}

/// Outcome of a directory scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Every publication directory, in scan order.
    pub entries: Vec<ScanEntry>,

    /// Publications created by this scan.
    pub created_publications: usize,

    /// Installments created by this scan.
    pub created_installments: usize,

    /// When the scan finished (Unix epoch seconds).
    pub finished_at: u64,
}

/// A publication directory found under the library root.
#[derive(Debug, Clone)]
struct PublicationDir {
    name: String,
    path: PathBuf,
    modified: SystemTime,
}

impl Library {
    /// Scan the library root and reconcile it with the catalog.
    pub fn scan(&mut self) -> Result<ScanReport> {
        let dirs = order_by_recency(read_publication_dirs(&self.config.library_dir)?);

        // First record wins when several share a name.
        let mut known: HashMap<String, PublicationId> = HashMap::new();
        for publication in self.store.find_all::<Publication>(&Filter::All)? {
            known.entry(publication.name).or_insert(publication.id);
        }

        let mut fresh = Vec::new();
        for (scan_index, dir) in dirs.iter().enumerate() {
            if !known.contains_key(&dir.name) {
                let metadata = descriptor::read_publication(&dir.path)?
                    .unwrap_or_else(|| PublicationMetadata::titled(&dir.name));
                fresh.push((dir.name.clone(), scan_index, metadata));
            }
        }

        let mut report = ScanReport::default();

        for publication in self.create_publications(fresh)? {
            report.created_publications += 1;
            report.created_installments += self.sync_installments(&publication.id)?;
            known.insert(publication.name, publication.id);
        }

        report.entries = dirs
            .into_iter()
            .enumerate()
            .filter_map(|(scan_index, dir)| {
                let id = known.get(&dir.name)?.clone();
                Some(ScanEntry {
                    id,
                    name: dir.name,
                    scan_index,
                })
            })
            .collect();

        report.finished_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        info!(
            publications = report.entries.len(),
            created_publications = report.created_publications,
            created_installments = report.created_installments,
            "Library scan complete"
        );

        Ok(report)
    }

    /// Create publication records in one batch and add them to the default
    /// category.
    fn create_publications(
        &mut self,
        fresh: Vec<(String, usize, PublicationMetadata)>,
    ) -> Result<Vec<Publication>> {
        let created = self
            .store
            .insert_many(fresh, |id, (name, scan_index, metadata)| {
                Publication::new(id, name, scan_index, metadata)
            })?;

        for publication in &created {
            debug!(
                id = %publication.id,
                name = %publication.name,
                scan_index = publication.scan_index,
                "Created publication"
            );
        }

        let ids: Vec<PublicationId> = created.iter().map(|p| p.id.clone()).collect();
        self.join_default_category(&ids)?;

        Ok(created)
    }
}

fn read_publication_dirs(root: &Path) -> Result<Vec<PublicationDir>> {
    let unreadable = |source: io::Error| LibraryError::LibraryRoot {
        path: root.to_path_buf(),
        source,
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let metadata = entry.metadata().map_err(unreadable)?;
        if !metadata.is_dir() {
            continue;
        }

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!(name = ?raw, "Skipping publication directory with a non-UTF-8 name");
                continue;
            }
        };

        dirs.push(PublicationDir {
            name,
            path: entry.path(),
            modified: metadata.modified().map_err(unreadable)?,
        });
    }

    Ok(dirs)
}

/// Most recently modified first. Ties keep their listing order.
fn order_by_recency(mut dirs: Vec<PublicationDir>) -> Vec<PublicationDir> {
    dirs.sort_by(|a, b| b.modified.cmp(&a.modified));
    dirs
}
