//! Installment synchronization.
//!
//! The authoritative installment list of a publication comes from
//! `chapters.json` when present, otherwise from the `.cbz` archives in its
//! directory. Records are created once per `(publication, name)` and their
//! availability is refreshed from disk on every read.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::archive::{self, ArchiveError, Page, PageArchive, ARCHIVE_EXTENSION};
use crate::catalog::{Installment, InstallmentId, Publication, PublicationId};
use crate::descriptor::{self, InstallmentEntry};
use crate::store::Filter;

use super::{Library, LibraryError, Result, COVER_TOKEN};

impl Library {
    /// Create records for installments not yet in the catalog.
    ///
    /// New records are written in one batch and then appended to the
    /// publication. Records of this publication that it does not reference
    /// (left by an interrupted sync) are appended as well.
    ///
    /// Returns the number of installments created.
    pub fn sync_installments(&mut self, publication_id: &PublicationId) -> Result<usize> {
        let publication = self.publication(publication_id)?;
        let dir = self.publication_dir(&publication);
        let entries = authoritative_installments(&dir)?;

        let known: Vec<Installment> = self
            .store
            .find_all(&Filter::eq("publicationId", publication_id.to_string()))?;
        let mut names: HashSet<String> = known.iter().map(|i| i.name.clone()).collect();

        let unreferenced: Vec<InstallmentId> = known
            .into_iter()
            .filter(|i| !publication.installments.contains(&i.id))
            .map(|i| i.id)
            .collect();

        let fresh: Vec<_> = entries
            .into_iter()
            .enumerate()
            .filter(|(_, entry)| names.insert(entry.title.clone()))
            .map(|(order_index, entry)| {
                let page_count = archive::probe(&archive::archive_path(&dir, &entry.title));
                (order_index, entry, page_count)
            })
            .collect();

        let created = self.store.insert_many(fresh, |id, (order_index, entry, page_count)| {
            let mut installment = Installment {
                id,
                publication_id: publication_id.clone(),
                number: entry.chapter_number.unwrap_or((order_index + 1) as f32),
                scanlator: entry.scanlator.unwrap_or_default(),
                name: entry.title,
                order_index,
                publication_index: publication.scan_index,
                available: false,
                page_count: 0,
                upload_date: entry.date,
            };
            installment.set_page_count(page_count);
            installment
        })?;

        for installment in &created {
            debug!(
                publication = %publication.name,
                installment = %installment.name,
                available = installment.available,
                page_count = installment.page_count,
                "Created installment"
            );
        }

        if !unreferenced.is_empty() {
            warn!(
                publication = %publication.name,
                count = unreferenced.len(),
                "Relinking installments missing from publication"
            );
        }

        let appended: Vec<InstallmentId> = unreferenced
            .into_iter()
            .chain(created.iter().map(|i| i.id.clone()))
            .collect();

        if !appended.is_empty() {
            self.store.update::<Publication>(publication_id, |p| {
                p.installments.extend(appended);
            })?;
        }

        Ok(created.len())
    }

    /// Available installments of a publication, name descending.
    ///
    /// Refreshes availability and page count of every known installment.
    pub fn list_installments(&mut self, publication_id: &PublicationId) -> Result<Vec<Installment>> {
        let publication = self.publication(publication_id)?;

        let mut installments = Vec::with_capacity(publication.installments.len());
        for installment_id in &publication.installments {
            installments.push(self.refresh_installment(&publication, installment_id)?);
        }

        installments.retain(|i| i.available);
        installments.sort_by(|a, b| b.name.cmp(&a.name));

        Ok(installments)
    }

    /// Installment at `ordinal` in creation order.
    pub fn installment_by_ordinal(
        &mut self,
        publication_id: &PublicationId,
        ordinal: i64,
    ) -> Result<Installment> {
        let publication = self.publication(publication_id)?;

        let installment_id = usize::try_from(ordinal)
            .ok()
            .and_then(|i| publication.installments.get(i))
            .ok_or_else(|| LibraryError::InstallmentOutOfRange {
                publication: publication_id.clone(),
                ordinal,
            })?;

        let installment = self.refresh_installment(&publication, installment_id)?;
        if !installment.available {
            return Err(LibraryError::InstallmentUnavailable(installment.name));
        }

        Ok(installment)
    }

    /// Creation-order position of an installment within its publication.
    pub fn installment_ordinal(&self, installment: &Installment) -> Result<Option<usize>> {
        let publication = self.publication(&installment.publication_id)?;
        Ok(publication.installments.iter().position(|id| id == &installment.id))
    }

    /// Bytes of page `page` (0-based) of the installment at
    /// `installment_ordinal`.
    pub fn page(
        &mut self,
        publication_id: &PublicationId,
        installment_ordinal: i64,
        page: i64,
    ) -> Result<Page> {
        let installment = self.installment_by_ordinal(publication_id, installment_ordinal)?;
        let publication = self.publication(publication_id)?;
        let path = archive::archive_path(&self.publication_dir(&publication), &installment.name);

        let mut archive = PageArchive::open(&path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Archive vanished before page read");
            LibraryError::InstallmentUnavailable(installment.name.clone())
        })?;

        let count = archive.page_count();
        let index = usize::try_from(page).map_err(|_| LibraryError::PageOutOfRange { page, count })?;

        archive.read_page(index).map_err(|e| match e {
            ArchiveError::PageOutOfRange { count, .. } => LibraryError::PageOutOfRange { page, count },
            other => LibraryError::Archive(other),
        })
    }

    fn refresh_installment(
        &mut self,
        publication: &Publication,
        installment_id: &InstallmentId,
    ) -> Result<Installment> {
        let dir = self.publication_dir(publication);

        Ok(self.store.update::<Installment>(installment_id, |installment| {
            installment.set_page_count(archive::probe(&archive::archive_path(&dir, &installment.name)));
        })?)
    }
}

/// The installment list a publication should have.
fn authoritative_installments(dir: &Path) -> Result<Vec<InstallmentEntry>> {
    match descriptor::read_installments(dir)? {
        Some(entries) => Ok(entries),
        None => infer_installments(dir),
    }
}

/// Installments inferred from the archives in `dir`, sorted by name.
fn infer_installments(dir: &Path) -> Result<Vec<InstallmentEntry>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(LibraryError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    let suffix = format!(".{}", ARCHIVE_EXTENSION);

    let mut names = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| LibraryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let file_name = entry.file_name().to_string_lossy().into_owned();

        if file_name.starts_with(COVER_TOKEN) {
            continue;
        }
        if let Some(stem) = file_name.strip_suffix(&suffix) {
            names.push(stem.to_string());
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| InstallmentEntry::inferred(name, now))
        .collect())
}
