//! Ordinal addressing of publications.
//!
//! A [`CatalogSnapshot`] maps externally visible ordinals to publication
//! identifiers. It is built from scan reports and owned by the caller, who
//! decides when to refresh it. Identifiers are appended the first time they
//! are seen and never removed, so an ordinal keeps pointing at the same
//! publication for the life of the snapshot even if its directory goes away.

use std::collections::HashSet;

use crate::catalog::PublicationId;

use super::{LibraryError, Result, ScanReport};

#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    ids: Vec<PublicationId>,
    seen: HashSet<PublicationId>,
    last_scan: Option<u64>,
}

impl CatalogSnapshot {
    /// Append publications not yet in the snapshot, in scan order.
    ///
    /// Returns the number of identifiers added.
    pub fn absorb(&mut self, report: &ScanReport) -> usize {
        let before = self.ids.len();
        for entry in &report.entries {
            if self.seen.insert(entry.id.clone()) {
                self.ids.push(entry.id.clone());
            }
        }
        self.last_scan = Some(report.finished_at);
        self.ids.len() - before
    }

    /// Identifier at `ordinal`.
    pub fn resolve(&self, ordinal: i64) -> Result<&PublicationId> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| self.ids.get(i))
            .ok_or(LibraryError::PublicationOutOfRange(ordinal))
    }

    /// Ordinal of a known identifier.
    pub fn ordinal_of(&self, id: &PublicationId) -> Option<usize> {
        self.ids.iter().position(|known| known == id)
    }

    pub fn ids(&self) -> &[PublicationId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Finish time of the last absorbed scan (Unix epoch seconds).
    pub fn last_scan(&self) -> Option<u64> {
        self.last_scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::Fixture;
    use std::fs;

    fn snapshot_of(report: &ScanReport) -> CatalogSnapshot {
        let mut snapshot = CatalogSnapshot::default();
        snapshot.absorb(report);
        snapshot
    }

    #[test]
    fn test_resolve_range() {
        let mut fixture = Fixture::new();
        fixture.publication_dir("One");
        fixture.publication_dir("Two");

        let report = fixture.library.scan().unwrap();
        let snapshot = snapshot_of(&report);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.resolve(0).unwrap(), &report.entries[0].id);
        assert_eq!(snapshot.resolve(1).unwrap(), &report.entries[1].id);
        assert!(matches!(
            snapshot.resolve(2),
            Err(LibraryError::PublicationOutOfRange(2))
        ));
        assert!(matches!(
            snapshot.resolve(-1),
            Err(LibraryError::PublicationOutOfRange(-1))
        ));
        assert_eq!(snapshot.ordinal_of(&report.entries[1].id), Some(1));
        assert_eq!(snapshot.last_scan(), Some(report.finished_at));
    }

    #[test]
    fn test_identical_scans_give_identical_mapping() {
        let mut fixture = Fixture::new();
        for name in ["A", "B", "C"] {
            fixture.publication_dir(name);
        }

        let first = snapshot_of(&fixture.library.scan().unwrap());
        let second = snapshot_of(&fixture.library.scan().unwrap());
        assert_eq!(first.ids(), second.ids());

        let mut absorbed = first.clone();
        assert_eq!(absorbed.absorb(&fixture.library.scan().unwrap()), 0);
        assert_eq!(absorbed.ids(), first.ids());
    }

    #[test]
    fn test_ids_are_never_removed() {
        let mut fixture = Fixture::new();
        let doomed = fixture.publication_dir("Doomed");
        fixture.publication_dir("Stays");

        let mut snapshot = snapshot_of(&fixture.library.scan().unwrap());
        let before = snapshot.ids().to_vec();

        fs::remove_dir_all(doomed).unwrap();
        fixture.publication_dir("Arrives");
        let added = snapshot.absorb(&fixture.library.scan().unwrap());

        assert_eq!(added, 1);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(&snapshot.ids()[..2], &before[..]);
        let arrived = fixture.library.find_publication("Arrives").unwrap().unwrap();
        assert_eq!(snapshot.ordinal_of(&arrived.id), Some(2));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CatalogSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(snapshot.last_scan().is_none());
        assert!(snapshot.resolve(0).is_err());
    }
}
