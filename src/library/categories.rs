//! Category management.
//!
//! Categories are addressed by ordinal in creation order. The default
//! category is created when the library is first opened, so it holds
//! ordinal 0 on any fresh catalog.

use tracing::{debug, info};

use crate::catalog::{Category, CategoryId, Publication, PublicationId, DEFAULT_CATEGORY};
use crate::store::{Document, Filter};

use super::{Library, LibraryError, Result};

impl Library {
    /// All categories in creation order.
    pub fn categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self.store.find_all(&Filter::All)?;
        categories.sort_by_key(|c| c.order);
        Ok(categories)
    }

    /// Get a category by identifier.
    pub fn category(&self, id: &CategoryId) -> Result<Category> {
        self.store
            .get(id)?
            .ok_or_else(|| LibraryError::CategoryNotFound(id.clone()))
    }

    /// Category at `ordinal` in creation order.
    pub fn category_by_ordinal(&self, ordinal: i64) -> Result<Category> {
        let categories = self.categories()?;
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| categories.into_iter().nth(i))
            .ok_or(LibraryError::CategoryOutOfRange(ordinal))
    }

    /// Create a category, or return the existing one with the same name.
    pub fn add_category(&mut self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::InvalidCategoryName(name.to_string()));
        }

        if let Some(existing) = self.store.find_first(&Filter::eq("name", name))? {
            return Ok(existing);
        }

        let order = self.store.count(Category::COLLECTION)?;
        let category = self.store.insert(|id| Category::new(id, name, order))?;

        info!(name = %category.name, order = order, "Created category");
        Ok(category)
    }

    /// Add a publication to a category. Adding a member twice is a no-op.
    pub fn add_to_category(
        &mut self,
        category_id: &CategoryId,
        publication_id: &PublicationId,
    ) -> Result<Category> {
        self.category(category_id)?;
        self.publication(publication_id)?;

        Ok(self.store.update::<Category>(category_id, |category| {
            if category.add(publication_id) {
                debug!(category = %category.name, publication = %publication_id, "Added to category");
            }
        })?)
    }

    /// Members of a category, in the order they were added.
    pub fn publications_in_category(&self, category: &Category) -> Result<Vec<Publication>> {
        category
            .publications
            .iter()
            .map(|id| self.publication(id))
            .collect()
    }

    /// Create the default category if the catalog has none.
    ///
    /// Publications cataloged before it existed all join it.
    pub(super) fn ensure_default_category(&mut self) -> Result<Category> {
        if let Some(existing) = self.store.find_first(&Filter::eq("default", true))? {
            return Ok(existing);
        }

        let members: Vec<PublicationId> = self
            .store
            .find_all::<Publication>(&Filter::All)?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let order = self.store.count(Category::COLLECTION)?;

        let category = self.store.insert(|id| Category {
            default: true,
            publications: members,
            ..Category::new(id, DEFAULT_CATEGORY, order)
        })?;

        info!(members = category.publications.len(), "Created default category");
        Ok(category)
    }

    /// Add newly created publications to the default category.
    pub(super) fn join_default_category(&mut self, publications: &[PublicationId]) -> Result<()> {
        if publications.is_empty() {
            return Ok(());
        }

        let default = self.ensure_default_category()?;
        self.store.update::<Category>(&default.id, |category| {
            for id in publications {
                category.add(id);
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::Fixture;

    fn names(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_default_category_exists_on_open() {
        let fixture = Fixture::new();
        let categories = fixture.library.categories().unwrap();

        assert_eq!(names(&categories), vec![DEFAULT_CATEGORY]);
        assert!(categories[0].default);
        assert_eq!(fixture.library.category_by_ordinal(0).unwrap(), categories[0]);
    }

    #[test]
    fn test_default_category_survives_reopen() {
        let fixture = Fixture::new();
        let before = fixture.library.category_by_ordinal(0).unwrap();

        let fixture = fixture.reopen();
        let categories = fixture.library.categories().unwrap();
        assert_eq!(categories, vec![before]);
    }

    #[test]
    fn test_new_publications_join_default() {
        let mut fixture = Fixture::new();
        fixture.publication_dir("Kaiji");
        fixture.publication_dir("Akagi");

        let report = fixture.library.scan().unwrap();
        let default = fixture.library.category_by_ordinal(0).unwrap();
        assert_eq!(default.publications.len(), 2);
        for entry in &report.entries {
            assert!(default.publications.contains(&entry.id));
        }

        fixture.library.scan().unwrap();
        let default = fixture.library.category_by_ordinal(0).unwrap();
        assert_eq!(default.publications.len(), 2);
    }

    #[test]
    fn test_default_category_adopts_existing_publications() {
        let mut fixture = Fixture::new();
        fixture.publication_dir("Zetman");
        fixture.library.scan().unwrap();

        let default = fixture.library.category_by_ordinal(0).unwrap();
        let emptied = fixture
            .library
            .store
            .update::<Category>(&default.id, |c| c.default = false)
            .unwrap();
        assert!(!emptied.default);

        let created = fixture.library.ensure_default_category().unwrap();
        assert_ne!(created.id, default.id);
        assert_eq!(created.publications, default.publications);
        assert_eq!(created.order, 1);
    }

    #[test]
    fn test_add_category_is_idempotent_by_name() {
        let mut fixture = Fixture::new();

        let reading = fixture.library.add_category("Reading").unwrap();
        let again = fixture.library.add_category("  Reading ").unwrap();
        let done = fixture.library.add_category("Finished").unwrap();

        assert_eq!(again.id, reading.id);
        assert_eq!(reading.order, 1);
        assert_eq!(done.order, 2);
        assert_eq!(
            names(&fixture.library.categories().unwrap()),
            vec![DEFAULT_CATEGORY, "Reading", "Finished"]
        );
        assert_eq!(fixture.library.category_by_ordinal(2).unwrap().id, done.id);
    }

    #[test]
    fn test_blank_category_name_is_rejected() {
        let mut fixture = Fixture::new();
        let err = fixture.library.add_category("   ").unwrap_err();
        assert!(matches!(err, LibraryError::InvalidCategoryName(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_category_ordinal_out_of_range() {
        let fixture = Fixture::new();
        for ordinal in [-1, 1, 40] {
            let err = fixture.library.category_by_ordinal(ordinal).unwrap_err();
            assert!(matches!(err, LibraryError::CategoryOutOfRange(o) if o == ordinal));
        }
    }

    #[test]
    fn test_add_to_category() {
        let mut fixture = Fixture::new();
        fixture.publication_dir("Pluto");
        fixture.publication_dir("Monster");
        let report = fixture.library.scan().unwrap();
        let reading = fixture.library.add_category("Reading").unwrap();

        let second = &report.entries[1].id;
        let first = &report.entries[0].id;
        fixture.library.add_to_category(&reading.id, second).unwrap();
        fixture.library.add_to_category(&reading.id, first).unwrap();
        let updated = fixture.library.add_to_category(&reading.id, second).unwrap();
        assert_eq!(updated.publications, vec![second.clone(), first.clone()]);

        let members = fixture.library.publications_in_category(&updated).unwrap();
        let names: Vec<&str> = members.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec![report.entries[1].name.as_str(), report.entries[0].name.as_str()]);
    }

    #[test]
    fn test_add_unknown_publication_to_category() {
        let mut fixture = Fixture::new();
        let reading = fixture.library.add_category("Reading").unwrap();

        let mut other = Fixture::new();
        other.publication_dir("Elsewhere");
        let stranger = other.library.scan().unwrap().entries[0].id.clone();

        let err = fixture.library.add_to_category(&reading.id, &stranger).unwrap_err();
        assert!(matches!(err, LibraryError::PublicationNotFound(_)));
        assert!(fixture.library.category(&reading.id).unwrap().publications.is_empty());
    }
}
