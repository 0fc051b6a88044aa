//! services/app/src/state/library.rs
//!
//! List-side document state. The library view delegates search/status/sort
//! to the server via `DocumentQuery` and trusts the filtered result; the
//! favorites view holds a full, unfiltered list and filters locally by
//! favorite membership and title. Deletion is optimistic at the card level:
//! the document leaves the in-memory list only after the server confirms.

use std::collections::BTreeSet;

use doclens_core::domain::{filter_by_title, Document, DocumentQuery};
use doclens_core::ports::{PortError, PortResult};

/// State behind the library (full listing) page.
pub struct LibraryState {
    pub documents: Vec<Document>,
    pub query: DocumentQuery,
    pub loading: bool,
    /// Bumped on every load; completions carrying an older generation are
    /// stale and discarded.
    generation: u64,
}

impl LibraryState {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            query: DocumentQuery::default(),
            loading: false,
            generation: 0,
        }
    }

    /// Marks a load as started and returns the generation tag the
    /// completion must echo.
    pub fn begin_load(&mut self) -> u64 {
        self.loading = true;
        self.generation += 1;
        self.generation
    }

    /// Applies a completed list fetch. Returns the error for surfacing when
    /// the fetch failed; stale completions are dropped silently.
    pub fn finish_load(
        &mut self,
        generation: u64,
        result: PortResult<Vec<Document>>,
    ) -> Option<PortError> {
        if generation != self.generation {
            return None;
        }
        self.loading = false;
        match result {
            Ok(documents) => {
                self.documents = documents;
                None
            }
            Err(error) => Some(error),
        }
    }

    /// Removes a confirmed-deleted document from the held list.
    pub fn apply_delete(&mut self, document_id: i64) {
        self.documents.retain(|doc| doc.id != document_id);
    }
}

impl Default for LibraryState {
    fn default() -> Self {
        Self::new()
    }
}

/// State behind the favorites page: an unfiltered listing narrowed locally.
pub struct FavoritesViewState {
    pub documents: Vec<Document>,
    pub search: String,
    pub loading: bool,
    generation: u64,
}

impl FavoritesViewState {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            search: String::new(),
            loading: false,
            generation: 0,
        }
    }

    pub fn begin_load(&mut self) -> u64 {
        self.loading = true;
        self.generation += 1;
        self.generation
    }

    pub fn finish_load(&mut self, generation: u64, result: PortResult<Vec<Document>>) {
        if generation != self.generation {
            return;
        }
        self.loading = false;
        // A failed fetch is non-fatal here; the previous list stays.
        if let Ok(documents) = result {
            self.documents = documents;
        }
    }

    /// Case-insensitive title search over the documents marked favorite.
    pub fn visible(&self, favorites: &BTreeSet<i64>) -> Vec<&Document> {
        filter_by_title(&self.documents, &self.search)
            .into_iter()
            .filter(|doc| favorites.contains(&doc.id))
            .collect()
    }

    pub fn apply_delete(&mut self, document_id: i64) {
        self.documents.retain(|doc| doc.id != document_id);
    }
}

impl Default for FavoritesViewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use doclens_core::domain::DocumentStatus;

    fn doc(id: i64, title: &str) -> Document {
        Document {
            id,
            title: title.to_string(),
            filename: format!("{id}.pdf"),
            status: DocumentStatus::Completed,
            created_at: Utc::now(),
            page_count: None,
            author: None,
            summary_short: None,
        }
    }

    #[test]
    fn stale_list_completion_is_dropped() {
        let mut library = LibraryState::new();
        let first = library.begin_load();
        let second = library.begin_load();

        assert!(library
            .finish_load(first, Ok(vec![doc(1, "stale")]))
            .is_none());
        assert!(library.documents.is_empty());
        assert!(library.loading);

        library.finish_load(second, Ok(vec![doc(2, "fresh")]));
        assert_eq!(library.documents.len(), 1);
        assert_eq!(library.documents[0].id, 2);
        assert!(!library.loading);
    }

    #[test]
    fn failed_load_keeps_previous_documents() {
        let mut library = LibraryState::new();
        let generation = library.begin_load();
        library.finish_load(generation, Ok(vec![doc(1, "kept")]));

        let generation = library.begin_load();
        let error = library.finish_load(
            generation,
            Err(PortError::Unexpected("boom".into())),
        );
        assert!(error.is_some());
        assert_eq!(library.documents.len(), 1);
    }

    #[test]
    fn delete_is_applied_only_to_the_target() {
        let mut library = LibraryState::new();
        let generation = library.begin_load();
        library.finish_load(generation, Ok(vec![doc(1, "a"), doc(2, "b")]));

        library.apply_delete(1);
        assert_eq!(library.documents.len(), 1);
        assert_eq!(library.documents[0].id, 2);
    }

    #[test]
    fn favorites_view_filters_by_membership_then_title() {
        let mut view = FavoritesViewState::new();
        let generation = view.begin_load();
        view.finish_load(
            generation,
            Ok(vec![doc(1, "Report A"), doc(2, "report b"), doc(3, "Notes")]),
        );

        let favorites = BTreeSet::from([1, 3]);
        let all = view.visible(&favorites);
        assert_eq!(all.len(), 2);

        view.search = "REPORT".to_string();
        let searched = view.visible(&favorites);
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].id, 1);
    }
}
