//! Ordered snapshot of all fragments of a store.
//!
//! # Invariants
//! - Entries are ordered by sort key, then by public id.
//! - A catalog records the store generation it was taken at; the store
//!   rejects it once a mutation happened.

use crate::model::id::{FragmentId, Source};
use crate::names::{make_sort_key, search_score, SortKey};

/// Marker appended to user fragment names in listings.
pub const USER_MARKER: &str = "  *user*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: FragmentId,
    /// Name as stored.
    pub name: String,
    pub sort_key: SortKey,
}

impl CatalogEntry {
    pub fn new(id: FragmentId, name: impl Into<String>) -> Self {
        let name = name.into();
        let sort_key = make_sort_key(&name, false);
        Self { id, name, sort_key }
    }

    pub fn public_id(&self) -> i64 {
        self.id.to_public()
    }

    pub fn source(&self) -> Source {
        self.id.source()
    }

    /// Name for listings; user fragments carry [`USER_MARKER`].
    pub fn display_name(&self) -> String {
        match self.source() {
            Source::Primary => self.name.clone(),
            Source::User => format!("{}{USER_MARKER}", self.name),
        }
    }
}

/// One ranked search result. Lower scores are better.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub entry: CatalogEntry,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    generation: u64,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub(crate) fn new(generation: u64, mut entries: Vec<CatalogEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.sort_key
                .cmp(&b.sort_key)
                .then_with(|| a.public_id().cmp(&b.public_id()))
        });
        Self {
            generation,
            entries,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: FragmentId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// `(public id, name)` pairs in catalog order.
    pub fn id_name_pairs(&self) -> Vec<(i64, String)> {
        self.entries
            .iter()
            .map(|entry| (entry.public_id(), entry.name.clone()))
            .collect()
    }

    /// The `limit` entries closest to `query`.
    ///
    /// Ties on the score fall back to the locant digits of the name, then
    /// to catalog order.
    pub fn find_by_name(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let mut scored = self
            .entries
            .iter()
            .map(|entry| {
                let (score, digits) = search_score(query, &entry.name);
                (score, digits, entry)
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        scored
            .into_iter()
            .take(limit)
            .map(|(score, _, entry)| SearchHit {
                entry: entry.clone(),
                score,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
