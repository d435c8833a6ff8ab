use std::collections::HashMap;
use std::sync::Mutex;

use crate::actions::ListingNotifier;
use crate::models::InvoiceRow;

/// One fetched page of the invoice listing, together with the page count
/// for its query.
#[derive(Debug, Clone)]
pub struct Listing {
    pub rows: Vec<InvoiceRow>,
    pub total_pages: u32,
}

/// The parameters a listing page was fetched under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub query: String,
    pub page: u32,
}

/// In-process cache of listing pages. A successful mutation discards the
/// whole cache; the next read recomputes from the database.
#[derive(Default)]
pub struct ListingCache {
    entries: Mutex<HashMap<ListingKey, Listing>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ListingKey) -> Option<Listing> {
        let hit = self.entries.lock().unwrap().get(key).cloned();
        tracing::debug!(query = %key.query, page = key.page, hit = hit.is_some(), "listing cache read");
        hit
    }

    pub fn put(&self, key: ListingKey, listing: Listing) {
        self.entries.lock().unwrap().insert(key, listing);
    }
}

impl ListingNotifier for ListingCache {
    fn listing_changed(&self) {
        self.entries.lock().unwrap().clear();
        tracing::debug!("listing cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(query: &str, page: u32) -> ListingKey {
        ListingKey {
            query: query.to_string(),
            page,
        }
    }

    fn empty_listing() -> Listing {
        Listing {
            rows: Vec::new(),
            total_pages: 1,
        }
    }

    #[test]
    fn entries_are_keyed_by_query_and_page() {
        let cache = ListingCache::new();
        cache.put(key("ace", 1), empty_listing());

        assert!(cache.get(&key("ace", 1)).is_some());
        assert!(cache.get(&key("ace", 2)).is_none());
        assert!(cache.get(&key("", 1)).is_none());
    }

    #[test]
    fn listing_changed_discards_everything() {
        let cache = ListingCache::new();
        cache.put(key("", 1), empty_listing());
        cache.put(key("ace", 2), empty_listing());

        cache.listing_changed();

        assert!(cache.get(&key("", 1)).is_none());
        assert!(cache.get(&key("ace", 2)).is_none());
    }
}
