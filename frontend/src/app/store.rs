use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use wxrecordings::{Pass, Selection};

/// Everything the window renders from: the loaded catalog and the active
/// selection. `selection` is `None` only while the catalog is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerState {
    pub catalog: Vec<Pass>,
    pub selection: Option<Selection>,
}

/// State transitions the store accepts.
#[derive(Debug, Clone)]
pub enum Action {
    SetCatalog(Vec<Pass>),
    SetSelection(Selection),
}

/// Pure reducer: applies one action to a state and returns the next state.
pub fn reduce(state: ViewerState, action: Action) -> ViewerState {
    match action {
        Action::SetCatalog(catalog) => ViewerState { catalog, ..state },
        Action::SetSelection(selection) => ViewerState {
            selection: Some(selection),
            ..state
        },
    }
}

/// Shared application state plus the in-memory image cache.
///
/// The cache maps image URLs to raw webp bytes so that prefetched and
/// previously shown images render without another network round trip.
pub struct Store {
    state: ViewerState,
    images: HashMap<String, Vec<u8>>,
    base_url: String,
}

pub type SharedStore = Arc<Mutex<Store>>;

impl Store {
    pub fn new(base_url: &str) -> Self {
        Store {
            state: ViewerState::default(),
            images: HashMap::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dispatch(&mut self, action: Action) {
        self.state = reduce(std::mem::take(&mut self.state), action);
    }

    pub fn cached_image(&self, url: &str) -> Option<&Vec<u8>> {
        self.images.get(url)
    }

    pub fn insert_image(&mut self, url: String, bytes: Vec<u8>) {
        self.images.insert(url, bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wxrecordings::parse_pass_list;

    #[test]
    fn test_set_catalog_keeps_selection() {
        let catalog = parse_pass_list("20230101000000 20230101001500 noaa-19 mcir msa");
        let state = ViewerState {
            catalog: Vec::new(),
            selection: Some(Selection {
                pass: 0,
                enhancement: 1,
            }),
        };

        let next = reduce(state, Action::SetCatalog(catalog.clone()));
        assert_eq!(next.catalog, catalog);
        assert_eq!(
            next.selection,
            Some(Selection {
                pass: 0,
                enhancement: 1
            })
        );
    }

    #[test]
    fn test_set_selection_replaces_selection() {
        let state = ViewerState::default();
        let next = reduce(
            state,
            Action::SetSelection(Selection {
                pass: 2,
                enhancement: 0,
            }),
        );
        assert_eq!(
            next.selection,
            Some(Selection {
                pass: 2,
                enhancement: 0
            })
        );
        assert!(next.catalog.is_empty());
    }

    #[test]
    fn test_store_trims_base_url_and_caches() {
        let mut store = Store::new("http://localhost:8080/");
        assert_eq!(store.base_url(), "http://localhost:8080");

        assert!(store.cached_image("http://localhost:8080/a.webp").is_none());
        store.insert_image("http://localhost:8080/a.webp".to_string(), vec![1, 2, 3]);
        assert_eq!(
            store.cached_image("http://localhost:8080/a.webp"),
            Some(&vec![1, 2, 3])
        );
    }
}
