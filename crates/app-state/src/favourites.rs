//! Favourites (saved catalog items)
//!
//! The store keeps an ordered, key-unique list of favourite items. All list
//! operations are synchronous and total. When a user is attached the list is
//! loaded from, and can be written back to, the key-value store under
//! `favourites:<email>`; without an attached user it only lives in memory.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{get_json, scoped_key, set_json, KeyValueStore, KvError};
use tokio::sync::broadcast;

/// Key scope of persisted favourites
const FAVOURITES_SCOPE: &str = "favourites";

/// A favourited catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavouriteItem {
    /// Catalog identifier (e.g. `/works/OL45883W`)
    pub key: String,
    /// Display title
    pub title: String,
    /// Cover image identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_i: Option<u64>,
}

impl FavouriteItem {
    /// Create a new favourite item
    pub fn new(key: impl Into<String>, title: impl Into<String>, cover_i: Option<u64>) -> Self {
        Self { key: key.into(), title: title.into(), cover_i }
    }
}

/// Events broadcast when favourites change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavouriteEvent {
    /// An item was added
    Added(FavouriteItem),
    /// The item with this key was removed
    Removed(String),
    /// The list was emptied (e.g. on logout)
    Cleared,
    /// A user's list was loaded with this many items
    Loaded(usize),
}

#[derive(Debug, Default)]
struct FavouritesState {
    owner: Option<String>,
    items: Vec<FavouriteItem>,
}

/// Favourites store
pub struct FavouritesStore {
    kv: Arc<dyn KeyValueStore>,
    state: RwLock<FavouritesState>,
    events_tx: broadcast::Sender<FavouriteEvent>,
}

impl FavouritesStore {
    /// Create an empty store with no attached user
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        let (events_tx, _) = broadcast::channel(32);

        Self {
            kv,
            state: RwLock::new(FavouritesState::default()),
            events_tx,
        }
    }

    /// Add an item; no-op if its key is already present
    ///
    /// Returns true if the item was added.
    pub fn add(&self, item: FavouriteItem) -> bool {
        let mut state = self.state.write();
        if state.items.iter().any(|fav| fav.key == item.key) {
            return false;
        }
        state.items.push(item.clone());
        drop(state);

        let _ = self.events_tx.send(FavouriteEvent::Added(item));
        true
    }

    /// Remove the item with `key`; no-op if absent
    ///
    /// Returns true if an item was removed.
    pub fn remove(&self, key: &str) -> bool {
        let mut state = self.state.write();
        let before = state.items.len();
        state.items.retain(|fav| fav.key != key);
        let removed = state.items.len() != before;
        drop(state);

        if removed {
            let _ = self.events_tx.send(FavouriteEvent::Removed(key.to_string()));
        }
        removed
    }

    /// Check if `key` is a favourite
    pub fn is_favourite(&self, key: &str) -> bool {
        self.state.read().items.iter().any(|fav| fav.key == key)
    }

    /// Remove the item if present, otherwise add it
    ///
    /// Returns true if the item is a favourite afterwards.
    pub fn toggle(&self, item: FavouriteItem) -> bool {
        if self.is_favourite(&item.key) {
            self.remove(&item.key);
            false
        } else {
            self.add(item);
            true
        }
    }

    /// Snapshot of all favourites in insertion order
    pub fn list(&self) -> Vec<FavouriteItem> {
        self.state.read().items.clone()
    }

    /// Number of favourites
    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    /// Check if there are no favourites
    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    /// Remove every favourite
    pub fn clear(&self) {
        self.state.write().items.clear();
        let _ = self.events_tx.send(FavouriteEvent::Cleared);
    }

    /// Email of the attached user
    pub fn owner(&self) -> Option<String> {
        self.state.read().owner.clone()
    }

    /// Attach a user and load their persisted favourites
    ///
    /// Unreadable data leaves the user with an empty list.
    pub async fn attach(&self, email: &str) -> usize {
        let key = favourites_key(email);
        let items = match get_json::<Vec<FavouriteItem>, _>(self.kv.as_ref(), &key).await {
            Ok(items) => dedup_by_key(items.unwrap_or_default()),
            Err(KvError::Serialization(e)) => {
                tracing::warn!(email = %email, "Discarding corrupt favourites: {}", e);
                Vec::new()
            }
            Err(e) => {
                tracing::error!(email = %email, "Failed to read favourites: {}", e);
                Vec::new()
            }
        };

        let count = items.len();
        {
            let mut state = self.state.write();
            state.owner = Some(email.to_string());
            state.items = items;
        }

        tracing::debug!(email = %email, count, "loaded favourites");
        let _ = self.events_tx.send(FavouriteEvent::Loaded(count));
        count
    }

    /// Detach the current user and forget their favourites in memory
    pub fn detach(&self) {
        {
            let mut state = self.state.write();
            state.owner = None;
            state.items.clear();
        }
        let _ = self.events_tx.send(FavouriteEvent::Cleared);
    }

    /// Write the current list for the attached user
    ///
    /// Does nothing without an attached user.
    pub async fn persist(&self) -> storage::kv::Result<()> {
        let (owner, items) = {
            let state = self.state.read();
            (state.owner.clone(), state.items.clone())
        };

        match owner {
            Some(email) => set_json(self.kv.as_ref(), &favourites_key(&email), &items).await,
            None => Ok(()),
        }
    }

    /// Subscribe to favourite events
    pub fn subscribe(&self) -> broadcast::Receiver<FavouriteEvent> {
        self.events_tx.subscribe()
    }
}

fn favourites_key(email: &str) -> String {
    scoped_key(&[FAVOURITES_SCOPE, email])
}

fn dedup_by_key(items: Vec<FavouriteItem>) -> Vec<FavouriteItem> {
    let mut unique: Vec<FavouriteItem> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.iter().any(|fav| fav.key == item.key) {
            unique.push(item);
        }
    }
    unique
}
