// Wish list item store persisted through a key-value backend

use crate::codec;
use crate::item::{IdGenerator, Item};
use crate::kv::KvBackend;
use crate::view::View;
use thiserror::Error;
use tracing::{debug, error, info};

/// Key the serialized collection lives under unless configured otherwise
pub const DEFAULT_KEY: &str = "items";

/// Rejected input to [`ItemStore::add`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("item name cannot be empty")]
    EmptyText,

    #[error("item image cannot be empty")]
    EmptyImage,
}

/// Identifier returned by [`ItemStore::subscribe`]
pub type SubscriptionId = u64;

type Observer = Box<dyn FnMut(&[Item])>;

/// Owns the wish list and writes it back to the backend after every change
///
/// A store only exists once [`ItemStore::load`] has run, so every method
/// operates on a loaded collection.
pub struct ItemStore<B: KvBackend> {
    backend: B,
    key: String,
    items: Vec<Item>,
    ids: IdGenerator,
    synced: bool,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: SubscriptionId,
}

impl<B: KvBackend> ItemStore<B> {
    /// Load the collection stored under [`DEFAULT_KEY`]
    pub fn load(backend: B) -> Self {
        Self::load_with_key(backend, DEFAULT_KEY)
    }

    /// Load the collection stored under `key`
    ///
    /// Read or parse failures are logged and leave the store empty.
    pub fn load_with_key(backend: B, key: &str) -> Self {
        let items = match backend.get(key) {
            Ok(Some(data)) => match codec::decode(&data) {
                Ok(items) => items,
                Err(e) => {
                    error!(key, error = ?e, "Failed to decode stored items, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!(key, "No stored items, starting empty");
                Vec::new()
            }
            Err(e) => {
                error!(key, error = ?e, "Failed to read stored items, starting empty");
                Vec::new()
            }
        };

        info!(key, count = items.len(), "Loaded item store");

        Self {
            backend,
            key: key.to_string(),
            ids: IdGenerator::seeded(&items),
            items,
            synced: true,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// False while the durable copy lags behind memory after a failed write
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new item
    ///
    /// `text` is stored trimmed; `image` is kept as given.
    pub fn add(&mut self, text: &str, image: &str) -> Result<&Item, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        if image.trim().is_empty() {
            return Err(ValidationError::EmptyImage);
        }

        let items = &self.items;
        let id = self.ids.next_id(|candidate| items.iter().any(|i| i.id() == candidate));
        debug!(id = %id, text, "Adding item");

        self.items.push(Item::new(id, text, image));
        self.changed();

        Ok(&self.items[self.items.len() - 1])
    }

    /// Flip `completed`; `None` if no item has `id`
    pub fn toggle_completed(&mut self, id: &str) -> Option<&Item> {
        self.update(id, Item::toggle_completed)
    }

    /// Flip `favorite`; `None` if no item has `id`
    pub fn toggle_favorite(&mut self, id: &str) -> Option<&Item> {
        self.update(id, Item::toggle_favorite)
    }

    /// Remove the item with `id`, returning it
    pub fn remove(&mut self, id: &str) -> Option<Item> {
        let pos = self.position(id)?;
        let removed = self.items.remove(pos);
        debug!(id, "Removed item");

        self.changed();
        Some(removed)
    }

    fn update(&mut self, id: &str, apply: impl FnOnce(&mut Item)) -> Option<&Item> {
        let pos = self.position(id)?;
        apply(&mut self.items[pos]);
        debug!(id, "Updated item");

        self.changed();
        Some(&self.items[pos])
    }

    fn position(&self, id: &str) -> Option<usize> {
        let pos = self.items.iter().position(|i| i.id() == id);
        if pos.is_none() {
            debug!(id, "No item with id, ignoring");
        }
        pos
    }

    fn changed(&mut self) {
        self.persist();
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.items);
        }
    }

    fn persist(&mut self) {
        let result = codec::encode(&self.items).and_then(|data| self.backend.set(&self.key, &data));
        match result {
            Ok(()) => {
                self.synced = true;
            }
            Err(e) => {
                self.synced = false;
                error!(key = %self.key, error = ?e, "Failed to persist items");
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whole collection in creation order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn view(&self, view: View) -> Vec<&Item> {
        view.apply(&self.items)
    }

    pub fn favorites(&self) -> Vec<&Item> {
        self.view(View::Favorites)
    }

    pub fn pending(&self) -> Vec<&Item> {
        self.view(View::Pending)
    }

    pub fn fulfilled(&self) -> Vec<&Item> {
        self.view(View::Fulfilled)
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Call `observer` with the new collection after every change
    pub fn subscribe(&mut self, observer: impl FnMut(&[Item]) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns `true` if the subscription existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryBackend;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn loaded(items: &[Item]) -> ItemStore<MemoryBackend> {
        let data = codec::encode(items).unwrap();
        ItemStore::load(MemoryBackend::with_value(DEFAULT_KEY, &data))
    }

    fn ids(items: Vec<&Item>) -> Vec<String> {
        items.into_iter().map(|i| i.id().to_string()).collect()
    }

    #[test]
    fn test_load_absent_key_is_empty() {
        let store = ItemStore::load(MemoryBackend::new());

        assert!(store.is_empty());
        assert!(store.is_synced());
        assert!(store.backend().writes().is_empty());
    }

    #[test]
    fn test_load_existing_collection() {
        let items = vec![Item::new("1", "Bike", "uri-1"), Item::new("2", "Book", "uri-2").with_favorite(true)];
        let store = loaded(&items);

        assert_eq!(store.items(), items.as_slice());
    }

    #[test]
    fn test_load_read_failure_falls_back_to_empty() {
        let mut backend = MemoryBackend::with_value(DEFAULT_KEY, "[]");
        backend.set_fail_reads(true);

        let store = ItemStore::load(backend);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_data_falls_back_to_empty() {
        let store = ItemStore::load(MemoryBackend::with_value(DEFAULT_KEY, "{corrupt"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_with_custom_key() {
        let data = codec::encode(&[Item::new("1", "Bike", "uri")]).unwrap();
        let store = ItemStore::load_with_key(MemoryBackend::with_value("wishes", &data), "wishes");

        assert_eq!(store.key(), "wishes");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_appends_with_defaults() {
        let mut store = ItemStore::load(MemoryBackend::new());

        let item = store.add("  New bike  ", "file:///bike.jpg").unwrap().clone();
        assert_eq!(item.text(), "New bike");
        assert_eq!(item.image(), "file:///bike.jpg");
        assert!(!item.completed());
        assert!(!item.favorite());

        store.add("Camera", "file:///camera.jpg").unwrap();
        assert_eq!(store.items()[0], item);
        assert_eq!(store.items()[1].text(), "Camera");
    }

    #[test]
    fn test_add_validation() {
        let mut store = loaded(&[Item::new("1", "Bike", "uri")]);

        assert_eq!(store.add("", "uri").unwrap_err(), ValidationError::EmptyText);
        assert_eq!(store.add("  ", "uri").unwrap_err(), ValidationError::EmptyText);
        assert_eq!(store.add("name", "").unwrap_err(), ValidationError::EmptyImage);
        assert_eq!(store.add("name", "   ").unwrap_err(), ValidationError::EmptyImage);

        assert_eq!(store.len(), 1);
        assert!(store.backend().writes().is_empty());
    }

    #[test]
    fn test_add_ids_unique() {
        let mut store = loaded(&[Item::new("legacy", "Old", "uri")]);

        for n in 0..200 {
            store.add(&format!("Wish {}", n), "uri").unwrap();
        }

        let unique: HashSet<&str> = store.items().iter().map(Item::id).collect();
        assert_eq!(unique.len(), store.len());
    }

    #[test]
    fn test_add_after_loading_max_numeric_id() {
        let huge = i64::MAX.to_string();
        let mut store = loaded(&[Item::new(huge.as_str(), "Huge", "uri")]);

        let id = store.add("Bike", "uri").unwrap().id().to_string();
        assert_ne!(id, huge);
        store.add("Book", "uri").unwrap();

        let unique: HashSet<&str> = store.items().iter().map(Item::id).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_double_toggle_completed_restores() {
        let original = Item::new("1", "Bike", "uri").with_favorite(true);
        let mut store = loaded(&[original.clone()]);

        assert!(store.toggle_completed("1").unwrap().completed());
        assert!(!store.toggle_completed("1").unwrap().completed());
        assert_eq!(store.get("1").unwrap(), &original);
    }

    #[test]
    fn test_toggle_favorite() {
        let mut store = loaded(&[Item::new("1", "Bike", "uri"), Item::new("2", "Book", "uri")]);

        let item = store.toggle_favorite("2").unwrap();
        assert!(item.favorite());
        assert!(!item.completed());
        assert!(!store.get("1").unwrap().favorite());
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let items = vec![Item::new("1", "Bike", "uri")];
        let mut store = loaded(&items);

        assert!(store.toggle_completed("missing").is_none());
        assert!(store.toggle_favorite("missing").is_none());
        assert_eq!(store.items(), items.as_slice());
        assert!(store.backend().writes().is_empty());
    }

    #[test]
    fn test_remove_preserves_order() {
        let a = Item::new("a", "A", "uri");
        let b = Item::new("b", "B", "uri");
        let c = Item::new("c", "C", "uri").with_completed(true);
        let mut store = loaded(&[a.clone(), b.clone(), c.clone()]);

        assert!(store.remove("unknown").is_none());
        assert_eq!(store.items(), &[a.clone(), b.clone(), c.clone()]);

        assert_eq!(store.remove("b"), Some(b));
        assert_eq!(store.items(), &[a, c.clone()]);

        // Completed items are removable at the store level
        assert_eq!(store.remove("c"), Some(c));
    }

    #[test]
    fn test_views() {
        let store = loaded(&[
            Item::new("a", "A", "uri").with_favorite(true),
            Item::new("b", "B", "uri").with_completed(true),
            Item::new("c", "C", "uri").with_completed(true).with_favorite(true),
        ]);

        assert_eq!(ids(store.favorites()), vec!["a", "c"]);
        assert_eq!(ids(store.pending()), vec!["a"]);
        assert_eq!(ids(store.fulfilled()), vec!["b", "c"]);
        assert_eq!(ids(store.view(View::All)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_one_write_per_mutation_with_full_collection() {
        let mut store = ItemStore::load(MemoryBackend::new());

        let id = store.add("Bike", "uri").unwrap().id().to_string();
        store.add("Book", "uri").unwrap();
        store.toggle_completed(&id);
        store.toggle_favorite(&id);
        store.remove(&id);

        let writes = store.backend().writes();
        assert_eq!(writes.len(), 5);
        assert!(writes.iter().all(|(key, _)| key == DEFAULT_KEY));

        let after_add: Vec<Item> = codec::decode(&writes[1].1).unwrap();
        assert_eq!(after_add.len(), 2);

        let after_toggle: Vec<Item> = codec::decode(&writes[2].1).unwrap();
        assert!(after_toggle[0].completed());

        let last: Vec<Item> = codec::decode(&writes[4].1).unwrap();
        assert_eq!(last, store.items());
    }

    #[test]
    fn test_persist_failure_keeps_memory_state() {
        let mut store = ItemStore::load(MemoryBackend::new());
        store.backend_mut().set_fail_writes(true);

        store.add("Bike", "uri").unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.is_synced());
        assert!(store.backend().value(DEFAULT_KEY).is_none());

        // Next mutation retries the full write
        store.backend_mut().set_fail_writes(false);
        store.add("Book", "uri").unwrap();
        assert!(store.is_synced());

        let stored = codec::decode(store.backend().value(DEFAULT_KEY).unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_reload_round_trip() {
        let mut store = ItemStore::load(MemoryBackend::new());
        let id = store.add("Bike", "uri").unwrap().id().to_string();
        store.add("Book", "uri").unwrap();
        store.toggle_favorite(&id);

        let expected = store.items().to_vec();
        let reloaded = ItemStore::load(store.into_backend());
        assert_eq!(reloaded.items(), expected.as_slice());
    }

    #[test]
    fn test_observers_receive_snapshots() {
        let mut store = ItemStore::load(MemoryBackend::new());
        let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |items| sink.borrow_mut().push(items.len()));

        let id = store.add("Bike", "uri").unwrap().id().to_string();
        store.add("Book", "uri").unwrap();
        store.toggle_completed("missing");
        store.remove(&id);
        assert_eq!(*seen.borrow(), vec![1, 2, 1]);

        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.add("Camera", "uri").unwrap();
        assert_eq!(*seen.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn test_observers_notified_when_persist_fails() {
        let mut store = ItemStore::load(MemoryBackend::new());
        store.backend_mut().set_fail_writes(true);

        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        store.subscribe(move |_| *sink.borrow_mut() += 1);

        store.add("Bike", "uri").unwrap();
        assert_eq!(*count.borrow(), 1);
    }
}
