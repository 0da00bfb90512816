// WishStore - Personal wish list persisted through a key-value backend

pub mod codec;
pub mod config;
pub mod detail;
pub mod file;
pub mod item;
pub mod kv;
pub mod sqlite;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use config::{BackendKind, Config};
pub use detail::ItemDetail;
pub use file::FileBackend;
pub use item::{Item, now_ms};
pub use kv::{KvBackend, MemoryBackend};
pub use sqlite::SqliteBackend;
pub use store::{DEFAULT_KEY, ItemStore, SubscriptionId, ValidationError};
pub use view::View;
