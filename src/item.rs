// Wish list item model and id generation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// One wish list entry
///
/// `id`, `text` and `image` are fixed at creation; only the two flags change
/// afterwards, through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: String,
    text: String,
    image: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    favorite: bool,
}

impl Item {
    /// Build an item with both flags cleared
    pub fn new(id: impl Into<String>, text: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            image: image.into(),
            completed: false,
            favorite: false,
        }
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// URI of the item's picture
    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn favorite(&self) -> bool {
        self.favorite
    }

    /// Creation time, when the id is a millisecond timestamp
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let ms: i64 = self.id.parse().ok()?;
        DateTime::from_timestamp_millis(ms)
    }

    pub(crate) fn toggle_completed(&mut self) {
        self.completed = !self.completed;
    }

    pub(crate) fn toggle_favorite(&mut self) {
        self.favorite = !self.favorite;
    }
}

/// Issues timestamp ids that never repeat within a process run
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    /// Seed from existing items so new ids sort after every numeric id already stored
    ///
    /// Only ids that are valid millisecond timestamps count; anything larger
    /// is treated as an opaque string.
    pub fn seeded(items: &[Item]) -> Self {
        let last = items
            .iter()
            .filter_map(|i| i.id.parse::<i64>().ok())
            .filter(|ms| DateTime::from_timestamp_millis(*ms).is_some())
            .max()
            .unwrap_or(0);
        Self { last }
    }

    /// Next id, skipping anything `taken` reports as already in use
    pub fn next_id(&mut self, taken: impl Fn(&str) -> bool) -> String {
        let mut candidate = now_ms().max(self.last.saturating_add(1));
        while taken(&candidate.to_string()) {
            match candidate.checked_add(1) {
                Some(next) => candidate = next,
                None => return Self::suffixed(candidate, taken),
            }
        }
        self.last = candidate;
        candidate.to_string()
    }

    // Numeric space exhausted: `<max>-<n>` for the first free n
    fn suffixed(base: i64, taken: impl Fn(&str) -> bool) -> String {
        (1u64..)
            .map(|n| format!("{}-{}", base, n))
            .find(|id| !taken(id))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    millis_since_epoch(SystemTime::now())
}

/// Milliseconds between the epoch and `time`
///
/// A time before the epoch gives 0 and one past `i64::MAX` milliseconds
/// saturates; both are logged.
pub fn millis_since_epoch(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or_else(|_| {
            warn!(millis = %d.as_millis(), "Clock beyond i64 milliseconds, saturating");
            i64::MAX
        }),
        Err(e) => {
            warn!(error = %e, "Clock set before the Unix epoch, using 0");
            0
        }
    }
}
