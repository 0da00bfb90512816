// Whole-collection serialization

use crate::item::Item;
use eyre::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Serialize the collection as a JSON array, in collection order
pub fn encode(items: &[Item]) -> Result<String> {
    serde_json::to_string(items).context("Failed to serialize item collection")
}

/// Parse a serialized collection
///
/// Records repeating an id already seen are dropped, keeping the first
/// occurrence.
pub fn decode(data: &str) -> Result<Vec<Item>> {
    let parsed: Vec<Item> = serde_json::from_str(data).context("Failed to parse item collection")?;

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(parsed.len());
    for item in parsed {
        if !seen.insert(item.id().to_string()) {
            warn!(id = item.id(), "Dropping item with duplicate id");
            continue;
        }
        items.push(item);
    }

    debug!(count = items.len(), "Decoded item collection");
    Ok(items)
}
