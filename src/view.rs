// Derived views over the item collection

use crate::item::Item;
use std::str::FromStr;

/// Read-only projection of the collection
///
/// Favorites overlaps both `Pending` and `Fulfilled`; the views are not a
/// partition of the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    All,
    Favorites,
    Pending,   // completed == false
    Fulfilled, // completed == true
}

impl View {
    pub fn matches(self, item: &Item) -> bool {
        match self {
            View::All => true,
            View::Favorites => item.favorite(),
            View::Pending => !item.completed(),
            View::Fulfilled => item.completed(),
        }
    }

    /// Items of `items` in this view, in collection order
    pub fn apply(self, items: &[Item]) -> Vec<&Item> {
        items.iter().filter(|item| self.matches(item)).collect()
    }

    /// Section heading used when rendering the view
    pub fn title(self) -> &'static str {
        match self {
            View::All => "All wishes",
            View::Favorites => "Favorites",
            View::Pending => "Not yet fulfilled",
            View::Fulfilled => "Fulfilled",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::All => write!(f, "all"),
            View::Favorites => write!(f, "favorites"),
            View::Pending => write!(f, "pending"),
            View::Fulfilled => write!(f, "fulfilled"),
        }
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(View::All),
            "favorites" | "favorite" => Ok(View::Favorites),
            "pending" => Ok(View::Pending),
            "fulfilled" | "completed" => Ok(View::Fulfilled),
            other => Err(format!(
                "unknown view: {} (expected all, favorites, pending or fulfilled)",
                other
            )),
        }
    }
}
