// Detail page for a single item

use crate::item::Item;
use std::fmt;

/// What the detail page shows for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetail {
    pub title: String,
    pub image: String,
    pub completed: bool,
    pub headline: &'static str,
    pub description: String,
}

impl From<&Item> for ItemDetail {
    fn from(item: &Item) -> Self {
        let (headline, description) = if item.completed() {
            (
                "Wish fulfilled!",
                format!("Congratulations! \"{}\" has come true.", item.text()),
            )
        } else {
            (
                "About this wish",
                format!(
                    "\"{}\" is something you wish for. Mark it as fulfilled once it comes true.",
                    item.text()
                ),
            )
        };

        Self {
            title: item.text().to_string(),
            image: item.image().to_string(),
            completed: item.completed(),
            headline,
            description,
        }
    }
}

impl fmt::Display for ItemDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "Image: {}", self.image)?;
        writeln!(f)?;
        writeln!(f, "{}", self.headline)?;
        write!(f, "{}", self.description)
    }
}
