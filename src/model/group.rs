use super::MediaItem;
use serde::{Deserialize, Serialize};

/// Where a group's items came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupSource {
    Show,
    Movie,
    Collection,
}

/// An ordered cluster of media items
///
/// Items keep their insertion order for the whole build; the shuffle
/// engine only ever consumes from the front of its own working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaGroup {
    /// Group name (show title, collection title or movie title)
    pub name: String,

    /// Items in intended playback order
    pub items: Vec<MediaItem>,

    /// Where the items came from
    pub source: GroupSource,
}

impl MediaGroup {
    /// Create a new group from an already-ordered item list
    pub fn new(name: String, items: Vec<MediaItem>, source: GroupSource) -> Self {
        Self {
            name,
            items,
            source,
        }
    }

    /// Number of items in this group
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the group holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaKind;

    #[test]
    fn test_group_keeps_insertion_order() {
        let items = vec![
            MediaItem::new("1".to_string(), "First".to_string(), MediaKind::Episode),
            MediaItem::new("2".to_string(), "Second".to_string(), MediaKind::Episode),
        ];
        let group = MediaGroup::new("Show".to_string(), items, GroupSource::Show);

        assert_eq!(group.len(), 2);
        assert!(!group.is_empty());
        assert_eq!(group.items[0].rating_key, "1");
        assert_eq!(group.items[1].rating_key, "2");
    }
}
