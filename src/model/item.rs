use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Show,
    Episode,
    Movie,
    Collection,
}

impl MediaKind {
    /// Lowercase name as used by the Plex API
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Show => "show",
            MediaKind::Episode => "episode",
            MediaKind::Movie => "movie",
            MediaKind::Collection => "collection",
        }
    }
}

/// Represents a single item from the media catalog
///
/// Which optional fields are populated depends on `kind`: only episodes
/// carry `show_title`/`season`/`episode`, only collection children carry
/// `collection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Plex rating key (unique identifier)
    pub rating_key: String,

    /// Item title
    pub title: String,

    /// What kind of item this is
    pub kind: MediaKind,

    /// Title of the parent show (episodes only)
    pub show_title: Option<String>,

    /// Season index (episodes only)
    pub season: Option<u32>,

    /// Episode index within the season (episodes only)
    pub episode: Option<u32>,

    /// Collection this item belongs to (collection children only)
    pub collection: Option<String>,

    /// Original release date
    pub released: Option<NaiveDate>,

    /// Number of times the item has been watched
    pub view_count: Option<u64>,

    /// Unix timestamp (seconds) of the most recent watch
    pub last_viewed_at: Option<i64>,
}

impl MediaItem {
    /// Create an item with only the fields every kind carries
    pub fn new(rating_key: String, title: String, kind: MediaKind) -> Self {
        Self {
            rating_key,
            title,
            kind,
            show_title: None,
            season: None,
            episode: None,
            collection: None,
            released: None,
            view_count: None,
            last_viewed_at: None,
        }
    }

    /// Human-readable line for console output
    pub fn describe(&self) -> String {
        match self.kind {
            MediaKind::Episode => format!(
                "{} S{:02}E{:02} - {}",
                self.show_title.as_deref().unwrap_or(""),
                self.season.unwrap_or(0),
                self.episode.unwrap_or(0),
                self.title
            ),
            MediaKind::Movie => format!("Movie - {}", self.title),
            _ => self.title.clone(),
        }
    }
}
