//! Catalog source trait definition

use crate::model::MediaItem;
use anyhow::Result;

/// Catalog backend the assembly pipeline reads from
///
/// Implemented by the HTTP Plex client; tests swap in an in-memory fake.
/// Sync is required because per-show episode fetches fan out across
/// worker threads.
pub trait CatalogSource: Sync {
    /// All shows in a library, optionally narrowed by a raw query string
    fn shows_in_library(&self, library: &str, query: &str) -> Result<Vec<MediaItem>>;

    /// Every episode of a show, keyed by the show's rating key
    fn episodes_of_show(&self, show_key: &str) -> Result<Vec<MediaItem>>;

    /// All movies in a library, optionally narrowed by a raw query string
    fn movies_in_library(&self, library: &str, query: &str) -> Result<Vec<MediaItem>>;

    /// All collections in a library
    fn collections_in_library(&self, library: &str, query: &str) -> Result<Vec<MediaItem>>;

    /// Movies inside one collection, keyed by the collection's rating key
    fn collection_items(&self, collection_key: &str) -> Result<Vec<MediaItem>>;
}
