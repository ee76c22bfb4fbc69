use serde::{Deserialize, Serialize};

/// A Plex library section (e.g. "TV Shows", "Movies")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySection {
    /// Section key used in API paths
    pub key: String,

    /// Section title as shown in Plex
    pub title: String,

    /// Section type ("show", "movie", ...)
    pub section_type: String,
}

/// A playlist as reported by the Plex server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    /// Playlist rating key
    pub rating_key: String,

    /// Playlist title
    pub title: String,

    /// Playlist type ("video", "audio", ...)
    pub playlist_type: String,
}
