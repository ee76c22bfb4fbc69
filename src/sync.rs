//! Playlist synchronization against the server

use crate::model::{MediaItem, PlaylistInfo};
use crate::plex::PlexClient;
use anyhow::Result;

/// Server playlist operations the sync flow needs
pub trait PlaylistStore {
    /// Playlists whose title may match, narrowed server-side
    fn find_playlists(&self, title: &str) -> Result<Vec<PlaylistInfo>>;

    /// Create a playlist seeded with the given items
    fn create(&self, title: &str, rating_keys: &[String], kind: &str) -> Result<PlaylistInfo>;

    /// Append items to an existing playlist
    fn append(&self, playlist_key: &str, rating_keys: &[String]) -> Result<()>;

    /// Delete a playlist
    fn delete(&self, playlist_key: &str) -> Result<()>;
}

impl PlaylistStore for PlexClient {
    fn find_playlists(&self, title: &str) -> Result<Vec<PlaylistInfo>> {
        self.get_playlists(Some(title))
    }

    fn create(&self, title: &str, rating_keys: &[String], kind: &str) -> Result<PlaylistInfo> {
        self.create_playlist(title, rating_keys, kind)
    }

    fn append(&self, playlist_key: &str, rating_keys: &[String]) -> Result<()> {
        self.add_playlist_items(playlist_key, rating_keys)
    }

    fn delete(&self, playlist_key: &str) -> Result<()> {
        self.delete_playlist(playlist_key)
    }
}

/// Push an assembled sequence to the server under the given name
///
/// Replace mode deletes any existing playlist with that name first;
/// append mode keeps it and adds the whole sequence to the end. Items
/// are sent in chunks to keep request URLs bounded. Returns None when
/// the sequence is empty and nothing was pushed.
pub fn sync_playlist(
    store: &dyn PlaylistStore,
    name: &str,
    items: &[MediaItem],
    mode: &str,
    chunk_size: i64,
) -> Result<Option<PlaylistInfo>> {
    if items.is_empty() {
        log::warn!("Playlist {name} has no items; skipping");
        return Ok(None);
    }

    let mut existing = find_playlist(store, name)?;
    let mode = normalize_mode(mode);

    if let Some(playlist) = existing.as_ref() {
        if mode == "replace" {
            log::info!("Deleting existing playlist: {name}");
            store.delete(&playlist.rating_key)?;
            existing = None;
        }
    }

    let rating_keys: Vec<String> = items.iter().map(|item| item.rating_key.clone()).collect();
    let chunk_len = if chunk_size > 0 {
        chunk_size as usize
    } else {
        rating_keys.len()
    }
    .max(1);
    let mut chunks = rating_keys.chunks(chunk_len);

    let playlist = if let Some(playlist) = existing {
        log::info!("Appending {} items to existing playlist {name}", items.len());
        playlist
    } else {
        log::info!("Creating playlist {name} with {} items", items.len());
        let first = chunks.next().unwrap_or_default();
        store.create(name, first, "video")?
    };

    for chunk in chunks {
        store.append(&playlist.rating_key, chunk)?;
    }

    Ok(Some(playlist))
}

fn find_playlist(store: &dyn PlaylistStore, name: &str) -> Result<Option<PlaylistInfo>> {
    let playlists = store.find_playlists(name)?;
    let wanted = name.trim().to_lowercase();
    Ok(playlists
        .into_iter()
        .find(|playlist| playlist.title.trim().to_lowercase() == wanted))
}

fn normalize_mode(mode: &str) -> String {
    let trimmed = mode.trim();
    if trimmed.is_empty() {
        "replace".to_string()
    } else {
        trimmed.to_lowercase()
    }
}
