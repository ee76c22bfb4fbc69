//! Plex Shuffler - shuffled playlist generator for Plex
//!
//! This library assembles shuffled playlists from Plex TV and movie
//! libraries and synchronizes them back to the server.

pub mod assemble;
pub mod config;
pub mod model;
pub mod plex;
pub mod query;
pub mod shuffle;
pub mod source;
pub mod sync;

pub use assemble::assemble_playlist;
pub use config::{load_config, validate_config, AppConfig};
pub use plex::PlexClient;
pub use source::CatalogSource;
pub use sync::sync_playlist;
