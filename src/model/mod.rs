//! Unified data model for media items and groupings
//!
//! This module defines data structures that are independent of
//! both the Plex wire format and the assembly pipeline.

mod group;
mod item;
mod section;
mod stats;

pub use group::{GroupSource, MediaGroup};
pub use item::{MediaItem, MediaKind};
pub use section::{LibrarySection, PlaylistInfo};
pub use stats::BuildStats;
