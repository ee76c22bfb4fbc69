//! Playlist assembly pipeline
//!
//! Turns catalog listings into the final ordered item sequence: fetch
//! and group, filter by title and watch state, shuffle, interleave
//! movies, truncate.

mod filters;
mod groups;
mod pipeline;

pub use filters::{filter_titles, filter_watched, watch_cutoff};
pub use groups::{build_movie_groups, build_show_groups};
pub use pipeline::assemble_playlist;
