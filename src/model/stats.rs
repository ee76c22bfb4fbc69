use serde::{Deserialize, Serialize};

/// Summary counts for one assembled playlist
///
/// Computed once after assembly completes and never mutated afterward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Number of show groups that contributed episodes
    pub shows: usize,

    /// Episodes in the final sequence
    pub episodes: usize,

    /// Movies in the final sequence
    pub movies: usize,

    /// Collections considered after title filtering
    pub collections: usize,

    /// Total length of the final sequence
    pub total_items: usize,
}
