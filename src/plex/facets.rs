//! Facet value caching for query builder option lists
//!
//! Option lists (genres, studios, collections and so on) change rarely
//! and are slow to fetch, so results are held in memory per section and
//! facet for the life of the process.

use super::client::PlexClient;
use crate::query::normalize_facet_source;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// In-memory cache of facet option values keyed by (section, facet)
#[derive(Debug, Default)]
pub struct FacetCache {
    entries: Mutex<HashMap<(String, String), Vec<String>>>,
}

impl FacetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached values for a section facet, when already fetched
    pub fn get(&self, section_key: &str, facet: &str) -> Option<Vec<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(section_key.to_string(), facet.to_string()))
            .cloned()
    }

    /// Store values for a section facet, replacing any previous entry
    pub fn store(&self, section_key: &str, facet: &str, values: Vec<String>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert((section_key.to_string(), facet.to_string()), values);
    }
}

/// Fetch facet option values through the cache
///
/// The facet name is normalized against the supported sources first, so
/// `Genre` and `genre` share one cache entry.
pub fn cached_filter_options(
    cache: &FacetCache,
    client: &PlexClient,
    section_key: &str,
    facet: &str,
    media_type: Option<&str>,
) -> Result<Vec<String>> {
    let source =
        normalize_facet_source(facet).ok_or_else(|| anyhow!("Unsupported filter facet: {facet}"))?;
    if let Some(values) = cache.get(section_key, source) {
        return Ok(values);
    }
    let values = client.get_filter_options(section_key, source, media_type)?;
    cache.store(section_key, source, values.clone());
    Ok(values)
}

/// Trim, de-duplicate and case-insensitively sort option values
pub fn normalize_values(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();
    for value in values {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.clone()) {
            normalized.push(trimmed);
        }
    }
    normalized.sort_by_key(|value| value.to_lowercase());
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlexConfig;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_normalize_trims_dedupes_and_sorts() {
        let values = strings(&["  Drama ", "action", "", "Drama", "Comedy", "   "]);
        assert_eq!(normalize_values(values), strings(&["action", "Comedy", "Drama"]));
    }

    #[test]
    fn test_cache_round_trip() {
        let cache = FacetCache::new();
        assert_eq!(cache.get("1", "genre"), None);

        cache.store("1", "genre", strings(&["Drama"]));
        assert_eq!(cache.get("1", "genre"), Some(strings(&["Drama"])));
        assert_eq!(cache.get("2", "genre"), None);
        assert_eq!(cache.get("1", "studio"), None);

        cache.store("1", "genre", strings(&["Action"]));
        assert_eq!(cache.get("1", "genre"), Some(strings(&["Action"])));
    }

    #[test]
    fn test_cached_hit_skips_the_network() {
        let cache = FacetCache::new();
        cache.store("1", "genre", strings(&["Drama"]));

        // The client points at the default local URL; a hit must return
        // before any request is attempted.
        let client = PlexClient::new(&PlexConfig::default());
        let values = cached_filter_options(&cache, &client, "1", "Genre", None).unwrap();
        assert_eq!(values, strings(&["Drama"]));
    }

    #[test]
    fn test_unknown_facet_is_rejected() {
        let cache = FacetCache::new();
        let client = PlexClient::new(&PlexConfig::default());
        let error = cached_filter_options(&cache, &client, "1", "bogus", None).unwrap_err();
        assert!(error.to_string().contains("Unsupported filter facet"));
    }
}
