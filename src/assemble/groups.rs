//! Group construction from catalog listings

use super::filters::{filter_titles, filter_watched, watch_cutoff};
use crate::config::{MovieConfig, TvConfig};
use crate::model::{GroupSource, MediaGroup, MediaItem};
use crate::source::CatalogSource;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;

/// Upper bound on concurrent per-show episode fetches
const MAX_FETCH_WORKERS: usize = 8;

/// Fetch, filter and order the episode group for every show in a library
///
/// Episodes are fetched concurrently on a bounded pool. A failure for
/// one show is logged and that show skipped; group order always follows
/// the show listing order regardless of fetch timing.
pub fn build_show_groups(
    source: &dyn CatalogSource,
    tv: &TvConfig,
    now: NaiveDateTime,
) -> Result<Vec<MediaGroup>> {
    let shows = source.shows_in_library(&tv.library, &tv.query)?;
    let shows = filter_titles(shows, &tv.include_titles, &tv.exclude_titles);
    if shows.is_empty() {
        return Ok(Vec::new());
    }

    let filters = &tv.episode_filters;
    let cutoff = watch_cutoff(now, filters.exclude_watched_days);
    let max_per_show = filters.max_per_show;

    log::info!("Fetching episodes for {} shows", shows.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(shows.len().min(MAX_FETCH_WORKERS))
        .build()
        .context("Failed to build episode fetch pool")?;

    let groups: Vec<Option<MediaGroup>> = pool.install(|| {
        shows
            .par_iter()
            .map(|show| {
                let episodes = match source.episodes_of_show(&show.rating_key) {
                    Ok(episodes) => episodes,
                    Err(error) => {
                        log::warn!("Failed to fetch episodes for {}: {:#}", show.title, error);
                        return None;
                    }
                };
                let mut ordered = filter_watched(episodes, cutoff, filters.unwatched_only);
                ordered.sort_by_cached_key(episode_sort_key);
                if max_per_show > 0 {
                    ordered.truncate(max_per_show as usize);
                }
                if ordered.is_empty() {
                    return None;
                }
                Some(MediaGroup::new(
                    show.title.clone(),
                    ordered,
                    GroupSource::Show,
                ))
            })
            .collect()
    });

    Ok(groups.into_iter().flatten().collect())
}

/// Build movie groups plus the count of collections involved
///
/// With `collections_as_shows` each collection becomes one group, so
/// the shuffle strategies spread collections the way they spread shows.
/// Otherwise every movie is its own group and any strategy degenerates
/// to a flat shuffle of the pool.
pub fn build_movie_groups(
    source: &dyn CatalogSource,
    movies: &MovieConfig,
    now: NaiveDateTime,
) -> Result<(Vec<MediaGroup>, usize)> {
    let cutoff = watch_cutoff(now, movies.filters.exclude_watched_days);
    let unwatched_only = movies.filters.unwatched_only;

    if movies.collections_as_shows {
        let collections = source.collections_in_library(&movies.library, &movies.query)?;
        let collections = filter_titles(
            collections,
            &movies.include_collections,
            &movies.exclude_collections,
        );
        let mut groups = Vec::new();
        for collection in &collections {
            let items = match source.collection_items(&collection.rating_key) {
                Ok(items) => items,
                Err(error) => {
                    log::warn!(
                        "Failed to fetch items for collection {}: {:#}",
                        collection.title,
                        error
                    );
                    continue;
                }
            };
            let mut ordered = filter_watched(items, cutoff, unwatched_only);
            ordered.sort_by_cached_key(movie_sort_key);
            if ordered.is_empty() {
                continue;
            }
            groups.push(MediaGroup::new(
                collection.title.clone(),
                ordered,
                GroupSource::Collection,
            ));
        }
        return Ok((groups, collections.len()));
    }

    let pool = source.movies_in_library(&movies.library, &movies.query)?;
    let groups = filter_watched(pool, cutoff, unwatched_only)
        .into_iter()
        .map(|movie| MediaGroup::new(movie.title.clone(), vec![movie], GroupSource::Movie))
        .collect();
    Ok((groups, 0))
}

fn episode_sort_key(item: &MediaItem) -> (u32, u32, NaiveDate, String) {
    (
        item.season.unwrap_or(0),
        item.episode.unwrap_or(0),
        item.released.unwrap_or(NaiveDate::MIN),
        item.title.clone(),
    )
}

fn movie_sort_key(item: &MediaItem) -> (NaiveDate, String) {
    (item.released.unwrap_or(NaiveDate::MIN), item.title.clone())
}
