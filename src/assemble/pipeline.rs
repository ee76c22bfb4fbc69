//! Full assembly of one playlist's item sequence

use super::groups::{build_movie_groups, build_show_groups};
use crate::config::PlaylistConfig;
use crate::model::{BuildStats, MediaItem, MediaKind};
use crate::shuffle::{interleave_movies, make_rng, shuffle_groups, SeedMode, Strategy};
use crate::source::CatalogSource;
use anyhow::Result;
use chrono::NaiveDateTime;

/// Assemble the final ordered sequence for one configured playlist
///
/// The TV and movie sides are shuffled independently, each with its own
/// seed and strategy, then merged at the configured cadence. The item
/// limit applies last, so counts in the returned stats always describe
/// what actually lands in the playlist.
pub fn assemble_playlist(
    source: &dyn CatalogSource,
    playlist: &PlaylistConfig,
    now: NaiveDateTime,
) -> Result<(Vec<MediaItem>, BuildStats)> {
    let tv_groups = build_show_groups(source, &playlist.tv, now)?;
    let show_count = tv_groups.len();
    log::debug!("Built {} show groups", show_count);

    let order = &playlist.tv.order;
    let mut rng = make_rng(&SeedMode::from_config(&order.seed), now);
    let mut items = shuffle_groups(
        &tv_groups,
        &mut rng,
        Strategy::from_name(&order.strategy),
        order.chunk_size,
    );

    let mut collections_count = 0;
    if playlist.movies.enabled {
        let (movie_groups, collections) = build_movie_groups(source, &playlist.movies, now)?;
        collections_count = collections;
        log::debug!("Built {} movie groups", movie_groups.len());

        let movie_order = &playlist.movies.order;
        let mut movie_rng = make_rng(&SeedMode::from_config(&movie_order.seed), now);
        let mut movie_items = shuffle_groups(
            &movie_groups,
            &mut movie_rng,
            Strategy::from_name(&movie_order.strategy),
            movie_order.chunk_size,
        );
        let max_movies = playlist.movies.ratio.max_movies;
        if max_movies > 0 {
            movie_items.truncate(max_movies as usize);
        }
        items = interleave_movies(items, movie_items, playlist.movies.ratio.every_episodes);
    }

    let limit = playlist.output.limit_items;
    if limit > 0 {
        items.truncate(limit as usize);
    }

    let stats = BuildStats {
        shows: show_count,
        episodes: items
            .iter()
            .filter(|item| item.kind == MediaKind::Episode)
            .count(),
        movies: items
            .iter()
            .filter(|item| item.kind == MediaKind::Movie)
            .count(),
        collections: collections_count,
        total_items: items.len(),
    };
    Ok((items, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaKind;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeCatalog {
        shows: Vec<MediaItem>,
        episodes: HashMap<String, Vec<MediaItem>>,
        movies: Vec<MediaItem>,
    }

    impl CatalogSource for FakeCatalog {
        fn shows_in_library(&self, _library: &str, _query: &str) -> Result<Vec<MediaItem>> {
            Ok(self.shows.clone())
        }

        fn episodes_of_show(&self, show_key: &str) -> Result<Vec<MediaItem>> {
            Ok(self.episodes.get(show_key).cloned().unwrap_or_default())
        }

        fn movies_in_library(&self, _library: &str, _query: &str) -> Result<Vec<MediaItem>> {
            Ok(self.movies.clone())
        }

        fn collections_in_library(&self, _library: &str, _query: &str) -> Result<Vec<MediaItem>> {
            Ok(Vec::new())
        }

        fn collection_items(&self, _collection_key: &str) -> Result<Vec<MediaItem>> {
            Ok(Vec::new())
        }
    }

    fn catalog_with_two_shows() -> FakeCatalog {
        let mut catalog = FakeCatalog::default();
        catalog.shows = vec![
            MediaItem::new("s1".to_string(), "One".to_string(), MediaKind::Show),
            MediaItem::new("s2".to_string(), "Two".to_string(), MediaKind::Show),
        ];
        for (show_key, prefix) in [("s1", "a"), ("s2", "b")] {
            let episodes = (1..=3)
                .map(|n| {
                    let mut item = MediaItem::new(
                        format!("{prefix}{n}"),
                        format!("Ep {prefix}{n}"),
                        MediaKind::Episode,
                    );
                    item.season = Some(1);
                    item.episode = Some(n);
                    item
                })
                .collect();
            catalog.episodes.insert(show_key.to_string(), episodes);
        }
        catalog
    }

    fn noon() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_seeded_assembly_is_repeatable() {
        let catalog = catalog_with_two_shows();
        let mut playlist = PlaylistConfig::default();
        playlist.tv.library = "TV".to_string();
        playlist.tv.order.seed = "42".to_string();

        let (first, stats) = assemble_playlist(&catalog, &playlist, noon()).unwrap();
        let (second, _) = assemble_playlist(&catalog, &playlist, noon()).unwrap();

        assert_eq!(first, second);
        assert_eq!(stats.shows, 2);
        assert_eq!(stats.episodes, 6);
        assert_eq!(stats.movies, 0);
        assert_eq!(stats.total_items, 6);
    }

    #[test]
    fn test_movies_interleave_at_cadence() {
        let mut catalog = catalog_with_two_shows();
        catalog.movies = vec![MediaItem::new(
            "m1".to_string(),
            "Feature".to_string(),
            MediaKind::Movie,
        )];

        let mut playlist = PlaylistConfig::default();
        playlist.tv.library = "TV".to_string();
        playlist.tv.order.seed = "7".to_string();
        playlist.movies.enabled = true;
        playlist.movies.library = "Movies".to_string();
        playlist.movies.ratio.every_episodes = 2;

        let (items, stats) = assemble_playlist(&catalog, &playlist, noon()).unwrap();

        let kinds: Vec<MediaKind> = items.iter().map(|item| item.kind).collect();
        assert_eq!(kinds[2], MediaKind::Movie);
        assert_eq!(stats.movies, 1);
        assert_eq!(stats.episodes, 6);
        assert_eq!(stats.total_items, 7);
    }

    #[test]
    fn test_max_movies_caps_the_mix() {
        let mut catalog = catalog_with_two_shows();
        catalog.movies = (1..=5)
            .map(|n| {
                MediaItem::new(format!("m{n}"), format!("Movie {n}"), MediaKind::Movie)
            })
            .collect();

        let mut playlist = PlaylistConfig::default();
        playlist.tv.library = "TV".to_string();
        playlist.movies.enabled = true;
        playlist.movies.library = "Movies".to_string();
        playlist.movies.ratio.every_episodes = 1;
        playlist.movies.ratio.max_movies = 2;

        let (_, stats) = assemble_playlist(&catalog, &playlist, noon()).unwrap();

        assert_eq!(stats.movies, 2);
        assert_eq!(stats.episodes, 6);
    }

    #[test]
    fn test_limit_items_truncates_final_sequence() {
        let catalog = catalog_with_two_shows();
        let mut playlist = PlaylistConfig::default();
        playlist.tv.library = "TV".to_string();
        playlist.output.limit_items = 4;

        let (items, stats) = assemble_playlist(&catalog, &playlist, noon()).unwrap();

        assert_eq!(items.len(), 4);
        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.episodes, 4);
        assert_eq!(stats.shows, 2);
    }
}
