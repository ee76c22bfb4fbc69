//! Load and validate shuffler configuration
//!
//! Configuration lives in a single JSON document. Missing fields fall
//! back to defaults at parse time, so a minimal file only needs the
//! Plex connection details and one playlist entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use thiserror::Error;

/// Accepted shuffle strategy names, in the order they are reported
const STRATEGY_NAMES: [&str; 3] = ["random", "round_robin", "rounds"];

/// Accepted output modes, in the order they are reported
const OUTPUT_MODES: [&str; 2] = ["append", "replace"];

/// Top-level configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Plex server connection settings
    pub plex: PlexConfig,

    /// Scheduling settings for loop mode
    pub schedule: ScheduleConfig,

    /// Playlists to build, in order
    pub playlists: Vec<PlaylistConfig>,
}

/// Connection settings for the Plex server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlexConfig {
    /// Base URL of the server, e.g. `http://localhost:32400`
    pub url: String,

    /// API token, a literal value or an `env:NAME` / `$NAME` reference
    pub token: String,

    /// Request timeout in seconds
    pub timeout_seconds: i64,

    /// Value sent as X-Plex-Client-Identifier; empty means the default
    pub client_id: String,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:32400".to_string(),
            token: String::new(),
            timeout_seconds: 30,
            client_id: String::new(),
        }
    }
}

/// Timing settings for `run --loop`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minutes between rebuilds; 0 disables looping
    pub interval_minutes: i64,

    /// Upper bound of the random delay added to each sleep, in seconds
    pub jitter_seconds: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 0,
            jitter_seconds: 30,
        }
    }
}

/// One playlist to assemble and push to the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Playlist title on the server
    pub name: String,

    /// Free-form note, not sent to the server
    pub description: String,

    /// Episode side of the playlist
    pub tv: TvConfig,

    /// Optional movie side of the playlist
    pub movies: MovieConfig,

    /// How the assembled sequence is written to the server
    pub output: OutputConfig,
}

/// Episode sourcing and ordering settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TvConfig {
    /// Plex library section title to read shows from
    pub library: String,

    /// Raw query string appended to the show listing request
    pub query: String,

    /// Glob patterns a show title must match; empty means all
    pub include_titles: Vec<String>,

    /// Glob patterns that remove a show even when included
    pub exclude_titles: Vec<String>,

    /// Per-episode watch-state filters
    pub episode_filters: EpisodeFilters,

    /// Shuffle strategy for the episode groups
    pub order: OrderConfig,
}

/// Watch-state filters applied to fetched episodes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeFilters {
    /// Drop episodes that have ever been watched
    pub unwatched_only: bool,

    /// Drop episodes watched within this many days; 0 disables
    pub exclude_watched_days: i64,

    /// Keep at most this many episodes per show; 0 means unlimited
    pub max_per_show: i64,
}

/// Shuffle strategy settings shared by the TV and movie sides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// One of `rounds`, `round_robin` or `random`
    pub strategy: String,

    /// Consecutive items taken from a group per visit
    pub chunk_size: i64,

    /// Seed keyword (`daily`, `weekly`, `monthly`), a literal, or empty
    pub seed: String,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            strategy: "rounds".to_string(),
            chunk_size: 1,
            seed: String::new(),
        }
    }
}

/// Movie sourcing, ordering and interleave settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieConfig {
    /// Mix movies into the playlist at all
    pub enabled: bool,

    /// Plex library section title to read movies from
    pub library: String,

    /// Raw query string appended to the movie listing request
    pub query: String,

    /// Treat collections as groups instead of one group per movie
    pub collections_as_shows: bool,

    /// Glob patterns a collection title must match; empty means all
    pub include_collections: Vec<String>,

    /// Glob patterns that remove a collection even when included
    pub exclude_collections: Vec<String>,

    /// Shuffle strategy for the movie groups
    pub order: OrderConfig,

    /// How often movies appear among episodes
    pub ratio: RatioConfig,

    /// Watch-state filters applied to fetched movies
    pub filters: MovieFilters,
}

/// Cadence of movie insertion into the episode sequence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioConfig {
    /// Insert one movie after this many episodes; 0 disables
    pub every_episodes: i64,

    /// Cap on movies drawn into the mix; 0 means unlimited
    pub max_movies: i64,
}

/// Watch-state filters applied to fetched movies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieFilters {
    /// Drop movies that have ever been watched
    pub unwatched_only: bool,

    /// Drop movies watched within this many days; 0 disables
    pub exclude_watched_days: i64,
}

/// How the assembled sequence is written to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// `replace` recreates the playlist, `append` adds to it
    pub mode: String,

    /// Truncate the final sequence to this length; 0 means unlimited
    pub limit_items: i64,

    /// Items per request when pushing to the server
    pub chunk_size: i64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: "replace".to_string(),
            limit_items: 0,
            chunk_size: 200,
        }
    }
}

/// One validation problem, addressed by config path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path into the document, e.g. `playlists[1].tv.library`
    pub path: String,

    /// What is wrong with the value at `path`
    pub message: String,
}

impl ConfigIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.message)
    }
}

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON of the expected shape
    #[error("Failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Validation found one or more problems
    #[error("Config errors:\n{}", list_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn list_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("- {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read a config file, filling defaults and resolving the Plex token
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let expanded = shellexpand::tilde(path).into_owned();
    let raw = fs::read_to_string(&expanded).map_err(|source| ConfigError::Io {
        path: expanded.clone(),
        source,
    })?;
    let mut config: AppConfig =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: expanded,
            source,
        })?;
    config.plex.token = resolve_token(&config.plex.token);
    Ok(config)
}

/// Resolve the configured token value against the environment
///
/// `env:NAME` and `$NAME` read the named variable, an empty value falls
/// back to `PLEX_TOKEN`, anything else is taken literally.
pub fn resolve_token(raw: &str) -> String {
    let token = raw.trim();
    if let Some(name) = token.strip_prefix("env:") {
        return env_or_empty(name.trim());
    }
    if let Some(name) = token.strip_prefix('$') {
        return env_or_empty(name);
    }
    if token.is_empty() {
        return env_or_empty("PLEX_TOKEN");
    }
    token.to_string()
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default().trim().to_string()
}

/// Check a loaded config, returning every problem found
pub fn config_issues(config: &AppConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    let url = config.plex.url.trim();
    if url.is_empty() {
        issues.push(ConfigIssue::new("plex.url", "is required"));
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        issues.push(ConfigIssue::new(
            "plex.url",
            "must start with http:// or https://",
        ));
    }

    if config.plex.token.trim().is_empty() {
        issues.push(ConfigIssue::new(
            "plex.token",
            "is required (or set PLEX_TOKEN env var)",
        ));
    }

    require_positive(&mut issues, "plex.timeout_seconds", config.plex.timeout_seconds);

    if config.playlists.is_empty() {
        issues.push(ConfigIssue::new(
            "playlists",
            "must contain at least one playlist",
        ));
    }

    for (idx, playlist) in config.playlists.iter().enumerate() {
        let base = format!("playlists[{}]", idx + 1);

        if playlist.name.trim().is_empty() {
            issues.push(ConfigIssue::new(format!("{base}.name"), "is required"));
        }
        if playlist.tv.library.trim().is_empty() {
            issues.push(ConfigIssue::new(format!("{base}.tv.library"), "is required"));
        }

        let filters = &playlist.tv.episode_filters;
        require_non_negative(
            &mut issues,
            &format!("{base}.tv.episode_filters.exclude_watched_days"),
            filters.exclude_watched_days,
        );
        require_non_negative(
            &mut issues,
            &format!("{base}.tv.episode_filters.max_per_show"),
            filters.max_per_show,
        );
        require_one_of(
            &mut issues,
            &format!("{base}.tv.order.strategy"),
            &playlist.tv.order.strategy,
            &STRATEGY_NAMES,
        );
        require_positive(
            &mut issues,
            &format!("{base}.tv.order.chunk_size"),
            playlist.tv.order.chunk_size,
        );

        let movies = &playlist.movies;
        if movies.enabled && movies.library.trim().is_empty() {
            issues.push(ConfigIssue::new(
                format!("{base}.movies.library"),
                "is required when movies.enabled=true",
            ));
        }
        require_one_of(
            &mut issues,
            &format!("{base}.movies.order.strategy"),
            &movies.order.strategy,
            &STRATEGY_NAMES,
        );
        require_positive(
            &mut issues,
            &format!("{base}.movies.order.chunk_size"),
            movies.order.chunk_size,
        );
        require_non_negative(
            &mut issues,
            &format!("{base}.movies.ratio.every_episodes"),
            movies.ratio.every_episodes,
        );
        require_non_negative(
            &mut issues,
            &format!("{base}.movies.ratio.max_movies"),
            movies.ratio.max_movies,
        );
        if movies.ratio.max_movies > 0 && movies.ratio.every_episodes <= 0 {
            issues.push(ConfigIssue::new(
                format!("{base}.movies.ratio.max_movies"),
                "requires movies.ratio.every_episodes > 0",
            ));
        }
        require_non_negative(
            &mut issues,
            &format!("{base}.movies.filters.exclude_watched_days"),
            movies.filters.exclude_watched_days,
        );

        require_one_of(
            &mut issues,
            &format!("{base}.output.mode"),
            &playlist.output.mode,
            &OUTPUT_MODES,
        );
        require_non_negative(
            &mut issues,
            &format!("{base}.output.limit_items"),
            playlist.output.limit_items,
        );
        require_positive(
            &mut issues,
            &format!("{base}.output.chunk_size"),
            playlist.output.chunk_size,
        );
    }

    issues
}

/// Validate a loaded config, failing with every problem at once
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let issues = config_issues(config);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(issues))
    }
}

fn require_positive(issues: &mut Vec<ConfigIssue>, path: &str, value: i64) {
    if value <= 0 {
        issues.push(ConfigIssue::new(path, "must be > 0"));
    }
}

fn require_non_negative(issues: &mut Vec<ConfigIssue>, path: &str, value: i64) {
    if value < 0 {
        issues.push(ConfigIssue::new(path, "must be >= 0"));
    }
}

fn require_one_of(issues: &mut Vec<ConfigIssue>, path: &str, value: &str, allowed: &[&str]) {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return;
    }
    if !allowed.contains(&normalized.as_str()) {
        issues.push(ConfigIssue::new(
            path,
            format!("must be one of: {}", allowed.join(", ")),
        ));
    }
}
