use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use plex_shuffler::assemble::assemble_playlist;
use plex_shuffler::config::{load_config, validate_config, AppConfig, PlaylistConfig};
use plex_shuffler::plex::{cached_filter_options, FacetCache, PlexClient};
use plex_shuffler::query::supported_facet_sources;
use plex_shuffler::sync::sync_playlist;
use rand::Rng;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "plex-shuffler")]
#[command(about = "Generate shuffled Plex playlists", long_about = None)]
struct Args {
    /// Path to config.json
    #[arg(short = 'c', long)]
    config: String,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build playlists and sync them to Plex
    Run(RunArgs),

    /// List Plex library sections
    Libraries(LibrariesArgs),
}

#[derive(clap::Args, Debug)]
struct LibrariesArgs {
    /// Also list filter facet option counts per section
    #[arg(long)]
    facets: bool,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Do not write playlists to Plex
    #[arg(long)]
    dry_run: bool,

    /// Print the first N assembled items
    #[arg(long = "print", value_name = "N", default_value = "0")]
    print_count: i64,

    /// Only run the named playlist (can be specified multiple times)
    #[arg(long = "playlist")]
    playlist_filter: Vec<String>,

    /// Keep rebuilding on the configured schedule
    #[arg(long = "loop")]
    run_loop: bool,

    /// Run once even if a schedule is configured
    #[arg(long)]
    once: bool,

    /// Override the schedule interval, in minutes
    #[arg(long, default_value = "0")]
    interval_minutes: i64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = load_config(&args.config)?;
    validate_config(&config)?;

    let client = PlexClient::new(&config.plex);

    match args.command {
        Command::Libraries(libraries) => run_libraries(&client, &libraries),
        Command::Run(run) => run_command(&client, &config, &run),
    }
}

fn run_libraries(client: &PlexClient, libraries: &LibrariesArgs) -> Result<()> {
    let cache = FacetCache::new();
    for section in client.get_sections()? {
        println!(
            "{} ({}) - key={}",
            section.title, section.section_type, section.key
        );
        if !libraries.facets {
            continue;
        }
        let media_type = match section.section_type.as_str() {
            "show" => "show",
            "movie" => "movie",
            _ => continue,
        };
        for facet in supported_facet_sources() {
            match cached_filter_options(&cache, client, &section.key, facet, Some(media_type)) {
                Ok(values) => println!("  {facet}: {} options", values.len()),
                Err(error) => log::warn!(
                    "Failed to list {facet} options for {}: {error:#}",
                    section.title
                ),
            }
        }
    }
    Ok(())
}

fn run_command(client: &PlexClient, config: &AppConfig, run: &RunArgs) -> Result<()> {
    let interval = if run.interval_minutes != 0 {
        run.interval_minutes
    } else {
        config.schedule.interval_minutes
    };
    let jitter = config.schedule.jitter_seconds;

    // A single pass is the default; continuous mode must be asked for.
    if run.once || !run.run_loop {
        run_once(client, config, run);
        return Ok(());
    }

    loop {
        run_once(client, config, run);
        if interval <= 0 {
            log::info!("Schedule interval is 0; exiting loop");
            break;
        }
        let mut sleep_seconds = interval * 60;
        if jitter > 0 {
            sleep_seconds += rand::rng().random_range(0..=jitter);
        }
        log::info!("Sleeping for {sleep_seconds} seconds");
        thread::sleep(Duration::from_secs(sleep_seconds as u64));
    }
    Ok(())
}

/// Build every selected playlist, keeping failures isolated per playlist
fn run_once(client: &PlexClient, config: &AppConfig, run: &RunArgs) {
    let now = Utc::now().naive_utc();
    let filters: HashSet<String> = run
        .playlist_filter
        .iter()
        .filter(|name| !name.is_empty())
        .map(|name| name.trim().to_lowercase())
        .collect();

    for playlist in &config.playlists {
        if !filters.is_empty() && !filters.contains(&playlist.name.trim().to_lowercase()) {
            continue;
        }
        if let Err(error) = run_playlist(client, playlist, run, now) {
            log::error!("Failed to build playlist {}: {error:#}", playlist.name);
        }
    }
}

fn run_playlist(
    client: &PlexClient,
    playlist: &PlaylistConfig,
    run: &RunArgs,
    now: NaiveDateTime,
) -> Result<()> {
    let (items, stats) = assemble_playlist(client, playlist, now)?;
    log::info!(
        "Built playlist {}: {} shows, {} episodes, {} movies, {} total",
        playlist.name,
        stats.shows,
        stats.episodes,
        stats.movies,
        stats.total_items
    );

    if run.print_count > 0 {
        for item in items.iter().take(run.print_count as usize) {
            println!("{}", item.describe());
        }
    }

    if !run.dry_run {
        sync_playlist(
            client,
            &playlist.name,
            &items,
            &playlist.output.mode,
            playlist.output.chunk_size,
        )?;
    }
    Ok(())
}
