//! Shuffle and interleave strategies for media groups
//!
//! All strategies flatten a set of groups into one sequence without ever
//! reordering items inside a group: items are only taken from the front
//! of each group's remaining queue. Caller-owned groups are never
//! mutated; every call works on its own private copies.

mod seed;

pub use seed::{make_rng, seed_value, SeedMode};

use crate::model::{MediaGroup, MediaItem};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use std::collections::VecDeque;

/// Strategy used to flatten groups into one sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Re-permute the active groups every round, then take a chunk from each
    Rounds,

    /// Permute the groups once, then cycle through that fixed order
    RoundRobin,

    /// Uniformly pick one active group per step and take a single item
    Random,
}

impl Strategy {
    /// Parse a strategy name; unknown or empty names default to rounds
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "round_robin" => Strategy::RoundRobin,
            "random" => Strategy::Random,
            _ => Strategy::Rounds,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Rounds => "rounds",
            Strategy::RoundRobin => "round_robin",
            Strategy::Random => "random",
        }
    }
}

/// Flatten groups into a single ordered sequence
///
/// Chunk sizes below 1 are treated as 1. The same RNG state, strategy,
/// chunk size and input always produce the same output.
pub fn shuffle_groups<R: Rng>(
    groups: &[MediaGroup],
    rng: &mut R,
    strategy: Strategy,
    chunk_size: i64,
) -> Vec<MediaItem> {
    if groups.is_empty() {
        return Vec::new();
    }
    match strategy {
        Strategy::RoundRobin => round_robin(groups, rng, chunk_size),
        Strategy::Random => random_pick(groups, rng),
        Strategy::Rounds => rounds(groups, rng, chunk_size),
    }
}

/// Insert one movie after every `every_episodes` episodes
///
/// Movies are consumed in order; once they run out the remaining episodes
/// pass through untouched. The since-last-movie counter resets both on a
/// successful insert and on an attempt that finds the movies exhausted.
/// A non-positive cadence or an empty movie list returns the episodes
/// unchanged.
pub fn interleave_movies(
    episodes: Vec<MediaItem>,
    movies: Vec<MediaItem>,
    every_episodes: i64,
) -> Vec<MediaItem> {
    if movies.is_empty() || every_episodes <= 0 {
        return episodes;
    }

    let mut output = Vec::with_capacity(episodes.len() + movies.len());
    let mut feed = movies.into_iter();
    let mut since_movie = 0i64;

    for episode in episodes {
        output.push(episode);
        since_movie += 1;
        if since_movie >= every_episodes {
            if let Some(movie) = feed.next() {
                output.push(movie);
            }
            since_movie = 0;
        }
    }
    output
}

/// Private per-call working queues, one per group
fn working_copies(groups: &[MediaGroup]) -> Vec<VecDeque<MediaItem>> {
    groups
        .iter()
        .map(|group| group.items.iter().cloned().collect())
        .collect()
}

fn active_indexes(remaining: &[VecDeque<MediaItem>], order: &[usize]) -> Vec<usize> {
    order
        .iter()
        .copied()
        .filter(|&index| !remaining[index].is_empty())
        .collect()
}

fn rounds<R: Rng>(groups: &[MediaGroup], rng: &mut R, chunk_size: i64) -> Vec<MediaItem> {
    let chunk = chunk_size.max(1);
    let mut remaining = working_copies(groups);
    let all: Vec<usize> = (0..remaining.len()).collect();
    let mut output = Vec::new();

    loop {
        let mut active = active_indexes(&remaining, &all);
        if active.is_empty() {
            break;
        }
        active.shuffle(rng);
        for index in active {
            for _ in 0..chunk {
                match remaining[index].pop_front() {
                    Some(item) => output.push(item),
                    None => break,
                }
            }
        }
    }
    output
}

fn round_robin<R: Rng>(groups: &[MediaGroup], rng: &mut R, chunk_size: i64) -> Vec<MediaItem> {
    let chunk = chunk_size.max(1);
    let mut remaining = working_copies(groups);
    let mut order: Vec<usize> = (0..remaining.len()).collect();
    order.shuffle(rng);
    let mut output = Vec::new();

    loop {
        let active = active_indexes(&remaining, &order);
        if active.is_empty() {
            break;
        }
        for index in active {
            for _ in 0..chunk {
                match remaining[index].pop_front() {
                    Some(item) => output.push(item),
                    None => break,
                }
            }
        }
    }
    output
}

fn random_pick<R: Rng>(groups: &[MediaGroup], rng: &mut R) -> Vec<MediaItem> {
    let mut remaining = working_copies(groups);
    let all: Vec<usize> = (0..remaining.len()).collect();
    let mut output = Vec::new();

    loop {
        let active = active_indexes(&remaining, &all);
        if active.is_empty() {
            break;
        }
        if let Some(&index) = active.choose(rng) {
            if let Some(item) = remaining[index].pop_front() {
                output.push(item);
            }
        }
    }
    output
}
