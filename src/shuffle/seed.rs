//! Deterministic seed derivation for repeatable shuffles

use chrono::{Datelike, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// How the shuffle RNG is seeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedMode {
    /// No seed; every run gets a fresh OS-entropy RNG
    None,

    /// Seed derived from the calendar day (YYYYMMDD)
    Daily,

    /// Seed derived from the ISO week (ISO year * 100 + week number)
    Weekly,

    /// Seed derived from the calendar month (YYYYMM)
    Monthly,

    /// Fixed literal seed (numeric string or arbitrary text)
    Literal(String),
}

impl SeedMode {
    /// Interpret the seed string from config
    ///
    /// Calendar keywords are case-insensitive; anything else becomes a
    /// literal seed (also lowercased, so literal seeds are
    /// case-insensitive too).
    pub fn from_config(raw: &str) -> Self {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return SeedMode::None;
        }
        match value.as_str() {
            "daily" => SeedMode::Daily,
            "weekly" => SeedMode::Weekly,
            "monthly" => SeedMode::Monthly,
            _ => SeedMode::Literal(value),
        }
    }
}

/// Numeric seed for a mode at a point in time; None means unseeded
pub fn seed_value(mode: &SeedMode, now: NaiveDateTime) -> Option<u64> {
    match mode {
        SeedMode::None => None,
        SeedMode::Daily => {
            let date = now.date();
            let key =
                date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64;
            Some(key as u64)
        }
        SeedMode::Weekly => {
            let week = now.date().iso_week();
            Some((week.year() as i64 * 100 + week.week() as i64) as u64)
        }
        SeedMode::Monthly => {
            let date = now.date();
            Some((date.year() as i64 * 100 + date.month() as i64) as u64)
        }
        SeedMode::Literal(text) => Some(match text.parse::<i64>() {
            Ok(number) => number as u64,
            Err(_) => digest_seed(text),
        }),
    }
}

/// Build the RNG for a seed mode at a point in time
pub fn make_rng(mode: &SeedMode, now: NaiveDateTime) -> StdRng {
    match seed_value(mode, now) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// First eight md5 digest bytes of the seed text, big-endian
fn digest_seed(text: &str) -> u64 {
    let digest = md5::compute(text.as_bytes()).0;
    u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}
