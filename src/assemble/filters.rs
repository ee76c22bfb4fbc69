//! Title pattern and watch-state filters
//!
//! Title filters use shell-style wildcards (`*`, `?`, `[...]` classes
//! with ranges and `!` negation) applied case-insensitively, so config
//! patterns like `"Star Trek*"` behave the way they would in a shell.

use crate::model::MediaItem;
use chrono::{Duration, NaiveDateTime};

/// Keep items whose title passes the include/exclude pattern lists
///
/// An empty include list passes everything; a non-empty exclude list
/// drops any item matching one of its patterns.
pub fn filter_titles(items: Vec<MediaItem>, include: &[String], exclude: &[String]) -> Vec<MediaItem> {
    let include_patterns = compile_patterns(include);
    let exclude_patterns = compile_patterns(exclude);

    items
        .into_iter()
        .filter(|item| {
            let title = item.title.to_lowercase();
            if !include_patterns.is_empty() && !matches_any(&include_patterns, &title) {
                return false;
            }
            if !exclude_patterns.is_empty() && matches_any(&exclude_patterns, &title) {
                return false;
            }
            true
        })
        .collect()
}

/// Drop watched items according to the configured filters
///
/// `unwatched_only` drops anything with a non-zero view count; a cutoff
/// (unix seconds) drops anything last viewed at or after it.
pub fn filter_watched(
    items: Vec<MediaItem>,
    cutoff: Option<i64>,
    unwatched_only: bool,
) -> Vec<MediaItem> {
    items
        .into_iter()
        .filter(|item| {
            if unwatched_only && item.view_count.unwrap_or(0) > 0 {
                return false;
            }
            if let (Some(cutoff), Some(last_viewed)) = (cutoff, item.last_viewed_at) {
                if last_viewed >= cutoff {
                    return false;
                }
            }
            true
        })
        .collect()
}

/// Unix-seconds cutoff for "watched in the last N days", if N is positive
pub fn watch_cutoff(now: NaiveDateTime, exclude_watched_days: i64) -> Option<i64> {
    if exclude_watched_days <= 0 {
        return None;
    }
    Some((now - Duration::days(exclude_watched_days)).and_utc().timestamp())
}

fn compile_patterns(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| pattern.trim().to_lowercase())
        .collect()
}

fn matches_any(patterns: &[String], title: &str) -> bool {
    patterns.iter().any(|pattern| glob_match(pattern, title))
}

/// Shell-style wildcard match over chars
///
/// `*` matches any run, `?` one char, `[...]` a class with `-` ranges
/// and leading `!` negation. An unterminated `[` is a literal bracket.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();

    let mut p = 0;
    let mut t = 0;
    let mut star: Option<usize> = None;
    let mut star_t = 0;

    while t < txt.len() {
        if p < pat.len() && pat[p] == '*' {
            star = Some(p);
            star_t = t;
            p += 1;
            continue;
        }

        let advanced = if p < pat.len() {
            match pat[p] {
                '?' => Some(p + 1),
                '[' => match match_class(&pat, p, txt[t]) {
                    Some((matched, next_p)) => matched.then_some(next_p),
                    // unterminated class: treat '[' as a literal
                    None => (txt[t] == '[').then_some(p + 1),
                },
                literal => (literal == txt[t]).then_some(p + 1),
            }
        } else {
            None
        };

        match advanced {
            Some(next_p) => {
                p = next_p;
                t += 1;
            }
            None => match star {
                // Let the last '*' swallow one more char and retry.
                Some(star_p) => {
                    star_t += 1;
                    t = star_t;
                    p = star_p + 1;
                }
                None => return false,
            },
        }
    }

    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

/// Evaluate a `[...]` class starting at `start` against one char
///
/// Returns (membership result, index past the closing bracket), or None
/// when the class never closes.
fn match_class(pat: &[char], start: usize, ch: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let mut negated = false;
    if i < pat.len() && pat[i] == '!' {
        negated = true;
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < pat.len() {
        if pat[i] == ']' && !first {
            return Some((matched != negated, i + 1));
        }
        first = false;
        if i + 2 < pat.len() && pat[i + 1] == '-' && pat[i + 2] != ']' {
            if pat[i] <= ch && ch <= pat[i + 2] {
                matched = true;
            }
            i += 3;
        } else {
            if pat[i] == ch {
                matched = true;
            }
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaKind;

    fn show(title: &str) -> MediaItem {
        MediaItem::new(title.to_lowercase(), title.to_string(), MediaKind::Show)
    }

    fn titles(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|item| item.title.as_str()).collect()
    }

    #[test]
    fn test_glob_star() {
        assert!(glob_match("star trek*", "star trek: voyager"));
        assert!(glob_match("*trek*", "star trek: voyager"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("*", ""));
        assert!(!glob_match("star trek*", "star wars"));
    }

    #[test]
    fn test_glob_question_mark() {
        assert!(glob_match("s?r", "sir"));
        assert!(!glob_match("s?r", "sr"));
        assert!(!glob_match("s?r", "seer"));
    }

    #[test]
    fn test_glob_char_class() {
        assert!(glob_match("s[ai]t", "sat"));
        assert!(glob_match("s[ai]t", "sit"));
        assert!(!glob_match("s[ai]t", "set"));
        assert!(glob_match("season [0-9]", "season 4"));
        assert!(!glob_match("season [0-9]", "season x"));
        assert!(glob_match("[!x]yz", "ayz"));
        assert!(!glob_match("[!x]yz", "xyz"));
    }

    #[test]
    fn test_glob_unterminated_class_is_literal() {
        assert!(glob_match("a[b", "a[b"));
        assert!(!glob_match("a[b", "ab"));
    }

    #[test]
    fn test_glob_exact_match() {
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
        assert!(!glob_match("exactly", "exact"));
    }

    #[test]
    fn test_filter_titles_include() {
        let items = vec![show("Star Trek"), show("Star Wars"), show("Firefly")];
        let include = vec!["star*".to_string()];
        let kept = filter_titles(items, &include, &[]);
        assert_eq!(titles(&kept), vec!["Star Trek", "Star Wars"]);
    }

    #[test]
    fn test_filter_titles_exclude_wins_over_include() {
        let items = vec![show("Star Trek"), show("Star Wars")];
        let include = vec!["star*".to_string()];
        let exclude = vec!["*wars".to_string()];
        let kept = filter_titles(items, &include, &exclude);
        assert_eq!(titles(&kept), vec!["Star Trek"]);
    }

    #[test]
    fn test_filter_titles_empty_include_passes_all() {
        let items = vec![show("Alpha"), show("Beta")];
        let kept = filter_titles(items, &[], &[]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_filter_titles_is_case_insensitive() {
        let items = vec![show("STAR TREK")];
        let include = vec!["  Star Trek  ".to_string()];
        let kept = filter_titles(items, &include, &[]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_filter_watched_unwatched_only() {
        let mut watched = show("Watched");
        watched.view_count = Some(3);
        let mut zero = show("Zero");
        zero.view_count = Some(0);
        let fresh = show("Fresh");

        let kept = filter_watched(vec![watched, zero, fresh], None, true);
        assert_eq!(titles(&kept), vec!["Zero", "Fresh"]);
    }

    #[test]
    fn test_filter_watched_cutoff() {
        let mut recent = show("Recent");
        recent.last_viewed_at = Some(1_000_000);
        let mut old = show("Old");
        old.last_viewed_at = Some(10);
        let never = show("Never");

        let kept = filter_watched(vec![recent, old, never], Some(500_000), false);
        assert_eq!(titles(&kept), vec!["Old", "Never"]);
    }

    #[test]
    fn test_filter_watched_cutoff_boundary_drops_exact_match() {
        let mut boundary = show("Boundary");
        boundary.last_viewed_at = Some(500_000);
        let kept = filter_watched(vec![boundary], Some(500_000), false);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_watch_cutoff_requires_positive_days() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(watch_cutoff(now, 0).is_none());
        assert!(watch_cutoff(now, -3).is_none());

        let cutoff = watch_cutoff(now, 7).unwrap();
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 6, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();
        assert_eq!(cutoff, expected);
    }
}
