//! Curated catalog of filter fields recognized by the query builder

use super::QueryOp;

/// A filter field the structured query builder understands
#[derive(Debug, Clone, Copy)]
pub struct QueryField {
    /// Field key as it appears in query strings
    pub key: &'static str,

    /// Operators this field supports
    pub ops: &'static [QueryOp],

    /// Whether the field's semantics are verified against the Plex API
    pub verified: bool,

    /// Facet source to pull selectable values from, if any
    pub options_source: Option<&'static str>,
}

/// All fields the builder knows about, verified or not
pub const QUERY_FIELDS: &[QueryField] = &[
    QueryField {
        key: "genre",
        ops: &[QueryOp::Eq],
        verified: true,
        options_source: Some("genre"),
    },
    QueryField {
        key: "unwatched",
        ops: &[QueryOp::Eq],
        verified: true,
        options_source: None,
    },
    QueryField {
        key: "year",
        ops: &[QueryOp::Eq, QueryOp::Gte, QueryOp::Lte],
        verified: true,
        options_source: None,
    },
    QueryField {
        key: "collection",
        ops: &[QueryOp::Eq],
        verified: true,
        options_source: Some("collection"),
    },
    QueryField {
        key: "contentRating",
        ops: &[QueryOp::Eq],
        verified: true,
        options_source: Some("contentRating"),
    },
    QueryField {
        key: "studio",
        ops: &[QueryOp::Eq],
        verified: true,
        options_source: Some("studio"),
    },
    QueryField {
        key: "title",
        ops: &[QueryOp::Contains],
        verified: true,
        options_source: None,
    },
    QueryField {
        key: "summary",
        ops: &[QueryOp::Contains],
        verified: false,
        options_source: None,
    },
    QueryField {
        key: "actor",
        ops: &[QueryOp::Eq],
        verified: true,
        options_source: Some("actor"),
    },
    QueryField {
        key: "director",
        ops: &[QueryOp::Eq],
        verified: true,
        options_source: Some("director"),
    },
];

/// Keys of all verified fields, in catalog order
pub fn known_field_keys() -> Vec<&'static str> {
    QUERY_FIELDS
        .iter()
        .filter(|field| field.verified)
        .map(|field| field.key)
        .collect()
}

/// Facet sources that selectable field values can be fetched from
pub fn supported_facet_sources() -> Vec<&'static str> {
    QUERY_FIELDS
        .iter()
        .filter_map(|field| field.options_source)
        .collect()
}

/// Map a user-supplied facet name onto a supported source
///
/// Matching is case-insensitive and ignores surrounding whitespace, so
/// "contentrating" resolves to "contentRating". Returns None for
/// unsupported facets.
pub fn normalize_facet_source(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    supported_facet_sources()
        .into_iter()
        .find(|source| source.eq_ignore_ascii_case(trimmed))
}
