//! Query state model with parse/serialize helpers
//!
//! A query is either a structured set of clauses ("builder" mode) or an
//! opaque raw string ("advanced" mode). Parsing a flat query string made
//! of known fields and serializing it back reproduces the same string,
//! which is what lets the UI and config representations stay in sync.

use serde_json::{json, Value};
use std::collections::HashMap;

/// Representation mode of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Builder,
    Advanced,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Builder => "builder",
            QueryMode::Advanced => "advanced",
        }
    }
}

/// Operator applied by a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOp {
    Eq,
    Contains,
    Gte,
    Lte,
    Exists,
    Custom,
}

impl QueryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOp::Eq => "eq",
            QueryOp::Contains => "contains",
            QueryOp::Gte => "gte",
            QueryOp::Lte => "lte",
            QueryOp::Exists => "exists",
            QueryOp::Custom => "custom",
        }
    }

    /// Parse an operator name; anything unrecognized becomes Custom
    pub fn from_name(name: &str) -> Self {
        match name {
            "eq" => QueryOp::Eq,
            "contains" => QueryOp::Contains,
            "gte" => QueryOp::Gte,
            "lte" => QueryOp::Lte,
            "exists" => QueryOp::Exists,
            "custom" => QueryOp::Custom,
            _ => QueryOp::Custom,
        }
    }
}

/// One filter condition: field, operator and one or more values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryClause {
    pub field: String,
    pub op: QueryOp,
    pub values: Vec<String>,
}

/// A conjunctive group of clauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryGroup {
    pub clauses: Vec<QueryClause>,
}

/// Full query state as edited by the builder or stored in config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub mode: QueryMode,
    pub groups: Vec<QueryGroup>,
    pub advanced: String,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            mode: QueryMode::Builder,
            groups: Vec::new(),
            advanced: String::new(),
        }
    }
}

/// Parse a flat query string into a QueryState
///
/// Pairs merge by (field, operator) in first-seen order, so repeated keys
/// accumulate values on one clause. With `strict` set, a single unknown
/// field downgrades the whole query to advanced mode carrying the trimmed
/// original string.
pub fn parse_query_string(query: &str, known_fields: &[&str], strict: bool) -> QueryState {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return QueryState::default();
    }

    let pairs = split_pairs(trimmed);
    if pairs.is_empty() {
        return QueryState::default();
    }

    let (clauses, has_unknown) = pairs_to_clauses(&pairs, known_fields);
    if has_unknown && strict {
        return QueryState {
            mode: QueryMode::Advanced,
            groups: Vec::new(),
            advanced: trimmed.to_string(),
        };
    }

    QueryState {
        mode: QueryMode::Builder,
        groups: vec![QueryGroup { clauses }],
        advanced: String::new(),
    }
}

/// Serialize a QueryState back to a flat query string
///
/// Advanced mode returns the raw string verbatim (trimmed). Builder mode
/// emits one `field=value` pair per clause value; gte/lte clauses encode
/// their comparison symbol into the field name so the operator survives a
/// round trip.
pub fn serialize_query_state(state: &QueryState) -> String {
    if state.mode == QueryMode::Advanced {
        return state.advanced.trim().to_string();
    }

    let mut pairs: Vec<String> = Vec::new();
    for group in &state.groups {
        for clause in &group.clauses {
            let key = encode_key(clause.field.trim(), clause.op);
            for value in &clause.values {
                pairs.push(format!("{}={}", key, encode_component(value.trim())));
            }
        }
    }
    pairs.join("&")
}

/// Convert a QueryState to its generic JSON representation
pub fn query_state_to_value(state: &QueryState) -> Value {
    json!({
        "mode": state.mode.as_str(),
        "groups": state
            .groups
            .iter()
            .map(|group| {
                json!({
                    "clauses": group
                        .clauses
                        .iter()
                        .map(|clause| {
                            json!({
                                "field": clause.field,
                                "op": clause.op.as_str(),
                                "values": clause.values,
                            })
                        })
                        .collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>(),
        "advanced_query": state.advanced,
    })
}

/// Rebuild a QueryState from its generic JSON representation
///
/// Input is tolerated loosely: missing or unknown mode falls back to
/// builder, `advancedQuery` is accepted as an alias, scalar clause values
/// are coerced to single-element lists and everything is stringified.
pub fn query_state_from_value(data: &Value) -> QueryState {
    let Some(map) = data.as_object() else {
        return QueryState::default();
    };

    let mode = match map.get("mode").and_then(Value::as_str) {
        Some("advanced") => QueryMode::Advanced,
        _ => QueryMode::Builder,
    };

    let advanced = map
        .get("advanced_query")
        .or_else(|| map.get("advancedQuery"))
        .map(value_to_string)
        .unwrap_or_default();

    let mut groups: Vec<QueryGroup> = Vec::new();
    if let Some(raw_groups) = map.get("groups").and_then(Value::as_array) {
        for group_data in raw_groups {
            let Some(group_map) = group_data.as_object() else {
                continue;
            };
            let mut clauses: Vec<QueryClause> = Vec::new();
            if let Some(raw_clauses) = group_map.get("clauses").and_then(Value::as_array) {
                for clause_data in raw_clauses {
                    let Some(clause_map) = clause_data.as_object() else {
                        continue;
                    };
                    let field = clause_map
                        .get("field")
                        .map(value_to_string)
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    let op = match clause_map.get("op") {
                        None => QueryOp::Eq,
                        Some(Value::String(name)) => QueryOp::from_name(name),
                        Some(_) => QueryOp::Custom,
                    };
                    let values = match clause_map.get("values") {
                        None | Some(Value::Null) => Vec::new(),
                        Some(Value::Array(list)) => list
                            .iter()
                            .map(|value| value_to_string(value).trim().to_string())
                            .collect(),
                        Some(single) => vec![value_to_string(single).trim().to_string()],
                    };
                    clauses.push(QueryClause { field, op, values });
                }
            }
            groups.push(QueryGroup { clauses });
        }
    }

    QueryState {
        mode,
        groups,
        advanced: advanced.trim().to_string(),
    }
}

/// Decode a raw query string into ordered (key, value) pairs
///
/// This is the flat form request builders append to listing URLs, with
/// no clause merging or field classification applied.
pub fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    split_pairs(query.trim())
}

/// Split a raw query string into decoded (key, value) pairs
///
/// Blank values are retained; empty segments between delimiters are not.
fn split_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(segment), String::new()),
        })
        .collect()
}

fn pairs_to_clauses(pairs: &[(String, String)], known_fields: &[&str]) -> (Vec<QueryClause>, bool) {
    let mut clauses: Vec<QueryClause> = Vec::new();
    let mut index: HashMap<(String, QueryOp), usize> = HashMap::new();
    let mut has_unknown = false;

    for (raw_key, raw_value) in pairs {
        let key = raw_key.trim();
        let value = raw_value.trim().to_string();
        let (field, op) = classify_key(key, known_fields);
        if op == QueryOp::Custom {
            has_unknown = true;
        }
        let clause_key = (field.clone(), op);
        match index.get(&clause_key) {
            Some(&existing) => clauses[existing].values.push(value),
            None => {
                index.insert(clause_key, clauses.len());
                clauses.push(QueryClause {
                    field,
                    op,
                    values: vec![value],
                });
            }
        }
    }

    (clauses, has_unknown)
}

/// Determine the field name and operator for a decoded key
///
/// A trailing `>` or `<` on a known field restores the gte/lte operator
/// emitted by the serializer; everything else is eq for known fields and
/// custom for unknown ones.
fn classify_key(key: &str, known_fields: &[&str]) -> (String, QueryOp) {
    if let Some(stem) = key.strip_suffix('>') {
        let stem = stem.trim_end();
        if is_known(stem, known_fields) {
            return (stem.to_string(), QueryOp::Gte);
        }
    }
    if let Some(stem) = key.strip_suffix('<') {
        let stem = stem.trim_end();
        if is_known(stem, known_fields) {
            return (stem.to_string(), QueryOp::Lte);
        }
    }
    if is_known(key, known_fields) {
        (key.to_string(), QueryOp::Eq)
    } else {
        (key.to_string(), QueryOp::Custom)
    }
}

fn is_known(field: &str, known_fields: &[&str]) -> bool {
    known_fields.iter().any(|known| *known == field)
}

fn encode_key(field: &str, op: QueryOp) -> String {
    let encoded = encode_component(field);
    match op {
        QueryOp::Gte => format!("{}%3E", encoded),
        QueryOp::Lte => format!("{}%3C", encoded),
        _ => encoded,
    }
}

fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw).replace("%20", "+")
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[&str] = &["genre", "year", "contentRating", "studio", "collection"];

    #[test]
    fn test_parse_empty_query_returns_builder() {
        let state = parse_query_string("", KNOWN, false);
        assert_eq!(state.mode, QueryMode::Builder);
        assert!(state.groups.is_empty());
        assert_eq!(state.advanced, "");
    }

    #[test]
    fn test_parse_whitespace_only_returns_builder() {
        let state = parse_query_string("   ", KNOWN, false);
        assert_eq!(state.mode, QueryMode::Builder);
        assert!(state.groups.is_empty());
    }

    #[test]
    fn test_parse_repeated_keys_accumulate_values() {
        let state = parse_query_string("genre=Animation&genre=Comedy", KNOWN, false);
        assert_eq!(state.mode, QueryMode::Builder);
        assert_eq!(state.groups.len(), 1);

        let clause = &state.groups[0].clauses[0];
        assert_eq!(clause.field, "genre");
        assert_eq!(clause.op, QueryOp::Eq);
        assert_eq!(clause.values, vec!["Animation", "Comedy"]);
    }

    #[test]
    fn test_parse_trims_keys_and_values() {
        let state = parse_query_string("  genre=Animation  &  year=2020  ", KNOWN, false);
        let clauses = &state.groups[0].clauses;
        assert_eq!(clauses[0].field, "genre");
        assert_eq!(clauses[0].values, vec!["Animation"]);
        assert_eq!(clauses[1].field, "year");
        assert_eq!(clauses[1].values, vec!["2020"]);
    }

    #[test]
    fn test_parse_interleaved_duplicates_use_first_seen_order() {
        let state = parse_query_string("genre=Animation&year=2020&genre=Comedy", KNOWN, false);
        assert_eq!(
            serialize_query_state(&state),
            "genre=Animation&genre=Comedy&year=2020"
        );
    }

    #[test]
    fn test_parse_query_pairs_keeps_order_and_decodes() {
        let pairs = parse_query_pairs("genre=Sci-Fi+%26+Fantasy&year%3E=2000&flag");
        assert_eq!(
            pairs,
            vec![
                ("genre".to_string(), "Sci-Fi & Fantasy".to_string()),
                ("year>".to_string(), "2000".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
        assert!(parse_query_pairs("").is_empty());
    }

    #[test]
    fn test_parse_strict_unknown_field_forces_advanced() {
        let state = parse_query_string("unknown=1", &["genre"], true);
        assert_eq!(state.mode, QueryMode::Advanced);
        assert!(state.groups.is_empty());
        assert_eq!(state.advanced, "unknown=1");
    }

    #[test]
    fn test_parse_lenient_unknown_field_becomes_custom() {
        let state = parse_query_string("unknown=1", &["genre"], false);
        assert_eq!(state.mode, QueryMode::Builder);
        let clause = &state.groups[0].clauses[0];
        assert_eq!(clause.field, "unknown");
        assert_eq!(clause.op, QueryOp::Custom);
    }

    #[test]
    fn test_parse_keeps_blank_values() {
        let state = parse_query_string("genre=&year=2020", KNOWN, false);
        let clauses = &state.groups[0].clauses;
        assert_eq!(clauses[0].values, vec![""]);
        assert_eq!(serialize_query_state(&state), "genre=&year=2020");
    }

    #[test]
    fn test_parse_skips_empty_segments() {
        let state = parse_query_string("genre=Animation&&year=2020", KNOWN, false);
        assert_eq!(state.groups[0].clauses.len(), 2);
    }

    #[test]
    fn test_serialize_builder_repeats_keys() {
        let state = QueryState {
            mode: QueryMode::Builder,
            groups: vec![QueryGroup {
                clauses: vec![QueryClause {
                    field: "genre".to_string(),
                    op: QueryOp::Eq,
                    values: vec!["Animation".to_string(), "Comedy".to_string()],
                }],
            }],
            advanced: String::new(),
        };
        assert_eq!(serialize_query_state(&state), "genre=Animation&genre=Comedy");
    }

    #[test]
    fn test_serialize_advanced_trims_whitespace() {
        let state = QueryState {
            mode: QueryMode::Advanced,
            groups: Vec::new(),
            advanced: "  genre=Animation  ".to_string(),
        };
        assert_eq!(serialize_query_state(&state), "genre=Animation");
    }

    #[test]
    fn test_serialize_empty_state_is_empty_string() {
        assert_eq!(serialize_query_state(&QueryState::default()), "");
    }

    #[test]
    fn test_round_trip_known_fields_is_identity() {
        let inputs = [
            "genre=Animation&genre=Comedy",
            "genre=Animation&year=2020&genre=Comedy",
            "year=2020",
            "genre=",
        ];
        for input in inputs {
            let state = parse_query_string(input, KNOWN, false);
            let serialized = serialize_query_state(&state);
            let reparsed = parse_query_string(&serialized, KNOWN, false);
            assert_eq!(serialized, input, "serialize(parse({:?}))", input);
            assert_eq!(reparsed, state, "parse(serialize(parse({:?})))", input);
        }
    }

    #[test]
    fn test_round_trip_encodes_spaces_as_plus() {
        let state = parse_query_string("studio=Warner+Bros", KNOWN, false);
        assert_eq!(state.groups[0].clauses[0].values, vec!["Warner Bros"]);
        assert_eq!(serialize_query_state(&state), "studio=Warner+Bros");
    }

    #[test]
    fn test_round_trip_percent_encoded_value() {
        let raw = "genre=Science%20Fiction";
        let state = parse_query_string(raw, KNOWN, false);
        assert_eq!(state.groups[0].clauses[0].values, vec!["Science Fiction"]);
        // Canonical form uses + for spaces.
        assert_eq!(serialize_query_state(&state), "genre=Science+Fiction");
    }

    #[test]
    fn test_gte_marker_survives_round_trip() {
        let state = parse_query_string("year%3E=2010", KNOWN, false);
        let clause = &state.groups[0].clauses[0];
        assert_eq!(clause.field, "year");
        assert_eq!(clause.op, QueryOp::Gte);
        assert_eq!(clause.values, vec!["2010"]);
        assert_eq!(serialize_query_state(&state), "year%3E=2010");
    }

    #[test]
    fn test_lte_marker_survives_round_trip() {
        let state = parse_query_string("year%3C=1999", KNOWN, false);
        let clause = &state.groups[0].clauses[0];
        assert_eq!(clause.op, QueryOp::Lte);
        assert_eq!(serialize_query_state(&state), "year%3C=1999");
    }

    #[test]
    fn test_comparison_marker_on_unknown_field_stays_custom() {
        let state = parse_query_string("foo%3E=1", KNOWN, false);
        let clause = &state.groups[0].clauses[0];
        assert_eq!(clause.field, "foo>");
        assert_eq!(clause.op, QueryOp::Custom);
        assert_eq!(serialize_query_state(&state), "foo%3E=1");
    }

    #[test]
    fn test_same_field_different_ops_stay_separate_clauses() {
        let state = parse_query_string("year%3E=2000&year%3C=2010&year=2005", KNOWN, false);
        let clauses = &state.groups[0].clauses;
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].op, QueryOp::Gte);
        assert_eq!(clauses[1].op, QueryOp::Lte);
        assert_eq!(clauses[2].op, QueryOp::Eq);
        assert_eq!(
            serialize_query_state(&state),
            "year%3E=2000&year%3C=2010&year=2005"
        );
    }

    #[test]
    fn test_to_value_and_back_is_lossless() {
        let state = parse_query_string("genre=Animation&year%3E=2010&genre=Comedy", KNOWN, false);
        let value = query_state_to_value(&state);
        let rebuilt = query_state_from_value(&value);
        assert_eq!(rebuilt, state);
    }

    #[test]
    fn test_from_value_tolerates_missing_fields() {
        let state = query_state_from_value(&serde_json::json!({}));
        assert_eq!(state, QueryState::default());

        let state = query_state_from_value(&serde_json::json!(null));
        assert_eq!(state, QueryState::default());
    }

    #[test]
    fn test_from_value_accepts_camel_case_advanced_alias() {
        let state = query_state_from_value(&serde_json::json!({
            "mode": "advanced",
            "advancedQuery": "  raw=1  ",
        }));
        assert_eq!(state.mode, QueryMode::Advanced);
        assert_eq!(state.advanced, "raw=1");
    }

    #[test]
    fn test_from_value_coerces_scalar_values_to_list() {
        let state = query_state_from_value(&serde_json::json!({
            "mode": "builder",
            "groups": [{"clauses": [{"field": "year", "op": "eq", "values": 2020}]}],
        }));
        assert_eq!(state.groups[0].clauses[0].values, vec!["2020"]);
    }

    #[test]
    fn test_from_value_unknown_op_becomes_custom() {
        let state = query_state_from_value(&serde_json::json!({
            "groups": [{"clauses": [{"field": "year", "op": "bogus", "values": ["1"]}]}],
        }));
        assert_eq!(state.groups[0].clauses[0].op, QueryOp::Custom);
    }

    #[test]
    fn test_from_value_missing_op_defaults_to_eq() {
        let state = query_state_from_value(&serde_json::json!({
            "groups": [{"clauses": [{"field": "genre", "values": ["Drama"]}]}],
        }));
        assert_eq!(state.groups[0].clauses[0].op, QueryOp::Eq);
    }

    #[test]
    fn test_from_value_unknown_mode_falls_back_to_builder() {
        let state = query_state_from_value(&serde_json::json!({"mode": "wizard"}));
        assert_eq!(state.mode, QueryMode::Builder);
    }
}
