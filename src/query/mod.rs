//! Structured query model and field catalog
//!
//! Translates between the flat query strings stored in config (and sent
//! to the Plex API) and a structured clause representation that survives
//! round trips for all known fields.

mod catalog;
mod state;

pub use catalog::{
    known_field_keys, normalize_facet_source, supported_facet_sources, QueryField, QUERY_FIELDS,
};
pub use state::{
    parse_query_pairs, parse_query_string, query_state_from_value, query_state_to_value,
    serialize_query_state, QueryClause, QueryGroup, QueryMode, QueryOp, QueryState,
};
