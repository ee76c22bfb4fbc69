//! Plex server integration
//!
//! A thin XML-over-HTTP client for the endpoints the assembler needs,
//! plus a process-wide cache for query builder facet values.

mod client;
mod facets;
mod xml;

pub use client::PlexClient;
pub use facets::{cached_filter_options, normalize_values, FacetCache};
pub use xml::{parse_container, MediaContainer, XmlElement};
