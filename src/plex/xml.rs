//! Plex API XML response parsing
//!
//! Every endpoint answers with a MediaContainer root whose direct
//! children carry the interesting attributes. Parsing flattens that
//! one level; nested media detail below the children is ignored.

use crate::model::{LibrarySection, MediaItem, MediaKind, PlaylistInfo};
use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::str::FromStr;

/// One element directly under the response root, attributes flattened
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// Element name, e.g. `Video` or `Directory`
    pub name: String,

    /// Attribute values keyed by attribute name
    pub attrs: HashMap<String, String>,
}

impl XmlElement {
    /// Attribute value, or empty when absent
    pub fn attr(&self, name: &str) -> &str {
        self.attrs.get(name).map(String::as_str).unwrap_or("")
    }

    /// Attribute value, or None when the attribute is absent
    pub fn opt_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Parsed MediaContainer response: root attributes plus direct children
#[derive(Debug, Clone, Default)]
pub struct MediaContainer {
    /// Attributes on the MediaContainer root element
    pub attrs: HashMap<String, String>,

    /// Direct child elements in document order
    pub children: Vec<XmlElement>,
}

impl MediaContainer {
    /// Value of the totalSize attribute, when present and numeric
    pub fn total_size(&self) -> Option<usize> {
        self.attrs.get("totalSize").and_then(|raw| raw.parse().ok())
    }

    /// Direct children with the given element name, in document order
    pub fn children_named(&self, name: &str) -> Vec<&XmlElement> {
        self.children
            .iter()
            .filter(|child| child.name == name)
            .collect()
    }
}

/// Parse an API response body into its container and children
pub fn parse_container(xml: &str) -> Result<MediaContainer> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<MediaContainer> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth == 1 {
                    root = Some(MediaContainer {
                        attrs: collect_attrs(&e)?,
                        children: Vec::new(),
                    });
                } else if depth == 2 {
                    if let Some(container) = root.as_mut() {
                        container.children.push(element_from(&e)?);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if depth == 1 {
                    if let Some(container) = root.as_mut() {
                        container.children.push(element_from(&e)?);
                    }
                } else if depth == 0 && root.is_none() {
                    root = Some(MediaContainer {
                        attrs: collect_attrs(&e)?,
                        children: Vec::new(),
                    });
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(error) => bail!(
                "XML parse error at position {}: {error}",
                reader.buffer_position()
            ),
            _ => {}
        }
    }

    root.ok_or_else(|| anyhow!("Response contained no XML document"))
}

fn element_from(event: &BytesStart<'_>) -> Result<XmlElement> {
    Ok(XmlElement {
        name: String::from_utf8_lossy(event.name().as_ref()).into_owned(),
        attrs: collect_attrs(event)?,
    })
}

fn collect_attrs(event: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in event.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

/// Convert a show listing entry
pub fn element_to_show(element: &XmlElement) -> MediaItem {
    MediaItem::new(
        element.attr("ratingKey").to_string(),
        element.attr("title").to_string(),
        MediaKind::Show,
    )
}

/// Convert an episode entry from an allLeaves listing
pub fn element_to_episode(element: &XmlElement) -> MediaItem {
    let mut item = MediaItem::new(
        element.attr("ratingKey").to_string(),
        element.attr("title").to_string(),
        MediaKind::Episode,
    );
    item.show_title = element.opt_attr("grandparentTitle").map(str::to_string);
    item.season = parse_number(element.attr("parentIndex"));
    item.episode = parse_number(element.attr("index"));
    item.released = parse_date(element.attr("originallyAvailableAt"));
    item.view_count = parse_number(element.attr("viewCount"));
    item.last_viewed_at = parse_number(element.attr("lastViewedAt"));
    item
}

/// Convert a movie entry from a section or collection listing
pub fn element_to_movie(element: &XmlElement) -> MediaItem {
    let mut item = MediaItem::new(
        element.attr("ratingKey").to_string(),
        element.attr("title").to_string(),
        MediaKind::Movie,
    );
    item.released = parse_date(element.attr("originallyAvailableAt"));
    item.view_count = parse_number(element.attr("viewCount"));
    item.last_viewed_at = parse_number(element.attr("lastViewedAt"));
    item
}

/// Convert a collection listing entry
pub fn element_to_collection(element: &XmlElement) -> MediaItem {
    MediaItem::new(
        element.attr("ratingKey").to_string(),
        element.attr("title").to_string(),
        MediaKind::Collection,
    )
}

/// Convert a library section entry
pub fn element_to_section(element: &XmlElement) -> LibrarySection {
    LibrarySection {
        key: element.attr("key").to_string(),
        title: element.attr("title").to_string(),
        section_type: element.attr("type").to_string(),
    }
}

/// Convert a playlist listing entry
pub fn element_to_playlist(element: &XmlElement) -> PlaylistInfo {
    PlaylistInfo {
        rating_key: element.attr("ratingKey").to_string(),
        title: element.attr("title").to_string(),
        playlist_type: element.attr("playlistType").to_string(),
    }
}

fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}
