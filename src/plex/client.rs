//! HTTP client for the Plex media server API

use super::facets::normalize_values;
use super::xml::{
    element_to_collection, element_to_episode, element_to_movie, element_to_playlist,
    element_to_section, element_to_show, parse_container, MediaContainer, XmlElement,
};
use crate::config::PlexConfig;
use crate::model::{LibrarySection, MediaItem, PlaylistInfo};
use crate::query::parse_query_pairs;
use crate::source::CatalogSource;
use anyhow::{anyhow, bail, Context, Result};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use ureq::Agent;

/// Identifier sent as X-Plex-Client-Identifier unless configured
const DEFAULT_CLIENT_ID: &str = "plex-shuffler-studio";

/// Product name sent with every request
const PRODUCT_NAME: &str = "Plex Shuffler Studio";

/// Items requested per page on listing endpoints
const PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Copy)]
enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Client for one Plex server, safe to share across fetch workers
pub struct PlexClient {
    agent: Agent,
    base_url: String,
    token: String,
    client_id: String,
    machine_id: Mutex<Option<String>>,
}

impl PlexClient {
    /// Build a client from the connection section of the config
    pub fn new(plex: &PlexConfig) -> Self {
        let timeout = plex.timeout_seconds.max(1) as u64;
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(timeout)))
            .build();
        let client_id = if plex.client_id.trim().is_empty() {
            DEFAULT_CLIENT_ID.to_string()
        } else {
            plex.client_id.trim().to_string()
        };
        Self {
            agent: config.into(),
            base_url: plex.url.trim_end_matches('/').to_string(),
            token: plex.token.clone(),
            client_id,
            machine_id: Mutex::new(None),
        }
    }

    /// All library sections on the server
    pub fn get_sections(&self) -> Result<Vec<LibrarySection>> {
        let container = self.fetch(HttpMethod::Get, "/library/sections", &[])?;
        Ok(container
            .children_named("Directory")
            .into_iter()
            .map(element_to_section)
            .collect())
    }

    /// Find a library section by its title, case-insensitively
    pub fn get_section_by_title(&self, title: &str) -> Result<LibrarySection> {
        let wanted = title.trim().to_lowercase();
        self.get_sections()?
            .into_iter()
            .find(|section| section.title.trim().to_lowercase() == wanted)
            .ok_or_else(|| anyhow!("Library section not found: {title}"))
    }

    /// All shows in a section, with extra query pairs appended
    pub fn get_shows(
        &self,
        section_key: &str,
        query: &[(String, String)],
    ) -> Result<Vec<MediaItem>> {
        let mut params = vec![("type".to_string(), "2".to_string())];
        params.extend(query.iter().cloned());
        let elements =
            self.fetch_paged(&format!("/library/sections/{section_key}/all"), &params)?;
        Ok(elements
            .into_iter()
            .filter(|e| e.name == "Directory" && e.attr("type") == "show")
            .map(|e| element_to_show(&e))
            .collect())
    }

    /// Every episode of a show across all seasons
    pub fn get_show_episodes(&self, show_key: &str) -> Result<Vec<MediaItem>> {
        let elements =
            self.fetch_paged(&format!("/library/metadata/{show_key}/allLeaves"), &[])?;
        Ok(elements
            .into_iter()
            .filter(|e| e.name == "Video" && e.attr("type") == "episode")
            .map(|e| element_to_episode(&e))
            .collect())
    }

    /// All movies in a section, with extra query pairs appended
    pub fn get_movies(
        &self,
        section_key: &str,
        query: &[(String, String)],
    ) -> Result<Vec<MediaItem>> {
        let mut params = vec![("type".to_string(), "1".to_string())];
        params.extend(query.iter().cloned());
        let elements =
            self.fetch_paged(&format!("/library/sections/{section_key}/all"), &params)?;
        Ok(elements
            .into_iter()
            .filter(|e| e.name == "Video" && e.attr("type") == "movie")
            .map(|e| element_to_movie(&e))
            .collect())
    }

    /// Collections in a section
    ///
    /// Older servers lack the collections endpoint; those fall back to
    /// the section listing filtered to the collection metadata type.
    pub fn get_collections(
        &self,
        section_key: &str,
        query: &[(String, String)],
    ) -> Result<Vec<MediaItem>> {
        let params = query.to_vec();
        let elements = match self.fetch_paged(
            &format!("/library/sections/{section_key}/collections"),
            &params,
        ) {
            Ok(elements) => elements,
            Err(error) => {
                log::warn!("Collections endpoint failed, retrying with fallback: {error:#}");
                let mut fallback = params.clone();
                fallback.push(("type".to_string(), "18".to_string()));
                self.fetch_paged(&format!("/library/sections/{section_key}/all"), &fallback)?
            }
        };
        Ok(elements
            .into_iter()
            .filter(|e| {
                e.name == "Directory"
                    && matches!(e.attr("type"), "collection" | "collectionGroup")
            })
            .map(|e| element_to_collection(&e))
            .collect())
    }

    /// Movies inside one collection
    pub fn get_collection_items(&self, collection_key: &str) -> Result<Vec<MediaItem>> {
        let elements =
            self.fetch_paged(&format!("/library/metadata/{collection_key}/children"), &[])?;
        Ok(elements
            .into_iter()
            .filter(|e| e.name == "Video" && e.attr("type") == "movie")
            .map(|e| element_to_movie(&e))
            .collect())
    }

    /// Distinct option values for a section facet such as `genre`
    pub fn get_filter_options(
        &self,
        section_key: &str,
        source: &str,
        media_type: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut params: Vec<(String, String)> = Vec::new();
        if let Some(media_type) = media_type {
            if let Some(type_value) = media_type_param(media_type) {
                params.push(("type".to_string(), type_value.to_string()));
            }
        }
        let result = self.fetch(
            HttpMethod::Get,
            &format!("/library/sections/{section_key}/{source}"),
            &params,
        );
        match result {
            Ok(container) => Ok(normalize_values(collect_option_values(&container))),
            Err(error) => {
                if source == "collection" {
                    log::debug!("Falling back to collection titles for options: {error:#}");
                    let collections = self.get_collections(section_key, &[])?;
                    Ok(normalize_values(collections.into_iter().map(|c| c.title)))
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Playlists on the server, optionally filtered by exact title
    pub fn get_playlists(&self, title: Option<&str>) -> Result<Vec<PlaylistInfo>> {
        let mut params: Vec<(String, String)> = Vec::new();
        if let Some(title) = title {
            if !title.is_empty() {
                params.push(("title".to_string(), title.to_string()));
            }
        }
        let container = self.fetch(HttpMethod::Get, "/playlists", &params)?;
        Ok(container
            .children_named("Playlist")
            .into_iter()
            .map(element_to_playlist)
            .collect())
    }

    /// Create a playlist from the given items, in order
    pub fn create_playlist(
        &self,
        title: &str,
        rating_keys: &[String],
        kind: &str,
    ) -> Result<PlaylistInfo> {
        if rating_keys.is_empty() {
            bail!("Cannot create playlist without items");
        }
        let uri = self.metadata_uri(rating_keys)?;
        let params = vec![
            ("uri".to_string(), uri),
            ("type".to_string(), kind.to_string()),
            ("title".to_string(), title.to_string()),
            ("smart".to_string(), "0".to_string()),
        ];
        let container = self.fetch(HttpMethod::Post, "/playlists", &params)?;
        let playlist = container
            .children_named("Playlist")
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Playlist creation failed: no playlist returned"))?;
        Ok(PlaylistInfo {
            rating_key: playlist.attr("ratingKey").to_string(),
            title: playlist.opt_attr("title").unwrap_or(title).to_string(),
            playlist_type: playlist.opt_attr("playlistType").unwrap_or(kind).to_string(),
        })
    }

    /// Append items to an existing playlist, in order
    pub fn add_playlist_items(&self, playlist_key: &str, rating_keys: &[String]) -> Result<()> {
        if rating_keys.is_empty() {
            return Ok(());
        }
        let uri = self.metadata_uri(rating_keys)?;
        let params = vec![("uri".to_string(), uri)];
        self.fetch(
            HttpMethod::Put,
            &format!("/playlists/{playlist_key}/items"),
            &params,
        )?;
        Ok(())
    }

    /// Delete a playlist by its rating key
    pub fn delete_playlist(&self, playlist_key: &str) -> Result<()> {
        self.fetch(HttpMethod::Delete, &format!("/playlists/{playlist_key}"), &[])?;
        Ok(())
    }

    /// The server's machine identifier, fetched once and cached
    pub fn machine_identifier(&self) -> Result<String> {
        let mut cached = self
            .machine_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let container = self.fetch(HttpMethod::Get, "/identity", &[])?;
        let mut identifier = container
            .attrs
            .get("machineIdentifier")
            .cloned()
            .filter(|value| !value.is_empty());
        if identifier.is_none() {
            identifier = container
                .children_named("Server")
                .first()
                .map(|server| server.attr("machineIdentifier").to_string())
                .filter(|value| !value.is_empty());
        }
        let identifier = identifier
            .ok_or_else(|| anyhow!("Unable to determine Plex machine identifier from /identity"))?;

        *cached = Some(identifier.clone());
        Ok(identifier)
    }

    fn metadata_uri(&self, rating_keys: &[String]) -> Result<String> {
        let machine = self.machine_identifier()?;
        Ok(format!(
            "server://{machine}/com.plexapp.plugins.library/library/metadata/{}",
            rating_keys.join(",")
        ))
    }

    /// Fetch every page of a listing endpoint
    fn fetch_paged(&self, path: &str, params: &[(String, String)]) -> Result<Vec<XmlElement>> {
        let mut elements = Vec::new();
        let mut start = 0usize;
        loop {
            let mut page_params = params.to_vec();
            page_params.push(("X-Plex-Container-Start".to_string(), start.to_string()));
            page_params.push(("X-Plex-Container-Size".to_string(), PAGE_SIZE.to_string()));
            let container = self.fetch(HttpMethod::Get, path, &page_params)?;
            let total = container.total_size();
            let page_count = container.children.len();
            elements.extend(container.children);
            match next_page_start(total, elements.len(), page_count) {
                Some(next) => start = next,
                None => break,
            }
        }
        Ok(elements)
    }

    fn fetch(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(String, String)],
    ) -> Result<MediaContainer> {
        let url = self.build_url(path, params);
        let body = self.execute(method, &url)?;
        parse_container(&body).with_context(|| {
            let snippet: String = body.chars().take(200).collect();
            format!("Invalid Plex API response from {url}: {snippet}")
        })
    }

    fn execute(&self, method: HttpMethod, url: &str) -> Result<String> {
        log::debug!("{} {url}", method.as_str());
        let result = match method {
            HttpMethod::Get => self.with_headers(self.agent.get(url)).call(),
            HttpMethod::Delete => self.with_headers(self.agent.delete(url)).call(),
            HttpMethod::Post => self.with_headers(self.agent.post(url)).send_empty(),
            HttpMethod::Put => self.with_headers(self.agent.put(url)).send_empty(),
        };
        let mut response = result.with_context(|| format!("Plex API connection error for {url}"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            bail!("Plex API error {} for {url}: {body}", status.as_u16());
        }
        response
            .body_mut()
            .read_to_string()
            .with_context(|| format!("Failed to read Plex API response from {url}"))
    }

    fn with_headers<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        request
            .header("X-Plex-Token", &self.token)
            .header("X-Plex-Product", PRODUCT_NAME)
            .header("X-Plex-Version", env!("CARGO_PKG_VERSION"))
            .header("X-Plex-Client-Identifier", &self.client_id)
            .header("Accept", "application/xml")
    }

    fn build_url(&self, path: &str, params: &[(String, String)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if !params.is_empty() {
            let query: Vec<String> = params
                .iter()
                .map(|(key, value)| format!("{}={}", encode_param(key), encode_param(value)))
                .collect();
            url = format!("{}?{}", url, query.join("&"));
        }
        url
    }
}

impl CatalogSource for PlexClient {
    fn shows_in_library(&self, library: &str, query: &str) -> Result<Vec<MediaItem>> {
        let section = self.get_section_by_title(library)?;
        self.get_shows(&section.key, &parse_query_pairs(query))
    }

    fn episodes_of_show(&self, show_key: &str) -> Result<Vec<MediaItem>> {
        self.get_show_episodes(show_key)
    }

    fn movies_in_library(&self, library: &str, query: &str) -> Result<Vec<MediaItem>> {
        let section = self.get_section_by_title(library)?;
        self.get_movies(&section.key, &parse_query_pairs(query))
    }

    fn collections_in_library(&self, library: &str, query: &str) -> Result<Vec<MediaItem>> {
        let section = self.get_section_by_title(library)?;
        self.get_collections(&section.key, &parse_query_pairs(query))
    }

    fn collection_items(&self, collection_key: &str) -> Result<Vec<MediaItem>> {
        self.get_collection_items(collection_key)
    }
}

/// Where the next page starts, or None when the listing is complete
fn next_page_start(total: Option<usize>, fetched: usize, page_count: usize) -> Option<usize> {
    match total {
        Some(total) if page_count > 0 && fetched < total => Some(fetched),
        _ => None,
    }
}

/// Map a friendly media type name to the numeric API parameter
fn media_type_param(media_type: &str) -> Option<&'static str> {
    let lowered = media_type.trim().to_lowercase();
    match lowered.as_str() {
        "movie" | "movies" | "1" => Some("1"),
        "show" | "shows" | "tv" | "2" => Some("2"),
        _ => None,
    }
}

fn collect_option_values(container: &MediaContainer) -> Vec<String> {
    let mut values = Vec::new();
    for child in &container.children {
        if child.name != "Directory" && child.name != "Tag" {
            continue;
        }
        let value = ["title", "tag", "name"]
            .iter()
            .map(|attr| child.attr(attr))
            .find(|value| !value.is_empty());
        if let Some(value) = value {
            values.push(value.to_string());
        }
    }
    values
}

fn encode_param(raw: &str) -> String {
    urlencoding::encode(raw).replace("%20", "+")
}
