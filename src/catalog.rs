use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::authorize::AuthorizeError;
use crate::config::ConfigError;
use crate::models::playlist::{Playlist, PlaylistItems};
use crate::models::search::PlaylistSearch;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status: {status} - {message}")]
    Status { status: u16, message: String },
    #[error("Unexpected id or uri: {0}")]
    InvalidId(String),
    #[error("Authorization failed: {0}")]
    Authorize(#[from] AuthorizeError),
}

/// The subset of the catalog API the handlers need.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn playlist(&self, playlist_id: &str) -> Result<Playlist, CatalogError>;

    /// First page of a playlist's items.
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<PlaylistItems, CatalogError>;

    /// Follows a `next` cursor taken from a previous page.
    async fn next_tracks(&self, next: &str) -> Result<PlaylistItems, CatalogError>;

    async fn search_playlists(&self, query: &str, limit: i64)
        -> Result<PlaylistSearch, CatalogError>;
}

/// Hands out an authenticated catalog client for one request.
pub trait CatalogSource: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn Catalog>, ConfigError>;
}

/// Accepts a bare playlist id, a `spotify:playlist:` uri or an
/// `open.spotify.com/playlist/` link and returns the id.
pub fn parse_playlist_id(input: &str) -> Result<&str, CatalogError> {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix("spotify:") {
        return match rest.split_once(':') {
            Some(("playlist", id)) if !id.is_empty() => Ok(id),
            _ => Err(CatalogError::InvalidId(input.to_string())),
        };
    }
    if input.starts_with("http://") || input.starts_with("https://") {
        let id = input
            .split_once("/playlist/")
            .map(|(_, rest)| rest.split(['?', '/', '#']).next().unwrap_or(rest))
            .filter(|id| !id.is_empty());
        return id.ok_or_else(|| CatalogError::InvalidId(input.to_string()));
    }
    Ok(input)
}
