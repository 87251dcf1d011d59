use serde::{Deserialize, Serialize};

use crate::models::image::Image;
use crate::models::page::Page;
use crate::models::track::Track;
use crate::models::{empty_as_none, ExternalUrls};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Owner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: Owner,
    pub images: Option<Vec<Image>>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistItem {
    pub added_at: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub track: Option<Track>,
}

pub type PlaylistItems = Page<PlaylistItem>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TracksRef {
    #[serde(default)]
    pub href: String,
    pub total: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimplifiedPlaylist {
    pub id: String,
    pub name: String,
    pub owner: Owner,
    pub tracks: TracksRef,
    pub images: Option<Vec<Image>>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}
