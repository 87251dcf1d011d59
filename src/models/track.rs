use serde::{Deserialize, Serialize};

use crate::models::album::Album;
use crate::models::artist::SimplifiedArtist;
use crate::models::{empty_as_none, ExternalUrls};

/// Local files and removed tracks come back with a null id or album.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub album: Option<Album>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub duration_ms: u64,
    pub popularity: Option<u32>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}
