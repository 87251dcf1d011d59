use serde::{Deserialize, Serialize};

use crate::models::artist::join_artist_names;
use crate::models::image::first_image_url;
use crate::models::playlist::{Playlist, SimplifiedPlaylist};
use crate::models::track::Track;

/// A track as stored inside a playlist document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackRecord {
    pub id: Option<String>,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub release_date: Option<String>,
    pub duration_ms: u64,
    pub popularity: Option<u32>,
    pub external_url: Option<String>,
    pub image_url: Option<String>,
}

impl TrackRecord {
    /// Returns `None` for tracks without an album, which is how the catalog
    /// reports local files and tombstoned entries.
    pub fn from_track(track: Track) -> Option<Self> {
        let album = track.album?;
        Some(TrackRecord {
            id: track.id,
            name: track.name,
            artist: join_artist_names(&track.artists),
            image_url: first_image_url(Some(album.images.as_slice())),
            album: album.name,
            release_date: album.release_date,
            duration_ms: track.duration_ms,
            popularity: track.popularity,
            external_url: track.external_urls.spotify,
        })
    }
}

/// Normalized snapshot of a catalog playlist. It never carries the display
/// `order`, which is stamped once when the playlist is first stored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaylistRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub image_url: Option<String>,
    pub tracks: Vec<TrackRecord>,
}

impl PlaylistRecord {
    pub fn from_playlist(playlist: Playlist, tracks: Vec<TrackRecord>) -> Self {
        PlaylistRecord {
            image_url: first_image_url(playlist.images.as_deref()),
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            owner: playlist.owner.display_name,
            tracks,
        }
    }
}

/// Search result entry returned to callers, not persisted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub tracks_total: u32,
    pub image_url: Option<String>,
    pub external_url: Option<String>,
}

impl From<SimplifiedPlaylist> for PlaylistSummary {
    fn from(playlist: SimplifiedPlaylist) -> Self {
        PlaylistSummary {
            image_url: first_image_url(playlist.images.as_deref()),
            id: playlist.id,
            name: playlist.name,
            owner: playlist.owner.display_name,
            tracks_total: playlist.tracks.total,
            external_url: playlist.external_urls.spotify,
        }
    }
}
