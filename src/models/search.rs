use serde::{Deserialize, Serialize};

use crate::models::page::Page;
use crate::models::playlist::SimplifiedPlaylist;

/// Response of `/search?type=playlist`. The catalog pads result pages with
/// `null` entries for playlists it can no longer serve.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistSearch {
    pub playlists: Page<Option<SimplifiedPlaylist>>,
}
