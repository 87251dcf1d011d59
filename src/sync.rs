use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::models::record::{PlaylistRecord, TrackRecord};

#[derive(Debug, Error)]
#[error("Error fetching playlist data: {source}")]
pub struct SyncError {
    #[from]
    source: CatalogError,
}

/// Fetches a playlist and every page of its tracks. Items without a track
/// or album are skipped. Any catalog failure, including one halfway through
/// the pages, discards what was collected.
pub async fn fetch_playlist_data(
    catalog: &dyn Catalog,
    playlist_id: &str,
) -> Result<PlaylistRecord, SyncError> {
    let playlist = catalog.playlist(playlist_id).await?;
    let mut tracks = Vec::new();
    let mut page = catalog.playlist_tracks(playlist_id).await?;
    loop {
        let next = page.next.take();
        tracks.extend(
            page.items
                .into_iter()
                .filter_map(|item| item.track)
                .filter_map(TrackRecord::from_track),
        );
        match next {
            Some(next) => page = catalog.next_tracks(&next).await?,
            None => break,
        }
    }
    Ok(PlaylistRecord::from_playlist(playlist, tracks))
}
