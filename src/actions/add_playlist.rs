use serde_json::Value;

use super::{folder_path, playlist_path, string_field, PlaylistSync};
use crate::caller::{require_caller, Caller};
use crate::error::CallError;
use crate::store::{Write, WriteMode};
use crate::sync::fetch_playlist_data;

impl PlaylistSync {
    /// Stores a playlist under a folder, creating the folder on first use.
    /// Expects `{"playlist_id": "...", "folder_name": "..."}`.
    pub async fn add_playlist(
        &self,
        caller: Option<&Caller>,
        data: &Value,
    ) -> Result<String, CallError> {
        require_caller(caller)?;
        let (Some(playlist_id), Some(folder_name)) = (
            string_field(data, "playlist_id"),
            string_field(data, "folder_name"),
        ) else {
            return Err(CallError::invalid_argument(
                "Missing playlist_id or folder_name",
            ));
        };
        if folder_name.contains('/') {
            return Err(CallError::invalid_argument(
                "folder_name must not contain '/'",
            ));
        }

        self.store_playlist(playlist_id, folder_name)
            .await
            .map_err(|err| {
                log::error!("Error in add_playlist: {}", err.message);
                err
            })
    }

    async fn store_playlist(&self, playlist_id: &str, folder_name: &str) -> Result<String, CallError> {
        let catalog = self.catalogs.connect()?;
        log::info!("Fetching data for playlist {playlist_id} to add to folder {folder_name}");
        let record = fetch_playlist_data(catalog.as_ref(), playlist_id)
            .await
            .map_err(CallError::internal)?;

        // New playlists sort after everything already in the folder.
        let write = Write::from_serialize(&record)
            .map_err(CallError::internal)?
            .field("order", (self.clock)());
        self.store
            .set(&playlist_path(folder_name, &record.id), write, WriteMode::Overwrite)
            .await
            .map_err(CallError::internal)?;

        let folder = Write::default()
            .field("name", folder_name)
            .server_timestamp("last_updated");
        self.store
            .set(&folder_path(folder_name), folder, WriteMode::Merge)
            .await
            .map_err(CallError::internal)?;

        log::info!("Successfully added playlist {} to {folder_name}", record.name);
        Ok(format!(
            "Playlist '{}' stored in folder '{folder_name}'.",
            record.name
        ))
    }
}
