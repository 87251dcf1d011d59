use thiserror::Error;

use super::{folder_path, folders, playlist_path, PlaylistSync, PLAYLISTS};
use crate::caller::{require_caller, Caller};
use crate::catalog::Catalog;
use crate::error::CallError;
use crate::store::{StoreError, Write, WriteMode};
use crate::sync::{fetch_playlist_data, SyncError};

#[derive(Debug, Error)]
enum RefreshError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlaylistSync {
    /// Re-fetches every stored playlist and merges the fresh data over the
    /// stored document, so `order` and any other extra fields survive.
    /// A playlist that fails is reported in the summary and skipped.
    pub async fn update_all_folders(&self, caller: Option<&Caller>) -> Result<String, CallError> {
        require_caller(caller)?;
        self.refresh_all().await.map_err(|err| {
            log::error!("Fatal error in update_all_folders: {}", err.message);
            err
        })
    }

    async fn refresh_all(&self) -> Result<String, CallError> {
        let catalog = self.catalogs.connect().map_err(CallError::internal)?;
        log::info!("Starting update of all folders...");
        let folders = self.store.list(&folders()).await.map_err(CallError::internal)?;

        let mut updated_count = 0;
        let mut errors = Vec::new();
        for folder in folders {
            let folder_name = folder.id.as_str();
            let playlists = self
                .store
                .list(&folder_path(folder_name).collection(PLAYLISTS))
                .await
                .map_err(CallError::internal)?;

            for playlist in playlists {
                let Some(playlist_id) = playlist.str_field("id").filter(|id| !id.is_empty()) else {
                    continue;
                };
                match self
                    .refresh_playlist(catalog.as_ref(), folder_name, playlist_id)
                    .await
                {
                    Ok(()) => updated_count += 1,
                    Err(err) => {
                        let error_msg = format!(
                            "Error updating playlist {playlist_id} in {folder_name}: {err}"
                        );
                        log::error!("{error_msg}");
                        errors.push(error_msg);
                    }
                }
            }
        }

        let mut response_msg = format!("Updated {updated_count} playlists.");
        if !errors.is_empty() {
            response_msg.push_str(&format!(" Errors: {}", errors.join("; ")));
        }
        Ok(response_msg)
    }

    async fn refresh_playlist(
        &self,
        catalog: &dyn Catalog,
        folder_name: &str,
        playlist_id: &str,
    ) -> Result<(), RefreshError> {
        let record = fetch_playlist_data(catalog, playlist_id).await?;
        self.store
            .set(
                &playlist_path(folder_name, playlist_id),
                Write::from_serialize(&record)?,
                WriteMode::Merge,
            )
            .await?;
        Ok(())
    }
}
