mod add_playlist;
mod search_playlists;
mod seed_users;
mod update_all_folders;

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::catalog::CatalogSource;
use crate::store::{CollectionPath, DocumentPath, DocumentStore};

pub use seed_users::seed_users;

pub const FOLDERS: &str = "qr_playlists";
pub const PLAYLISTS: &str = "playlists";

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// The callable handlers, wired to a catalog source and a document store.
pub struct PlaylistSync {
    catalogs: Arc<dyn CatalogSource>,
    store: Arc<dyn DocumentStore>,
    clock: Clock,
}

impl PlaylistSync {
    pub fn new(catalogs: Arc<dyn CatalogSource>, store: Arc<dyn DocumentStore>) -> Self {
        PlaylistSync {
            catalogs,
            store,
            clock: Arc::new(|| Utc::now().timestamp_millis()),
        }
    }

    /// Replaces the millisecond clock used for the display `order`.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

pub fn folders() -> CollectionPath {
    CollectionPath::root(FOLDERS)
}

pub fn folder_path(folder_name: &str) -> DocumentPath {
    folders().doc(folder_name)
}

pub fn playlist_path(folder_name: &str, playlist_id: &str) -> DocumentPath {
    folder_path(folder_name).collection(PLAYLISTS).doc(playlist_id)
}

/// A request field that is present, a string, and not empty.
fn string_field<'a>(data: &'a Value, name: &str) -> Option<&'a str> {
    data.get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}
