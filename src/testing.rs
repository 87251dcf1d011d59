//! In-process fakes of the catalog for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::catalog::{Catalog, CatalogError, CatalogSource};
use crate::config::ConfigError;
use crate::models::page::Page;
use crate::models::playlist::{Playlist, PlaylistItems};
use crate::models::search::PlaylistSearch;

pub fn playlist_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("About {name}"),
        "owner": {"id": "owner", "display_name": format!("Owner of {id}")},
        "images": [{"url": format!("https://img/{id}"), "height": 300, "width": 300}],
        "external_urls": {"spotify": format!("https://open.spotify.com/playlist/{id}")}
    })
}

/// A playlist item wrapping a complete track.
pub fn track_json(id: &str) -> Value {
    json!({
        "added_at": "2024-01-01T00:00:00Z",
        "track": {
            "id": id,
            "name": format!("Song {id}"),
            "artists": [{"id": "a1", "name": "Ann"}, {"id": "a2", "name": "Bob"}],
            "album": {
                "id": format!("album-{id}"),
                "name": format!("Album {id}"),
                "release_date": "2021-06-01",
                "images": [{"url": format!("https://img/album-{id}"), "height": 64, "width": 64}]
            },
            "duration_ms": 180000,
            "popularity": 50,
            "external_urls": {"spotify": format!("https://open.spotify.com/track/{id}")}
        }
    })
}

fn not_found() -> CatalogError {
    CatalogError::Status {
        status: 404,
        message: "Resource not found".into(),
    }
}

fn server_error() -> CatalogError {
    CatalogError::Status {
        status: 500,
        message: "Server error".into(),
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    playlists: Mutex<HashMap<String, (Value, Vec<Vec<Value>>)>>,
    failing_pages: Mutex<HashSet<(String, usize)>>,
    search_items: Vec<Value>,
    calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_playlist(self, playlist: Value, pages: Vec<Vec<Value>>) -> Self {
        self.replace_playlist(playlist, pages);
        self
    }

    pub fn with_search(mut self, items: Vec<Value>) -> Self {
        self.search_items = items;
        self
    }

    pub fn failing_page(self, playlist_id: &str, page: usize) -> Self {
        self.fail_page(playlist_id, page);
        self
    }

    pub fn replace_playlist(&self, playlist: Value, pages: Vec<Vec<Value>>) {
        let id = playlist["id"].as_str().unwrap_or_default().to_string();
        self.playlists.lock().unwrap().insert(id, (playlist, pages));
    }

    pub fn fail_page(&self, playlist_id: &str, page: usize) {
        self.failing_pages
            .lock()
            .unwrap()
            .insert((playlist_id.to_string(), page));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn page(&self, playlist_id: &str, index: usize) -> Result<PlaylistItems, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_pages
            .lock()
            .unwrap()
            .contains(&(playlist_id.to_string(), index))
        {
            return Err(server_error());
        }
        let playlists = self.playlists.lock().unwrap();
        let (_, pages) = playlists.get(playlist_id).ok_or_else(not_found)?;
        let items = pages.get(index).cloned().unwrap_or_default();
        let mut page: PlaylistItems =
            Page::single(serde_json::from_value(Value::Array(items)).unwrap());
        if index + 1 < pages.len() {
            page.next = Some(format!("fake://{playlist_id}/{}", index + 1));
        }
        Ok(page)
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn playlist(&self, playlist_id: &str) -> Result<Playlist, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let playlists = self.playlists.lock().unwrap();
        let (playlist, _) = playlists.get(playlist_id).ok_or_else(not_found)?;
        Ok(serde_json::from_value(playlist.clone()).unwrap())
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<PlaylistItems, CatalogError> {
        self.page(playlist_id, 0)
    }

    async fn next_tracks(&self, next: &str) -> Result<PlaylistItems, CatalogError> {
        let (playlist_id, index) = next
            .strip_prefix("fake://")
            .and_then(|rest| rest.rsplit_once('/'))
            .unwrap();
        self.page(playlist_id, index.parse().unwrap())
    }

    async fn search_playlists(
        &self,
        _query: &str,
        limit: i64,
    ) -> Result<PlaylistSearch, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let items: Vec<Value> = self
            .search_items
            .iter()
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(serde_json::from_value(json!({
            "playlists": {"items": items, "next": null, "previous": null}
        }))
        .unwrap())
    }
}

/// Catalog source over a shared fake, or one that behaves as if the
/// credentials were missing.
pub struct FakeSource {
    catalog: Option<Arc<FakeCatalog>>,
    connects: AtomicUsize,
}

impl FakeSource {
    pub fn new(catalog: Arc<FakeCatalog>) -> Self {
        FakeSource {
            catalog: Some(catalog),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        FakeSource {
            catalog: None,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl CatalogSource for FakeSource {
    fn connect(&self) -> Result<Arc<dyn Catalog>, ConfigError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.catalog {
            Some(catalog) => Ok(catalog.clone()),
            None => Err(ConfigError::MissingCredentials),
        }
    }
}
