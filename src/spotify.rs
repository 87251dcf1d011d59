use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::authorize::{request_access_token, Access, ClientCredentials};
use crate::catalog::{parse_playlist_id, Catalog, CatalogError, CatalogSource};
use crate::config::ConfigError;
use crate::models::playlist::{Playlist, PlaylistItems};
use crate::models::search::PlaylistSearch;
use crate::{api_endpoint, authorization_endpoint};

/// Token cache shared by every client built from the same source. It is
/// keyed by client id so rotated credentials never reuse a stale token.
type SharedAccess = Arc<Mutex<Option<(String, Access)>>>;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Base URLs of the Web API and the accounts service.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api: String,
    pub accounts: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            api: api_endpoint!(""),
            accounts: authorization_endpoint!(""),
        }
    }
}

impl Endpoints {
    fn api(&self, path: &str) -> String {
        format!("{}{path}", self.api.trim_end_matches('/'))
    }

    fn token(&self) -> String {
        format!("{}/api/token", self.accounts.trim_end_matches('/'))
    }
}

pub struct SpotifyClient {
    http: Client,
    credentials: ClientCredentials,
    access: SharedAccess,
    endpoints: Endpoints,
}

impl SpotifyClient {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    pub fn with_endpoints(credentials: ClientCredentials, endpoints: Endpoints) -> Self {
        SpotifyClient {
            http: Client::new(),
            credentials,
            access: SharedAccess::default(),
            endpoints,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let request_builder = self.http.get(url).query(query);
        let request = {
            let mut cached = self.access.lock().await;
            let fresh = match cached.as_ref() {
                Some((client_id, access)) => {
                    *client_id == self.credentials.client_id && !access.is_expired()
                }
                None => false,
            };
            if !fresh {
                let access =
                    request_access_token(&self.http, &self.endpoints.token(), &self.credentials)
                        .await?;
                *cached = Some((self.credentials.client_id.clone(), access));
            }
            match cached.as_ref() {
                Some((_, access)) => access.authorize(request_builder).build()?,
                None => request_builder.build()?,
            }
        };
        let resp = self.http.execute(request).await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, CatalogError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }
    let message = match resp.json::<ApiErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
    };
    Err(CatalogError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn playlist(&self, playlist_id: &str) -> Result<Playlist, CatalogError> {
        let playlist_id = parse_playlist_id(playlist_id)?;
        self.get(
            &self.endpoints.api(&format!("/playlists/{playlist_id}")),
            &[("additional_types", "track".to_string())],
        )
        .await
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<PlaylistItems, CatalogError> {
        let playlist_id = parse_playlist_id(playlist_id)?;
        self.get(
            &self.endpoints.api(&format!("/playlists/{playlist_id}/tracks")),
            &[
                ("limit", "100".to_string()),
                ("additional_types", "track".to_string()),
            ],
        )
        .await
    }

    async fn next_tracks(&self, next: &str) -> Result<PlaylistItems, CatalogError> {
        self.get(next, &[]).await
    }

    async fn search_playlists(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<PlaylistSearch, CatalogError> {
        self.get(
            &self.endpoints.api("/search"),
            &[
                ("q", query.to_string()),
                ("type", "playlist".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}

/// Builds clients from `SPOTIPY_CLIENT_ID`/`SPOTIPY_CLIENT_SECRET`, read anew
/// on every request so a misconfigured deployment fails per call.
#[derive(Default)]
pub struct SpotifyCatalogSource {
    http: Client,
    access: SharedAccess,
}

impl SpotifyCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogSource for SpotifyCatalogSource {
    fn connect(&self) -> Result<Arc<dyn Catalog>, ConfigError> {
        let credentials = ClientCredentials::from_env()?;
        Ok(Arc::new(SpotifyClient {
            http: self.http.clone(),
            credentials,
            access: self.access.clone(),
            endpoints: Endpoints::default(),
        }))
    }
}
