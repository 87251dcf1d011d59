use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CLIENT_ID_VAR: &str = "SPOTIPY_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIPY_CLIENT_SECRET";
pub const CALLER_TOKENS_VAR: &str = "QR_PLAYLISTS_CALLER_TOKENS";
pub const FIRESTORE_TOKEN_VAR: &str = "FIRESTORE_ACCESS_TOKEN";
pub const FIRESTORE_EMULATOR_VAR: &str = "FIRESTORE_EMULATOR_HOST";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SPOTIPY_CLIENT_ID and SPOTIPY_CLIENT_SECRET must be set as environment variables.")]
    MissingCredentials,
    #[error("A project id is required for the firestore store.")]
    MissingProject,
    #[error("FIRESTORE_ACCESS_TOKEN or FIRESTORE_EMULATOR_HOST must be set for the firestore store.")]
    MissingFirestoreAccess,
    #[error("Invalid firestore endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Error reading config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Error parsing config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reads a variable, treating an empty value as unset.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Firestore,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StoreKind::Memory),
            "firestore" => Ok(StoreKind::Firestore),
            other => Err(format!("unknown store '{other}'")),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfigFile {
    pub address: Option<IpAddr>,
    pub port: Option<u16>,
    pub store: Option<StoreKind>,
    pub project: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub store: StoreKind,
    pub project: Option<String>,
}

impl From<ServerConfigFile> for ServerConfig {
    fn from(file_config: ServerConfigFile) -> Self {
        ServerConfig {
            address: file_config
                .address
                .unwrap_or(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: file_config.port.unwrap_or(8080),
            store: file_config.store.unwrap_or_default(),
            project: file_config.project,
        }
    }
}

impl ServerConfigFile {
    /// A missing file is not an error; every field has a default.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(ServerConfigFile::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Values given on the command line win over the file.
    pub fn overridden_by(self, other: ServerConfigFile) -> Self {
        ServerConfigFile {
            address: other.address.or(self.address),
            port: other.port.or(self.port),
            store: other.store.or(self.store),
            project: other.project.or(self.project),
        }
    }
}
