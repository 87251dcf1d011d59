mod firestore;
mod memory;
mod path;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use path::{CollectionPath, DocumentPath};

pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Document store returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replaces the whole document.
    Overwrite,
    /// Updates the given fields (recursing into maps) and keeps the rest.
    Merge,
}

/// Field values plus the fields the store should stamp with its own clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Write {
    pub fields: Fields,
    pub server_timestamps: Vec<String>,
}

impl Write {
    pub fn new(fields: Fields) -> Self {
        Write {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    /// Serializes a struct into top-level fields.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, StoreError> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Write::new(fields)),
            other => Err(StoreError::InvalidDocument(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn server_timestamp(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self.server_timestamps.push(name.to_string());
        self
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    async fn set(&self, path: &DocumentPath, write: Write, mode: WriteMode)
        -> Result<(), StoreError>;

    /// Documents of one collection, ordered by id.
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError>;
}

/// Leaf field paths of `fields`, the way a merge write addresses them.
pub(crate) fn leaf_paths(fields: &Fields) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    for (name, value) in fields {
        match value {
            Value::Object(inner) if !inner.is_empty() => {
                for mut rest in leaf_paths(inner) {
                    rest.insert(0, name.clone());
                    paths.push(rest);
                }
            }
            _ => paths.push(vec![name.clone()]),
        }
    }
    paths
}
