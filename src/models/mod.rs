pub mod album;
pub mod artist;
pub mod image;
pub mod page;
pub mod playlist;
pub mod record;
pub mod search;
pub mod track;

use serde::de::{DeserializeOwned, Deserializer, Error};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Reads `null` and `{}` alike as `None`. The catalog sends empty objects
/// for tracks and albums it no longer has.
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(fields)) if fields.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(D::Error::custom),
    }
}
