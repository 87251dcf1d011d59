use serde_json::Value;
use thiserror::Error;

use super::{string_field, PlaylistSync};
use crate::caller::{require_caller, Caller};
use crate::error::CallError;
use crate::models::record::PlaylistSummary;

const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Error)]
#[error("invalid limit {0}")]
pub struct InvalidLimit(String);

/// Reads `limit` as an integer: JSON integers, floats (truncated), numeric
/// strings and booleans (`true` is 1) are accepted, absence means the default.
fn search_limit(data: &Value) -> Result<i64, InvalidLimit> {
    match data.get("limit") {
        None | Some(Value::Null) => Ok(DEFAULT_LIMIT),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| InvalidLimit(n.to_string())),
        Some(Value::Bool(flag)) => Ok(i64::from(*flag)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| InvalidLimit(format!("'{s}'"))),
        Some(other) => Err(InvalidLimit(other.to_string())),
    }
}

impl PlaylistSync {
    /// Searches the catalog for playlists. Expects `{"q": "...", "limit": 10}`.
    pub async fn search_playlists(
        &self,
        caller: Option<&Caller>,
        data: &Value,
    ) -> Result<Vec<PlaylistSummary>, CallError> {
        require_caller(caller)?;
        let Some(query) = string_field(data, "q") else {
            return Err(CallError::invalid_argument("Missing query parameter 'q'"));
        };
        let limit = search_limit(data).map_err(CallError::internal)?;

        let catalog = self.catalogs.connect().map_err(CallError::internal)?;
        log::info!("Searching playlists for query: '{query}' with limit {limit}");
        let results = catalog
            .search_playlists(query, limit)
            .await
            .map_err(CallError::internal)?;

        Ok(results
            .playlists
            .items
            .into_iter()
            .flatten()
            .map(PlaylistSummary::from)
            .collect())
    }
}
