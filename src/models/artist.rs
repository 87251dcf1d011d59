use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
}

/// Joins contributing artist names the way they are displayed, e.g. `"A, B"`.
pub fn join_artist_names(artists: &[SimplifiedArtist]) -> String {
    artists
        .iter()
        .map(|artist| artist.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
