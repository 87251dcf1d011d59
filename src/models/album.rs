use serde::{Deserialize, Serialize};

use crate::models::image::Image;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Album {
    pub id: Option<String>,
    pub name: String,
    pub release_date: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}
