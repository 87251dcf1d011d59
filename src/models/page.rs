use serde::{Deserialize, Serialize};

/// One page of a paginated catalog listing. `next` holds the absolute URL of
/// the following page and is `None` once the listing is exhausted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn single(items: Vec<T>) -> Self {
        Page {
            href: String::new(),
            limit: items.len() as u32,
            offset: 0,
            total: items.len() as u32,
            next: None,
            previous: None,
            items,
        }
    }
}
