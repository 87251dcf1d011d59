use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

/// The catalog lists images widest first, so the first one is the cover.
pub fn first_image_url(images: Option<&[Image]>) -> Option<String> {
    images
        .and_then(|images| images.first())
        .map(|image| image.url.clone())
}
