use std::fmt;

/// Slash-free segments addressing a collection: `a`, `a/b/c`, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Segments addressing a document: `a/b`, `a/b/c/d`, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl CollectionPath {
    pub fn root(id: &str) -> Self {
        CollectionPath {
            segments: vec![id.to_string()],
        }
    }

    pub fn doc(&self, id: &str) -> DocumentPath {
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        DocumentPath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl DocumentPath {
    pub fn collection(&self, id: &str) -> CollectionPath {
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        CollectionPath { segments }
    }

    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
