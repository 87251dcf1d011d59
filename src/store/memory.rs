use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::{
    CollectionPath, Document, DocumentPath, DocumentStore, Fields, StoreError, Write, WriteMode,
};

/// Process-local store with the same overwrite/merge semantics as the hosted
/// one. Server timestamps become RFC 3339 strings.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<CollectionPath, BTreeMap<String, Fields>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collections(&self) -> MutexGuard<'_, HashMap<CollectionPath, BTreeMap<String, Fields>>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn merge_into(target: &mut Fields, source: Fields) {
    for (name, value) in source {
        match value {
            Value::Object(incoming) if !incoming.is_empty() => {
                if let Some(Value::Object(existing)) = target.get_mut(&name) {
                    merge_into(existing, incoming);
                } else {
                    target.insert(name, Value::Object(incoming));
                }
            }
            value => {
                target.insert(name, value);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let collections = self.collections();
        let fields = collections
            .get(&path.parent())
            .and_then(|documents| documents.get(path.id()));
        Ok(fields.map(|fields| Document {
            id: path.id().to_string(),
            fields: fields.clone(),
        }))
    }

    async fn set(
        &self,
        path: &DocumentPath,
        write: Write,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let mut collections = self.collections();
        let document = collections
            .entry(path.parent())
            .or_default()
            .entry(path.id().to_string())
            .or_default();
        match mode {
            WriteMode::Overwrite => *document = write.fields,
            WriteMode::Merge => merge_into(document, write.fields),
        }
        for name in write.server_timestamps {
            document.insert(name, Value::String(now.clone()));
        }
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections();
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
