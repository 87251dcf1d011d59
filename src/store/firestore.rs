use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};

use super::{
    leaf_paths, CollectionPath, Document, DocumentPath, DocumentStore, Fields, StoreError, Write,
    WriteMode,
};
use crate::config::{env_var, ConfigError, FIRESTORE_EMULATOR_VAR, FIRESTORE_TOKEN_VAR};
use crate::firestore_endpoint;

const PAGE_SIZE: &str = "300";

/// Document store backed by the Firestore REST API.
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    http: Client,
    /// `.../v1/projects/{project}/databases/(default)/documents`
    documents_url: Url,
    /// Resource name of the documents root, used inside write requests.
    root_name: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl FirestoreStore {
    pub fn new(project: &str, token: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_api_root(&firestore_endpoint!(""), project, token)
    }

    /// Talks to the local emulator when `FIRESTORE_EMULATOR_HOST` is set,
    /// otherwise to the hosted API with `FIRESTORE_ACCESS_TOKEN`.
    pub fn from_env(project: &str) -> Result<Self, ConfigError> {
        if let Some(host) = env_var(FIRESTORE_EMULATOR_VAR) {
            return Self::with_api_root(&format!("http://{host}/v1"), project, "owner");
        }
        let token = env_var(FIRESTORE_TOKEN_VAR).ok_or(ConfigError::MissingFirestoreAccess)?;
        Self::new(project, token)
    }

    /// `api_root` is the versioned API base, e.g. `http://localhost:8080/v1`.
    pub fn with_api_root(
        api_root: &str,
        project: &str,
        token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let root_name = format!("projects/{project}/databases/(default)/documents");
        let endpoint = format!("{}/{root_name}", api_root.trim_end_matches('/'));
        let documents_url =
            Url::parse(&endpoint).map_err(|err| ConfigError::InvalidEndpoint(err.to_string()))?;
        Ok(FirestoreStore {
            http: Client::new(),
            documents_url,
            root_name,
            token: token.into(),
        })
    }

    fn url(&self, segments: &[String]) -> Result<Url, StoreError> {
        check_segments(segments)?;
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidPath(self.documents_url.to_string()))?
            .extend(segments);
        Ok(url)
    }

    fn commit_url(&self) -> Result<Url, StoreError> {
        Url::parse(&format!("{}:commit", self.documents_url))
            .map_err(|err| StoreError::InvalidPath(err.to_string()))
    }

    fn authorize(&self, request_builder: RequestBuilder) -> RequestBuilder {
        request_builder.bearer_auth(self.token.as_str())
    }

    fn document_name(&self, path: &DocumentPath) -> Result<String, StoreError> {
        check_segments(path.segments())?;
        Ok(format!("{}/{}", self.root_name, path))
    }
}

/// Resource names are slash separated, so a segment holding a `/` would
/// address a different document in URLs than in `:commit` bodies.
fn check_segments(segments: &[String]) -> Result<(), StoreError> {
    match segments
        .iter()
        .find(|segment| segment.is_empty() || segment.contains('/'))
    {
        Some(segment) => Err(StoreError::InvalidPath(format!("'{segment}'"))),
        None => Ok(()),
    }
}

async fn check(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
    };
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

fn into_document(raw: RawDocument) -> Result<Document, StoreError> {
    let id = raw
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    Ok(Document {
        id,
        fields: decode_fields(&raw.fields)?,
    })
}

/// Builds one entry of a `:commit` request.
fn write_request(name: String, write: Write, mode: WriteMode) -> Value {
    let mut request = Map::new();
    if mode == WriteMode::Merge {
        let field_paths: Vec<String> = leaf_paths(&write.fields)
            .iter()
            .map(|path| field_path(path))
            .collect();
        request.insert("updateMask".into(), json!({ "fieldPaths": field_paths }));
    }
    request.insert(
        "update".into(),
        json!({ "name": name, "fields": encode_fields(&write.fields) }),
    );
    if !write.server_timestamps.is_empty() {
        let transforms: Vec<Value> = write
            .server_timestamps
            .iter()
            .map(|name| {
                json!({
                    "fieldPath": field_path(std::slice::from_ref(name)),
                    "setToServerValue": "REQUEST_TIME",
                })
            })
            .collect();
        request.insert("updateTransforms".into(), Value::Array(transforms));
    }
    Value::Object(request)
}

/// Dotted field path, backquoting segments that are not plain identifiers.
pub(crate) fn field_path(segments: &[String]) -> String {
    segments
        .iter()
        .map(|segment| {
            let simple = segment
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if simple {
                segment.clone()
            } else {
                format!("`{}`", segment.replace('\\', "\\\\").replace('`', "\\`"))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

pub(crate) fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), encode_value(value)))
            .collect(),
    )
}

pub(crate) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

pub(crate) fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, StoreError> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value)?)))
        .collect()
}

pub(crate) fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let invalid = || StoreError::InvalidDocument(value.to_string());
    let Some((kind, inner)) = value.as_object().and_then(|typed| typed.iter().next()) else {
        return Err(invalid());
    };
    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().ok_or_else(invalid)?),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            Value::Number(parsed.ok_or_else(invalid)?.into())
        }
        "doubleValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<f64>().ok(),
                other => other.as_f64(),
            };
            parsed
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        "stringValue" | "timestampValue" | "bytesValue" | "referenceValue" => {
            Value::String(inner.as_str().ok_or_else(invalid)?.to_string())
        }
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            Value::Array(values)
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => Value::Object(decode_fields(fields)?),
            _ => Value::Object(Map::new()),
        },
        _ => return Err(invalid()),
    })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let request = self.authorize(self.http.get(self.url(path.segments())?));
        let resp = request.send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw = check(resp).await?.json::<RawDocument>().await?;
        into_document(raw).map(Some)
    }

    async fn set(
        &self,
        path: &DocumentPath,
        write: Write,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let body = json!({ "writes": [write_request(self.document_name(path)?, write, mode)] });
        let request = self.authorize(self.http.post(self.commit_url()?)).json(&body);
        check(request.send().await?).await?;
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let url = self.url(collection.segments())?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }
            let request = self.authorize(self.http.get(url.clone())).query(&query);
            let page = check(request.send().await?)
                .await?
                .json::<ListResponse>()
                .await?;
            for raw in page.documents {
                documents.push(into_document(raw)?);
            }
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(fields) => fields,
            _ => unreachable!(),
        }
    }

    #[test]
    fn playlist_document_survives_the_typed_encoding() {
        let document = fields(json!({
            "id": "p1",
            "order": 1700000000000i64,
            "image_url": null,
            "score": 0.5,
            "tracks": [{"id": "t1", "popularity": 40, "explicit": false}],
        }));
        let encoded = encode_fields(&document);
        assert_eq!(encoded["order"], json!({"integerValue": "1700000000000"}));
        assert_eq!(encoded["image_url"], json!({"nullValue": null}));
        assert_eq!(
            encoded["tracks"]["arrayValue"]["values"][0]["mapValue"]["fields"]["id"],
            json!({"stringValue": "t1"})
        );

        let decoded = decode_fields(encoded.as_object().unwrap()).unwrap();
        assert_eq!(decoded, document);
    }

    #[test]
    fn timestamps_and_empty_containers_decode() {
        let raw = fields(json!({
            "last_updated": {"timestampValue": "2024-05-01T10:00:00.123456Z"},
            "tracks": {"arrayValue": {}},
            "meta": {"mapValue": {}},
        }));
        let decoded = decode_fields(&raw).unwrap();
        assert_eq!(decoded["last_updated"], json!("2024-05-01T10:00:00.123456Z"));
        assert_eq!(decoded["tracks"], json!([]));
        assert_eq!(decoded["meta"], json!({}));
    }

    #[test]
    fn unknown_value_kinds_are_rejected() {
        assert!(decode_value(&json!({"mysteryValue": 1})).is_err());
        assert!(decode_value(&json!("plain")).is_err());
    }

    #[test]
    fn field_paths_quote_non_identifiers() {
        assert_eq!(field_path(&["last_updated".to_string()]), "last_updated");
        assert_eq!(
            field_path(&["meta".to_string(), "a-b".to_string()]),
            "meta.`a-b`"
        );
        assert_eq!(field_path(&["1st".to_string()]), "`1st`");
    }

    #[test]
    fn merge_writes_mask_fields_and_transform_timestamps() {
        let write = Write::default()
            .field("name", "Road trip")
            .server_timestamp("last_updated");
        let request = write_request("root/qr_playlists/Road trip".into(), write, WriteMode::Merge);
        assert_eq!(request["updateMask"], json!({"fieldPaths": ["name"]}));
        assert_eq!(
            request["updateTransforms"],
            json!([{"fieldPath": "last_updated", "setToServerValue": "REQUEST_TIME"}])
        );
        assert_eq!(
            request["update"]["fields"],
            json!({"name": {"stringValue": "Road trip"}})
        );
    }

    #[test]
    fn overwrites_have_no_mask() {
        let write = Write::default().field("id", "p1");
        let request = write_request("root/c/p1".into(), write, WriteMode::Overwrite);
        assert!(request.get("updateMask").is_none());
        assert!(request.get("updateTransforms").is_none());
    }

    #[test]
    fn document_urls_encode_segments() {
        let store = FirestoreStore::new("demo", "token").unwrap();
        let path = CollectionPath::root("qr_playlists").doc("Road trip");
        let url = store.url(path.segments()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/qr_playlists/Road%20trip"
        );
        assert_eq!(
            store.commit_url().unwrap().as_str(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents:commit"
        );
        assert_eq!(
            store.document_name(&path).unwrap(),
            "projects/demo/databases/(default)/documents/qr_playlists/Road trip"
        );
    }

    #[test]
    fn slashes_inside_a_segment_are_rejected_everywhere() {
        let store = FirestoreStore::new("demo", "token").unwrap();
        let path = CollectionPath::root("qr_playlists").doc("a/b");
        assert!(matches!(
            store.url(path.segments()),
            Err(StoreError::InvalidPath(_))
        ));
        assert!(matches!(
            store.document_name(&path),
            Err(StoreError::InvalidPath(_))
        ));
        assert!(store
            .url(CollectionPath::root("qr_playlists").doc("").segments())
            .is_err());
    }

    #[tokio::test]
    async fn writes_to_slashed_names_never_reach_the_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;
        let store = mock_store(&server);
        let path = CollectionPath::root("qr_playlists").doc("a/b");
        let err = store
            .set(&path, Write::default().field("name", "a/b"), WriteMode::Merge)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
    }

    const DOCUMENTS: &str = "/v1/projects/demo/databases/(default)/documents";

    fn mock_store(server: &MockServer) -> FirestoreStore {
        FirestoreStore::with_api_root(&format!("{}/v1", server.uri()), "demo", "token").unwrap()
    }

    fn folder_document(name: &str) -> Value {
        json!({
            "name": format!("projects/demo/databases/(default)/documents/qr_playlists/{name}"),
            "fields": {"name": {"stringValue": name}},
        })
    }

    #[tokio::test]
    async fn list_follows_page_tokens() {
        let server = MockServer::start().await;
        let collection = format!("{DOCUMENTS}/qr_playlists");
        Mock::given(method("GET"))
            .and(path(collection.as_str()))
            .and(query_param("pageToken", "page-2"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [folder_document("Gym")],
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(collection.as_str()))
            .and(query_param("pageSize", "300"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [folder_document("Chill"), folder_document("Road trip")],
                "nextPageToken": "page-2",
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        let documents = mock_store(&server)
            .list(&CollectionPath::root("qr_playlists"))
            .await
            .unwrap();
        let ids: Vec<_> = documents.iter().map(|document| document.id.as_str()).collect();
        assert_eq!(ids, vec!["Chill", "Road trip", "Gym"]);
        assert_eq!(documents[2].str_field("name"), Some("Gym"));
    }

    #[tokio::test]
    async fn merge_commits_carry_an_update_mask_and_transforms() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{DOCUMENTS}:commit").as_str()))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"writeResults": [{}]})))
            .expect(1)
            .mount(&server)
            .await;

        let write = Write::default()
            .field("name", "Road trip")
            .field("meta", json!({"color": "teal"}))
            .server_timestamp("last_updated");
        mock_store(&server)
            .set(
                &CollectionPath::root("qr_playlists").doc("Road trip"),
                write,
                WriteMode::Merge,
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let commit = &body["writes"][0];
        assert_eq!(
            commit["update"]["name"],
            json!("projects/demo/databases/(default)/documents/qr_playlists/Road trip")
        );
        let mut mask: Vec<&str> = commit["updateMask"]["fieldPaths"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        mask.sort_unstable();
        assert_eq!(mask, vec!["meta.color", "name"]);
        assert_eq!(
            commit["updateTransforms"],
            json!([{"fieldPath": "last_updated", "setToServerValue": "REQUEST_TIME"}])
        );
    }

    #[tokio::test]
    async fn missing_documents_are_none_and_errors_keep_their_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{DOCUMENTS}/qr_playlists/Gone").as_str()))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DOCUMENTS}/qr_playlists/Locked").as_str()))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Missing or insufficient permissions."}
            })))
            .mount(&server)
            .await;

        let store = mock_store(&server);
        let folders = CollectionPath::root("qr_playlists");
        assert_eq!(store.get(&folders.doc("Gone")).await.unwrap(), None);
        let err = store.get(&folders.doc("Locked")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Document store returned 403: Missing or insufficient permissions."
        );
    }
}
