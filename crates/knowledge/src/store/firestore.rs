//! Firestore [`DocumentStore`] over the REST API.
//!
//! https://firebase.google.com/docs/firestore/reference/rest
//!
//! Documents are stored with typed values (`stringValue`, `arrayValue`,
//! `mapValue`, ...). The term vector is a map of token to `integerValue`.
//! Vector updates send an update mask so no other field is rewritten.

use super::DocumentStore;
use crate::types::{Document, DocumentPatch, NewDocument, TermVector};
use async_trait::async_trait;
use edurag_core::{AppError, AppResult, StoreSettings};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Default REST base URL.
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";

/// Page size for collection listing.
const PAGE_SIZE: u32 = 300;

/// Per-call timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Firestore-backed document store.
pub struct FirestoreStore {
    /// `{base}/v1/projects/{project}/databases/{database}/documents`
    documents_url: String,
    collection: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl FirestoreStore {
    /// Create a store from settings. The project id is required.
    pub fn from_settings(settings: &StoreSettings) -> AppResult<Self> {
        let project_id = settings.project_id.as_deref().ok_or_else(|| {
            AppError::Config("store.projectId is required for the Firestore store".to_string())
        })?;

        let base_url = settings
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_FIRESTORE_URL)
            .trim_end_matches('/');

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Store(format!("Failed to create HTTP client for Firestore: {}", e)))?;

        Ok(Self {
            documents_url: format!(
                "{}/v1/projects/{}/databases/{}/documents",
                base_url, project_id, settings.database_id
            ),
            collection: settings.collection.clone(),
            access_token: settings.access_token(),
            client,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.documents_url, self.collection)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, action: &str) -> AppResult<Value> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("Firestore {} request failed: {}", action, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "Firestore {} failed ({}): {}",
                action,
                status.as_u16(),
                body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Store(format!("Failed to parse Firestore {} response: {}", action, e)))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn backend_name(&self) -> &str {
        "firestore"
    }

    async fn scan_all(&self) -> AppResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let body = self
                .send(self.client.get(self.collection_url()).query(&query), "list")
                .await?;
            let page: ListDocumentsResponse = serde_json::from_value(body)
                .map_err(|e| AppError::Store(format!("Unexpected Firestore list response: {}", e)))?;

            documents.extend(
                page.documents
                    .iter()
                    .map(|raw| decode_document(&raw.name, &raw.fields)),
            );

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Scanned {} documents from Firestore", documents.len());
        Ok(documents)
    }

    async fn insert(&self, document: &NewDocument) -> AppResult<String> {
        let body = json!({ "fields": encode_new_document(document) });
        let created = self
            .send(self.client.post(self.collection_url()).json(&body), "insert")
            .await?;

        let name = created
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Store("Firestore insert returned no document name".to_string()))?;

        Ok(document_id(name).to_string())
    }

    async fn update_fields(&self, id: &str, patch: &DocumentPatch) -> AppResult<()> {
        let url = format!("{}/{}", self.collection_url(), id);
        let body = json!({ "fields": { "vector": encode_vector(&patch.vector) } });
        let query = [
            ("updateMask.fieldPaths", "vector"),
            ("currentDocument.exists", "true"),
        ];

        self.send(self.client.patch(url).query(&query).json(&body), "update")
            .await?;
        Ok(())
    }
}

/// Last path segment of a resource name.
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn optional_string_value(value: Option<&str>) -> Value {
    match value {
        Some(value) => string_value(value),
        None => json!({ "nullValue": null }),
    }
}

fn encode_vector(vector: &TermVector) -> Value {
    let fields: Map<String, Value> = vector
        .iter()
        .map(|(token, count)| (token.clone(), json!({ "integerValue": count.to_string() })))
        .collect();
    json!({ "mapValue": { "fields": fields } })
}

fn encode_new_document(document: &NewDocument) -> Map<String, Value> {
    let keywords: Vec<Value> = document.keywords.iter().map(|k| string_value(k)).collect();

    let mut fields = Map::new();
    fields.insert("title".to_string(), string_value(&document.title));
    fields.insert("content".to_string(), string_value(&document.content));
    fields.insert(
        "keywords".to_string(),
        json!({ "arrayValue": { "values": keywords } }),
    );
    fields.insert(
        "category".to_string(),
        optional_string_value(document.category.as_deref()),
    );
    fields.insert(
        "publisher".to_string(),
        optional_string_value(document.publisher.as_deref()),
    );
    fields.insert("url".to_string(), optional_string_value(document.url.as_deref()));
    fields.insert("vector".to_string(), encode_vector(&document.vector));
    fields
}

fn decode_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(|value| value.get("stringValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn decode_keywords(fields: &Map<String, Value>) -> Vec<String> {
    fields
        .get("keywords")
        .and_then(|value| value.pointer("/arrayValue/values"))
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.get("stringValue").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Counts arrive as string-encoded int64, occasionally as doubles.
fn decode_count(value: &Value) -> Option<u32> {
    if let Some(integer) = value.get("integerValue") {
        return match integer {
            Value::String(s) => s.parse().ok(),
            other => other.as_u64().and_then(|n| u32::try_from(n).ok()),
        };
    }
    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .filter(|n| *n >= 0.0)
        .map(|n| n as u32)
}

/// A vector that is not a map of counts decodes as missing so it scores 0
/// and the repair job can rebuild it.
fn decode_vector(name: &str, fields: &Map<String, Value>) -> Option<TermVector> {
    let value = fields.get("vector")?;
    if value.get("nullValue").is_some() {
        return None;
    }

    let Some(map) = value.get("mapValue") else {
        tracing::warn!("Ignoring vector of {}: not a map of token counts", name);
        return None;
    };
    let Some(entries) = map.get("fields").map(Value::as_object) else {
        return Some(TermVector::new());
    };
    let Some(entries) = entries else {
        tracing::warn!("Ignoring vector of {}: fields is not an object", name);
        return None;
    };

    let mut vector = TermVector::with_capacity(entries.len());
    for (token, count) in entries {
        match decode_count(count) {
            Some(count) => {
                vector.insert(token.clone(), count);
            }
            None => {
                tracing::warn!(
                    "Ignoring vector of {}: non-integer count for '{}'",
                    name,
                    token
                );
                return None;
            }
        }
    }
    Some(vector)
}

fn decode_document(name: &str, fields: &Map<String, Value>) -> Document {
    Document {
        id: document_id(name).to_string(),
        title: decode_string(fields, "title").unwrap_or_default(),
        content: decode_string(fields, "content").unwrap_or_default(),
        keywords: decode_keywords(fields),
        category: decode_string(fields, "category"),
        publisher: decode_string(fields, "publisher"),
        url: decode_string(fields, "url"),
        vector: decode_vector(name, fields),
    }
}
