//! Cloud Firestore backend over the v1 REST API.
//!
//! Requests are written as documents in one collection. Firestore wraps
//! every value in a typed envelope (`stringValue`, `integerValue`, ...), so
//! records go through `serde_json::Value` and are wrapped or unwrapped
//! field by field.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::RequestStore;
use crate::error::StoreError;
use crate::request::{CreditRequest, StoredRequest};

/// Public Firestore REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    collection: String,
    api_key: Option<String>,
}

impl FirestoreStore {
    pub fn new(project_id: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            collection: collection.into(),
            api_key: None,
        }
    }

    /// Point at another endpoint, e.g. the local emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.query(&[("key", key)]),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl RequestStore for FirestoreStore {
    async fn create(&self, request: &CreditRequest) -> Result<String, StoreError> {
        let url = format!("{}/{}", self.documents_url(), self.collection);
        let body = encode_document(request)?;

        tracing::debug!(collection = %self.collection, "creating firestore document");
        let created = self.send(self.post(url).json(&body)).await?;

        created
            .get("name")
            .and_then(Value::as_str)
            .and_then(document_id)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Decode("response has no document name".to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<StoredRequest>, StoreError> {
        let url = format!("{}:runQuery", self.documents_url());
        let query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "email" },
                        "op": "EQUAL",
                        "value": { "stringValue": email }
                    }
                }
            }
        });

        let rows = self.send(self.post(url).json(&query)).await?;
        let rows = rows
            .as_array()
            .ok_or_else(|| StoreError::Decode("runQuery did not return an array".to_string()))?;

        // Rows without a document only carry a read time.
        let mut found = rows
            .iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect::<Result<Vec<_>, _>>()?;
        found.sort_by_key(|s| s.request.created_at);
        Ok(found)
    }
}

/// Wrap a record as a Firestore document body (`{"fields": {...}}`).
pub fn encode_document(request: &CreditRequest) -> Result<Value, StoreError> {
    match serde_json::to_value(request)? {
        Value::Object(map) => Ok(json!({ "fields": encode_fields(&map) })),
        other => Err(StoreError::Decode(format!(
            "record serialized to a non-object: {other}"
        ))),
    }
}

/// Unwrap a Firestore document into a stored request.
pub fn decode_document(document: &Value) -> Result<StoredRequest, StoreError> {
    let id = document
        .get("name")
        .and_then(Value::as_str)
        .and_then(document_id)
        .ok_or_else(|| StoreError::Decode("document has no name".to_string()))?
        .to_string();

    let fields = document
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::Decode(format!("document {id} has no fields")))?;

    let request = serde_json::from_value(decode_fields(fields)?)?;
    Ok(StoredRequest { id, request })
}

fn encode_fields(map: &Map<String, Value>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(u)) => json!({ "integerValue": u.to_string() }),
            _ => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Result<Value, StoreError> {
    let mut out = Map::with_capacity(fields.len());
    for (key, value) in fields {
        out.insert(key.clone(), decode_value(value)?);
    }
    Ok(Value::Object(out))
}

fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(StoreError::Decode(format!("not a typed value: {value}")));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" => Ok(inner.clone()),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .ok_or_else(|| StoreError::Decode(format!("bad integerValue: {inner}"))),
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(Value::Array),
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => decode_fields(fields),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(StoreError::Decode(format!("unsupported value type {other}"))),
    }
}

fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}
