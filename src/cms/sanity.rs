//! Client for the hosted CMS HTTP API.
//!
//! Reads go to the query and doc endpoints, writes to the mutate endpoint as
//! a single transaction. The write token stays on the server; requests that
//! need it fail with `MissingCredential` when none is configured.

use super::{CommitReceipt, DocumentQuery, DocumentStore};
use crate::error::RemoteError;
use crate::models::SetOperation;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SanitySettings {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub read_token: Option<String>,
    pub write_token: Option<String>,
    pub timeout: Duration,
}

pub struct SanityClient {
    http: reqwest::Client,
    settings: SanitySettings,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: Value,
}

#[derive(Deserialize)]
struct DocResponse {
    documents: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutateResponse {
    transaction_id: String,
    #[serde(default)]
    results: Vec<MutateResult>,
}

#[derive(Deserialize)]
struct MutateResult {
    id: String,
}

impl SanityClient {
    pub fn new(settings: SanitySettings) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self { http, settings })
    }

    fn base_url(&self) -> String {
        format!(
            "https://{}.api.sanity.io/v{}",
            self.settings.project_id, self.settings.api_version
        )
    }

    pub fn query_url(&self, query: &DocumentQuery) -> String {
        let mut url = format!(
            "{}/data/query/{}?query={}&%24type={}",
            self.base_url(),
            self.settings.dataset,
            urlencoding::encode(&query.to_groq()),
            urlencoding::encode(&Value::String(query.doc_type.clone()).to_string()),
        );
        if let Some((_, value)) = &query.filter {
            url.push_str(&format!("&%24value={}", urlencoding::encode(&value.to_string())));
        }
        url
    }

    pub fn doc_url(&self, id: &str) -> String {
        format!(
            "{}/data/doc/{}/{}",
            self.base_url(),
            self.settings.dataset,
            urlencoding::encode(id)
        )
    }

    pub fn mutate_url(&self) -> String {
        format!(
            "{}/data/mutate/{}?returnIds=true&visibility=sync",
            self.base_url(),
            self.settings.dataset
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, RemoteError> {
        let mut req = self.http.get(url);
        if let Some(token) = &self.settings.read_token {
            req = req.bearer_auth(token);
        }
        let response = req
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        read_response(response).await
    }

    async fn mutate(&self, mutations: Value) -> Result<CommitReceipt, RemoteError> {
        let token = self
            .settings
            .write_token
            .as_deref()
            .ok_or(RemoteError::MissingCredential)?;
        let response = self
            .http
            .post(self.mutate_url())
            .bearer_auth(token)
            .json(&mutations)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        let body: MutateResponse = serde_json::from_value(read_response(response).await?)?;
        Ok(CommitReceipt {
            transaction_id: body.transaction_id,
            document_ids: body.results.into_iter().map(|r| r.id).collect(),
        })
    }
}

async fn read_response(response: reqwest::Response) -> Result<Value, RemoteError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RemoteError::Network(e.to_string()))?;
    if !status.is_success() {
        return Err(map_status(status, body));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Classify a failed response.
pub fn map_status(status: StatusCode, body: String) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized,
        StatusCode::NOT_FOUND => RemoteError::NotFound(body),
        StatusCode::BAD_REQUEST if body.to_lowercase().contains("path") => {
            RemoteError::MalformedPath(body)
        }
        _ => RemoteError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

/// Mutation body patching one document with every set in one transaction.
pub fn patch_mutation(id: &str, sets: &[SetOperation]) -> Value {
    let set: Map<String, Value> = sets
        .iter()
        .map(|op| (op.path.clone(), op.value.clone()))
        .collect();
    json!({ "mutations": [ { "patch": { "id": id, "set": set } } ] })
}

#[async_trait]
impl DocumentStore for SanityClient {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, RemoteError> {
        let body: QueryResponse = serde_json::from_value(self.get_json(&self.query_url(query)).await?)?;
        match body.result {
            Value::Array(docs) => Ok(docs),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }

    async fn get_document(&self, id: &str) -> Result<Option<Value>, RemoteError> {
        let body: DocResponse = serde_json::from_value(self.get_json(&self.doc_url(id)).await?)?;
        Ok(body.documents.into_iter().next())
    }

    async fn patch(&self, id: &str, sets: &[SetOperation]) -> Result<CommitReceipt, RemoteError> {
        self.mutate(patch_mutation(id, sets)).await
    }

    async fn create(&self, document: Value) -> Result<CommitReceipt, RemoteError> {
        self.mutate(json!({ "mutations": [ { "create": document } ] }))
            .await
    }

    async fn delete(&self, id: &str) -> Result<CommitReceipt, RemoteError> {
        self.mutate(json!({ "mutations": [ { "delete": { "id": id } } ] }))
            .await
    }

    fn name(&self) -> &'static str {
        "sanity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(write_token: Option<&str>) -> SanityClient {
        SanityClient::new(SanitySettings {
            project_id: "abc123".into(),
            dataset: "production".into(),
            api_version: "2024-01-01".into(),
            read_token: None,
            write_token: write_token.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let c = client(None);
        assert_eq!(
            c.mutate_url(),
            "https://abc123.api.sanity.io/v2024-01-01/data/mutate/production?returnIds=true&visibility=sync"
        );
        assert_eq!(
            c.doc_url("homePage"),
            "https://abc123.api.sanity.io/v2024-01-01/data/doc/production/homePage"
        );
        let url = c.query_url(&DocumentQuery::of_type("room").where_eq("slug.current", "deluxe"));
        assert!(url.contains("query=%2A%5B_type%20%3D%3D%20%24type"));
        assert!(url.contains("&%24type=%22room%22"));
        assert!(url.ends_with("&%24value=%22deluxe%22"));
    }

    #[test]
    fn test_patch_mutation_body() {
        let body = patch_mutation(
            "homePage",
            &[
                SetOperation { path: "hero.cta.text".into(), value: json!("Book") },
                SetOperation { path: "hero.cta.url".into(), value: json!("/book") },
            ],
        );
        assert_eq!(
            body,
            json!({"mutations": [{"patch": {"id": "homePage", "set": {
                "hero.cta.text": "Book",
                "hero.cta.url": "/book"
            }}}]})
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status(StatusCode::UNAUTHORIZED, String::new()), RemoteError::Unauthorized);
        assert_eq!(map_status(StatusCode::FORBIDDEN, String::new()), RemoteError::Unauthorized);
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, "invalid path `a..b`".into()),
            RemoteError::MalformedPath(_)
        ));
        assert!(matches!(
            map_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            RemoteError::Status { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn test_write_without_token_fails_before_network() {
        let c = client(None);
        let result = c.patch("homePage", &[]).await;
        assert_eq!(result, Err(RemoteError::MissingCredential));
    }
}
