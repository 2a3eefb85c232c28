//! Coze knowledge-base document sync client.
//!
//! Wraps the document-creation endpoint: the body is uploaded as base64
//! plain text inside the store's creation envelope, with bearer-token
//! authorization and a fixed chunking strategy. The remote call has two
//! failure layers, transport (connection error, non-2xx) and business
//! (2xx with a non-zero `code` field), surfaced as distinct error
//! variants; callers treat both the same way (log and move on).

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use articlesync_shared::{ArticleSyncError, Result};

/// Relative path of the document-creation endpoint.
const CREATE_DOCUMENT_PATH: &str = "/open_api/knowledge/document/create";

/// The store mishandles large numeric ids unless this header is present.
const AGW_JS_CONV_HEADER: &str = "Agw-Js-Conv";

/// Chunking parameter applied to every uploaded document.
const CHUNK_MAX_TOKENS: u32 = 800;

/// Default upload timeout in seconds (uploads can be large).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CreateDocumentRequest {
    dataset_id: String,
    document_bases: Vec<DocumentBase>,
    chunk_strategy: ChunkStrategy,
    format_type: u32,
}

#[derive(Debug, Serialize)]
struct DocumentBase {
    name: String,
    source_info: SourceInfo,
}

#[derive(Debug, Serialize)]
struct SourceInfo {
    file_base64: String,
    file_type: String,
    document_source: u32,
}

#[derive(Debug, Serialize)]
struct ChunkStrategy {
    chunk_type: u32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CreateDocumentResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    document_infos: Vec<DocumentInfo>,
}

#[derive(Debug, Deserialize)]
struct DocumentInfo {
    #[serde(default)]
    document_id: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the knowledge-store document API.
#[derive(Debug)]
pub struct CozeClient {
    client: Client,
    api_base: String,
    token: String,
}

impl CozeClient {
    /// Create a client. An empty token is a config error, a setup defect
    /// caught before any upload is attempted.
    pub fn new(api_base: &str, token: &str, timeout_secs: u64) -> Result<Self> {
        if token.is_empty() {
            return Err(ArticleSyncError::config("Coze API token is empty"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                ArticleSyncError::SyncTransport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Create a plain-text document named `name` with content `body` in the
    /// knowledge base `dataset_id`. Returns the remote document id on
    /// business success (`code == 0`).
    #[instrument(skip_all, fields(dataset_id = %dataset_id, name = %name))]
    pub async fn create_document(
        &self,
        dataset_id: &str,
        name: &str,
        body: &str,
    ) -> Result<String> {
        if dataset_id.is_empty() {
            return Err(ArticleSyncError::config("knowledge base id is empty"));
        }

        let payload = CreateDocumentRequest {
            dataset_id: dataset_id.to_string(),
            document_bases: vec![DocumentBase {
                name: name.to_string(),
                source_info: SourceInfo {
                    file_base64: BASE64.encode(body),
                    file_type: "txt".to_string(),
                    document_source: 0,
                },
            }],
            chunk_strategy: ChunkStrategy {
                chunk_type: 0,
                max_tokens: CHUNK_MAX_TOKENS,
            },
            format_type: 0,
        };

        debug!(bytes = body.len(), "uploading document");

        let url = format!("{}{CREATE_DOCUMENT_PATH}", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(AGW_JS_CONV_HEADER, "str")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ArticleSyncError::SyncTransport(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleSyncError::SyncTransport(format!(
                "{url}: HTTP {status}"
            )));
        }

        let parsed: CreateDocumentResponse = response.json().await.map_err(|e| {
            ArticleSyncError::SyncTransport(format!("{url}: invalid response body: {e}"))
        })?;

        if parsed.code != 0 {
            return Err(ArticleSyncError::SyncBusiness {
                code: parsed.code,
                message: parsed.msg,
            });
        }

        let document_id = parsed
            .document_infos
            .into_iter()
            .next()
            .map(|info| info.document_id)
            .unwrap_or_default();

        info!(%document_id, "document created");
        Ok(document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success_body(document_id: &str) -> serde_json::Value {
        serde_json::json!({
            "code": 0,
            "msg": "",
            "document_infos": [ { "document_id": document_id } ]
        })
    }

    #[tokio::test]
    async fn create_document_returns_remote_id() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/open_api/knowledge/document/create"))
            .and(wiremock::matchers::header("authorization", "Bearer pat_test"))
            .and(wiremock::matchers::header("agw-js-conv", "str"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_json(success_body("doc-123")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CozeClient::new(&server.uri(), "pat_test", DEFAULT_TIMEOUT_SECS).unwrap();
        let id = client
            .create_document("kb-1", "标题", "内容")
            .await
            .expect("create");
        assert_eq!(id, "doc-123");
    }

    #[tokio::test]
    async fn create_document_sends_base64_envelope() {
        let server = wiremock::MockServer::start().await;

        let expected_base64 = BASE64.encode("document body");
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::body_json(serde_json::json!({
                "dataset_id": "kb-1",
                "document_bases": [ {
                    "name": "doc name",
                    "source_info": {
                        "file_base64": expected_base64,
                        "file_type": "txt",
                        "document_source": 0
                    }
                } ],
                "chunk_strategy": { "chunk_type": 0, "max_tokens": 800 },
                "format_type": 0
            })))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_json(success_body("doc-1")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CozeClient::new(&server.uri(), "pat_test", DEFAULT_TIMEOUT_SECS).unwrap();
        client
            .create_document("kb-1", "doc name", "document body")
            .await
            .expect("create");
    }

    #[tokio::test]
    async fn business_error_code_maps_to_sync_business() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "code": 1001, "msg": "invalid" }),
            ))
            .mount(&server)
            .await;

        let client = CozeClient::new(&server.uri(), "pat_test", DEFAULT_TIMEOUT_SECS).unwrap();
        let err = client.create_document("kb-1", "n", "b").await.unwrap_err();
        match err {
            ArticleSyncError::SyncBusiness { code, message } => {
                assert_eq!(code, 1001);
                assert_eq!(message, "invalid");
            }
            other => panic!("expected business error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_2xx_maps_to_sync_transport() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CozeClient::new(&server.uri(), "pat_test", DEFAULT_TIMEOUT_SECS).unwrap();
        let err = client.create_document("kb-1", "n", "b").await.unwrap_err();
        assert!(matches!(err, ArticleSyncError::SyncTransport(_)));
    }

    #[tokio::test]
    async fn missing_kb_id_is_config_error() {
        let server = wiremock::MockServer::start().await;
        let client = CozeClient::new(&server.uri(), "pat_test", DEFAULT_TIMEOUT_SECS).unwrap();

        let err = client.create_document("", "n", "b").await.unwrap_err();
        assert!(matches!(err, ArticleSyncError::Config { .. }));
        // No request must have been made.
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn empty_token_is_config_error() {
        let err = CozeClient::new("https://api.coze.cn", "", DEFAULT_TIMEOUT_SECS).unwrap_err();
        assert!(matches!(err, ArticleSyncError::Config { .. }));
    }
}
