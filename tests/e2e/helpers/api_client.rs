use anyhow::Result;
use http_body_util::{BodyExt, Full};
use hyper::{body::Bytes, header, HeaderMap, Method, Request, StatusCode};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::Value;

type HttpClient = Client<HttpConnector, Full<Bytes>>;

/// Thin HTTP client for the running test server
#[derive(Clone)]
pub struct TestClient {
    base_url: String,
    http: HttpClient,
}

impl TestClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::GET, path, None).await
    }

    /// POST a JSON document
    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::POST, path, Some(serde_json::to_vec(body)?))
            .await
    }

    /// POST with no body, the way clients ask for default generation options
    pub async fn post_empty(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::POST, path, None).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::DELETE, path, None).await
    }

    async fn send(&self, method: Method, path: &str, json: Option<Vec<u8>>) -> Result<ApiResponse> {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", self.base_url, path));
        if json.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder.body(Full::new(Bytes::from(json.unwrap_or_default())))?;

        let response = self.http.request(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response.into_body().collect().await?.to_bytes().to_vec();
        let body = serde_json::from_slice(&body_bytes).ok();

        Ok(ApiResponse {
            status,
            headers,
            body,
            body_bytes,
        })
    }
}

pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed body, when the server answered with JSON
    pub body: Option<Value>,
    pub body_bytes: Vec<u8>,
}

impl ApiResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body_bytes)
        );
        self
    }

    /// Checks the `message` field of an error payload
    pub fn assert_error_message(&self, expected: &str) -> &Self {
        let message = self
            .body
            .as_ref()
            .and_then(|body| body["message"].as_str())
            .unwrap_or_else(|| panic!("no error message in {:?}", self.body));
        assert!(
            message.contains(expected),
            "error message '{}' does not mention '{}'",
            message,
            expected
        );
        self
    }

    pub fn assert_header_exists(&self, name: &str) -> &Self {
        assert!(self.headers.contains_key(name), "missing header '{}'", name);
        self
    }
}
