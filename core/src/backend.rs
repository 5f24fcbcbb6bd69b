/// Backend collaborator: the three calls the chat client makes, and their
/// HTTP implementation on hyper's client
use crate::api::{KeysResponse, SendRequest, SendResponse, KEYS_PATH, REGENERATE_KEYS_PATH, SEND_PATH};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

/// Everything the controller needs from the server side.
///
/// Non-2xx answers come back as `ChatError::Backend` with the raw body.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, request: &SendRequest) -> Result<SendResponse>;

    async fn regenerate_keys(&self) -> Result<()>;

    async fn keys(&self) -> Result<KeysResponse>;
}

/// Talks to the backend over plain HTTP/1.1
#[derive(Clone)]
pub struct HttpBackend {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn uri(&self, path: &str) -> Result<Uri> {
        format!("{}{}", self.base_url, path)
            .parse()
            .map_err(|e: http::uri::InvalidUri| ChatError::transport(&e))
    }

    /// Issue one request and return the body of a 2xx answer
    async fn call(&self, method: Method, path: &str, json: Option<Vec<u8>>) -> Result<Bytes> {
        let mut builder = Request::builder().method(method.clone()).uri(self.uri(path)?);
        let body = match json {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Full::new(Bytes::from(bytes))
            }
            None => Full::new(Bytes::new()),
        };
        let request = builder.body(body).map_err(|e| ChatError::transport(&e))?;

        debug!("{} {}", method, path);
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ChatError::transport(&e))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ChatError::transport(&e))?
            .to_bytes();
        debug!("{} {} -> {}", method, path, status);

        if !status.is_success() {
            return Err(ChatError::Backend(String::from_utf8_lossy(&body).into_owned()));
        }
        Ok(body)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send(&self, request: &SendRequest) -> Result<SendResponse> {
        let payload = serde_json::to_vec(request)?;
        let body = self.call(Method::POST, SEND_PATH, Some(payload)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn regenerate_keys(&self) -> Result<()> {
        self.call(Method::POST, REGENERATE_KEYS_PATH, None).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<KeysResponse> {
        let body = self.call(Method::GET, KEYS_PATH, None).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
