//! HTTP transport for the travel-entry backend.
//!
//! Wraps [`reqwest`] with three concerns: building URLs against the
//! configured base, attaching the caller's bearer token to each request,
//! and normalizing failures into [`ClientError`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;

/// HTTP client bound to one backend base URL.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport with the configured request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.api_base_url.clone()))
    }

    /// Build a transport reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a backend path such as `/travel-entries`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET` a JSON document.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&Session>,
    ) -> Result<T, ClientError> {
        let request = self.authorize(self.client.get(self.url(path)), session);
        Self::parse_response(Self::send(request).await?).await
    }

    /// `POST` a JSON body and decode the JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        session: Option<&Session>,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorize(self.client.post(self.url(path)).json(body), session);
        Self::parse_response(Self::send(request).await?).await
    }

    /// `PUT` a JSON body and decode the JSON response.
    pub async fn put_json<B, T>(
        &self,
        path: &str,
        session: Option<&Session>,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorize(self.client.put(self.url(path)).json(body), session);
        Self::parse_response(Self::send(request).await?).await
    }

    /// `DELETE` a resource, discarding any response body.
    pub async fn delete(&self, path: &str, session: Option<&Session>) -> Result<(), ClientError> {
        let request = self.authorize(self.client.delete(self.url(path)), session);
        Self::ensure_success(Self::send(request).await?).await?;
        Ok(())
    }

    /// `PUT` raw bytes to an absolute presigned URL.
    ///
    /// The URL already embeds its credentials, so no bearer token is sent;
    /// the target is object storage, not the backend.
    pub async fn put_bytes(
        &self,
        url: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ClientError> {
        let request = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        Self::ensure_success(Self::send(request).await?).await?;
        Ok(())
    }

    // ---- private helpers ----

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        session: Option<&Session>,
    ) -> reqwest::RequestBuilder {
        match session {
            Some(s) => request.header(reqwest::header::AUTHORIZATION, s.bearer()),
            None => request,
        }
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        request.send().await.map_err(|e| {
            tracing::debug!(error = %e, "Request failed before a response arrived");
            ClientError::from(e)
        })
    }

    /// Return the response unchanged on 2xx, otherwise the matching
    /// [`ClientError`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::debug!(status = status.as_u16(), "Backend returned an error status");
            return Err(ClientError::from_status(status.as_u16(), body));
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        // An empty 2xx body decodes as `null`, so `Option<T>` targets see `None`.
        let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
