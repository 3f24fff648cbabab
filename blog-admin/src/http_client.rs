use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{AdminClientError, AdminClientResult};
use crate::transport::ApiTransport;

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Clone, Copy)]
/// Таймауты HTTP-клиента.
pub struct HttpTimeouts {
    /// Таймаут установки соединения.
    pub connect: Duration,
    /// Таймаут всего запроса.
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP-клиент REST API блога.
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт клиент с базовым URL API, например `http://127.0.0.1:8080/api`.
    pub fn new(base_url: impl Into<String>, timeouts: HttpTimeouts) -> AdminClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn decode_error(response: reqwest::Response) -> AdminClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body
                .error
                .or(body.message)
                .unwrap_or_else(|| format!("http status {status}")),
            Err(_) => format!("http status {status}"),
        };
        AdminClientError::from_http_status(status, Some(message))
    }

    async fn read_json(response: reqwest::Response) -> AdminClientResult<Value> {
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(AdminClientError::from_reqwest)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|err| AdminClientError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ApiTransport for HttpClient {
    async fn get_json(
        &self,
        token: &str,
        path: &str,
        params: &[(String, String)],
    ) -> AdminClientResult<Value> {
        let url = self.endpoint(path);
        tracing::debug!(%url, ?params, "GET");

        let response = self
            .client
            .request(Method::GET, url)
            .query(params)
            .bearer_auth(token)
            .send()
            .await
            .map_err(AdminClientError::from_reqwest)?;

        Self::read_json(response).await
    }

    async fn send_json(
        &self,
        token: &str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> AdminClientResult<Value> {
        let url = self.endpoint(path);
        tracing::debug!(%url, %method, "sending request");

        let mut request = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(AdminClientError::from_reqwest)?;

        Self::read_json(response).await
    }
}
