use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::AdminClientResult;

/// Транспорт до REST API. Каждый вызов несёт bearer-токен сессии.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// `GET path?params` и разбор JSON-тела.
    async fn get_json(
        &self,
        token: &str,
        path: &str,
        params: &[(String, String)],
    ) -> AdminClientResult<Value>;

    /// Запрос с необязательным JSON-телом (`DELETE`, `PATCH`, `POST`).
    /// Пустой ответ возвращается как `Value::Null`.
    async fn send_json(
        &self,
        token: &str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> AdminClientResult<Value>;
}
