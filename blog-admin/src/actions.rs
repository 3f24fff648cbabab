use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::error::{AdminClientError, AdminClientResult};
use crate::fetcher::{FetchOutcome, ListFetcher};
use crate::list::ListStore;
use crate::models::{Readable, Row};
use crate::query::QueryState;
use crate::resource::Resource;
use crate::session::Session;
use crate::transport::ApiTransport;

/// Подтверждение разрушительного действия пользователем.
pub trait Confirm: Send + Sync {
    /// `true`, если пользователь согласился.
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Подтверждает всё без вопросов (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Результат действия над строкой.
pub enum ActionOutcome {
    /// Сервер подтвердил, список обновлён.
    Done,
    /// Пользователь отказался, запрос не отправлялся.
    Cancelled,
    /// Действие ничего бы не изменило, запрос не отправлялся.
    Unchanged,
}

fn check_success(body: &Value) -> AdminClientResult<()> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = ["message", "error"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .unwrap_or("the server rejected the request");
        return Err(AdminClientError::Rejected(message.to_string()));
    }
    Ok(())
}

fn extract_entity<T: Row>(body: &Value, resource: Resource) -> AdminClientResult<T> {
    let raw = [resource.singular_key(), "data"]
        .iter()
        .find_map(|key| body.get(key).filter(|value| value.is_object()))
        .ok_or_else(|| {
            AdminClientError::Decode(format!(
                "response has no `{}` object",
                resource.singular_key()
            ))
        })?;
    serde_json::from_value(raw.clone())
        .map_err(|err| AdminClientError::Decode(format!("{resource}: {err}")))
}

/// Выполняет действия над одной строкой и сверяет список в памяти
/// только после ответа сервера.
pub struct RowActionExecutor<T> {
    api: Arc<dyn ApiTransport>,
    session: Session,
    fetcher: Arc<ListFetcher<T>>,
    confirm: Arc<dyn Confirm>,
}

impl<T: Row> RowActionExecutor<T> {
    /// Создаёт executor поверх fetcher'а того же списка.
    pub fn new(
        api: Arc<dyn ApiTransport>,
        session: Session,
        fetcher: Arc<ListFetcher<T>>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            api,
            session,
            fetcher,
            confirm,
        }
    }

    fn store(&self) -> &ListStore<T> {
        self.fetcher.store()
    }

    fn resource(&self) -> Resource {
        self.fetcher.resource()
    }

    /// Удаляет строку после подтверждения. Страница не меняется, даже
    /// если стала пустой.
    pub async fn delete(&self, id: &str) -> AdminClientResult<ActionOutcome> {
        let label = self
            .store()
            .find(id)
            .map(|row| row.label().to_string())
            .unwrap_or_else(|| id.to_string());
        if !self.confirm.confirm(&format!("Delete \"{label}\"?")) {
            return Ok(ActionOutcome::Cancelled);
        }

        let token = self.session.require_token()?;
        let path = self.resource().item_path(id);
        let body = self
            .api
            .send_json(token, Method::DELETE, &path, None)
            .await
            .inspect_err(|err| tracing::warn!(%path, error = %err, "delete failed"))?;
        check_success(&body)?;

        self.store().remove(id);
        tracing::debug!(%path, "row deleted");
        Ok(ActionOutcome::Done)
    }

    /// Публикует запись сейчас и заменяет строку версией с сервера.
    pub async fn publish_now(&self, id: &str) -> AdminClientResult<ActionOutcome> {
        let token = self.session.require_token()?;
        let path = format!("{}/publish", self.resource().item_path(id));
        let body = self
            .api
            .send_json(token, Method::POST, &path, None)
            .await
            .inspect_err(|err| tracing::warn!(%path, error = %err, "publish failed"))?;
        check_success(&body)?;

        let updated = extract_entity::<T>(&body, self.resource())?;
        self.store().replace(id, updated);
        Ok(ActionOutcome::Done)
    }

    /// Сохраняет изменения и перезагружает список: правка может сдвинуть
    /// строку в сортировке или вывести её из фильтра.
    pub async fn update<F>(
        &self,
        id: &str,
        form: &F,
        query: &QueryState,
    ) -> AdminClientResult<FetchOutcome>
    where
        F: Serialize + Validate + Sync,
    {
        form.validate()?;

        let token = self.session.require_token()?;
        let payload =
            serde_json::to_value(form).map_err(|err| AdminClientError::Decode(err.to_string()))?;
        let path = self.resource().item_path(id);
        let body = self
            .api
            .send_json(token, Method::PATCH, &path, Some(&payload))
            .await
            .inspect_err(|err| tracing::warn!(%path, error = %err, "update failed"))?;
        check_success(&body)?;

        self.fetcher.fetch(query).await
    }
}

impl<T: Readable> RowActionExecutor<T> {
    /// Помечает строку прочитанной. Уже прочитанная строка не трогается.
    pub async fn mark_read(&self, id: &str) -> AdminClientResult<ActionOutcome> {
        if self.store().find(id).is_some_and(|row| row.is_read()) {
            return Ok(ActionOutcome::Unchanged);
        }

        let token = self.session.require_token()?;
        let path = format!("{}/read", self.resource().item_path(id));
        let body = self
            .api
            .send_json(token, Method::PATCH, &path, None)
            .await
            .inspect_err(|err| tracing::warn!(%path, error = %err, "mark read failed"))?;
        check_success(&body)?;

        self.store().patch(id, |row| row.mark_read());
        Ok(ActionOutcome::Done)
    }
}
