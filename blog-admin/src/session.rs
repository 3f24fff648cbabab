use std::sync::Arc;

use crate::error::{AdminClientError, AdminClientResult};

#[derive(Debug, Clone, Default)]
/// Сессия администратора: bearer-токен, который передаётся в fetcher и
/// executor явно, а не читается из глобального хранилища.
pub struct Session {
    token: Option<Arc<str>>,
}

impl Session {
    /// Создаёт сессию с токеном. Пустой токен считается отсутствующим.
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            token: parse_token(token.as_ref()).map(Arc::from),
        }
    }

    /// Сессия без токена.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Возвращает текущий токен, если он установлен.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Есть ли у сессии токен.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn require_token(&self) -> AdminClientResult<&str> {
        self.token.as_deref().ok_or(AdminClientError::Unauthorized)
    }
}

/// Обрезает пробелы и отбрасывает пустые значения.
pub fn parse_token(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
