use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
/// Ошибки библиотеки `blog-admin`.
pub enum AdminClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Сервер не ответил за отведённое время.
    #[error("request timed out")]
    Timeout,

    /// Требуется авторизация (отсутствует/некорректен токен).
    #[error("unauthorized")]
    Unauthorized,

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Некорректный запрос или ошибка, описанная сервером.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Тело ответа не удалось разобрать.
    #[error("decode error: {0}")]
    Decode(String),

    /// Форма не прошла клиентскую валидацию, запрос не отправлялся.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Сервер ответил `{"success": false}`.
    #[error("rejected by server: {0}")]
    Rejected(String),
}

/// Результат операций `blog-admin`.
pub type AdminClientResult<T> = Result<T, AdminClientError>;

impl AdminClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Unauthorized
            }
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                Self::InvalidRequest(message)
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        Self::Http(err)
    }

    /// Текст, который экран показывает пользователю вместо ошибки.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Please log in to continue.".to_string(),
            Self::NotFound => "The requested item no longer exists.".to_string(),
            Self::Timeout => "The server took too long to respond. Try again.".to_string(),
            Self::Validation(errors) => format!("Please fix the form: {errors}"),
            Self::InvalidRequest(message) | Self::Rejected(message) => message.clone(),
            Self::Http(_) | Self::Decode(_) => {
                "Something went wrong while talking to the server.".to_string()
            }
        }
    }
}
