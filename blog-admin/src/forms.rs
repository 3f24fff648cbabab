//! Формы редактирования. Валидация выполняется до отправки запроса.

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::{Validate, ValidationError};

use crate::models::PostStatus;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Изменения поста. Отсутствующие поля не отправляются.
pub struct PostUpdate {
    /// Новый заголовок.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: Option<String>,
    /// Новое содержимое.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1), custom(function = "not_blank"))]
    pub content: Option<String>,
    /// Новая категория (id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Новый статус.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    /// Время публикации. Публикацией по расписанию занимается бэкенд.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl PostUpdate {
    /// Форма отложенной публикации: статус `scheduled` и время.
    pub fn schedule(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(PostStatus::Scheduled),
            published_at: Some(at),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
/// Изменения категории.
pub struct CategoryUpdate {
    /// Новое название.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64), custom(function = "not_blank"))]
    pub name: Option<String>,
    /// Новое описание.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
/// Изменения пользователя.
pub struct UserUpdate {
    /// Новое имя.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64), custom(function = "not_blank"))]
    pub name: Option<String>,
    /// Новый email.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    /// Новая роль.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}
