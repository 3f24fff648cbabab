use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Строка списка: всё, что нужно паттерну от сущности.
pub trait Row: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Идентификатор для поиска и точечных изменений.
    fn id(&self) -> &str;
    /// Человекочитаемое имя для подтверждений (заголовок, имя).
    fn label(&self) -> &str;
}

/// Строка, которую можно пометить прочитанной.
pub trait Readable: Row {
    /// Прочитана ли запись.
    fn is_read(&self) -> bool;
    /// Переводит запись в статус «прочитано».
    fn mark_read(&mut self);
}

/// Принимает id как строку или число (`"42"` и `42` равнозначны).
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
/// Ссылка на связанную сущность: только id или встроенный объект.
pub enum Reference {
    /// Бэкенд вернул только идентификатор.
    Id(#[serde(deserialize_with = "deserialize_id")] String),
    /// Бэкенд развернул связанную сущность.
    Embedded {
        /// Идентификатор.
        #[serde(alias = "_id", deserialize_with = "deserialize_id")]
        id: String,
        /// Имя или заголовок, если есть.
        #[serde(default)]
        name: Option<String>,
    },
}

impl Reference {
    /// Идентификатор связанной сущности.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Embedded { id, .. } => id,
        }
    }

    /// Имя, если оно известно, иначе id.
    pub fn display(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Embedded { id, name } => name.as_deref().unwrap_or(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Статус поста.
pub enum PostStatus {
    /// Черновик.
    #[default]
    Draft,
    /// Опубликован.
    Published,
    /// Ждёт публикации по `published_at`.
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Пост блога.
pub struct Post {
    /// Идентификатор поста.
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    /// Заголовок поста.
    pub title: String,
    /// Slug для публичного URL.
    #[serde(default)]
    pub slug: Option<String>,
    /// Содержимое поста.
    #[serde(default)]
    pub content: Option<String>,
    /// Статус публикации.
    #[serde(default)]
    pub status: PostStatus,
    /// Автор.
    #[serde(default)]
    pub author: Option<Reference>,
    /// Категория.
    #[serde(default)]
    pub category: Option<Reference>,
    /// Момент публикации (у отложенных постов в будущем).
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Дата создания.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Row for Post {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Пользователь админки.
pub struct User {
    /// Идентификатор пользователя.
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    /// Имя.
    pub name: String,
    /// Email.
    pub email: String,
    /// Роль (`admin`, `author`, ...).
    #[serde(default)]
    pub role: Option<String>,
    /// Дата регистрации.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Row for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Категория постов.
pub struct Category {
    /// Идентификатор категории.
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    /// Название.
    pub name: String,
    /// Slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Описание.
    #[serde(default)]
    pub description: Option<String>,
}

impl Row for Category {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Статус сообщения обратной связи.
pub enum ContactStatus {
    /// Новое сообщение.
    #[default]
    Unread,
    /// Прочитано администратором.
    Read,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Сообщение из формы обратной связи.
pub struct ContactMessage {
    /// Идентификатор сообщения.
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    /// Имя отправителя.
    pub name: String,
    /// Email отправителя.
    pub email: String,
    /// Тема.
    #[serde(default)]
    pub subject: Option<String>,
    /// Текст сообщения.
    #[serde(default)]
    pub message: String,
    /// Статус.
    #[serde(default)]
    pub status: ContactStatus,
    /// Дата отправки.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Row for ContactMessage {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        self.subject.as_deref().unwrap_or(&self.name)
    }
}

impl Readable for ContactMessage {
    fn is_read(&self) -> bool {
        self.status == ContactStatus::Read
    }

    fn mark_read(&mut self) {
        self.status = ContactStatus::Read;
    }
}
