use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Коллекция, которой управляет бэкенд.
pub enum Resource {
    /// Все посты.
    Posts,
    /// Посты с отложенной публикацией.
    ScheduledPosts,
    /// Пользователи.
    Users,
    /// Категории.
    Categories,
    /// Сообщения из формы обратной связи.
    Contacts,
}

impl Resource {
    /// Все ресурсы в порядке отображения.
    pub const ALL: [Resource; 5] = [
        Resource::Posts,
        Resource::ScheduledPosts,
        Resource::Users,
        Resource::Categories,
        Resource::Contacts,
    ];

    /// Путь списка.
    pub fn list_path(self) -> &'static str {
        match self {
            Self::Posts => "/posts",
            Self::ScheduledPosts => "/posts/scheduled",
            Self::Users => "/users",
            Self::Categories => "/categories",
            Self::Contacts => "/admin/contacts",
        }
    }

    /// Путь отдельной записи.
    pub fn item_path(self, id: &str) -> String {
        match self {
            Self::Posts | Self::ScheduledPosts => format!("/posts/{id}"),
            Self::Users => format!("/users/{id}"),
            Self::Categories => format!("/categories/{id}"),
            Self::Contacts => format!("/admin/contacts/{id}"),
        }
    }

    /// Ключ массива в ответе списка, специфичный для ресурса.
    pub fn envelope_key(self) -> &'static str {
        match self {
            Self::Posts | Self::ScheduledPosts => "posts",
            Self::Users => "users",
            Self::Categories => "categories",
            Self::Contacts => "contacts",
        }
    }

    /// Ключ одиночной сущности в ответах `PATCH`/`POST`.
    pub fn singular_key(self) -> &'static str {
        match self {
            Self::Posts | Self::ScheduledPosts => "post",
            Self::Users => "user",
            Self::Categories => "category",
            Self::Contacts => "contact",
        }
    }

    /// Имя ресурса в CLI.
    pub fn name(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::ScheduledPosts => "scheduled",
            Self::Users => "users",
            Self::Categories => "categories",
            Self::Contacts => "contacts",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.name() == raw.trim())
            .ok_or_else(|| format!("unknown resource: {raw}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Вид фильтра списка. Совпадает с ключом в URL и в GET-параметрах.
pub enum FilterKind {
    /// Посты одного автора.
    Author,
    /// Посты одной категории.
    Category,
}

impl FilterKind {
    /// Ключ параметра запроса.
    pub fn key(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Category => "category",
        }
    }
}
