//! Клиентская библиотека админки блога поверх REST API.
//!
//! Общий для всех экранов списка паттерн: состояние запроса с синхронизацией
//! в URL (`QueryController`), загрузка страниц с защитой от устаревших
//! ответов (`ListFetcher`), действия над строками со сверкой списка в памяти
//! (`RowActionExecutor`) и панель пагинации (`PaginationControl`).
//!
//! Токен передаётся явно через `Session`; все запросы уходят с заголовком
//! `Authorization: Bearer <token>`.
#![warn(missing_docs)]

mod actions;
mod envelope;
mod error;
mod fetcher;
mod forms;
mod http_client;
mod list;
mod models;
mod pagination;
mod query;
mod resource;
mod screen;
mod session;
#[cfg(test)]
mod testing;
mod transport;

pub use actions::{ActionOutcome, AssumeYes, Confirm, RowActionExecutor};
pub use envelope::normalize;
pub use error::{AdminClientError, AdminClientResult};
pub use fetcher::{FetchOutcome, ListFetcher};
pub use forms::{CategoryUpdate, PostUpdate, UserUpdate};
pub use http_client::{HttpClient, HttpTimeouts};
pub use list::{ListResult, ListState, ListStatus, ListStore, ListView, RequestId, total_pages};
pub use models::{
    Category, ContactMessage, ContactStatus, Post, PostStatus, Readable, Reference, Row, User,
};
pub use pagination::{PageItem, PageNav, PaginationControl, page_items};
pub use query::{
    ALLOWED_LIMITS, History, Limit, MemoryHistory, QueryController, QueryPatch, QueryState,
    ScreenConfig, Sort, from_url_query, to_url_query,
};
pub use resource::{FilterKind, Resource};
pub use screen::{ListScreen, Notice, NoticeLevel};
pub use session::{Session, parse_token};
pub use transport::ApiTransport;

/// HTTP-метод, который принимает `ApiTransport::send_json`.
pub use reqwest::Method;
