use std::sync::Arc;

use crate::envelope;
use crate::error::{AdminClientError, AdminClientResult};
use crate::list::{ListStatus, ListStore};
use crate::models::Row;
use crate::query::{QueryState, ScreenConfig};
use crate::resource::Resource;
use crate::session::Session;
use crate::transport::ApiTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Чем закончилась загрузка.
pub enum FetchOutcome {
    /// Результат записан в список.
    Committed {
        /// Страница ответа.
        page: u32,
        /// Количество страниц.
        total_pages: u32,
    },
    /// Пока запрос шёл, начался более новый; ответ отброшен.
    Superseded,
    /// Экрану нужен фильтр, а его нет: запрос не отправлялся.
    Skipped,
}

/// Загружает страницы списка и записывает в `ListStore` только ответ
/// последнего выданного запроса.
pub struct ListFetcher<T> {
    api: Arc<dyn ApiTransport>,
    session: Session,
    resource: Resource,
    config: ScreenConfig,
    store: ListStore<T>,
}

impl<T: Row> ListFetcher<T> {
    /// Создаёт fetcher для ресурса.
    pub fn new(
        api: Arc<dyn ApiTransport>,
        session: Session,
        resource: Resource,
        config: ScreenConfig,
        store: ListStore<T>,
    ) -> Self {
        Self {
            api,
            session,
            resource,
            config,
            store,
        }
    }

    /// Список, в который пишет fetcher.
    pub fn store(&self) -> &ListStore<T> {
        &self.store
    }

    /// Ресурс, который загружает fetcher.
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Загружает страницу по `query`.
    ///
    /// Ошибка возвращается только если запрос всё ещё последний; ошибки
    /// устаревших запросов отбрасываются так же, как их данные.
    pub async fn fetch(&self, query: &QueryState) -> AdminClientResult<FetchOutcome> {
        let token = match self.session.require_token() {
            Ok(token) => token,
            Err(err) => {
                let id = self.store.begin_request();
                self.store.fail(id, ListStatus::LoginRequired);
                return Err(err);
            }
        };

        if self.config.requires_filter && query.filter_id.is_none() {
            tracing::debug!(resource = %self.resource, "no filter id, skipping fetch");
            self.store.clear();
            return Ok(FetchOutcome::Skipped);
        }

        let id = self.store.begin_request();
        let params = query.request_params(self.config.filter_kind);
        tracing::debug!(
            resource = %self.resource,
            request_id = id,
            page = query.page,
            "fetching list"
        );

        let result = match self
            .api
            .get_json(token, self.resource.list_path(), &params)
            .await
        {
            Ok(body) => envelope::normalize::<T>(body, self.resource, query),
            Err(err) => Err(err),
        };

        match result {
            Ok(list) => {
                let outcome = FetchOutcome::Committed {
                    page: list.page(),
                    total_pages: list.total_pages(),
                };
                if self.store.commit(id, list) {
                    return Ok(outcome);
                }
            }
            Err(err) => {
                let status = match &err {
                    AdminClientError::Unauthorized => ListStatus::LoginRequired,
                    other => ListStatus::Failed(other.user_message()),
                };
                if self.store.fail(id, status) {
                    tracing::warn!(resource = %self.resource, error = %err, "list fetch failed");
                    return Err(err);
                }
            }
        }

        tracing::debug!(
            resource = %self.resource,
            request_id = id,
            "discarding superseded response"
        );
        Ok(FetchOutcome::Superseded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ListView;
    use crate::models::Category;
    use crate::query::QueryPatch;
    use crate::testing::ScriptedApi;
    use serde_json::json;
    use std::time::Duration;

    fn page_of(ids: &[&str], total: u64) -> serde_json::Value {
        let data: Vec<_> = ids.iter().map(|id| json!({"id": id, "name": id})).collect();
        json!({"data": data, "meta": {"total": total}})
    }

    fn fetcher(api: Arc<ScriptedApi>, config: ScreenConfig) -> ListFetcher<Category> {
        ListFetcher::new(
            api,
            Session::new("token"),
            Resource::Categories,
            config,
            ListStore::new(),
        )
    }

    #[tokio::test]
    async fn commits_latest_and_reports_pages() {
        let api = Arc::new(ScriptedApi::new());
        api.respond_list(Ok(page_of(&["a", "b"], 25)), Duration::ZERO);
        let fetcher = fetcher(api.clone(), ScreenConfig::internal());

        let outcome = fetcher.fetch(&QueryState::default()).await.expect("fetch");
        assert_eq!(
            outcome,
            FetchOutcome::Committed {
                page: 1,
                total_pages: 3
            }
        );
        assert_eq!(fetcher.store().items().len(), 2);
        assert_eq!(api.calls()[0].path, "/categories");
    }

    #[tokio::test]
    async fn slow_stale_response_never_overwrites_newer_list() {
        let api = Arc::new(ScriptedApi::new());
        api.respond_list(Ok(page_of(&["stale"], 1)), Duration::from_millis(80));
        api.respond_list(Ok(page_of(&["fresh"], 1)), Duration::from_millis(5));
        let fetcher = fetcher(api.clone(), ScreenConfig::internal());

        let mut first_query = QueryState::default();
        first_query.apply(QueryPatch::search("r"));
        let mut second_query = first_query.clone();
        second_query.apply(QueryPatch::search("ru"));

        let first = fetcher.fetch(&first_query);
        let second = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            fetcher.fetch(&second_query).await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.expect("first"), FetchOutcome::Superseded);
        assert!(matches!(second.expect("second"), FetchOutcome::Committed { .. }));
        let items = fetcher.store().items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "fresh");
    }

    #[tokio::test]
    async fn stale_error_is_discarded_too() {
        let api = Arc::new(ScriptedApi::new());
        api.respond_list(
            Err(AdminClientError::InvalidRequest("boom".to_string())),
            Duration::from_millis(60),
        );
        api.respond_list(Ok(page_of(&["ok"], 1)), Duration::ZERO);
        let fetcher = fetcher(api.clone(), ScreenConfig::internal());

        let query = QueryState::default();
        let first = fetcher.fetch(&query);
        let second = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            fetcher.fetch(&query).await
        };
        let (first, _) = tokio::join!(first, second);

        assert_eq!(first.expect("stale error is swallowed"), FetchOutcome::Superseded);
        assert!(matches!(fetcher.store().snapshot().view(), ListView::Items(_)));
    }

    #[tokio::test]
    async fn http_failure_is_visible_not_empty_success() {
        let api = Arc::new(ScriptedApi::new());
        api.respond_list(
            Err(AdminClientError::InvalidRequest("http status 500".to_string())),
            Duration::ZERO,
        );
        let fetcher = fetcher(api.clone(), ScreenConfig::internal());

        let result = fetcher.fetch(&QueryState::default()).await;
        assert!(result.is_err());
        assert_eq!(
            fetcher.store().snapshot().view(),
            ListView::Failed("http status 500")
        );
    }

    #[tokio::test]
    async fn missing_token_short_circuits_before_network() {
        let api = Arc::new(ScriptedApi::new());
        let fetcher = ListFetcher::<Category>::new(
            api.clone(),
            Session::anonymous(),
            Resource::Categories,
            ScreenConfig::internal(),
            ListStore::new(),
        );

        let result = fetcher.fetch(&QueryState::default()).await;
        assert!(matches!(result, Err(AdminClientError::Unauthorized)));
        assert!(api.calls().is_empty());
        assert_eq!(fetcher.store().snapshot().view(), ListView::LoginRequired);
    }

    #[tokio::test]
    async fn author_scoped_fetch_without_author_is_a_no_op() {
        let api = Arc::new(ScriptedApi::new());
        let fetcher = fetcher(api.clone(), ScreenConfig::author_scoped());

        let outcome = fetcher.fetch(&QueryState::default()).await.expect("fetch");
        assert_eq!(outcome, FetchOutcome::Skipped);
        assert!(api.calls().is_empty());
        assert!(fetcher.store().items().is_empty());
    }

    #[tokio::test]
    async fn request_carries_filter_under_its_key() {
        let api = Arc::new(ScriptedApi::new());
        api.respond_list(Ok(page_of(&[], 0)), Duration::ZERO);
        let fetcher = fetcher(api.clone(), ScreenConfig::author_scoped());

        let mut query = QueryState::default();
        query.apply(QueryPatch::filter(Some("u7".to_string())));
        fetcher.fetch(&query).await.expect("fetch");

        let call = &api.calls()[0];
        assert!(call.params.contains(&("author".to_string(), "u7".to_string())));
        assert_eq!(call.token, "token");
    }
}
