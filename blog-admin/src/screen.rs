use std::sync::Arc;

use serde::Serialize;
use validator::Validate;

use crate::actions::{ActionOutcome, Confirm, RowActionExecutor};
use crate::error::AdminClientResult;
use crate::fetcher::{FetchOutcome, ListFetcher};
use crate::list::{ListState, ListStore};
use crate::models::{Readable, Row};
use crate::pagination::{PageNav, PaginationControl};
use crate::query::{History, MemoryHistory, QueryController, QueryPatch, QueryState, ScreenConfig};
use crate::resource::Resource;
use crate::session::Session;
use crate::transport::ApiTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Уровень уведомления.
pub enum NoticeLevel {
    /// Действие выполнено.
    Success,
    /// Действие не удалось.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Всплывающее уведомление после действия над строкой.
pub struct Notice {
    /// Уровень.
    pub level: NoticeLevel,
    /// Текст для пользователя.
    pub text: String,
}

impl Notice {
    fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Экран списка: состояние запроса, загрузка, действия над строками и
/// пагинация одного ресурса.
///
/// Ошибки загрузки попадают в `ListState::view`, ошибки действий в
/// `notice`; наружу они возвращаются только для кода выхода.
pub struct ListScreen<T, H: History = MemoryHistory> {
    controller: QueryController<H>,
    fetcher: Arc<ListFetcher<T>>,
    executor: RowActionExecutor<T>,
    notice: Option<Notice>,
}

impl<T: Row, H: History> ListScreen<T, H> {
    /// Собирает экран для ресурса.
    pub fn new(
        api: Arc<dyn ApiTransport>,
        session: Session,
        resource: Resource,
        config: ScreenConfig,
        history: H,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        let fetcher = Arc::new(ListFetcher::new(
            Arc::clone(&api),
            session.clone(),
            resource,
            config,
            ListStore::new(),
        ));
        let executor = RowActionExecutor::new(api, session, Arc::clone(&fetcher), confirm);

        Self {
            controller: QueryController::new(config, history),
            fetcher,
            executor,
            notice: None,
        }
    }

    /// Текущее состояние запроса.
    pub fn query(&self) -> &QueryState {
        self.controller.state()
    }

    /// Контроллер состояния запроса.
    pub fn controller(&self) -> &QueryController<H> {
        &self.controller
    }

    /// Список в памяти.
    pub fn store(&self) -> &ListStore<T> {
        self.fetcher.store()
    }

    /// Снимок списка для рендера.
    pub fn state(&self) -> ListState<T> {
        self.store().snapshot()
    }

    /// Последнее уведомление.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Забирает уведомление (тост показан).
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Панель пагинации для текущей страницы.
    pub fn pagination(&self) -> PaginationControl {
        PaginationControl::new(self.query().page, self.state().total_pages)
    }

    /// Загружает текущую страницу. Если страниц стало меньше, чем номер
    /// текущей, страница ограничивается и загружается ещё раз.
    pub async fn load(&mut self) -> AdminClientResult<FetchOutcome> {
        let outcome = self.fetch_current().await?;
        self.clamp_and_reload(outcome).await
    }

    /// Если ответ сократил число страниц ниже текущей, страница
    /// ограничивается и загружается ещё раз.
    async fn clamp_and_reload(&mut self, outcome: FetchOutcome) -> AdminClientResult<FetchOutcome> {
        if let FetchOutcome::Committed { total_pages, .. } = outcome {
            if self.controller.clamp_page(total_pages) {
                tracing::debug!(page = self.query().page, "page clamped, reloading");
                return self.fetch_current().await;
            }
        }
        Ok(outcome)
    }

    async fn fetch_current(&self) -> AdminClientResult<FetchOutcome> {
        let query = self.controller.state().clone();
        self.fetcher.fetch(&query).await
    }

    /// Применяет патч и перезагружает список, если состояние изменилось.
    pub async fn update_query(
        &mut self,
        patch: QueryPatch,
    ) -> AdminClientResult<Option<FetchOutcome>> {
        if !self.controller.update_query(patch) {
            return Ok(None);
        }
        self.load().await.map(Some)
    }

    /// Переход по пагинации. Клик по текущей странице ничего не делает.
    pub async fn navigate(&mut self, nav: PageNav) -> AdminClientResult<Option<FetchOutcome>> {
        match self.pagination().target(nav) {
            Some(page) => self.update_query(QueryPatch::page(page)).await,
            None => Ok(None),
        }
    }

    /// Переход назад/вперёд по истории: состояние читается из URL.
    pub async fn on_pop_state(
        &mut self,
        url_query: &str,
    ) -> AdminClientResult<Option<FetchOutcome>> {
        if !self.controller.on_pop_state(url_query) {
            return Ok(None);
        }
        self.load().await.map(Some)
    }

    fn record(&mut self, result: &AdminClientResult<ActionOutcome>, done: &str) {
        self.notice = match result {
            Ok(ActionOutcome::Done) => Some(Notice::success(done)),
            Ok(ActionOutcome::Cancelled | ActionOutcome::Unchanged) => None,
            Err(err) => Some(Notice::error(err.user_message())),
        };
    }

    /// Удаляет строку после подтверждения.
    pub async fn delete(&mut self, id: &str) -> AdminClientResult<ActionOutcome> {
        let result = self.executor.delete(id).await;
        self.record(&result, "Deleted.");
        result
    }

    /// Публикует запись немедленно.
    pub async fn publish_now(&mut self, id: &str) -> AdminClientResult<ActionOutcome> {
        let result = self.executor.publish_now(id).await;
        self.record(&result, "Published.");
        result
    }

    /// Сохраняет форму и перезагружает список.
    pub async fn update<F>(&mut self, id: &str, form: &F) -> AdminClientResult<FetchOutcome>
    where
        F: Serialize + Validate + Sync,
    {
        let query = self.controller.state().clone();
        let result = match self.executor.update(id, form, &query).await {
            Ok(outcome) => self.clamp_and_reload(outcome).await,
            Err(err) => Err(err),
        };
        self.notice = Some(match &result {
            Ok(_) => Notice::success("Saved."),
            Err(err) => Notice::error(err.user_message()),
        });
        result
    }
}

impl<T: Readable, H: History> ListScreen<T, H> {
    /// Помечает строку прочитанной.
    pub async fn mark_read(&mut self, id: &str) -> AdminClientResult<ActionOutcome> {
        let result = self.executor.mark_read(id).await;
        self.record(&result, "Marked as read.");
        result
    }
}

impl<T: Row> ListScreen<T, MemoryHistory> {
    /// Кнопка «назад» браузера.
    pub async fn back(&mut self) -> AdminClientResult<Option<FetchOutcome>> {
        let Some(url_query) = self.controller.history_mut().back().map(str::to_string) else {
            return Ok(None);
        };
        self.on_pop_state(&url_query).await
    }

    /// Кнопка «вперёд» браузера.
    pub async fn forward(&mut self) -> AdminClientResult<Option<FetchOutcome>> {
        let Some(url_query) = self.controller.history_mut().forward().map(str::to_string) else {
            return Ok(None);
        };
        self.on_pop_state(&url_query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::AssumeYes;
    use crate::error::AdminClientError;
    use crate::forms::CategoryUpdate;
    use crate::list::ListView;
    use crate::models::{Category, ContactMessage};
    use crate::testing::ScriptedApi;
    use serde_json::json;
    use std::time::Duration;

    fn screen<T: Row>(
        api: Arc<ScriptedApi>,
        resource: Resource,
        config: ScreenConfig,
        history: MemoryHistory,
    ) -> ListScreen<T> {
        ListScreen::new(
            api,
            Session::new("token"),
            resource,
            config,
            history,
            Arc::new(AssumeYes),
        )
    }

    fn categories(ids: &[&str], total: u64) -> serde_json::Value {
        let data: Vec<_> = ids.iter().map(|id| json!({"id": id, "name": id})).collect();
        json!({"data": data, "meta": {"total": total}})
    }

    #[tokio::test]
    async fn search_resets_page_and_refetches() {
        let api = Arc::new(ScriptedApi::new());
        let mut screen = screen::<Category>(
            api.clone(),
            Resource::Categories,
            ScreenConfig::internal(),
            MemoryHistory::default(),
        );
        api.respond_list(Ok(categories(&["a"], 30)), Duration::ZERO);
        api.respond_list(Ok(categories(&["b"], 30)), Duration::ZERO);
        api.respond_list(Ok(categories(&["c"], 1)), Duration::ZERO);

        screen.load().await.expect("load");
        screen.navigate(PageNav::Page(3)).await.expect("navigate");
        assert_eq!(screen.query().page, 3);

        screen.update_query(QueryPatch::search("rust")).await.expect("search");
        assert_eq!(screen.query().page, 1);
        let last = api.calls().pop().expect("search call");
        assert!(last.params.contains(&("q".to_string(), "rust".to_string())));
        assert!(last.params.contains(&("page".to_string(), "1".to_string())));
    }

    #[tokio::test]
    async fn unchanged_query_does_not_refetch() {
        let api = Arc::new(ScriptedApi::new());
        let mut screen = screen::<Category>(
            api.clone(),
            Resource::Categories,
            ScreenConfig::internal(),
            MemoryHistory::default(),
        );
        screen.load().await.expect("load");

        let outcome = screen.navigate(PageNav::Page(1)).await.expect("navigate");
        assert_eq!(outcome, None);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn shrunk_total_clamps_page_and_reloads() {
        let api = Arc::new(ScriptedApi::new());
        let mut screen = screen::<Category>(
            api.clone(),
            Resource::Categories,
            ScreenConfig::author_scoped(),
            MemoryHistory::with_initial("author=u1&page=5&limit=10"),
        );
        api.respond_list(Ok(categories(&[], 12)), Duration::ZERO);
        api.respond_list(Ok(categories(&["k"], 12)), Duration::ZERO);

        screen.load().await.expect("load");

        assert_eq!(screen.query().page, 2);
        assert_eq!(screen.controller().history().current(), Some("author=u1&page=2&limit=10"));
        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].params.contains(&("page".to_string(), "2".to_string())));
    }

    #[tokio::test]
    async fn update_that_shrinks_total_moves_to_last_valid_page() {
        let api = Arc::new(ScriptedApi::new());
        let mut screen = screen::<Category>(
            api.clone(),
            Resource::Categories,
            ScreenConfig::internal(),
            MemoryHistory::default(),
        );
        api.respond_list(Ok(categories(&["a", "b"], 11)), Duration::ZERO);
        api.respond_list(Ok(categories(&["k"], 11)), Duration::ZERO);
        api.respond_list(Ok(categories(&[], 10)), Duration::ZERO);
        api.respond_list(Ok(categories(&["a", "b"], 10)), Duration::ZERO);

        screen.load().await.expect("load");
        screen.navigate(PageNav::Next).await.expect("next");
        assert_eq!(screen.query().page, 2);

        let form = CategoryUpdate {
            name: Some("Moved".to_string()),
            description: None,
        };
        screen.update("k", &form).await.expect("update");

        assert_eq!(screen.query().page, 1);
        let state = screen.state();
        assert_eq!(state.total_pages, 1);
        assert_eq!(state.items.len(), 2);
        let calls = api.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[2].method, reqwest::Method::PATCH);
        assert!(calls[3].params.contains(&("page".to_string(), "2".to_string())));
        assert!(calls[4].params.contains(&("page".to_string(), "1".to_string())));
        assert_eq!(screen.notice().map(|n| n.level), Some(NoticeLevel::Success));
    }

    #[tokio::test]
    async fn back_button_restores_previous_page() {
        let api = Arc::new(ScriptedApi::new());
        let mut screen = screen::<Category>(
            api.clone(),
            Resource::Categories,
            ScreenConfig::author_scoped(),
            MemoryHistory::with_initial("author=u1&page=1&limit=10"),
        );
        for _ in 0..3 {
            api.respond_list(Ok(categories(&["x"], 40)), Duration::ZERO);
        }

        screen.load().await.expect("load");
        screen.navigate(PageNav::Next).await.expect("next");
        assert_eq!(screen.query().page, 2);

        screen.back().await.expect("back");
        assert_eq!(screen.query().page, 1);
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn failed_action_becomes_error_notice() {
        let api = Arc::new(ScriptedApi::new());
        let mut screen = screen::<ContactMessage>(
            api.clone(),
            Resource::Contacts,
            ScreenConfig::internal(),
            MemoryHistory::default(),
        );
        api.respond_list(
            Ok(json!({"data": [{"id": "m1", "name": "A", "email": "a@example.com"}]})),
            Duration::ZERO,
        );
        screen.load().await.expect("load");
        api.respond_send(Err(AdminClientError::InvalidRequest("mailbox locked".to_string())));

        assert!(screen.mark_read("m1").await.is_err());
        assert_eq!(
            screen.take_notice(),
            Some(Notice {
                level: NoticeLevel::Error,
                text: "mailbox locked".to_string()
            })
        );
        assert!(!screen.state().items[0].is_read());
    }

    #[tokio::test]
    async fn delete_then_empty_page_shows_no_results() {
        let api = Arc::new(ScriptedApi::new());
        let mut screen = screen::<Category>(
            api.clone(),
            Resource::Categories,
            ScreenConfig::internal(),
            MemoryHistory::default(),
        );
        api.respond_list(Ok(categories(&["only"], 1)), Duration::ZERO);
        screen.load().await.expect("load");

        screen.delete("only").await.expect("delete");
        assert_eq!(screen.state().view(), ListView::NoResults);
        assert_eq!(screen.notice().map(|n| n.level), Some(NoticeLevel::Success));
    }
}
