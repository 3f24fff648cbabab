use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::Row;

/// `max(1, ceil(total / limit))`.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(limit)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, PartialEq)]
/// Результат одной загрузки страницы. Не изменяется после создания.
pub struct ListResult<T> {
    items: Vec<T>,
    total: u64,
    page: u32,
    limit: u32,
    total_pages: u32,
}

impl<T> ListResult<T> {
    /// Собирает результат; лишние элементы сверх `limit` отбрасываются,
    /// `total_pages` вычисляется из `total` и `limit`.
    pub fn new(mut items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        items.truncate(limit as usize);
        Self {
            items,
            total,
            page: page.max(1),
            limit,
            total_pages: total_pages(total, limit),
        }
    }

    /// Элементы страницы.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Общее количество элементов на сервере.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Номер страницы.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Размер страницы.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Количество страниц.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Забирает элементы.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Что сейчас показывает список.
pub enum ListStatus {
    /// Ещё ничего не загружалось.
    Idle,
    /// Идёт загрузка.
    Loading,
    /// Данные загружены.
    Ready,
    /// Нет токена, нужно войти.
    LoginRequired,
    /// Последняя загрузка завершилась ошибкой.
    Failed(String),
}

#[derive(Debug, Clone)]
/// Состояние списка в памяти.
pub struct ListState<T> {
    /// Строки текущей страницы.
    pub items: Vec<T>,
    /// Общее количество элементов по последнему ответу.
    pub total: u64,
    /// Страница последнего ответа.
    pub page: u32,
    /// Количество страниц по последнему ответу.
    pub total_pages: u32,
    /// Статус.
    pub status: ListStatus,
    latest_request: u64,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            total_pages: 1,
            status: ListStatus::Idle,
            latest_request: 0,
        }
    }
}

#[derive(Debug, PartialEq)]
/// Что рендерить для списка.
pub enum ListView<'a, T> {
    /// Загрузка ещё не запускалась.
    Idle,
    /// Идёт загрузка.
    Loading,
    /// Нужно войти.
    LoginRequired,
    /// Ошибка загрузки.
    Failed(&'a str),
    /// Запрос успешен, но строк нет.
    NoResults,
    /// Строки страницы.
    Items(&'a [T]),
}

impl<T> ListState<T> {
    /// Вид для рендера. Пустая страница после успешного ответа означает
    /// «нет результатов», а не ошибку.
    pub fn view(&self) -> ListView<'_, T> {
        match &self.status {
            ListStatus::Idle => ListView::Idle,
            ListStatus::Loading => ListView::Loading,
            ListStatus::LoginRequired => ListView::LoginRequired,
            ListStatus::Failed(message) => ListView::Failed(message.as_str()),
            ListStatus::Ready if self.items.is_empty() => ListView::NoResults,
            ListStatus::Ready => ListView::Items(&self.items),
        }
    }
}

/// Идентификатор запроса; чем больше, тем новее.
pub type RequestId = u64;

#[derive(Debug)]
/// Разделяемый список. Пишут в него только fetcher (при завершении
/// последнего запроса) и executor (после подтверждения сервера).
pub struct ListStore<T> {
    inner: Arc<Mutex<ListState<T>>>,
}

impl<T> Clone for ListStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ListStore<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ListState::default())),
        }
    }
}

impl<T: Row> ListStore<T> {
    /// Пустой список.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ListState<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Снимок состояния.
    pub fn snapshot(&self) -> ListState<T> {
        self.lock().clone()
    }

    /// Строки текущей страницы.
    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    /// Ищет строку по id.
    pub fn find(&self, id: &str) -> Option<T> {
        self.lock().items.iter().find(|row| row.id() == id).cloned()
    }

    /// Регистрирует новый запрос; все более ранние становятся устаревшими.
    pub(crate) fn begin_request(&self) -> RequestId {
        let mut state = self.lock();
        state.latest_request += 1;
        state.status = ListStatus::Loading;
        state.latest_request
    }

    /// Заменяет список результатом, если `id` совпадает с последним выданным запросом.
    pub(crate) fn commit(&self, id: RequestId, result: ListResult<T>) -> bool {
        let mut state = self.lock();
        if state.latest_request != id {
            return false;
        }
        state.total = result.total();
        state.page = result.page();
        state.total_pages = result.total_pages();
        state.items = result.into_items();
        state.status = ListStatus::Ready;
        true
    }

    /// Фиксирует ошибку последнего запроса. Старые строки убираются, чтобы
    /// не выдавать их за актуальный ответ.
    pub(crate) fn fail(&self, id: RequestId, status: ListStatus) -> bool {
        let mut state = self.lock();
        if state.latest_request != id {
            return false;
        }
        state.items.clear();
        state.status = status;
        true
    }

    /// Отменяет ожидание без запроса (экран без обязательного фильтра).
    pub(crate) fn clear(&self) {
        let mut state = self.lock();
        let latest_request = state.latest_request + 1;
        *state = ListState {
            latest_request,
            ..ListState::default()
        };
    }

    /// Удаляет строку по id. Возвращает `true`, если строка была в списке.
    pub(crate) fn remove(&self, id: &str) -> bool {
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|row| row.id() != id);
        state.items.len() != before
    }

    /// Изменяет строку на месте, не меняя порядок.
    pub(crate) fn patch(&self, id: &str, apply: impl FnOnce(&mut T)) -> bool {
        let mut state = self.lock();
        match state.items.iter_mut().find(|row| row.id() == id) {
            Some(row) => {
                apply(row);
                true
            }
            None => false,
        }
    }

    /// Заменяет строку версией с сервера.
    pub(crate) fn replace(&self, id: &str, updated: T) -> bool {
        self.patch(id, |row| *row = updated)
    }
}
