//! Состояние запроса списка и его синхронизация с query string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::resource::FilterKind;

/// Допустимые размеры страницы.
pub const ALLOWED_LIMITS: [u32; 7] = [5, 6, 10, 12, 20, 24, 50];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Размер страницы из фиксированного набора `ALLOWED_LIMITS`.
pub struct Limit(u32);

impl Limit {
    /// Размер страницы по умолчанию.
    pub const DEFAULT: Limit = Limit(10);

    /// Возвращает `None` для значений вне набора.
    pub fn new(value: u32) -> Option<Self> {
        ALLOWED_LIMITS.contains(&value).then_some(Self(value))
    }

    /// Числовое значение.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Limit {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
            .ok_or_else(|| format!("limit must be one of {ALLOWED_LIMITS:?}, got {value}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Порядок сортировки списка.
pub enum Sort {
    /// Сначала новые.
    #[default]
    Latest,
    /// Сначала старые.
    Oldest,
    /// Случайный порядок.
    Random,
}

impl Sort {
    /// Значение параметра `sort`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Oldest => "oldest",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sort {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "latest" => Ok(Self::Latest),
            "oldest" => Ok(Self::Oldest),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Полное состояние запроса одного экрана списка.
pub struct QueryState {
    /// Текущая страница, начиная с 1.
    pub page: u32,
    /// Размер страницы.
    pub limit: Limit,
    /// Строка поиска как её ввёл пользователь.
    pub search: String,
    /// Порядок сортировки.
    pub sort: Sort,
    /// Id автора или категории, по которому фильтруется список.
    pub filter_id: Option<String>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Limit::DEFAULT,
            search: String::new(),
            sort: Sort::default(),
            filter_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Частичное обновление `QueryState`. `None`: поле не меняется.
pub struct QueryPatch {
    /// Новая страница.
    pub page: Option<u32>,
    /// Новый размер страницы.
    pub limit: Option<Limit>,
    /// Новая строка поиска.
    pub search: Option<String>,
    /// Новая сортировка.
    pub sort: Option<Sort>,
    /// Новый фильтр; `Some(None)` снимает фильтр.
    pub filter_id: Option<Option<String>>,
}

impl QueryPatch {
    /// Переход на страницу.
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Новая строка поиска.
    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Self::default()
        }
    }

    /// Новый размер страницы.
    pub fn limit(limit: Limit) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Новая сортировка.
    pub fn sort(sort: Sort) -> Self {
        Self {
            sort: Some(sort),
            ..Self::default()
        }
    }

    /// Новый фильтр.
    pub fn filter(filter_id: Option<String>) -> Self {
        Self {
            filter_id: Some(filter_id),
            ..Self::default()
        }
    }

    /// Добавляет страницу к уже собранному патчу.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Добавляет строку поиска к уже собранному патчу.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Добавляет размер страницы к уже собранному патчу.
    pub fn with_limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Добавляет сортировку к уже собранному патчу.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Добавляет фильтр к уже собранному патчу.
    pub fn with_filter(mut self, filter_id: Option<String>) -> Self {
        self.filter_id = Some(filter_id);
        self
    }
}

fn normalize_filter(filter_id: Option<String>) -> Option<String> {
    filter_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

impl QueryState {
    /// Вливает патч. Любое изменение поиска, размера страницы, сортировки
    /// или фильтра сбрасывает страницу на 1, даже если патч задаёт страницу.
    ///
    /// Возвращает `true`, если состояние изменилось.
    pub fn apply(&mut self, patch: QueryPatch) -> bool {
        let before = self.clone();
        let mut reset_page = false;

        if let Some(search) = patch.search.filter(|search| *search != self.search) {
            self.search = search;
            reset_page = true;
        }
        if let Some(limit) = patch.limit.filter(|limit| *limit != self.limit) {
            self.limit = limit;
            reset_page = true;
        }
        if let Some(sort) = patch.sort.filter(|sort| *sort != self.sort) {
            self.sort = sort;
            reset_page = true;
        }
        if let Some(filter_id) = patch.filter_id {
            let filter_id = normalize_filter(filter_id);
            if filter_id != self.filter_id {
                self.filter_id = filter_id;
                reset_page = true;
            }
        }

        if reset_page {
            self.page = 1;
        } else if let Some(page) = patch.page {
            self.page = page.max(1);
        }

        *self != before
    }

    /// Ограничивает страницу диапазоном `[1, total_pages]`.
    pub fn clamp_page(&mut self, total_pages: u32) -> bool {
        let clamped = self.page.clamp(1, total_pages.max(1));
        let changed = clamped != self.page;
        self.page = clamped;
        changed
    }

    /// Параметры GET-запроса. Пустые поля не отправляются.
    pub fn request_params(&self, filter_kind: Option<FilterKind>) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.get().to_string()),
        ];

        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("q".to_string(), search.to_string()));
        }
        params.push(("sort".to_string(), self.sort.as_str().to_string()));

        if let (Some(kind), Some(filter_id)) = (filter_kind, self.filter_id.as_deref()) {
            params.push((kind.key().to_string(), filter_id.to_string()));
        }

        params
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UrlQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<String>,
}

/// Сериализует `{filter, page, limit}` в query string вида
/// `author=<id>&page=<n>&limit=<n>`.
pub fn to_url_query(state: &QueryState, filter_kind: Option<FilterKind>) -> String {
    let filter_id = state.filter_id.clone();
    let mut url = UrlQuery {
        page: Some(state.page.to_string()),
        limit: Some(state.limit.get().to_string()),
        ..UrlQuery::default()
    };
    match filter_kind {
        Some(FilterKind::Author) => url.author = filter_id,
        Some(FilterKind::Category) => url.category = filter_id,
        None => {}
    }

    serde_html_form::to_string(&url).unwrap_or_default()
}

/// Восстанавливает состояние из query string. Некорректные значения
/// заменяются значениями по умолчанию; поиск и сортировка берутся из `base`.
pub fn from_url_query(raw: &str, filter_kind: Option<FilterKind>, base: &QueryState) -> QueryState {
    let raw = raw.trim().trim_start_matches('?');
    let url: UrlQuery = serde_html_form::from_str(raw).unwrap_or_else(|err| {
        tracing::warn!(error = %err, query = raw, "malformed url query, using defaults");
        UrlQuery::default()
    });

    let page = url
        .page
        .and_then(|page| page.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1);
    let limit = url
        .limit
        .and_then(|limit| limit.trim().parse::<u32>().ok())
        .and_then(Limit::new)
        .unwrap_or_default();
    let filter_id = match filter_kind {
        Some(FilterKind::Author) => normalize_filter(url.author),
        Some(FilterKind::Category) => normalize_filter(url.category),
        None => None,
    };

    QueryState {
        page,
        limit,
        search: base.search.clone(),
        sort: base.sort,
        filter_id,
    }
}

/// Стек навигации, в который пишется query string экрана.
pub trait History {
    /// Текущая запись.
    fn current(&self) -> Option<&str>;
    /// Добавляет запись без перехода на другую страницу.
    fn push(&mut self, url_query: &str);
    /// Заменяет текущую запись.
    fn replace(&mut self, url_query: &str);
}

#[derive(Debug, Clone, Default)]
/// История в памяти с переходами назад/вперёд.
pub struct MemoryHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl MemoryHistory {
    /// История с начальной записью (URL, с которым открыт экран).
    pub fn with_initial(url_query: impl Into<String>) -> Self {
        Self {
            entries: vec![url_query.into()],
            cursor: 0,
        }
    }

    /// Переход назад; возвращает новую текущую запись.
    pub fn back(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    /// Переход вперёд; возвращает новую текущую запись.
    pub fn forward(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    /// Количество записей.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Пуста ли история.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl History for MemoryHistory {
    fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    fn push(&mut self, url_query: &str) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(url_query.to_string());
        self.cursor = self.entries.len() - 1;
    }

    fn replace(&mut self, url_query: &str) {
        match self.entries.get_mut(self.cursor) {
            Some(entry) => *entry = url_query.to_string(),
            None => self.push(url_query),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Настройки экрана списка.
pub struct ScreenConfig {
    /// Фильтр, который поддерживает экран.
    pub filter_kind: Option<FilterKind>,
    /// Синхронизировать ли состояние с URL.
    pub url_synced: bool,
    /// Без фильтра список не загружается.
    pub requires_filter: bool,
}

impl ScreenConfig {
    /// Экран с внутренним состоянием, без URL и фильтров.
    pub fn internal() -> Self {
        Self::default()
    }

    /// Экран с необязательным фильтром, без URL.
    pub fn filtered(kind: FilterKind) -> Self {
        Self {
            filter_kind: Some(kind),
            ..Self::default()
        }
    }

    /// Посты одного автора: фильтр обязателен, состояние живёт в URL.
    pub fn author_scoped() -> Self {
        Self {
            filter_kind: Some(FilterKind::Author),
            url_synced: true,
            requires_filter: true,
        }
    }
}

#[derive(Debug, Clone)]
/// Владелец `QueryState` экрана: применяет патчи и пишет URL.
pub struct QueryController<H: History = MemoryHistory> {
    state: QueryState,
    config: ScreenConfig,
    history: H,
}

impl<H: History> QueryController<H> {
    /// Создаёт контроллер. Для экранов с URL состояние читается из
    /// текущей записи истории.
    pub fn new(config: ScreenConfig, history: H) -> Self {
        let defaults = QueryState::default();
        let state = match (config.url_synced, history.current()) {
            (true, Some(url_query)) => from_url_query(url_query, config.filter_kind, &defaults),
            _ => defaults,
        };
        Self {
            state,
            config,
            history,
        }
    }

    /// Текущее состояние.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Настройки экрана.
    pub fn config(&self) -> ScreenConfig {
        self.config
    }

    /// История навигации.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// История навигации для переходов назад/вперёд.
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Применяет патч и пишет URL. Возвращает `true`, если нужна загрузка.
    pub fn update_query(&mut self, patch: QueryPatch) -> bool {
        let changed = self.state.apply(patch);
        if changed && self.config.url_synced {
            let url_query = self.url_query();
            self.history.push(&url_query);
        }
        changed
    }

    /// Перечитывает состояние из URL после перехода назад/вперёд.
    pub fn on_pop_state(&mut self, url_query: &str) -> bool {
        if !self.config.url_synced {
            return false;
        }
        let restored = from_url_query(url_query, self.config.filter_kind, &self.state);
        let changed = restored != self.state;
        self.state = restored;
        changed
    }

    /// Ограничивает страницу после того, как число страниц уменьшилось.
    pub fn clamp_page(&mut self, total_pages: u32) -> bool {
        let changed = self.state.clamp_page(total_pages);
        if changed && self.config.url_synced {
            let url_query = self.url_query();
            self.history.replace(&url_query);
        }
        changed
    }

    /// Можно ли загружать список: экран без обязательного фильтра
    /// или фильтр задан.
    pub fn is_fetchable(&self) -> bool {
        !self.config.requires_filter || self.state.filter_id.is_some()
    }

    /// Query string для текущего состояния.
    pub fn url_query(&self) -> String {
        to_url_query(&self.state, self.config.filter_kind)
    }
}
