//! Кнопки пагинации: чистая функция от текущей страницы и числа страниц.

use std::fmt::Write as _;

/// До скольких страниц показываются все номера без пропусков.
const MAX_UNCOLLAPSED: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Элемент панели пагинации.
pub enum PageItem {
    /// Кнопка с номером страницы.
    Page(u32),
    /// Свёрнутый диапазон («…»).
    Gap,
}

/// Последовательность кнопок: первая, окно из трёх вокруг текущей,
/// последняя; по одному `Gap` с каждой стороны, если есть что сворачивать.
pub fn page_items(current: u32, total_pages: u32) -> Vec<PageItem> {
    let last = total_pages.max(1);
    let current = current.clamp(1, last);

    if last <= MAX_UNCOLLAPSED {
        return (1..=last).map(PageItem::Page).collect();
    }

    let window_start = current.saturating_sub(1).max(2);
    let window_end = current.saturating_add(1).min(last - 1);

    let mut items = vec![PageItem::Page(1)];
    if window_start > 2 {
        items.push(PageItem::Gap);
    }
    items.extend((window_start..=window_end).map(PageItem::Page));
    if window_end < last - 1 {
        items.push(PageItem::Gap);
    }
    items.push(PageItem::Page(last));
    items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Куда пользователь хочет перейти.
pub enum PageNav {
    /// На первую.
    First,
    /// На предыдущую.
    Prev,
    /// На следующую.
    Next,
    /// На последнюю.
    Last,
    /// На конкретную.
    Page(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Панель пагинации. Своего состояния не держит.
pub struct PaginationControl {
    current: u32,
    total_pages: u32,
}

impl PaginationControl {
    /// Панель для `current` из `total_pages`.
    pub fn new(current: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            current: current.clamp(1, total_pages),
            total_pages,
        }
    }

    /// Кнопки для рендера.
    pub fn items(&self) -> Vec<PageItem> {
        page_items(self.current, self.total_pages)
    }

    /// Страница, на которую надо перейти, или `None`, если это текущая.
    pub fn target(&self, nav: PageNav) -> Option<u32> {
        let target = match nav {
            PageNav::First => 1,
            PageNav::Prev => self.current.saturating_sub(1),
            PageNav::Next => self.current.saturating_add(1),
            PageNav::Last => self.total_pages,
            PageNav::Page(page) => page,
        }
        .clamp(1, self.total_pages);

        (target != self.current).then_some(target)
    }

    /// Есть ли предыдущая страница.
    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    /// Есть ли следующая страница.
    pub fn has_next(&self) -> bool {
        self.current < self.total_pages
    }

    /// Текстовая панель: `« 1 … 9 [10] 11 … 20 »`.
    pub fn render_bar(&self) -> String {
        let mut bar = String::new();
        if self.has_prev() {
            bar.push_str("« ");
        }
        for (index, item) in self.items().into_iter().enumerate() {
            if index > 0 {
                bar.push(' ');
            }
            match item {
                PageItem::Page(page) if page == self.current => {
                    let _ = write!(bar, "[{page}]");
                }
                PageItem::Page(page) => {
                    let _ = write!(bar, "{page}");
                }
                PageItem::Gap => bar.push('…'),
            }
        }
        if self.has_next() {
            bar.push_str(" »");
        }
        bar
    }
}
