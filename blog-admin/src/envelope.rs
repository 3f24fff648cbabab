//! Приведение ответов списка к одному виду.
//!
//! Бэкенд кладёт массив то в `data`, то в ключ ресурса (`posts`, `users`,
//! `categories`), то в `result`; пагинация бывает и в `meta`, и на верхнем
//! уровне. Вся терпимость к этому живёт здесь.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AdminClientError, AdminClientResult};
use crate::list::ListResult;
use crate::query::QueryState;
use crate::resource::Resource;

/// Ключи массива в порядке приоритета.
fn item_keys(resource: Resource) -> [&'static str; 3] {
    ["data", resource.envelope_key(), "result"]
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Ищет поле сначала в `meta`, затем на верхнем уровне.
fn meta_field(body: &Value, names: &[&str]) -> Option<u64> {
    let meta = body.get("meta");
    names
        .iter()
        .find_map(|name| meta.and_then(|meta| meta.get(name)).and_then(as_u64))
        .or_else(|| names.iter().find_map(|name| body.get(name).and_then(as_u64)))
}

fn extract_items(body: &Value, resource: Resource) -> Option<&Vec<Value>> {
    if let Value::Array(items) = body {
        return Some(items);
    }
    item_keys(resource)
        .into_iter()
        .find_map(|key| body.get(key).and_then(Value::as_array))
}

/// Нормализует тело ответа списка в `ListResult`.
///
/// Недостающие поля пагинации выводятся: `page` и `limit` из запроса,
/// `total` из позиции страницы и количества строк, `total_pages` из
/// `total / limit`.
pub fn normalize<T: DeserializeOwned>(
    body: Value,
    resource: Resource,
    requested: &QueryState,
) -> AdminClientResult<ListResult<T>> {
    let raw_items = match extract_items(&body, resource) {
        Some(items) => items.clone(),
        None => {
            tracing::warn!(%resource, "list response has no items array, treating as empty");
            Vec::new()
        }
    };
    let items = raw_items
        .into_iter()
        .map(serde_json::from_value::<T>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| AdminClientError::Decode(format!("{resource} item: {err}")))?;

    let page = meta_field(&body, &["page", "currentPage"])
        .and_then(|page| u32::try_from(page).ok())
        .filter(|page| *page >= 1)
        .unwrap_or(requested.page);
    let limit = meta_field(&body, &["limit", "perPage", "pageSize"])
        .and_then(|limit| u32::try_from(limit).ok())
        .filter(|limit| *limit >= 1)
        .unwrap_or_else(|| requested.limit.get());
    let reported_pages = meta_field(&body, &["totalPages", "total_pages", "pages"]);

    let total = match meta_field(&body, &["total", "totalItems", "count"]) {
        Some(total) => total,
        None => {
            let estimated = estimate_total(items.len() as u64, page, limit, reported_pages);
            tracing::debug!(%resource, estimated, "list response has no total, estimating");
            estimated
        }
    };

    let result = ListResult::new(items, total, page, limit);
    if let Some(reported) =
        reported_pages.filter(|pages| *pages != u64::from(result.total_pages()))
    {
        tracing::warn!(
            %resource,
            reported,
            derived = result.total_pages(),
            "totalPages disagrees with total/limit, using derived value"
        );
    }
    Ok(result)
}

/// Оценка `total`, когда сервер его не прислал.
fn estimate_total(item_count: u64, page: u32, limit: u32, reported_pages: Option<u64>) -> u64 {
    let limit = u64::from(limit);
    let before = u64::from(page.saturating_sub(1)) * limit;
    let counted = before.saturating_add(item_count);
    match reported_pages {
        Some(pages) if pages > u64::from(page) => pages.checked_mul(limit).unwrap_or(counted),
        _ => counted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::query::Limit;
    use serde_json::json;

    fn requested(page: u32, limit: u32) -> QueryState {
        QueryState {
            page,
            limit: Limit::new(limit).expect("allowed limit"),
            ..QueryState::default()
        }
    }

    fn categories(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| json!({"id": format!("c{i}"), "name": format!("Cat {i}")}))
            .collect()
    }

    #[test]
    fn data_key_with_meta() {
        let body = json!({
            "data": categories(10),
            "meta": {"total": 25, "page": 1, "limit": 10, "totalPages": 3}
        });
        let result: ListResult<Category> =
            normalize(body, Resource::Categories, &requested(1, 10)).expect("normalize");
        assert_eq!(result.items().len(), 10);
        assert_eq!(result.total(), 25);
        assert_eq!(result.total_pages(), 3);
    }

    #[test]
    fn resource_key_with_flat_metadata() {
        let body = json!({"categories": categories(5), "total": "12", "page": 3, "limit": 5});
        let result: ListResult<Category> =
            normalize(body, Resource::Categories, &requested(1, 10)).expect("normalize");
        assert_eq!(result.page(), 3);
        assert_eq!(result.limit(), 5);
        assert_eq!(result.total(), 12);
        assert_eq!(result.total_pages(), 3);
    }

    #[test]
    fn data_wins_over_resource_key_and_result() {
        let body = json!({
            "result": categories(3),
            "categories": categories(2),
            "data": categories(1),
        });
        let result: ListResult<Category> =
            normalize(body, Resource::Categories, &requested(1, 10)).expect("normalize");
        assert_eq!(result.items().len(), 1);
    }

    #[test]
    fn result_key_is_last_resort() {
        let body = json!({"result": categories(2), "users": categories(4)});
        let result: ListResult<Category> =
            normalize(body, Resource::Categories, &requested(1, 10)).expect("normalize");
        assert_eq!(result.items().len(), 2);
    }

    #[test]
    fn meta_takes_precedence_over_top_level() {
        let body = json!({"data": [], "total": 99, "meta": {"total": 7}});
        let result: ListResult<Category> =
            normalize(body, Resource::Categories, &requested(1, 5)).expect("normalize");
        assert_eq!(result.total(), 7);
        assert_eq!(result.total_pages(), 2);
    }

    #[test]
    fn missing_array_is_empty_result_not_error() {
        let body = json!({"success": true});
        let result: ListResult<Category> =
            normalize(body, Resource::Categories, &requested(2, 10)).expect("normalize");
        assert!(result.items().is_empty());
        assert_eq!(result.page(), 2);
        assert_eq!(result.total_pages(), 1);
    }

    #[test]
    fn missing_total_is_estimated_from_position() {
        let body = json!({"data": categories(4)});
        let result: ListResult<Category> =
            normalize(body, Resource::Categories, &requested(3, 10)).expect("normalize");
        assert_eq!(result.total(), 24);
        assert_eq!(result.total_pages(), 3);
    }

    #[test]
    fn bare_array_body_is_accepted() {
        let body = Value::Array(categories(3));
        let result: ListResult<Category> =
            normalize(body, Resource::Categories, &requested(1, 10)).expect("normalize");
        assert_eq!(result.items().len(), 3);
        assert_eq!(result.total(), 3);
    }

    #[test]
    fn absurd_total_pages_without_total_falls_back_to_counted_rows() {
        let body = json!({"data": categories(2), "limit": 50, "totalPages": u64::MAX});
        let result: ListResult<Category> =
            normalize(body, Resource::Categories, &requested(1, 50)).expect("normalize");
        assert_eq!(result.total(), 2);
        assert_eq!(result.total_pages(), 1);
    }

    #[test]
    fn malformed_item_is_a_decode_error() {
        let body = json!({"data": [{"id": "c1"}]});
        let result = normalize::<Category>(body, Resource::Categories, &requested(1, 10));
        assert!(matches!(result, Err(AdminClientError::Decode(_))));
    }
}
