//! # Advanced Results
//!
//! Parses list query strings into filters, projection, sort order and a
//! page window, and runs them against a model.
//!
//! ```text
//! ?careers=Business&averageCost[lte]=10000&select=name,slug&sort=-name&page=2&limit=10
//! ```
//!
//! Bracket keys whose operator is `gt`, `gte`, `lt` or `in` become range or
//! membership filters. Any other bracket key is grouped into an embedded
//! document compared by equality.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::dispatch::Pagination;
use crate::store::{Document, FilterExpr, FilterOperator, FilterSet, FindOptions, ModelHandle, OrderBy, StoreResult};

/// Page used when `page` is absent or invalid
pub const DEFAULT_PAGE: usize = 1;

/// Page size used when `limit` is absent or invalid
pub const DEFAULT_LIMIT: usize = 25;

/// A parsed list query
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: FilterSet,
    pub select: Option<Vec<String>>,
    pub sort: Vec<OrderBy>,
    pub page: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: FilterSet::new(),
            select: None,
            sort: vec![OrderBy::desc("createdAt")],
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    /// Parse raw query pairs, in order of appearance
    pub fn parse(pairs: &[(String, String)]) -> Self {
        let mut query = ListQuery::default();
        let mut plain: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        let mut embedded: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

        for (key, value) in pairs {
            match key.as_str() {
                "select" => query.select = parse_list(value),
                "sort" => {
                    if let Some(sort) = parse_sort(value) {
                        query.sort = sort;
                    }
                }
                "page" => query.page = parse_positive(value).unwrap_or(DEFAULT_PAGE),
                "limit" => query.limit = parse_positive(value).unwrap_or(DEFAULT_LIMIT),
                _ => match split_bracket(key) {
                    Some((field, op)) => match FilterOperator::from_keyword(op) {
                        Some(FilterOperator::In) => {
                            let values = value.split(',').map(|v| parse_filter_value(v.trim())).collect();
                            query.filter = query.filter.and(FilterExpr::in_list(field, values));
                        }
                        Some(operator) => {
                            query.filter = query
                                .filter
                                .and(FilterExpr::new(field, operator, parse_filter_value(value)));
                        }
                        None => {
                            embedded
                                .entry(field.to_string())
                                .or_default()
                                .insert(op.to_string(), parse_filter_value(value));
                        }
                    },
                    None => plain
                        .entry(key.clone())
                        .or_default()
                        .push(parse_filter_value(value)),
                },
            }
        }

        for (field, mut values) in plain {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            query.filter = query.filter.and(FilterExpr::eq(field, value));
        }
        for (field, doc) in embedded {
            query.filter = query.filter.and(FilterExpr::eq(field, Value::Object(doc)));
        }

        query
    }

    /// Restrict the query with an additional filter
    pub fn scoped(mut self, filter: FilterExpr) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    /// Number of matching documents skipped before this page
    pub fn skip(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::filtered(self.filter.clone())
            .sorted(self.sort.clone())
            .page(self.skip(), self.limit);
        if let Some(select) = &self.select {
            options = options.select(select.clone());
        }
        options
    }

    pub fn pagination(&self, total: usize) -> Pagination {
        Pagination::compute(self.page, self.limit, total)
    }
}

/// Run `query` against `model`: one page of results and the pagination
/// computed from the filtered total.
pub async fn advanced_results(model: ModelHandle<'_>, query: &ListQuery) -> StoreResult<(Vec<Document>, Pagination)> {
    let total = model.count(&query.filter).await?;
    let docs = model.find(&query.find_options()).await?;
    Ok((docs, query.pagination(total)))
}

/// `field[op]` → `(field, op)`
fn split_bracket(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    let inner = key[open + 1..].strip_suffix(']')?;
    if open == 0 || inner.is_empty() {
        return None;
    }
    Some((&key[..open], inner))
}

/// Comma-separated field list
fn parse_list(value: &str) -> Option<Vec<String>> {
    let fields: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!fields.is_empty()).then_some(fields)
}

/// Comma-separated sort keys, `-` prefix for descending
fn parse_sort(value: &str) -> Option<Vec<OrderBy>> {
    let order: Vec<OrderBy> = parse_list(value)?
        .into_iter()
        .filter_map(|part| match part.strip_prefix('-') {
            Some("") => None,
            Some(field) => Some(OrderBy::desc(field)),
            None => Some(OrderBy::asc(part)),
        })
        .collect();
    (!order.is_empty()).then_some(order)
}

fn parse_positive(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// Type a query-string value: null, booleans, numbers, else text
fn parse_filter_value(value: &str) -> Value {
    if value == "null" {
        return Value::Null;
    }

    if value == "true" {
        return Value::Bool(true);
    }
    if value == "false" {
        return Value::Bool(false);
    }

    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = value.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return Value::Number(num);
        }
    }

    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::parse(&[]);

        assert!(query.filter.is_empty());
        assert_eq!(query.sort, vec![OrderBy::desc("createdAt")]);
        assert_eq!((query.page, query.limit), (1, 25));
        assert_eq!(query.skip(), 0);
    }

    #[test]
    fn test_operator_keys_become_filters() {
        let query = ListQuery::parse(&pairs(&[
            ("averageCost[gt]", "1000"),
            ("averageCost[lt]", "9000"),
            ("careers[in]", "Business,UI/UX"),
        ]));

        assert_eq!(
            query.filter.filters,
            vec![
                FilterExpr::new("averageCost", FilterOperator::Gt, json!(1000)),
                FilterExpr::new("averageCost", FilterOperator::Lt, json!(9000)),
                FilterExpr::in_list("careers", vec![json!("Business"), json!("UI/UX")]),
            ]
        );
    }

    #[test]
    fn test_untranslated_operator_is_embedded_equality() {
        let query = ListQuery::parse(&pairs(&[("averageCost[lte]", "10000")]));
        assert_eq!(
            query.filter.filters,
            vec![FilterExpr::eq("averageCost", json!({"lte": 10000}))]
        );

        let nested = ListQuery::parse(&pairs(&[("location[state]", "MA"), ("location[city]", "Boston")]));
        assert_eq!(
            nested.filter.filters,
            vec![FilterExpr::eq("location", json!({"city": "Boston", "state": "MA"}))]
        );
    }

    #[test]
    fn test_reserved_keys_are_not_filters() {
        let query = ListQuery::parse(&pairs(&[
            ("select", "name,description"),
            ("sort", "name,-averageCost"),
            ("page", "2"),
            ("limit", "10"),
            ("housing", "true"),
        ]));

        assert_eq!(
            query.select,
            Some(vec!["name".to_string(), "description".to_string()])
        );
        assert_eq!(
            query.sort,
            vec![OrderBy::asc("name"), OrderBy::desc("averageCost")]
        );
        assert_eq!((query.page, query.limit), (2, 10));
        assert_eq!(query.skip(), 10);
        assert_eq!(query.filter.filters, vec![FilterExpr::eq("housing", json!(true))]);
    }

    #[test]
    fn test_invalid_page_and_limit_fall_back() {
        let query = ListQuery::parse(&pairs(&[("page", "0"), ("limit", "many")]));
        assert_eq!((query.page, query.limit), (DEFAULT_PAGE, DEFAULT_LIMIT));
    }

    #[test]
    fn test_repeated_key_matches_whole_array() {
        let query = ListQuery::parse(&pairs(&[("careers", "Business"), ("careers", "Other")]));
        assert_eq!(
            query.filter.filters,
            vec![FilterExpr::eq("careers", json!(["Business", "Other"]))]
        );
    }

    #[test]
    fn test_pagination_from_total() {
        let first = ListQuery::parse(&pairs(&[("page", "1")]));
        let p = first.pagination(30);
        assert!(p.next.is_some() && p.previous.is_none());

        let second = ListQuery::parse(&pairs(&[("page", "2")]));
        let p = second.pagination(30);
        assert!(p.next.is_none() && p.previous.is_some());
    }

    #[test]
    fn test_filter_value_typing() {
        assert_eq!(parse_filter_value("null"), Value::Null);
        assert_eq!(parse_filter_value("false"), json!(false));
        assert_eq!(parse_filter_value("42"), json!(42));
        assert_eq!(parse_filter_value("4.5"), json!(4.5));
        assert_eq!(parse_filter_value("Boston"), json!("Boston"));
    }
}
