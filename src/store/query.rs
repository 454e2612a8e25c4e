//! # Query Model
//!
//! Filter expressions, sort keys and find options understood by every
//! [`DocumentStore`](super::DocumentStore).

use std::cmp::Ordering;

use serde_json::{json, Value};

use super::document::{get_path, Document};
use crate::geo::{within_sphere, GeoPoint};

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equals (array fields match when any element equals)
    Eq,

    /// Greater than
    Gt,

    /// Greater than or equal
    Gte,

    /// Less than
    Lt,

    /// Less than or equal
    Lte,

    /// Value in list
    In,

    /// Coordinate pair inside a spherical cap: `[[lng, lat], radians]`
    WithinSphere,
}

impl FilterOperator {
    /// Operator keyword accepted in query strings (`field[gt]=`)
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "lt" => Some(FilterOperator::Lt),
            "in" => Some(FilterOperator::In),
            _ => None,
        }
    }
}

/// A filter expression
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    /// Field to filter on (dotted paths reach into sub-documents)
    pub field: String,

    /// Comparison operator
    pub operator: FilterOperator,

    /// Value to compare against
    pub value: Value,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Gt, value)
    }

    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Match coordinates within `radius` radians of `center`.
    pub fn within_sphere(field: impl Into<String>, center: GeoPoint, radius: f64) -> Self {
        Self::new(
            field,
            FilterOperator::WithinSphere,
            json!([[center.longitude, center.latitude], radius]),
        )
    }

    /// Check if a document matches this filter
    pub fn matches(&self, doc: &Document) -> bool {
        let field_value = match get_path(doc, &self.field) {
            Some(v) => v,
            None => return self.operator == FilterOperator::Eq && self.value.is_null(),
        };

        match self.operator {
            FilterOperator::Eq => match field_value {
                Value::Array(items) if !self.value.is_array() => {
                    items.iter().any(|item| values_equal(item, &self.value))
                }
                _ => values_equal(field_value, &self.value),
            },
            FilterOperator::Gt => compare_ordered(field_value, &self.value) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                compare_ordered(field_value, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => compare_ordered(field_value, &self.value) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                compare_ordered(field_value, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::In => {
                let candidates = match &self.value {
                    Value::Array(arr) => arr.as_slice(),
                    other => std::slice::from_ref(other),
                };
                match field_value {
                    Value::Array(items) => items
                        .iter()
                        .any(|item| candidates.iter().any(|c| values_equal(item, c))),
                    single => candidates.iter().any(|c| values_equal(single, c)),
                }
            }
            FilterOperator::WithinSphere => {
                let (Some(center), Some(radius)) = (
                    self.value.get(0).and_then(GeoPoint::from_coordinates),
                    self.value.get(1).and_then(Value::as_f64),
                ) else {
                    return false;
                };
                GeoPoint::from_coordinates(field_value)
                    .map(|point| within_sphere(point, center, radius))
                    .unwrap_or(false)
            }
        }
    }
}

/// Equality with the numeric coercion a typed schema would apply:
/// a numeric string equals the number it spells.
fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (n.as_f64(), s.trim().parse::<f64>()) {
                (Some(x), Ok(y)) => x == y,
                _ => false,
            }
        }
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => false,
    }
}

/// Ordering for range operators; `None` when the values are not comparable.
fn compare_ordered(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Number(x), Value::String(s)) => x.as_f64()?.partial_cmp(&s.trim().parse().ok()?),
        (Value::String(s), Value::Number(y)) => s.trim().parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// A set of filters combined with AND logic
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub filters: Vec<FilterExpr>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    /// Shorthand for a single equality filter
    pub fn by(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(FilterExpr::eq(field, value.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Check if a document matches all filters
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// Compare two documents by a list of sort keys.
pub fn compare_documents(a: &Document, b: &Document, order: &[OrderBy]) -> Ordering {
    for key in order {
        let ordering = sort_compare(get_path(a, &key.field), get_path(b, &key.field));
        let ordering = if key.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Total order across JSON types: missing, null, numbers, strings,
/// objects, arrays, booleans.
fn sort_compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Object(_)) => 4,
            Some(Value::Array(_)) => 5,
            Some(Value::Bool(_)) => 6,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Options for a `find` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub filter: FilterSet,
    pub order: Vec<OrderBy>,
    pub skip: usize,
    pub limit: Option<usize>,
    /// Projection; `None` returns every field
    pub select: Option<Vec<String>>,
}

impl FindOptions {
    pub fn filtered(filter: FilterSet) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn sorted(mut self, order: Vec<OrderBy>) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }

    pub fn select(mut self, fields: Vec<String>) -> Self {
        self.select = Some(fields);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{angular_radius, DistanceUnit};
    use crate::store::document::into_document;

    fn doc(value: Value) -> Document {
        into_document(value).unwrap()
    }

    #[test]
    fn test_eq_filter() {
        let filter = FilterExpr::eq("name", json!("Alice"));

        assert!(filter.matches(&doc(json!({"name": "Alice"}))));
        assert!(!filter.matches(&doc(json!({"name": "Bob"}))));
    }

    #[test]
    fn test_eq_against_array_field() {
        let filter = FilterExpr::eq("careers", json!("Business"));
        assert!(filter.matches(&doc(json!({"careers": ["Web Development", "Business"]}))));
        assert!(!filter.matches(&doc(json!({"careers": ["UI/UX"]}))));
    }

    #[test]
    fn test_eq_null_matches_missing_field() {
        let filter = FilterExpr::eq("averageCost", Value::Null);
        assert!(filter.matches(&doc(json!({"name": "x"}))));
    }

    #[test]
    fn test_numeric_string_coercion() {
        let filter = FilterExpr::new("averageCost", FilterOperator::Lt, json!("10000"));
        assert!(filter.matches(&doc(json!({"averageCost": 9000}))));
        assert!(!filter.matches(&doc(json!({"averageCost": 12000}))));

        let weeks = FilterExpr::eq("weeks", json!(12));
        assert!(weeks.matches(&doc(json!({"weeks": "12"}))));
    }

    #[test]
    fn test_gt_filter() {
        let filter = FilterExpr::gt("tuition", json!(8000));

        assert!(filter.matches(&doc(json!({"tuition": 9000}))));
        assert!(!filter.matches(&doc(json!({"tuition": 8000}))));
        assert!(!filter.matches(&doc(json!({}))));
    }

    #[test]
    fn test_in_filter() {
        let filter = FilterExpr::in_list("minimumSkill", vec![json!("beginner"), json!("intermediate")]);

        assert!(filter.matches(&doc(json!({"minimumSkill": "beginner"}))));
        assert!(!filter.matches(&doc(json!({"minimumSkill": "advanced"}))));

        let careers = FilterExpr::in_list("careers", vec![json!("Business")]);
        assert!(careers.matches(&doc(json!({"careers": ["Other", "Business"]}))));
    }

    #[test]
    fn test_embedded_object_equality() {
        // an unrecognized operator key compares as a sub-document
        let filter = FilterExpr::eq("averageCost", json!({"lte": 10000}));
        assert!(!filter.matches(&doc(json!({"averageCost": 5000}))));
    }

    #[test]
    fn test_within_sphere_filter() {
        let boston = GeoPoint::new(-71.0589, 42.3601);
        let filter = FilterExpr::within_sphere(
            "location.coordinates",
            boston,
            angular_radius(10.0, DistanceUnit::Kilometers),
        );

        assert!(filter.matches(&doc(json!({"location": {"coordinates": [-71.1097, 42.3736]}}))));
        assert!(!filter.matches(&doc(json!({"location": {"coordinates": [-74.0060, 40.7128]}}))));
        assert!(!filter.matches(&doc(json!({"name": "no location"}))));
    }

    #[test]
    fn test_filter_set() {
        let filters = FilterSet::new()
            .and(FilterExpr::eq("housing", json!(true)))
            .and(FilterExpr::gt("averageCost", json!(1000)));

        assert!(filters.matches(&doc(json!({"housing": true, "averageCost": 2000}))));
        assert!(!filters.matches(&doc(json!({"housing": false, "averageCost": 2000}))));
    }

    #[test]
    fn test_compare_documents_multi_key() {
        let a = doc(json!({"rating": 5, "title": "b"}));
        let b = doc(json!({"rating": 5, "title": "a"}));
        let c = doc(json!({"rating": 9, "title": "z"}));

        let order = vec![OrderBy::desc("rating"), OrderBy::asc("title")];
        let mut docs = vec![a.clone(), b.clone(), c.clone()];
        docs.sort_by(|x, y| compare_documents(x, y, &order));

        assert_eq!(docs, vec![c, b, a]);
    }
}
