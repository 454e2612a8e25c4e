//! Derived bootcamp fields and cascades.
//!
//! Handlers call these after a successful mutation of a course, review or
//! bootcamp. With no courses (reviews) left, the aggregate is cleared.

use serde_json::{json, Value};
use tracing::debug;

use crate::store::{Document, FilterSet, FindOptions, ModelHandle, StoreHandle, StoreResult};

/// Mean tuition rounded up to the nearest 10
pub fn average_cost(tuitions: &[f64]) -> Option<f64> {
    mean(tuitions).map(|avg| (avg / 10.0).ceil() * 10.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn numeric_field(doc: &Document, field: &str) -> Option<f64> {
    match doc.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

async fn children_values(children: ModelHandle<'_>, bootcamp_id: &str, field: &str) -> StoreResult<Vec<f64>> {
    let docs = children
        .find(&FindOptions::filtered(FilterSet::by("bootcamp", bootcamp_id)))
        .await?;
    Ok(docs.iter().filter_map(|d| numeric_field(d, field)).collect())
}

async fn set_aggregate(store: &StoreHandle, bootcamp_id: &str, field: &str, value: Option<f64>) -> StoreResult<()> {
    let mut patch = Document::new();
    patch.insert(field.to_string(), value.map(|v| json!(v)).unwrap_or(Value::Null));
    store.bootcamps().update(bootcamp_id, patch).await?;
    debug!(bootcamp = bootcamp_id, field, ?value, "aggregate recomputed");
    Ok(())
}

/// Recompute `averageCost` of a bootcamp from its courses
pub async fn recompute_average_cost(store: &StoreHandle, bootcamp_id: &str) -> StoreResult<Option<f64>> {
    let tuitions = children_values(store.courses(), bootcamp_id, "tuition").await?;
    let value = average_cost(&tuitions);
    set_aggregate(store, bootcamp_id, "averageCost", value).await?;
    Ok(value)
}

/// Recompute `averageRating` of a bootcamp from its reviews
pub async fn recompute_average_rating(store: &StoreHandle, bootcamp_id: &str) -> StoreResult<Option<f64>> {
    let ratings = children_values(store.reviews(), bootcamp_id, "rating").await?;
    let value = mean(&ratings);
    set_aggregate(store, bootcamp_id, "averageRating", value).await?;
    Ok(value)
}

/// Delete the courses of a bootcamp that is being removed
pub async fn delete_bootcamp_courses(store: &StoreHandle, bootcamp_id: &str) -> StoreResult<usize> {
    let removed = store
        .courses()
        .delete_many(&FilterSet::by("bootcamp", bootcamp_id))
        .await?;
    debug!(bootcamp = bootcamp_id, removed, "bootcamp courses removed");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document::{document_id, into_document};
    use crate::store::{MemoryStore, StoreName};
    use std::sync::Arc;

    async fn store() -> StoreHandle {
        StoreHandle::bind(StoreName::Cloud, Arc::new(MemoryStore::new("cloud")))
            .await
            .unwrap()
    }

    async fn bootcamp(store: &StoreHandle) -> String {
        let created = store
            .bootcamps()
            .create(into_document(json!({"name": "Devworks"})).unwrap())
            .await
            .unwrap();
        document_id(&created).unwrap().to_string()
    }

    #[test]
    fn test_average_cost_rounds_up_to_ten() {
        assert_eq!(average_cost(&[100.0, 150.0, 200.0]), Some(150.0));
        assert_eq!(average_cost(&[10000.0, 12001.0]), Some(11010.0));
        assert_eq!(average_cost(&[]), None);
    }

    #[tokio::test]
    async fn test_recompute_average_cost() {
        let store = store().await;
        let id = bootcamp(&store).await;
        for tuition in [100, 150, 200] {
            store
                .courses()
                .create(into_document(json!({"bootcamp": id, "tuition": tuition})).unwrap())
                .await
                .unwrap();
        }

        assert_eq!(recompute_average_cost(&store, &id).await.unwrap(), Some(150.0));
        let doc = store.bootcamps().find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(doc["averageCost"], 150.0);
    }

    #[tokio::test]
    async fn test_aggregate_cleared_without_children() {
        let store = store().await;
        let id = bootcamp(&store).await;
        store
            .reviews()
            .create(into_document(json!({"bootcamp": id, "user": "u", "rating": 7})).unwrap())
            .await
            .unwrap();
        recompute_average_rating(&store, &id).await.unwrap();

        store
            .reviews()
            .delete_many(&FilterSet::by("bootcamp", id.as_str()))
            .await
            .unwrap();
        assert_eq!(recompute_average_rating(&store, &id).await.unwrap(), None);

        let doc = store.bootcamps().find_by_id(&id).await.unwrap().unwrap();
        assert!(doc.get("averageRating").is_none());
    }

    #[tokio::test]
    async fn test_delete_bootcamp_courses() {
        let store = store().await;
        let id = bootcamp(&store).await;
        for other in [id.as_str(), id.as_str(), "other"] {
            store
                .courses()
                .create(into_document(json!({"bootcamp": other, "tuition": 1})).unwrap())
                .await
                .unwrap();
        }

        assert_eq!(delete_bootcamp_courses(&store, &id).await.unwrap(), 2);
        assert_eq!(store.courses().count(&FilterSet::new()).await.unwrap(), 1);
    }
}
