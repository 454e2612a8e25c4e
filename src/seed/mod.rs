//! # Seeding
//!
//! Imports bootcamps, courses, users and reviews from JSON array files in a
//! data directory (`bootcamps.json`, `courses.json`, `users.json`,
//! `reviews.json`), and wipes all four collections. Missing files are
//! skipped. Records go through the same derivations the API applies: slug,
//! geocoded location, hashed password and the bootcamp aggregates.

mod errors;

pub use errors::{SeedError, SeedResult};

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::crypto::hash_password;
use crate::geo::Geocoder;
use crate::models::bootcamp::slugify;
use crate::resources::aggregates::{recompute_average_cost, recompute_average_rating};
use crate::store::document::{document_id, now_timestamp, str_field};
use crate::store::{Document, FilterSet, FindOptions, StoreHandle};

/// Documents affected per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub bootcamps: usize,
    pub courses: usize,
    pub users: usize,
    pub reviews: usize,
}

/// Seeder bound to a data directory
pub struct Seeder<'a> {
    data_dir: PathBuf,
    geocoder: &'a dyn Geocoder,
}

impl<'a> Seeder<'a> {
    pub fn new(data_dir: impl Into<PathBuf>, geocoder: &'a dyn Geocoder) -> Self {
        Self {
            data_dir: data_dir.into(),
            geocoder,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Import every data file into `store`
    pub async fn import(&self, store: &StoreHandle) -> SeedResult<SeedReport> {
        let mut bootcamps = Vec::new();
        for doc in self.load("bootcamps.json").await? {
            bootcamps.push(self.prepare_bootcamp(doc).await);
        }
        let users = self
            .load("users.json")
            .await?
            .into_iter()
            .map(prepare_user)
            .collect::<SeedResult<Vec<_>>>()?;
        let courses = self.load("courses.json").await?.into_iter().map(stamp).collect();
        let reviews = self.load("reviews.json").await?.into_iter().map(stamp).collect();

        let report = SeedReport {
            bootcamps: store.bootcamps().create_many(bootcamps).await?,
            courses: store.courses().create_many(courses).await?,
            users: store.users().create_many(users).await?,
            reviews: store.reviews().create_many(reviews).await?,
        };

        for bootcamp in store.bootcamps().find(&FindOptions::default()).await? {
            if let Some(id) = document_id(&bootcamp) {
                recompute_average_cost(store, id).await?;
                recompute_average_rating(store, id).await?;
            }
        }

        info!(store = %store.name(), ?report, "seed data imported");
        Ok(report)
    }

    async fn load(&self, file: &str) -> SeedResult<Vec<Document>> {
        let path = self.data_dir.join(file);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(path = %path.display(), "seed file missing, skipping");
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| SeedError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let records: Vec<Value> = serde_json::from_str(&content).map_err(|e| SeedError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        records
            .into_iter()
            .map(|record| match record {
                Value::Object(doc) => Ok(doc),
                other => Err(SeedError::Parse {
                    path: path.clone(),
                    message: format!("expected an object, found {}", other),
                }),
            })
            .collect()
    }

    /// Slug, timestamps and a geocoded location in place of the address
    async fn prepare_bootcamp(&self, mut doc: Document) -> Document {
        if let Some(name) = str_field(&doc, "name") {
            let slug = slugify(name);
            doc.insert("slug".to_string(), Value::String(slug));
        }
        if let Some(Value::String(address)) = doc.remove("address") {
            match self.geocoder.geocode(&address).await {
                Ok(location) => {
                    doc.insert("location".to_string(), location.to_geojson());
                }
                Err(e) => warn!(%address, error = %e, "seed address not geocoded"),
            }
        }
        stamp(doc)
    }
}

fn stamp(mut doc: Document) -> Document {
    doc.entry("createdAt".to_string())
        .or_insert_with(|| Value::String(now_timestamp()));
    doc
}

/// Hash plain-text passwords; already hashed ones are kept
fn prepare_user(mut doc: Document) -> SeedResult<Document> {
    let password = match doc.get("password") {
        Some(Value::String(p)) => p.clone(),
        _ => {
            return Err(SeedError::Record(format!(
                "user {} has no password",
                str_field(&doc, "email").unwrap_or("<unknown>")
            )))
        }
    };
    if !password.starts_with("$argon2") {
        let hash = hash_password(&password).map_err(|e| SeedError::Record(e.to_string()))?;
        doc.insert("password".to_string(), Value::String(hash));
    }
    doc.entry("role".to_string())
        .or_insert_with(|| Value::String("user".to_string()));
    Ok(stamp(doc))
}

/// Remove every bootcamp, course, user and review
pub async fn delete_all(store: &StoreHandle) -> SeedResult<SeedReport> {
    let all = FilterSet::new();
    let report = SeedReport {
        bootcamps: store.bootcamps().delete_many(&all).await?,
        courses: store.courses().delete_many(&all).await?,
        users: store.users().delete_many(&all).await?,
        reviews: store.reviews().delete_many(&all).await?,
    };
    info!(store = %store.name(), ?report, "seed data deleted");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::verify_password;
    use crate::geo::{GeoPoint, StaticGeocoder};
    use crate::resources::testing::store;
    use serde_json::json;

    fn write(dir: &Path, file: &str, value: Value) {
        std::fs::write(dir.join(file), serde_json::to_string(&value).unwrap()).unwrap();
    }

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "bootcamps.json",
            json!([{"_id": "b1", "name": "Devworks Bootcamp", "address": "Boston MA", "user": "u1"}]),
        );
        write(
            dir.path(),
            "courses.json",
            json!([
                {"bootcamp": "b1", "title": "Front End", "tuition": 8000},
                {"bootcamp": "b1", "title": "Back End", "tuition": 12000}
            ]),
        );
        write(
            dir.path(),
            "users.json",
            json!([{"_id": "u1", "name": "Pub", "email": "pub@example.com", "password": "123456", "role": "publisher"}]),
        );
        write(
            dir.path(),
            "reviews.json",
            json!([{"bootcamp": "b1", "user": "u1", "title": "Good", "rating": 8}]),
        );
        dir
    }

    #[tokio::test]
    async fn test_import_derives_fields() {
        let store = store().await;
        let dir = data_dir();
        let geocoder = StaticGeocoder::centered(GeoPoint::new(-71.1, 42.3));

        let report = Seeder::new(dir.path(), &geocoder).import(&store).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                bootcamps: 1,
                courses: 2,
                users: 1,
                reviews: 1
            }
        );

        let bootcamp = store.bootcamps().find_by_id("b1").await.unwrap().unwrap();
        assert_eq!(bootcamp["slug"], "devworks-bootcamp");
        assert_eq!(bootcamp["averageCost"], 10000.0);
        assert_eq!(bootcamp["averageRating"], 8.0);
        assert!(bootcamp.get("address").is_none());
        assert_eq!(bootcamp["location"]["type"], "Point");

        let user = store.users().with_hidden().find_by_id("u1").await.unwrap().unwrap();
        assert!(verify_password("123456", user["password"].as_str().unwrap()).unwrap());
    }

    #[tokio::test]
    async fn test_missing_files_are_skipped() {
        let store = store().await;
        let dir = tempfile::tempdir().unwrap();
        let geocoder = StaticGeocoder::new();

        let report = Seeder::new(dir.path(), &geocoder).import(&store).await.unwrap();
        assert_eq!(report, SeedReport::default());
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let store = store().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("courses.json"), "{not json").unwrap();
        let geocoder = StaticGeocoder::new();

        let err = Seeder::new(dir.path(), &geocoder).import(&store).await.unwrap_err();
        assert!(matches!(err, SeedError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_delete_all() {
        let store = store().await;
        let dir = data_dir();
        let geocoder = StaticGeocoder::centered(GeoPoint::new(0.0, 0.0));
        Seeder::new(dir.path(), &geocoder).import(&store).await.unwrap();

        let report = delete_all(&store).await.unwrap();
        assert_eq!(report.courses, 2);
        assert_eq!(store.bootcamps().count(&FilterSet::new()).await.unwrap(), 0);
        assert_eq!(store.users().count(&FilterSet::new()).await.unwrap(), 0);
    }
}
