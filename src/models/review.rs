//! Review model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ValidationError, Validator};
use crate::store::document::{now_timestamp, Document};

/// Client-supplied review fields, shared by create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl ReviewInput {
    pub fn validate_new(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.require_text(&self.title, "Please add a review title");
        v.require_text(&self.text, "Please add some text");
        v.check(
            self.rating.is_some(),
            "Please add a rating between 1 and 10",
        );
        self.check_fields(&mut v);
        v.finish()
    }

    pub fn validate_patch(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        if self.title.is_some() {
            v.require_text(&self.title, "Please add a review title");
        }
        self.check_fields(&mut v);
        v.finish()
    }

    fn check_fields(&self, v: &mut Validator) {
        v.max_len(&self.title, 100, "Title can not be more than 100 characters");
        if let Some(rating) = self.rating {
            v.check(
                (1.0..=10.0).contains(&rating),
                "Rating must be between 1 and 10",
            );
        }
    }

    pub fn to_document(&self) -> Document {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Document::new(),
        }
    }

    pub fn to_new_document(&self, bootcamp: &str, owner: &str) -> Document {
        let mut doc = self.to_document();
        doc.insert("createdAt".to_string(), Value::String(now_timestamp()));
        doc.insert("bootcamp".to_string(), Value::String(bootcamp.to_string()));
        doc.insert("user".to_string(), Value::String(owner.to_string()));
        doc
    }
}
