//! Course model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use super::{ValidationError, Validator};
use crate::store::document::{now_timestamp, Document};

/// Allowed values of `minimumSkill`
pub const SKILL_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Client-supplied course fields, shared by create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Stored as text; numbers are accepted
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub weeks: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuition: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scholarship_available: Option<bool>,
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text or number, found {}",
            other
        ))),
    }
}

impl CourseInput {
    pub fn validate_new(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.require_text(&self.title, "Please add a course title");
        v.require_text(&self.description, "Please add a description");
        v.require_text(&self.weeks, "Please add a number of weeks");
        v.check(self.tuition.is_some(), "Please add a tuition cost");
        v.check(self.minimum_skill.is_some(), "Please add a minimum skill");
        self.check_fields(&mut v);
        v.finish()
    }

    pub fn validate_patch(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        if self.title.is_some() {
            v.require_text(&self.title, "Please add a course title");
        }
        self.check_fields(&mut v);
        v.finish()
    }

    fn check_fields(&self, v: &mut Validator) {
        if let Some(skill) = &self.minimum_skill {
            v.check(
                SKILL_LEVELS.contains(&skill.as_str()),
                format!("'{}' is not a valid minimum skill", skill),
            );
        }
        if let Some(tuition) = self.tuition {
            v.check(tuition >= 0.0, "Tuition can not be negative");
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Document::new(),
        };
        if let Some(title) = &self.title {
            doc.insert("title".to_string(), Value::String(title.trim().to_string()));
        }
        doc
    }

    /// Document for a new course of `bootcamp` owned by `owner`
    pub fn to_new_document(&self, bootcamp: &str, owner: &str) -> Document {
        let mut doc = self.to_document();
        doc.entry("scholarshipAvailable".to_string())
            .or_insert(json!(false));
        doc.insert("createdAt".to_string(), Value::String(now_timestamp()));
        doc.insert("bootcamp".to_string(), Value::String(bootcamp.to_string()));
        doc.insert("user".to_string(), Value::String(owner.to_string()));
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_input;

    #[test]
    fn test_weeks_accepts_number_or_text() {
        let numeric: CourseInput = parse_input(json!({"weeks": 12})).unwrap();
        assert_eq!(numeric.weeks.as_deref(), Some("12"));

        let text: CourseInput = parse_input(json!({"weeks": "8"})).unwrap();
        assert_eq!(text.weeks.as_deref(), Some("8"));

        assert!(parse_input::<CourseInput>(json!({"weeks": [1]})).is_err());
    }

    #[test]
    fn test_validate_new() {
        let input: CourseInput = parse_input(json!({
            "title": "Front End Web Development",
            "description": "HTML, CSS and JavaScript",
            "weeks": 8,
            "tuition": 8000,
            "minimumSkill": "beginner"
        }))
        .unwrap();
        assert!(input.validate_new().is_ok());

        let doc = input.to_new_document("bc-1", "user-1");
        assert_eq!(doc["weeks"], "8");
        assert_eq!(doc["tuition"], 8000.0);
        assert_eq!(doc["scholarshipAvailable"], false);
        assert_eq!(doc["bootcamp"], "bc-1");
    }

    #[test]
    fn test_invalid_skill() {
        let input: CourseInput = parse_input(json!({"minimumSkill": "expert"})).unwrap();
        let err = input.validate_patch().unwrap_err();
        assert_eq!(err.0, "'expert' is not a valid minimum skill");
    }

    #[test]
    fn test_tuition_must_be_numeric() {
        assert!(parse_input::<CourseInput>(json!({"tuition": "lots"})).is_err());
    }
}
