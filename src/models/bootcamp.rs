//! Bootcamp model.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{is_valid_email, is_valid_website, ValidationError, Validator};
use crate::store::document::{now_timestamp, Document};

/// Allowed values of `careers`
pub const CAREERS: [&str; 6] = [
    "Web Development",
    "Mobile Development",
    "UI/UX",
    "Data Science",
    "Business",
    "Other",
];

/// Photo filename recorded until one is uploaded
pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

/// Client-supplied bootcamp fields, shared by create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootcampInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Geocoded into `location`; never stored
    #[serde(skip_serializing)]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub careers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_assistance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_guarantee: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_gi: Option<bool>,
}

impl BootcampInput {
    /// Validate a complete bootcamp for creation
    pub fn validate_new(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.require_text(&self.name, "Please add a name");
        v.require_text(&self.description, "Please add a description");
        v.require_text(&self.address, "Please add an address");
        v.check(
            self.careers.as_ref().map(|c| !c.is_empty()).unwrap_or(false),
            "Please add at least one career",
        );
        self.check_fields(&mut v);
        v.finish()
    }

    /// Validate the fields present in a partial update
    pub fn validate_patch(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        if self.name.is_some() {
            v.require_text(&self.name, "Please add a name");
        }
        if self.description.is_some() {
            v.require_text(&self.description, "Please add a description");
        }
        self.check_fields(&mut v);
        v.finish()
    }

    fn check_fields(&self, v: &mut Validator) {
        v.max_len(&self.name, 50, "Name can not be more than 50 characters");
        v.max_len(
            &self.description,
            1000,
            "Description can not be more than 1000 characters",
        );
        v.max_len(&self.phone, 20, "Phone number can not be more than 20 characters");
        if let Some(website) = &self.website {
            v.check(
                is_valid_website(website),
                "Please use a valid URL with HTTP or HTTPS",
            );
        }
        if let Some(email) = &self.email {
            v.check(is_valid_email(email), "Please add a valid email");
        }
        if let Some(careers) = &self.careers {
            for career in careers {
                v.check(
                    CAREERS.contains(&career.as_str()),
                    format!("'{}' is not a valid career", career),
                );
            }
        }
    }

    /// Stored fields of this input; `slug` follows `name`
    pub fn to_document(&self) -> Document {
        let mut doc = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Document::new(),
        };
        if let Some(name) = &self.name {
            let name = name.trim().to_string();
            doc.insert("slug".to_string(), Value::String(slugify(&name)));
            doc.insert("name".to_string(), Value::String(name));
        }
        doc
    }

    /// Document for a new bootcamp owned by `owner`, with defaults applied
    pub fn to_new_document(&self, owner: &str) -> Document {
        let mut doc = self.to_document();
        for (field, default) in [
            ("photo", json!(DEFAULT_PHOTO)),
            ("housing", json!(false)),
            ("jobAssistance", json!(false)),
            ("jobGuarantee", json!(false)),
            ("acceptGi", json!(false)),
        ] {
            doc.entry(field.to_string()).or_insert(default);
        }
        doc.insert("createdAt".to_string(), Value::String(now_timestamp()));
        doc.insert("user".to_string(), Value::String(owner.to_string()));
        doc
    }
}

/// URL-friendly lowercase form of a name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_input;

    fn valid() -> BootcampInput {
        parse_input(json!({
            "name": "Devworks Bootcamp",
            "description": "Full stack web development",
            "website": "https://devworks.com",
            "phone": "(111) 111-1111",
            "email": "enroll@devworks.com",
            "address": "233 Bay State Rd Boston MA 02215",
            "careers": ["Web Development", "UI/UX", "Business"],
            "housing": true
        }))
        .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Devworks Bootcamp"), "devworks-bootcamp");
        assert_eq!(slugify("  UI/UX -- Lab! "), "ui-ux-lab");
    }

    #[test]
    fn test_valid_bootcamp() {
        assert!(valid().validate_new().is_ok());
    }

    #[test]
    fn test_rejects_unknown_career_and_long_name() {
        let mut input = valid();
        input.name = Some("x".repeat(51));
        input.careers = Some(vec!["Cooking".to_string()]);

        let err = input.validate_new().unwrap_err();
        assert!(err.0.contains("Name can not be more than 50 characters"));
        assert!(err.0.contains("'Cooking' is not a valid career"));
    }

    #[test]
    fn test_missing_required_fields() {
        let err = BootcampInput::default().validate_new().unwrap_err();
        assert!(err.0.contains("Please add a name"));
        assert!(err.0.contains("Please add an address"));
    }

    #[test]
    fn test_patch_validates_only_present_fields() {
        let patch: BootcampInput = parse_input(json!({"housing": false})).unwrap();
        assert!(patch.validate_patch().is_ok());

        let bad: BootcampInput = parse_input(json!({"website": "nope"})).unwrap();
        assert!(bad.validate_patch().is_err());
    }

    #[test]
    fn test_new_document_defaults_and_no_address() {
        let doc = valid().to_new_document("owner-1");

        assert_eq!(doc["slug"], "devworks-bootcamp");
        assert_eq!(doc["photo"], DEFAULT_PHOTO);
        assert_eq!(doc["housing"], true);
        assert_eq!(doc["jobGuarantee"], false);
        assert_eq!(doc["user"], "owner-1");
        assert!(doc.get("address").is_none());
        assert!(doc.get("averageCost").is_none());
    }
}
