//! Resource models bound to every store connection.

use std::fmt;

/// The fixed set of persisted resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceModel {
    Bootcamp,
    Course,
    User,
    Review,
}

impl ResourceModel {
    pub const ALL: [ResourceModel; 4] = [
        ResourceModel::Bootcamp,
        ResourceModel::Course,
        ResourceModel::User,
        ResourceModel::Review,
    ];

    /// Backing collection name
    pub fn collection(self) -> &'static str {
        match self {
            ResourceModel::Bootcamp => "bootcamps",
            ResourceModel::Course => "courses",
            ResourceModel::User => "users",
            ResourceModel::Review => "reviews",
        }
    }

    /// Unique indexes declared when a store is bound
    pub fn unique_indexes(self) -> &'static [&'static [&'static str]] {
        match self {
            ResourceModel::Bootcamp => &[&["name"]],
            ResourceModel::Course => &[],
            ResourceModel::User => &[&["email"]],
            ResourceModel::Review => &[&["bootcamp", "user"]],
        }
    }

    /// Fields stripped from reads unless explicitly requested
    pub fn hidden_fields(self) -> &'static [&'static str] {
        match self {
            ResourceModel::User => &["password", "resetPasswordToken", "resetPasswordExpire"],
            _ => &[],
        }
    }
}

impl fmt::Display for ResourceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceModel::Bootcamp => "bootcamp",
            ResourceModel::Course => "course",
            ResourceModel::User => "user",
            ResourceModel::Review => "review",
        };
        f.write_str(name)
    }
}
