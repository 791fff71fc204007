//! Reference lookups: preaching categories and the user/temple directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Category lookup keyed by document id.
pub type CategoryMap = BTreeMap<String, PreachingCategory>;

/// User directory keyed by document id.
pub type UserMap = BTreeMap<String, User>;

/// A named classification of preaching activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreachingCategory {
    pub id: String,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PreachingCategory {
    pub fn named(id: impl Into<String>, category_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category_name: Some(category_name.into()),
            ..Default::default()
        }
    }
}

/// A directory entry for someone who submits reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Regional grouping key.
    #[serde(default)]
    pub temple: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl User {
    /// Parsed role, if one is recorded.
    pub fn role(&self) -> Option<UserRole> {
        self.role
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(UserRole::parse)
    }

    /// Whether the user holds a privileged role.
    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(|role| role.is_privileged())
    }
}

/// Role attached to a directory entry. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRole {
    Admin,
    SuperAdmin,
    /// Any other role, kept as written.
    Member(String),
}

impl UserRole {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "super_admin" => UserRole::SuperAdmin,
            _ => UserRole::Member(raw.trim().to_string()),
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::SuperAdmin => write!(f, "super_admin"),
            UserRole::Member(raw) => write!(f, "{}", raw),
        }
    }
}
