use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

/// Row of the `courses` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub instructor_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Catalog query. Only published courses are ever listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CourseFilter {
    pub level: Option<String>,
    pub tag: Option<String>,
}

impl CourseFilter {
    /// Drop blank parameters so `?level=` behaves like no filter.
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            level: clean(self.level),
            tag: clean(self.tag),
        }
    }
}
