use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::null_as_default;

/// Course id to completion percentage.
pub type ProgressMap = BTreeMap<String, u8>;

/// Row of the `profiles` table, one per identity user.
///
/// Enrollment and progress live on the row itself (`enrolled_courses`,
/// `course_progress`) rather than in join tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enrolled_courses: Vec<String>,
    #[serde(default, deserialize_with = "progress_map")]
    pub course_progress: ProgressMap,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            email: None,
            full_name: None,
            role: None,
            avatar_url: None,
            phone: None,
            bio: None,
            enrolled_courses: Vec::new(),
            course_progress: ProgressMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_enrolled(&self, course_id: &str) -> bool {
        self.enrolled_courses.iter().any(|id| id == course_id)
    }
}

/// Partial update sent to the backend. Unset fields are left out of the
/// payload so the backend keeps their stored values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled_courses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_progress: Option<ProgressMap>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileChanges {
    pub fn at(updated_at: DateTime<Utc>) -> Self {
        Self {
            full_name: None,
            avatar_url: None,
            phone: None,
            bio: None,
            enrolled_courses: None,
            course_progress: None,
            updated_at,
        }
    }
}

/// Clamp a requested completion value into `0..=100`.
pub fn clamp_progress(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u8
}

// Older rows may hold fractional or out-of-range numbers; normalize on read.
fn progress_map<'de, D>(deserializer: D) -> Result<ProgressMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, f64>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(course, value)| (course, clamp_progress(value)))
        .collect())
}
