pub mod course;
pub mod profile;
pub mod user;

pub use course::{Course, CourseFilter};
pub use profile::{clamp_progress, Profile, ProfileChanges, ProgressMap};
pub use user::{IdentityUser, Role, UserMetadata, UserRecord};

use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
