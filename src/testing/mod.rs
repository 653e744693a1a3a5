use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::models::{
    Course, CourseFilter, IdentityUser, Profile, ProfileChanges, UserMetadata,
};
use crate::backend::{BackendError, CourseRepository, IdentityProvider, ProfileRepository};
use crate::state::AppState;

/// In-memory stand-in for the hosted backend.
///
/// Tokens map directly to identity users; every trait call is counted so
/// tests can assert that validation short-circuits before the backend.
#[derive(Default)]
pub struct MemoryBackend {
    users: Mutex<HashMap<String, IdentityUser>>,
    profiles: Mutex<HashMap<Uuid, Profile>>,
    courses: Mutex<Vec<Course>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a token for a fresh student and give them an empty profile.
    pub fn add_student(&self, token: &str) -> IdentityUser {
        let user = identity_user("student@example.com");
        self.add_user(token, user.clone());
        self.add_profile(Profile::new(user.id));
        user
    }

    pub fn add_user(&self, token: &str, user: IdentityUser) {
        self.users.lock().unwrap().insert(token.to_string(), user);
    }

    pub fn add_profile(&self, profile: Profile) {
        self.profiles.lock().unwrap().insert(profile.id, profile);
    }

    pub fn add_course(&self, course: Course) {
        self.courses.lock().unwrap().push(course);
    }

    pub fn profile(&self, id: Uuid) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&id).cloned()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn record_call(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, BackendError> {
        self.record_call()?;
        self.users
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or(BackendError::TokenRejected)
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.record_call()
    }
}

#[async_trait]
impl ProfileRepository for MemoryBackend {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, BackendError> {
        self.record_call()?;
        Ok(self.profile(id))
    }

    async fn update(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<Profile>, BackendError> {
        self.record_call()?;
        let mut profiles = self.profiles.lock().unwrap();
        Ok(profiles.get_mut(&id).map(|profile| {
            apply_changes(changes, profile);
            profile.clone()
        }))
    }
}

#[async_trait]
impl CourseRepository for MemoryBackend {
    async fn list_published(&self, filter: &CourseFilter) -> Result<Vec<Course>, BackendError> {
        self.record_call()?;
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .filter(|course| course_matches(filter, course))
            .cloned()
            .collect())
    }

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Course>, BackendError> {
        self.record_call()?;
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .find(|course| course.is_published && course.slug == slug)
            .cloned())
    }
}

pub fn identity_user(email: &str) -> IdentityUser {
    IdentityUser {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
        email_confirmed_at: None,
        user_metadata: UserMetadata::default(),
        created_at: None,
    }
}

pub fn course(slug: &str, published: bool) -> Course {
    Course {
        id: format!("course-{}", slug),
        slug: slug.to_string(),
        instructor_id: None,
        title: slug.replace('-', " "),
        description: None,
        price: None,
        duration: None,
        level: Some("beginner".to_string()),
        tags: vec!["tax".to_string()],
        is_published: published,
        created_at: None,
    }
}

/// Application state wired entirely to one in-memory backend.
pub fn app_state(backend: &Arc<MemoryBackend>) -> AppState {
    AppState::from_backend(backend.clone())
}

/// What the backend's `is_published`, `level=ilike` and `tags=cs` filters select.
pub fn course_matches(filter: &CourseFilter, course: &Course) -> bool {
    if !course.is_published {
        return false;
    }
    if let Some(level) = &filter.level {
        let same_level = course
            .level
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case(level));
        if !same_level {
            return false;
        }
    }
    if let Some(tag) = &filter.tag {
        if !course.tags.iter().any(|t| t == tag) {
            return false;
        }
    }
    true
}

/// What a PATCH does to the stored row: set fields overwrite, unset ones stay.
pub fn apply_changes(changes: &ProfileChanges, profile: &mut Profile) {
    if let Some(name) = &changes.full_name {
        profile.full_name = Some(name.clone());
    }
    if let Some(avatar) = &changes.avatar_url {
        profile.avatar_url = Some(avatar.clone());
    }
    if let Some(phone) = &changes.phone {
        profile.phone = Some(phone.clone());
    }
    if let Some(bio) = &changes.bio {
        profile.bio = Some(bio.clone());
    }
    if let Some(courses) = &changes.enrolled_courses {
        profile.enrolled_courses = courses.clone();
    }
    if let Some(progress) = &changes.course_progress {
        profile.course_progress = progress.clone();
    }
    profile.updated_at = Some(changes.updated_at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn leveled(level: &str, tags: &[&str], published: bool) -> Course {
        let mut c = course("vat-basics", published);
        c.level = Some(level.to_string());
        c.tags = tags.iter().map(|t| t.to_string()).collect();
        c
    }

    #[test]
    fn filter_hides_unpublished_courses() {
        let filter = CourseFilter::default();
        assert!(course_matches(&filter, &leveled("beginner", &[], true)));
        assert!(!course_matches(&filter, &leveled("beginner", &[], false)));
    }

    #[test]
    fn filter_matches_level_and_tag() {
        let filter = CourseFilter {
            level: Some("Beginner".to_string()),
            tag: Some("vat".to_string()),
        };
        assert!(course_matches(&filter, &leveled("beginner", &["vat", "sales-tax"], true)));
        assert!(!course_matches(&filter, &leveled("advanced", &["vat"], true)));
        assert!(!course_matches(&filter, &leveled("beginner", &["payroll"], true)));
    }

    #[test]
    fn apply_changes_keeps_unset_fields() {
        let mut profile = Profile::new(Uuid::new_v4());
        profile.full_name = Some("Ada".to_string());
        profile.bio = Some("Enrolled agent".to_string());

        let mut changes = ProfileChanges::at(Utc::now());
        changes.bio = Some("CPA".to_string());
        apply_changes(&changes, &mut profile);

        assert_eq!(profile.full_name.as_deref(), Some("Ada"));
        assert_eq!(profile.bio.as_deref(), Some("CPA"));
        assert_eq!(profile.updated_at, Some(changes.updated_at));
    }
}
