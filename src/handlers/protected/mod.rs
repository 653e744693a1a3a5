// handlers/protected/mod.rs - Token-bearing handlers
//
// Every request body carries `token`; the service layer validates it with the
// identity service before touching profile rows.
pub mod courses;
pub mod profile;
pub mod verify;

pub use courses::{enroll_post, progress_post};
pub use profile::profile_patch;
pub use verify::verify_post;
