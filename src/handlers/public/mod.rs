// handlers/public/mod.rs - Public handlers (no token required)
//
// Health reporting and the published course catalog.
pub mod courses;
pub mod health;

pub use courses::{course_get, courses_list};
pub use health::health;
