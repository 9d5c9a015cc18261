//! Progress rules that run outside of grading.
//!
//! Everything here is a pure function over [`UserProgress`] values. Callers
//! apply the mutating ones through [`Database::mutate_user`] so each change is
//! an atomic read-modify-write.
//!
//! [`UserProgress`]: crate::models::UserProgress
//! [`Database::mutate_user`]: crate::db::Database::mutate_user

mod leaderboard;
mod mentors;
mod onboarding;
mod shield;
mod streak;

pub use leaderboard::*;
pub use mentors::*;
pub use onboarding::*;
pub use shield::*;
pub use streak::*;
