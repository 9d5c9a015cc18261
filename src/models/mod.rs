//! Domain models for QuestMate.
//!
//! # Core Concepts
//!
//! ## Static Content
//!
//! - [`TaskDescriptor`]: One exercise in a skill's roadmap, keyed by (skill, level).
//! - [`SkillInfo`]: Display metadata for a skill track.
//!
//! ## Persistent Entities
//!
//! - [`UserProgress`]: One record per registered user. Created at signup,
//!   mutated by grading and login evaluation, never deleted.
//! - [`MentorshipRequest`]: A student asking a more advanced peer for help.
//!
//! ## Transient Values
//!
//! - [`SubmissionResult`]: Outcome of grading one submission. Not persisted.
//! - [`Dashboard`], [`MentorCandidate`], [`LeaderboardEntry`]: read-side views.

mod dashboard;
mod leaderboard;
mod mentorship;
mod submission;
mod task;
mod user;

pub use dashboard::*;
pub use leaderboard::*;
pub use mentorship::*;
pub use submission::*;
pub use task::*;
pub use user::*;
