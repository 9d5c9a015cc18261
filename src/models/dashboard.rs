use serde::{Deserialize, Serialize};

use super::{MentorCandidate, TaskDescriptor, UserProgress};

/// What happened to the streak when the dashboard was opened.
///
/// - `Continued`: Logged in within a day, nothing changed
/// - `ShieldConsumed`: A missed day was covered by a shield
/// - `StreakReset`: A missed day with no shield to cover it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoginOutcome {
    Continued,
    ShieldConsumed,
    StreakReset,
}

/// The task a user should work on next.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CurrentTask {
    /// No skill selected yet.
    Unselected,
    Active {
        level: u32,
        task: TaskDescriptor,
    },
    /// Every level of the skill is done.
    Mastered { level: u32 },
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub user: UserProgress,
    pub login: LoginOutcome,
    pub current_task: CurrentTask,
    pub mentors: Vec<MentorCandidate>,
}
