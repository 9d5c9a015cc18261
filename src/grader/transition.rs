use crate::executor::ExecutionError;
use crate::models::{TaskDescriptor, UserProgress};

/// XP for an ordinary task.
pub const TASK_XP: u32 = 50;

/// XP for a milestone task.
pub const MILESTONE_XP: u32 = 100;

/// A shield is earned each time the streak reaches a multiple of this.
pub const SHIELD_STREAK_INTERVAL: u32 = 7;

/// How a run compared to the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed { output: String },
    Mismatch { expected: String, actual: String },
    Crashed(ExecutionError),
}

/// Compare a run against the expected output. Exact equality, no trimming
/// and no line-ending normalisation.
pub fn judge(task: &TaskDescriptor, run: Result<String, ExecutionError>) -> Verdict {
    match run {
        Ok(output) if output == task.expected_output => Verdict::Passed { output },
        Ok(actual) => Verdict::Mismatch {
            expected: task.expected_output.clone(),
            actual,
        },
        Err(e) => Verdict::Crashed(e),
    }
}

/// What a successful submission earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub xp_awarded: u32,
    pub new_level: u32,
    pub streak_count: u32,
    pub shield_earned: bool,
    pub shield_count: u32,
}

/// Advance `user` past `level` of `skill`.
pub fn apply_success(
    user: &mut UserProgress,
    skill: &str,
    level: u32,
    task: &TaskDescriptor,
) -> Award {
    let xp_awarded = if task.is_milestone { MILESTONE_XP } else { TASK_XP };
    let new_level = level + 1;

    user.experience_points = user.experience_points.saturating_add(xp_awarded);
    user.levels.insert(skill.to_string(), new_level);
    user.completed_tasks
        .entry(skill.to_string())
        .or_default()
        .push(level);
    user.streak_count += 1;

    let shield_earned = user.streak_count % SHIELD_STREAK_INTERVAL == 0;
    if shield_earned {
        user.shield_count += 1;
    }

    Award {
        xp_awarded,
        new_level,
        streak_count: user.streak_count,
        shield_earned,
        shield_count: user.shield_count,
    }
}
