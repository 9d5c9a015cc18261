use chrono::NaiveDate;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::db::StoreError;
use crate::models::{CreateUserInput, UserProgress};

/// College recorded when signup does not name one.
pub const DEFAULT_COLLEGE: &str = "Default College";

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("Username must be {}-{} characters of letters, digits, '_' or '-'", USERNAME_MIN, USERNAME_MAX)]
    InvalidUsername,

    #[error("Invalid skill: {0}")]
    UnknownSkill(String),

    #[error("Level must be between 1 and {max} for {skill}")]
    InvalidLevel { skill: String, max: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build the record for a new signup.
pub fn new_user(input: CreateUserInput, today: NaiveDate) -> Result<UserProgress, OnboardingError> {
    let username = input.username.trim();
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&username.len()) || !valid_chars {
        return Err(OnboardingError::InvalidUsername);
    }

    let college = input
        .college
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_COLLEGE.to_string());

    Ok(UserProgress::new(username, college, today))
}

/// Switch the user to `skill`, starting at `level`.
///
/// The level is reset even if the user had already progressed further in
/// the skill, and the skill's completed list starts over.
pub fn select_skill(
    user: &mut UserProgress,
    catalog: &Catalog,
    skill: &str,
    level: u32,
) -> Result<(), OnboardingError> {
    if !catalog.contains_skill(skill) {
        return Err(OnboardingError::UnknownSkill(skill.to_string()));
    }

    let max = catalog.task_count(skill);
    if !(1..=max).contains(&level) {
        return Err(OnboardingError::InvalidLevel {
            skill: skill.to_string(),
            max,
        });
    }

    user.current_skill = Some(skill.to_string());
    user.levels.insert(skill.to_string(), level);
    user.completed_tasks.insert(skill.to_string(), Vec::new());
    Ok(())
}
