use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Progress record for a registered user.
///
/// `levels` maps each skill the user has started to the level they are
/// currently working on. A level past the end of the skill's roadmap means the
/// skill is mastered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProgress {
    pub username: String,
    pub experience_points: u32,
    pub streak_count: u32,
    pub shield_count: u32,
    pub current_skill: Option<String>,
    pub levels: BTreeMap<String, u32>,
    /// Levels completed per skill, in completion order.
    pub completed_tasks: BTreeMap<String, Vec<u32>>,
    pub last_login_date: NaiveDate,
    /// Set while a shield pause is in effect.
    pub shield_paused_until: Option<NaiveDate>,
    pub paused_reason: Option<String>,
    pub college: String,
    pub joined_date: NaiveDate,
}

impl UserProgress {
    /// Fresh record as created at signup. New users start with one shield.
    pub fn new(username: impl Into<String>, college: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            username: username.into(),
            experience_points: 0,
            streak_count: 0,
            shield_count: 1,
            current_skill: None,
            levels: BTreeMap::new(),
            completed_tasks: BTreeMap::new(),
            last_login_date: today,
            shield_paused_until: None,
            paused_reason: None,
            college: college.into(),
            joined_date: today,
        }
    }

    /// Level in `skill`, or 0 if the skill was never started.
    pub fn level_in(&self, skill: &str) -> u32 {
        self.levels.get(skill).copied().unwrap_or(0)
    }

    /// The current skill and the level being worked on in it.
    ///
    /// A selected skill with no recorded level is treated as level 1.
    pub fn current_position(&self) -> Option<(&str, u32)> {
        let skill = self.current_skill.as_deref()?;
        let level = self.levels.get(skill).copied().unwrap_or(1);
        Some((skill, level))
    }

    /// Whether a shield pause covers `today`.
    pub fn is_paused_on(&self, today: NaiveDate) -> bool {
        self.shield_paused_until.is_some_and(|until| until >= today)
    }
}

/// Input for registering a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    /// Defaults to `"Default College"` when omitted.
    #[serde(default)]
    pub college: Option<String>,
}

/// Input for choosing a skill track and starting level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectSkillInput {
    pub skill: String,
    /// Defaults to 1.
    #[serde(default)]
    pub level: Option<u32>,
}

/// Input for pausing progress with a shield.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateShieldInput {
    /// Length of the pause in days (1-90). Defaults to 7.
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response after activating a shield pause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldPause {
    pub paused_until: NaiveDate,
    pub reason: String,
    pub shields_remaining: u32,
}

/// Response after resuming progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeOutcome {
    /// Whether a pause was in place before resuming.
    pub was_paused: bool,
}
