use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::db::StoreError;
use crate::models::{ResumeOutcome, ShieldPause, UserProgress};

/// Longest pause a shield can buy.
pub const MAX_PAUSE_DAYS: u32 = 90;

/// Pause length when none is given.
pub const DEFAULT_PAUSE_DAYS: u32 = 7;

#[derive(Debug, Error)]
pub enum ShieldError {
    #[error("Shield duration must be 1-{} days", MAX_PAUSE_DAYS)]
    InvalidDuration,

    #[error("No consistency shields available")]
    NoShieldsAvailable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Spend a shield to pause progress for `days` days starting today.
pub fn activate_shield(
    user: &mut UserProgress,
    days: u32,
    reason: Option<String>,
    today: NaiveDate,
) -> Result<ShieldPause, ShieldError> {
    if !(1..=MAX_PAUSE_DAYS).contains(&days) {
        return Err(ShieldError::InvalidDuration);
    }
    if user.shield_count == 0 {
        return Err(ShieldError::NoShieldsAvailable);
    }

    let paused_until = today
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or(ShieldError::InvalidDuration)?;
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "Personal reasons".to_string());

    user.shield_count -= 1;
    user.shield_paused_until = Some(paused_until);
    user.paused_reason = Some(reason.clone());

    Ok(ShieldPause {
        paused_until,
        reason,
        shields_remaining: user.shield_count,
    })
}

/// End a pause early. Counts today as a login so the pause gap is not
/// treated as missed days.
pub fn resume_progress(user: &mut UserProgress, today: NaiveDate) -> ResumeOutcome {
    let was_paused = user.shield_paused_until.is_some();
    user.shield_paused_until = None;
    user.paused_reason = None;
    user.last_login_date = today;
    ResumeOutcome { was_paused }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn activation_spends_a_shield() {
        let mut user = UserProgress::new("ada", "MIT", today());
        user.shield_count = 2;

        let pause = activate_shield(&mut user, 10, Some("exams".into()), today()).unwrap();

        assert_eq!(pause.paused_until, NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
        assert_eq!(pause.reason, "exams");
        assert_eq!(pause.shields_remaining, 1);
        assert_eq!(user.shield_count, 1);
        assert_eq!(user.shield_paused_until, Some(pause.paused_until));
    }

    #[test]
    fn activation_needs_a_shield() {
        let mut user = UserProgress::new("ada", "MIT", today());
        user.shield_count = 0;
        assert!(matches!(
            activate_shield(&mut user, 7, None, today()),
            Err(ShieldError::NoShieldsAvailable)
        ));
        assert!(user.shield_paused_until.is_none());
    }

    #[test]
    fn duration_is_bounded() {
        let mut user = UserProgress::new("ada", "MIT", today());
        assert!(matches!(
            activate_shield(&mut user, 0, None, today()),
            Err(ShieldError::InvalidDuration)
        ));
        assert!(matches!(
            activate_shield(&mut user, 91, None, today()),
            Err(ShieldError::InvalidDuration)
        ));
        assert_eq!(user.shield_count, 1);
    }

    #[test]
    fn blank_reason_gets_default() {
        let mut user = UserProgress::new("ada", "MIT", today());
        let pause = activate_shield(&mut user, 3, Some("  ".into()), today()).unwrap();
        assert_eq!(pause.reason, "Personal reasons");
    }

    #[test]
    fn resume_clears_pause_and_touches_login() {
        let mut user = UserProgress::new("ada", "MIT", today());
        activate_shield(&mut user, 5, None, today()).unwrap();

        let later = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let outcome = resume_progress(&mut user, later);

        assert!(outcome.was_paused);
        assert!(user.shield_paused_until.is_none());
        assert!(user.paused_reason.is_none());
        assert_eq!(user.last_login_date, later);
        assert!(!resume_progress(&mut user, later).was_paused);
    }
}
