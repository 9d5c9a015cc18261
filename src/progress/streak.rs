use chrono::NaiveDate;

use crate::models::{LoginOutcome, UserProgress};

/// Apply the missed-day rule when a user opens the dashboard.
///
/// A gap of more than one calendar day breaks the streak unless a shield
/// covers it. A shield is only spent when no pause is in effect; during a
/// pause the streak resets like it would without shields. `last_login_date`
/// always moves to `today`, and a pause that ended before `today` is cleared.
pub fn evaluate_login(user: &mut UserProgress, today: NaiveDate) -> LoginOutcome {
    let days_since = (today - user.last_login_date).num_days();
    let paused = user.is_paused_on(today);

    let outcome = if days_since > 1 {
        if user.shield_count > 0 && !paused {
            user.shield_count -= 1;
            LoginOutcome::ShieldConsumed
        } else {
            user.streak_count = 0;
            LoginOutcome::StreakReset
        }
    } else {
        LoginOutcome::Continued
    };

    if user.shield_paused_until.is_some() && !paused {
        user.shield_paused_until = None;
        user.paused_reason = None;
    }

    user.last_login_date = today;
    outcome
}
