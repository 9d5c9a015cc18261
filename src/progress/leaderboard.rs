use crate::models::{LeaderboardEntry, UserProgress};

/// Entries returned per skill leaderboard.
pub const LEADERBOARD_LIMIT: usize = 20;

/// Users who have started `skill`, ranked by XP and then level.
pub fn rank(users: &[UserProgress], skill: &str, limit: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = users
        .iter()
        .filter(|u| u.level_in(skill) > 0)
        .map(|u| LeaderboardEntry {
            username: u.username.clone(),
            level: u.level_in(skill),
            xp: u.experience_points,
            streak: u.streak_count,
            college: u.college.clone(),
        })
        .collect();

    entries.sort_by(|a, b| {
        (b.xp, b.level)
            .cmp(&(a.xp, a.level))
            .then_with(|| a.username.cmp(&b.username))
    });
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user(name: &str, skill: Option<(&str, u32)>, xp: u32) -> UserProgress {
        let mut u = UserProgress::new(name, "MIT", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        if let Some((skill, level)) = skill {
            u.levels.insert(skill.to_string(), level);
        }
        u.experience_points = xp;
        u
    }

    #[test]
    fn ranks_by_xp_then_level() {
        let users = vec![
            user("low", Some(("Python", 9)), 100),
            user("high", Some(("Python", 2)), 400),
            user("tie_lo", Some(("Python", 3)), 200),
            user("tie_hi", Some(("Python", 5)), 200),
        ];

        let names: Vec<_> = rank(&users, "Python", 20)
            .into_iter()
            .map(|e| e.username)
            .collect();
        assert_eq!(names, vec!["high", "tie_hi", "tie_lo", "low"]);
    }

    #[test]
    fn skips_users_outside_the_skill() {
        let users = vec![user("html", Some(("HTML", 3)), 900), user("nobody", None, 50)];
        assert!(rank(&users, "Python", 20).is_empty());
    }

    #[test]
    fn truncates_to_limit() {
        let users: Vec<_> = (0..30)
            .map(|i| user(&format!("u{:02}", i), Some(("Python", 1)), i))
            .collect();
        let entries = rank(&users, "Python", LEADERBOARD_LIMIT);
        assert_eq!(entries.len(), 20);
        assert_eq!(entries[0].username, "u29");
    }
}
