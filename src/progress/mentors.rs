use crate::models::{MentorCandidate, UserProgress};

/// How far ahead a peer must be to mentor.
pub const MENTOR_LEVEL_GAP: u32 = 2;

/// Mentors shown on the dashboard.
pub const DASHBOARD_MENTOR_LIMIT: usize = 5;

/// Who is looking for mentors, and in what.
#[derive(Debug, Clone, Copy)]
pub struct MentorQuery<'a> {
    pub requester: &'a str,
    pub skill: &'a str,
    pub requester_level: u32,
    /// Only match peers from this college.
    pub college: Option<&'a str>,
    pub limit: usize,
}

/// Peers at least [`MENTOR_LEVEL_GAP`] levels ahead of the requester in the
/// skill, highest level first, then most XP.
pub fn find_mentors(users: &[UserProgress], query: MentorQuery<'_>) -> Vec<MentorCandidate> {
    let threshold = query.requester_level.saturating_add(MENTOR_LEVEL_GAP);

    let mut mentors: Vec<MentorCandidate> = users
        .iter()
        .filter(|u| u.username != query.requester)
        .filter(|u| query.college.map_or(true, |c| u.college == c))
        .filter(|u| u.level_in(query.skill) >= threshold)
        .map(|u| MentorCandidate {
            name: u.username.clone(),
            level: u.level_in(query.skill),
            xp: u.experience_points,
            streak: u.streak_count,
            college: u.college.clone(),
        })
        .collect();

    mentors.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then(b.xp.cmp(&a.xp))
            .then_with(|| a.name.cmp(&b.name))
    });
    mentors.truncate(query.limit);
    mentors
}
