use serde::{Deserialize, Serialize};

/// One row of a skill leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub level: u32,
    pub xp: u32,
    pub streak: u32,
    pub college: String,
}

/// A skill leaderboard, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub skill: String,
    pub entries: Vec<LeaderboardEntry>,
}
