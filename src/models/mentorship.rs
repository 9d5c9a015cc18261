use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A peer far enough ahead in a skill to mentor the requester.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MentorCandidate {
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub streak: u32,
    pub college: String,
}

/// A request from a student to a mentor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorshipRequest {
    pub id: Uuid,
    pub student: String,
    pub mentor: String,
    pub skill: Option<String>,
    pub topic: String,
    pub status: MentorshipStatus,
    pub created_at: DateTime<Utc>,
}

/// - `Pending`: Waiting for the mentor to respond
/// - `Accepted`: Mentor agreed to help
/// - `Declined`: Mentor turned the request down
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MentorshipStatus {
    Pending,
    Accepted,
    Declined,
}

impl MentorshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// Input for requesting mentorship.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentorshipRequestInput {
    #[serde(default)]
    pub skill: Option<String>,
    /// Defaults to `"General help"`.
    #[serde(default)]
    pub topic: Option<String>,
}
