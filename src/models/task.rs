use serde::{Deserialize, Serialize};

/// One exercise in a skill roadmap.
///
/// Descriptors are immutable and loaded once at startup. The grader compares
/// a submission's captured stdout against `expected_output` byte for byte, so
/// the trailing newline printed by most interpreters is part of the text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub title: String,
    /// What the learner is asked to do.
    pub prompt: String,
    /// Exact stdout a correct program produces.
    pub expected_output: String,
    /// Milestone tasks award double XP.
    #[serde(default)]
    pub is_milestone: bool,
    #[serde(default)]
    pub hint: Option<String>,
    /// Rough time to solve, e.g. `"10 min"`.
    #[serde(default)]
    pub time_estimate: Option<String>,
}

/// Display metadata for a skill track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillInfo {
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Stage names, one per block of the roadmap.
    pub stages: Vec<String>,
    /// Number of levels defined for this skill.
    pub task_count: u32,
}

/// A task together with its position in the roadmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapEntry {
    pub level: u32,
    #[serde(flatten)]
    pub task: TaskDescriptor,
}
