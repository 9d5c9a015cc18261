use serde::{Deserialize, Serialize};

/// A code submission for the user's current task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitInput {
    #[serde(default)]
    pub code: String,
}

/// Outcome of grading one submission.
///
/// Returned for passing and failing submissions alike; only a passing one
/// changes the stored progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionResult {
    pub success: bool,
    /// Stdout captured from the program, verbatim. Empty when execution failed.
    pub captured_output: String,
    pub message: String,
    pub xp_awarded: u32,
    /// Level the user moved to, on success.
    #[serde(default)]
    pub new_level: Option<u32>,
    /// Streak bonus message, when the success earned a shield.
    #[serde(default)]
    pub bonus: Option<String>,
    pub streak_count: u32,
}
