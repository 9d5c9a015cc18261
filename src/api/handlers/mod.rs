use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::db::StoreError;
use crate::grader::GradeError;
use crate::models::*;
use crate::progress::{self, MentorQuery, OnboardingError, ShieldError};

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side for debugging, but clients only
/// see a generic message to avoid leaking internal details.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn rejected(status: StatusCode, e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();
    tracing::warn!(status = status.as_u16(), "Request rejected: {}", msg);
    (status, msg)
}

fn store_error(e: StoreError) -> (StatusCode, String) {
    match e {
        StoreError::UserNotFound(_) => rejected(StatusCode::NOT_FOUND, e),
        StoreError::UserExists(_) => rejected(StatusCode::CONFLICT, e),
        StoreError::Sqlite(_) => internal_error(e),
    }
}

fn grade_error(e: GradeError) -> (StatusCode, String) {
    match e {
        GradeError::UserNotFound(_) | GradeError::TaskNotFound { .. } => {
            rejected(StatusCode::NOT_FOUND, e)
        }
        GradeError::NoSkillSelected => rejected(StatusCode::BAD_REQUEST, e),
        GradeError::ProgressChanged => rejected(StatusCode::CONFLICT, e),
        GradeError::Store(e) => store_error(e),
    }
}

fn onboarding_error(e: OnboardingError) -> (StatusCode, String) {
    match e {
        OnboardingError::Store(e) => store_error(e),
        other => rejected(StatusCode::BAD_REQUEST, other),
    }
}

fn shield_error(e: ShieldError) -> (StatusCode, String) {
    match e {
        ShieldError::Store(e) => store_error(e),
        other => rejected(StatusCode::BAD_REQUEST, other),
    }
}

fn require_skill(state: &AppState, skill: &str) -> Result<(), (StatusCode, String)> {
    if state.catalog.contains_skill(skill) {
        Ok(())
    } else {
        Err((StatusCode::NOT_FOUND, "Skill not found".to_string()))
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Catalog
// ============================================================

pub async fn list_skills(State(state): State<AppState>) -> Json<Vec<SkillInfo>> {
    Json(state.catalog.skills().cloned().collect())
}

pub async fn get_roadmap(
    State(state): State<AppState>,
    Path(skill): Path<String>,
) -> Result<Json<Vec<RoadmapEntry>>, (StatusCode, String)> {
    state
        .catalog
        .roadmap(&skill)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Skill not found".to_string()))
}

// ============================================================
// Users
// ============================================================

pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<UserProgress>), (StatusCode, String)> {
    let user = progress::new_user(input, state.today()).map_err(onboarding_error)?;
    state.db.create_user(&user).map_err(store_error)?;

    tracing::info!(username = %user.username, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserProgress>, (StatusCode, String)> {
    state
        .db
        .get_user(&username)
        .map_err(store_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))
}

pub async fn select_skill(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(input): Json<SelectSkillInput>,
) -> Result<Json<UserProgress>, (StatusCode, String)> {
    let level = input.level.unwrap_or(1);
    let _guard = state.grader.lock_user(&username).await;

    state
        .db
        .mutate_user(&username, |user| {
            progress::select_skill(user, &state.catalog, &input.skill, level)?;
            Ok::<_, OnboardingError>(user.clone())
        })
        .map(Json)
        .map_err(onboarding_error)
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Dashboard>, (StatusCode, String)> {
    let today = state.today();
    let (login, user) = state
        .db
        .mutate_user(&username, |user| {
            let login = progress::evaluate_login(user, today);
            Ok::<_, StoreError>((login, user.clone()))
        })
        .map_err(store_error)?;

    if login == LoginOutcome::ShieldConsumed {
        tracing::info!(username = %username, shields = user.shield_count, "Shield saved streak");
    }

    let (current_task, mentors) = match user.current_position() {
        None => (CurrentTask::Unselected, Vec::new()),
        Some((skill, level)) => {
            let task = match state.catalog.get_task(skill, level) {
                Some(task) => CurrentTask::Active {
                    level,
                    task: task.clone(),
                },
                None => CurrentTask::Mastered { level },
            };

            let users = state.db.all_users().map_err(store_error)?;
            let mentors = progress::find_mentors(
                &users,
                MentorQuery {
                    requester: &username,
                    skill,
                    requester_level: level,
                    college: None,
                    limit: progress::DASHBOARD_MENTOR_LIMIT,
                },
            );
            (task, mentors)
        }
    };

    Ok(Json(Dashboard {
        user,
        login,
        current_task,
        mentors,
    }))
}

// ============================================================
// Grading
// ============================================================

/// Grade a submission. Passing and failing submissions both return a
/// [`SubmissionResult`]; a failing one is sent with `400 Bad Request`.
pub async fn submit(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(input): Json<SubmitInput>,
) -> Result<Response, (StatusCode, String)> {
    let result = state
        .grader
        .submit(&username, &input.code)
        .await
        .map_err(grade_error)?;

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(result)).into_response())
}

// ============================================================
// Shields
// ============================================================

pub async fn activate_shield(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(input): Json<ActivateShieldInput>,
) -> Result<Json<ShieldPause>, (StatusCode, String)> {
    let today = state.today();
    let days = input.days.unwrap_or(progress::DEFAULT_PAUSE_DAYS);

    state
        .db
        .mutate_user(&username, |user| {
            progress::activate_shield(user, days, input.reason, today)
        })
        .map(Json)
        .map_err(shield_error)
}

pub async fn resume_shield(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ResumeOutcome>, (StatusCode, String)> {
    let today = state.today();

    state
        .db
        .mutate_user(&username, |user| {
            Ok::<_, StoreError>(progress::resume_progress(user, today))
        })
        .map(Json)
        .map_err(store_error)
}

// ============================================================
// Mentors
// ============================================================

/// Query parameters for mentor search.
#[derive(Debug, Deserialize)]
pub struct MentorsQuery {
    /// Only return mentors from the requester's college.
    #[serde(default)]
    pub same_college: bool,
    /// Maximum number of mentors to return. Defaults to 10.
    pub limit: Option<usize>,
}

pub async fn list_mentors(
    State(state): State<AppState>,
    Path((username, skill)): Path<(String, String)>,
    Query(query): Query<MentorsQuery>,
) -> Result<Json<Vec<MentorCandidate>>, (StatusCode, String)> {
    require_skill(&state, &skill)?;

    let users = state.db.all_users().map_err(store_error)?;
    let requester = users
        .iter()
        .find(|u| u.username == username)
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let mentors = progress::find_mentors(
        &users,
        MentorQuery {
            requester: &requester.username,
            skill: &skill,
            requester_level: requester.level_in(&skill),
            college: query.same_college.then_some(requester.college.as_str()),
            limit: query.limit.unwrap_or(10),
        },
    );

    Ok(Json(mentors))
}

pub async fn request_mentorship(
    State(state): State<AppState>,
    Path((username, mentor)): Path<(String, String)>,
    Json(input): Json<MentorshipRequestInput>,
) -> Result<(StatusCode, Json<MentorshipRequest>), (StatusCode, String)> {
    if username == mentor {
        return Err(rejected(
            StatusCode::BAD_REQUEST,
            "Cannot request mentorship from yourself",
        ));
    }

    let request = state
        .db
        .create_mentorship_request(&username, &mentor, input)
        .map_err(store_error)?;

    tracing::info!(student = %username, mentor = %mentor, "Mentorship requested");
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_mentorship_requests(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<MentorshipRequest>>, (StatusCode, String)> {
    state
        .db
        .get_user(&username)
        .map_err(store_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    state
        .db
        .get_mentorship_requests(&username)
        .map(Json)
        .map_err(store_error)
}

// ============================================================
// Leaderboard
// ============================================================

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(skill): Path<String>,
) -> Result<Json<Leaderboard>, (StatusCode, String)> {
    require_skill(&state, &skill)?;

    let users = state.db.all_users().map_err(store_error)?;
    let entries = progress::rank(&users, &skill, progress::LEADERBOARD_LIMIT);

    Ok(Json(Leaderboard { skill, entries }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_keep_status_and_message() {
        assert_eq!(
            grade_error(GradeError::ProgressChanged),
            (
                StatusCode::CONFLICT,
                "Progress changed during grading, reload the current task".to_string()
            )
        );
        assert_eq!(
            store_error(StoreError::UserNotFound("ghost".into())),
            (StatusCode::NOT_FOUND, "User not found: ghost".to_string())
        );
        assert_eq!(
            grade_error(GradeError::NoSkillSelected).0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn database_failures_are_sanitised() {
        let (status, msg) = store_error(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "Internal server error");
    }
}
