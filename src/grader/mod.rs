//! Submission grading.
//!
//! A submission runs the user's code, compares its stdout with the current
//! task's expected output, and on an exact match advances the user one level.
//! Each (skill, level) pair is a state and a passing submission is the only
//! edge out of it.

mod transition;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

pub use transition::*;

use crate::catalog::Catalog;
use crate::db::{Database, StoreError};
use crate::executor::Executor;
use crate::models::SubmissionResult;

#[derive(Debug, Error)]
pub enum GradeError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Please select a skill first")]
    NoSkillSelected,

    #[error("Task not found: {skill} level {level}")]
    TaskNotFound { skill: String, level: u32 },

    /// The user's skill or level moved while the submission was running.
    /// Only reachable through writers that change progress without taking
    /// [`Grader::lock_user`] first.
    #[error("Progress changed during grading, reload the current task")]
    ProgressChanged,

    #[error(transparent)]
    Store(#[from] StoreError),
}

type LockTable = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// One async lock per username. An entry lives only while someone holds or
/// waits for it.
#[derive(Clone, Default)]
struct UserLocks {
    inner: LockTable,
}

impl UserLocks {
    async fn lock(&self, username: &str) -> UserGuard {
        let lock = {
            let mut locks = self.inner.lock().expect("user lock table poisoned");
            locks.entry(username.to_string()).or_default().clone()
        };

        // Built before waiting so a cancelled wait still prunes the entry
        let mut held = UserGuard {
            username: username.to_string(),
            table: self.inner.clone(),
            lock,
            guard: None,
        };
        held.guard = Some(held.lock.clone().lock_owned().await);
        held
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().expect("user lock table poisoned").len()
    }
}

/// A user's lock. Dropping it releases the lock and removes the table entry
/// when no other caller holds or waits for it.
pub struct UserGuard {
    username: String,
    table: LockTable,
    lock: Arc<tokio::sync::Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGuard {
    fn drop(&mut self) {
        self.guard.take();

        let mut locks = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the table and this guard still point at the lock
        let unshared = Arc::strong_count(&self.lock) == 2;
        let same_entry = locks
            .get(&self.username)
            .is_some_and(|l| Arc::ptr_eq(l, &self.lock));
        if unshared && same_entry {
            locks.remove(&self.username);
        }
    }
}

/// Grades submissions and applies the resulting progress.
#[derive(Clone)]
pub struct Grader {
    db: Database,
    catalog: Arc<Catalog>,
    executor: Arc<dyn Executor>,
    locks: UserLocks,
}

impl Grader {
    pub fn new(db: Database, catalog: Arc<Catalog>, executor: Arc<dyn Executor>) -> Self {
        Self {
            db,
            catalog,
            executor,
            locks: UserLocks::default(),
        }
    }

    /// Hold off submissions for `username` until the guard is dropped.
    ///
    /// Anything else that moves a user's skill or level takes this first.
    pub async fn lock_user(&self, username: &str) -> UserGuard {
        self.locks.lock(username).await
    }

    /// Grade `source` against the user's current task.
    ///
    /// Failing submissions come back as `Ok` with `success == false` and leave
    /// the store untouched. Submissions from the same user are graded one at
    /// a time.
    pub async fn submit(&self, username: &str, source: &str) -> Result<SubmissionResult, GradeError> {
        let _guard = self.locks.lock(username).await;

        let user = self
            .db
            .get_user(username)?
            .ok_or_else(|| GradeError::UserNotFound(username.to_string()))?;

        let (skill, level) = user
            .current_position()
            .map(|(s, l)| (s.to_string(), l))
            .ok_or(GradeError::NoSkillSelected)?;

        let task = self
            .catalog
            .get_task(&skill, level)
            .ok_or_else(|| GradeError::TaskNotFound {
                skill: skill.clone(),
                level,
            })?;

        let run = self.executor.execute(source).await;

        let output = match judge(task, run) {
            Verdict::Passed { output } => output,
            Verdict::Mismatch { expected, actual } => {
                tracing::info!(username = %username, skill = %skill, level, "Submission output mismatch");
                return Ok(SubmissionResult {
                    success: false,
                    message: format!("Output mismatch. Expected: {:?}, Got: {:?}", expected, actual),
                    captured_output: actual,
                    xp_awarded: 0,
                    new_level: None,
                    bonus: None,
                    streak_count: user.streak_count,
                });
            }
            Verdict::Crashed(e) => {
                tracing::info!(username = %username, skill = %skill, level, error = %e, "Submission failed to run");
                return Ok(SubmissionResult {
                    success: false,
                    captured_output: String::new(),
                    message: format!("Code execution error: {}", e),
                    xp_awarded: 0,
                    new_level: None,
                    bonus: None,
                    streak_count: user.streak_count,
                });
            }
        };

        let award = self.db.mutate_user(username, |u| {
            if u.current_position() != Some((skill.as_str(), level)) {
                return Err(GradeError::ProgressChanged);
            }
            Ok(apply_success(u, &skill, level, task))
        })?;

        tracing::info!(
            username = %username,
            skill = %skill,
            level,
            xp = award.xp_awarded,
            streak = award.streak_count,
            "Submission passed"
        );

        Ok(SubmissionResult {
            success: true,
            captured_output: output,
            message: "Quest completed!".to_string(),
            xp_awarded: award.xp_awarded,
            new_level: Some(award.new_level),
            bonus: award
                .shield_earned
                .then(|| format!("Earned consistency shield! Total: {}", award.shield_count)),
            streak_count: award.streak_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;
    use crate::executor::ExecutionError;
    use crate::models::UserProgress;

    fn echo(source: &str) -> Result<String, ExecutionError> {
        Ok(source.to_string())
    }

    fn grader() -> Grader {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let catalog = Arc::new(Catalog::builtin().unwrap());
        Grader::new(db, catalog, Arc::new(echo))
    }

    fn add_user(grader: &Grader, name: &str, skill: Option<&str>) {
        let mut user = UserProgress::new(name, "MIT", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        if let Some(skill) = skill {
            user.current_skill = Some(skill.to_string());
            user.levels.insert(skill.to_string(), 1);
        }
        grader.db.create_user(&user).unwrap();
    }

    #[tokio::test]
    async fn unknown_users_leave_no_lock_entries() {
        let grader = grader();

        for i in 0..200 {
            let err = grader.submit(&format!("ghost{}", i), "x").await.unwrap_err();
            assert!(matches!(err, GradeError::UserNotFound(_)));
        }

        assert_eq!(grader.locks.len(), 0);
    }

    #[tokio::test]
    async fn graded_and_rejected_submissions_release_entries() {
        let grader = grader();
        add_user(&grader, "ada", Some("Python"));
        add_user(&grader, "bob", None);

        assert!(!grader.submit("ada", "wrong\n").await.unwrap().success);
        assert!(grader.submit("ada", "Hello, World!\n").await.unwrap().success);
        assert!(matches!(
            grader.submit("bob", "x").await,
            Err(GradeError::NoSkillSelected)
        ));
        drop(grader.lock_user("carol").await);

        assert_eq!(grader.locks.len(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_another_caller_waits() {
        let locks = UserLocks::default();

        let first = locks.lock("ada").await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _second = locks.lock("ada").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert!(locks.len() <= 1);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn cancelled_wait_releases_entry() {
        let locks = UserLocks::default();

        let held = locks.lock("ada").await;
        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), locks.lock("ada")).await;
        assert!(timed_out.is_err());

        drop(held);
        assert_eq!(locks.len(), 0);
    }
}
