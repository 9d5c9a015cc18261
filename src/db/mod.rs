mod schema;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

/// Errors from store queries and mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// SQLite-backed user store.
///
/// Every read-modify-write goes through [`Database::mutate_user`], which runs
/// inside one transaction while holding the connection lock, so concurrent
/// requests never overwrite each other's changes.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "questmate")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("questmate.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // User operations
    // ============================================================

    pub fn create_user(&self, user: &UserProgress) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO users (username, experience_points, streak_count, shield_count, current_skill,
                                last_login_date, shield_paused_until, paused_reason, college, joined_date, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &user.username,
                user.experience_points,
                user.streak_count,
                user.shield_count,
                &user.current_skill,
                user.last_login_date.to_string(),
                user.shield_paused_until.map(|d| d.to_string()),
                &user.paused_reason,
                &user.college,
                user.joined_date.to_string(),
                Utc::now().to_rfc3339(),
            ),
        );

        match inserted {
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::UserExists(user.username.clone()));
            }
            other => other?,
        };

        write_levels(&tx, &user.username, user)?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserProgress>, StoreError> {
        let conn = self.conn.lock().expect("database lock poisoned");
        load_user(&conn, username)
    }

    /// All users ordered by username.
    pub fn all_users(&self) -> Result<Vec<UserProgress>, StoreError> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let mut stmt = conn.prepare(&format!("{} ORDER BY username", USER_SELECT))?;
        let mut users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_name: HashMap<String, &mut UserProgress> =
            users.iter_mut().map(|u| (u.username.clone(), u)).collect();

        let mut stmt = conn.prepare("SELECT username, skill, level FROM user_levels")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let username: String = row.get(0)?;
            if let Some(user) = by_name.get_mut(&username) {
                user.levels.insert(row.get(1)?, row.get(2)?);
            }
        }

        let mut stmt = conn.prepare(
            "SELECT username, skill, level FROM completed_tasks ORDER BY username, skill, position",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let username: String = row.get(0)?;
            if let Some(user) = by_name.get_mut(&username) {
                user.completed_tasks
                    .entry(row.get(1)?)
                    .or_default()
                    .push(row.get(2)?);
            }
        }

        drop(by_name);
        Ok(users)
    }

    /// Atomically load a user, apply `f`, and write the result back.
    ///
    /// The whole cycle runs in one transaction under the connection lock. If
    /// `f` returns an error nothing is written. The username itself cannot be
    /// changed through this call.
    pub fn mutate_user<T, E>(
        &self,
        username: &str,
        f: impl FnOnce(&mut UserProgress) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction().map_err(StoreError::from)?;

        let mut user = load_user(&tx, username)?
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))?;

        let value = f(&mut user)?;

        write_user(&tx, username, &user)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(value)
    }

    // ============================================================
    // Mentorship operations
    // ============================================================

    pub fn create_mentorship_request(
        &self,
        student: &str,
        mentor: &str,
        input: MentorshipRequestInput,
    ) -> Result<MentorshipRequest, StoreError> {
        let conn = self.conn.lock().expect("database lock poisoned");

        for name in [student, mentor] {
            let exists: Option<i32> = conn
                .query_row("SELECT 1 FROM users WHERE username = ?", [name], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::UserNotFound(name.to_string()));
            }
        }

        let request = MentorshipRequest {
            id: Uuid::new_v4(),
            student: student.to_string(),
            mentor: mentor.to_string(),
            skill: input.skill,
            topic: input.topic.unwrap_or_else(|| "General help".to_string()),
            status: MentorshipStatus::Pending,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO mentorship_requests (id, student, mentor, skill, topic, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                request.id.to_string(),
                &request.student,
                &request.mentor,
                &request.skill,
                &request.topic,
                request.status.as_str(),
                request.created_at.to_rfc3339(),
            ),
        )?;

        Ok(request)
    }

    /// Requests where `username` is the student or the mentor, newest first.
    pub fn get_mentorship_requests(
        &self,
        username: &str,
    ) -> Result<Vec<MentorshipRequest>, StoreError> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, student, mentor, skill, topic, status, created_at
             FROM mentorship_requests WHERE student = ?1 OR mentor = ?1
             ORDER BY created_at DESC",
        )?;

        let requests = stmt
            .query_map([username], |row| {
                Ok(MentorshipRequest {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    student: row.get(1)?,
                    mentor: row.get(2)?,
                    skill: row.get(3)?,
                    topic: row.get(4)?,
                    status: MentorshipStatus::from_str(&row.get::<_, String>(5)?)
                        .unwrap_or(MentorshipStatus::Pending),
                    created_at: parse_datetime(row.get::<_, String>(6)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(requests)
    }
}

// ============================================================
// Row mapping
// ============================================================

const USER_SELECT: &str = "SELECT username, experience_points, streak_count, shield_count, current_skill,
        last_login_date, shield_paused_until, paused_reason, college, joined_date
 FROM users";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProgress> {
    Ok(UserProgress {
        username: row.get(0)?,
        experience_points: row.get(1)?,
        streak_count: row.get(2)?,
        shield_count: row.get(3)?,
        current_skill: row.get(4)?,
        levels: BTreeMap::new(),
        completed_tasks: BTreeMap::new(),
        last_login_date: parse_date(row.get::<_, String>(5)?),
        shield_paused_until: row.get::<_, Option<String>>(6)?.map(parse_date),
        paused_reason: row.get(7)?,
        college: row.get(8)?,
        joined_date: parse_date(row.get::<_, String>(9)?),
    })
}

fn load_user(conn: &Connection, username: &str) -> Result<Option<UserProgress>, StoreError> {
    let Some(mut user) = conn
        .query_row(
            &format!("{} WHERE username = ?", USER_SELECT),
            [username],
            user_from_row,
        )
        .optional()?
    else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT skill, level FROM user_levels WHERE username = ?")?;
    user.levels = stmt
        .query_map([username], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT skill, level FROM completed_tasks WHERE username = ? ORDER BY skill, position",
    )?;
    let mut rows = stmt.query([username])?;
    while let Some(row) = rows.next()? {
        user.completed_tasks
            .entry(row.get(0)?)
            .or_default()
            .push(row.get(1)?);
    }

    Ok(Some(user))
}

fn write_user(conn: &Connection, username: &str, user: &UserProgress) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE users SET experience_points = ?, streak_count = ?, shield_count = ?, current_skill = ?,
                          last_login_date = ?, shield_paused_until = ?, paused_reason = ?, college = ?
         WHERE username = ?",
        (
            user.experience_points,
            user.streak_count,
            user.shield_count,
            &user.current_skill,
            user.last_login_date.to_string(),
            user.shield_paused_until.map(|d| d.to_string()),
            &user.paused_reason,
            &user.college,
            username,
        ),
    )?;

    write_levels(conn, username, user)
}

fn write_levels(conn: &Connection, username: &str, user: &UserProgress) -> Result<(), StoreError> {
    conn.execute("DELETE FROM user_levels WHERE username = ?", [username])?;
    for (skill, level) in &user.levels {
        conn.execute(
            "INSERT INTO user_levels (username, skill, level) VALUES (?, ?, ?)",
            (username, skill, level),
        )?;
    }

    conn.execute("DELETE FROM completed_tasks WHERE username = ?", [username])?;
    for (skill, levels) in &user.completed_tasks {
        for (position, level) in levels.iter().enumerate() {
            conn.execute(
                "INSERT INTO completed_tasks (username, skill, position, level) VALUES (?, ?, ?, ?)",
                (username, skill, position as i64, level),
            )?;
        }
    }

    Ok(())
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_date(s: String) -> NaiveDate {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
