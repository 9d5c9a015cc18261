//! QuestMate: gamified coding practice.
//!
//! Users pick a skill track, submit code for the current task, and advance a
//! level each time the program's output matches exactly. Daily logins build a
//! streak, every seventh streak day earns a consistency shield, and peers a
//! few levels ahead are suggested as mentors.

pub mod api;
pub mod catalog;
pub mod client;
pub mod config;
pub mod db;
pub mod executor;
pub mod grader;
pub mod models;
pub mod progress;
