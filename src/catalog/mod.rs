//! Skill roadmaps.
//!
//! The catalog is configuration data: it is parsed once at startup, either
//! from the roadmaps embedded in the binary or from a JSON file supplied on
//! the command line, and never changes afterwards. Levels are 1-based
//! positions in a skill's task list; asking for a level past the end is how
//! callers detect that a skill is mastered.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{RoadmapEntry, SkillInfo, TaskDescriptor};

const BUILTIN_ROADMAPS: &str = include_str!("roadmaps.json");

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    skills: Vec<SkillFile>,
}

#[derive(Debug, Deserialize)]
struct SkillFile {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    stages: Vec<String>,
    tasks: Vec<TaskDescriptor>,
}

#[derive(Debug)]
struct Skill {
    info: SkillInfo,
    tasks: Vec<TaskDescriptor>,
}

/// Static mapping of skill → level → task.
#[derive(Debug)]
pub struct Catalog {
    skills: Vec<Skill>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// The roadmaps shipped with the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_ROADMAPS)
    }

    /// Load roadmaps from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;

        if file.skills.is_empty() {
            return Err(CatalogError::Invalid("no skills defined".to_string()));
        }

        let mut skills = Vec::with_capacity(file.skills.len());
        let mut index = HashMap::new();

        for skill in file.skills {
            let name = skill.name.trim().to_string();
            if name.is_empty() {
                return Err(CatalogError::Invalid("skill with empty name".to_string()));
            }
            if index.contains_key(&name) {
                return Err(CatalogError::Invalid(format!("duplicate skill: {}", name)));
            }
            if skill.tasks.is_empty() {
                return Err(CatalogError::Invalid(format!("skill {} has no tasks", name)));
            }
            for (i, task) in skill.tasks.iter().enumerate() {
                if task.title.trim().is_empty() || task.expected_output.is_empty() {
                    return Err(CatalogError::Invalid(format!(
                        "{} level {} needs a title and expected output",
                        name,
                        i + 1
                    )));
                }
            }

            index.insert(name.clone(), skills.len());
            skills.push(Skill {
                info: SkillInfo {
                    name,
                    description: skill.description,
                    icon: skill.icon,
                    stages: skill.stages,
                    task_count: skill.tasks.len() as u32,
                },
                tasks: skill.tasks,
            });
        }

        Ok(Self { skills, index })
    }

    fn skill_entry(&self, name: &str) -> Option<&Skill> {
        self.index.get(name).map(|&i| &self.skills[i])
    }

    /// The task at `level` in `skill`, or `None` past the end of the roadmap
    /// or for an unknown skill.
    pub fn get_task(&self, skill: &str, level: u32) -> Option<&TaskDescriptor> {
        let index = usize::try_from(level).ok()?.checked_sub(1)?;
        self.skill_entry(skill)?.tasks.get(index)
    }

    /// Skills in catalog order.
    pub fn skills(&self) -> impl Iterator<Item = &SkillInfo> {
        self.skills.iter().map(|s| &s.info)
    }

    pub fn skill(&self, name: &str) -> Option<&SkillInfo> {
        self.skill_entry(name).map(|s| &s.info)
    }

    pub fn contains_skill(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of levels in `skill`; 0 for an unknown skill.
    pub fn task_count(&self, skill: &str) -> u32 {
        self.skill_entry(skill).map_or(0, |s| s.info.task_count)
    }

    /// Every task of `skill` with its level.
    pub fn roadmap(&self, skill: &str) -> Option<Vec<RoadmapEntry>> {
        let skill = self.skill_entry(skill)?;
        Some(
            skill
                .tasks
                .iter()
                .enumerate()
                .map(|(i, task)| RoadmapEntry {
                    level: i as u32 + 1,
                    task: task.clone(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "skills": [
            {
                "name": "Rust",
                "tasks": [
                    { "title": "Hello", "prompt": "say hi", "expected_output": "hi\n" },
                    { "title": "Test", "prompt": "count", "expected_output": "3\n", "is_milestone": true }
                ]
            }
        ]
    }"#;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        let hello = catalog.get_task("Python", 1).unwrap();
        assert_eq!(hello.expected_output, "Hello, World!\n");
        assert!(!hello.is_milestone);
        assert!(catalog.get_task("Python", 4).unwrap().is_milestone);
    }

    #[test]
    fn levels_are_one_based() {
        let catalog = Catalog::from_json(SMALL).unwrap();
        assert!(catalog.get_task("Rust", 0).is_none());
        assert_eq!(catalog.get_task("Rust", 1).unwrap().title, "Hello");
        assert_eq!(catalog.get_task("Rust", 2).unwrap().title, "Test");
    }

    #[test]
    fn past_the_end_is_not_found() {
        let catalog = Catalog::from_json(SMALL).unwrap();
        assert!(catalog.get_task("Rust", 3).is_none());
        assert!(catalog.get_task("Go", 1).is_none());
        assert_eq!(catalog.task_count("Rust"), 2);
        assert_eq!(catalog.task_count("Go"), 0);
    }

    #[test]
    fn roadmap_numbers_levels() {
        let catalog = Catalog::from_json(SMALL).unwrap();
        let roadmap = catalog.roadmap("Rust").unwrap();
        assert_eq!(roadmap.len(), 2);
        assert_eq!(roadmap[1].level, 2);
        assert!(roadmap[1].task.is_milestone);
        assert!(catalog.roadmap("Go").is_none());
    }

    #[test]
    fn rejects_duplicate_skills() {
        let json = r#"{ "skills": [
            { "name": "A", "tasks": [ { "title": "t", "prompt": "", "expected_output": "x" } ] },
            { "name": "A", "tasks": [ { "title": "t", "prompt": "", "expected_output": "x" } ] }
        ] }"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_expected_output() {
        let json = r#"{ "skills": [
            { "name": "A", "tasks": [ { "title": "t", "prompt": "", "expected_output": "" } ] }
        ] }"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn rejects_skill_without_tasks() {
        let json = r#"{ "skills": [ { "name": "A", "tasks": [] } ] }"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Invalid(_))));
    }
}
