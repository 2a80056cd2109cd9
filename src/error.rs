use thiserror::Error;

use crate::core::task::{ProjectId, TaskId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    #[error("Adding dependency {prerequisite} -> {dependent} would create a circular dependency")]
    CircularDependency {
        dependent: TaskId,
        prerequisite: TaskId,
    },

    #[error("Progress {0} is outside the range 0..=100")]
    Range(i64),

    #[error("Invalid range: end {end} is before start {start}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),
}

pub type Result<T> = std::result::Result<T, Error>;
