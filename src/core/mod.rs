//! Core domain models for taskline.
//!
//! This module contains the task and milestone records, the dependency graph
//! between tasks, and the progress/completion invariant.

pub mod dag;
pub mod milestone;
pub mod progress;
pub mod task;

pub use dag::{DependencyGraph, DependencyUpdate};
pub use milestone::{Milestone, MilestoneId};
pub use task::{MemberId, Priority, ProjectId, SubsystemId, TaskId, TaskNode};
