pub mod config;
pub mod error;
pub mod log;
pub mod store;

// Dependency graph and scheduling
pub mod core;
pub mod schedule;

// Edit forms and the timeline
pub mod edit;
pub mod timeline;

pub use error::{Error, Result};
