//! Schedule analysis over the dependency graph.

pub mod bottleneck;
pub mod critical_path;

pub use bottleneck::{find_bottlenecks, Bottleneck};
pub use critical_path::{CriticalPathAnalysis, CriticalPathAnalyzer, TaskSchedule};
