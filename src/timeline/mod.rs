//! Gantt timeline: entries, building, filtering, zoom, and the service that
//! wires them to the stores.

pub mod builder;
pub mod entry;
pub mod filter;
pub mod service;
pub mod zoom;

pub use builder::TimelineBuilder;
pub use entry::{EntryKind, EntryLink, TimelineEntry};
pub use filter::{FilterCriteria, FilterOption, TimelineFilter};
pub use service::TimelineService;
pub use zoom::{ViewMode, ZoomController};
