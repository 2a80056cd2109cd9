//! Progress/completion invariant.
//!
//! `progress == 100` and `completed` move together. These are the only
//! writers of either field.

use tracing::debug;

use crate::core::task::TaskNode;
use crate::error::{Error, Result};

/// Set a task's progress percentage.
///
/// 100 marks the task completed; anything lower clears the completed flag.
///
/// # Errors
/// Returns `Range` if `value` is outside `0..=100`. Out-of-range values are
/// rejected, never clamped, and the task is left unchanged.
pub fn set_progress(node: &mut TaskNode, value: i64) -> Result<()> {
    let progress = u8::try_from(value)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or(Error::Range(value))?;

    node.progress = progress;
    node.completed = progress == 100;

    debug!(task = %node.id, progress, completed = node.completed, "progress updated");
    Ok(())
}

/// Set a task's completion flag.
///
/// Completing forces progress to 100. Reopening keeps the last numeric
/// progress so that toggling completion does not lose an edit.
pub fn set_completed(node: &mut TaskNode, flag: bool) {
    node.completed = flag;
    if flag {
        node.progress = 100;
    }

    debug!(task = %node.id, progress = node.progress, completed = flag, "completion updated");
}
