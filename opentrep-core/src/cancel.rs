//! Cooperative cancellation: query execution may be interrupted between
//! slices and between a matcher's retrieval retries (spec.md §5). Index
//! build is not cancellable mid-transaction; callers cancel a build by
//! discarding the partial index directory instead.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{OpenTrepError, OpenTrepResult};

/// Returns `Cancelled` if `cancel` is set, otherwise `Ok(())`. Called at
/// each of the cancellation points spec.md §5 names: between slices, and
/// between the matcher's exact/corrected/shrink-right/shrink-left steps.
pub(crate) fn check(cancel: Option<&AtomicBool>) -> OpenTrepResult<()> {
    if cancel.map(|flag| flag.load(Ordering::Relaxed)).unwrap_or(false) {
        return Err(OpenTrepError::Cancelled);
    }
    Ok(())
}
