//! Per-session diagnostics sink.
//!
//! Spec §7 describes a thread-local error callback: the first error of a
//! session sets the session's failure flag, but cheap additional
//! diagnostics (e.g. one per mismatching type argument) keep surfacing
//! until the session short-circuits. We model that as a thread-local
//! collection a [`crate::loader::LoadManager`] session drains at the end
//! of `import`/`load`.

use std::cell::RefCell;

use crate::errors::YamaError;

thread_local! {
    static SINK: RefCell<Vec<YamaError>> = const { RefCell::new(Vec::new()) };
}

/// Records a diagnostic against the current thread's session and marks it
/// failed. Cheap and infallible; callers keep going after calling this so
/// that later, independent diagnostics in the same session are still
/// surfaced (spec §4.3.4).
pub fn report(err: YamaError) {
    log::error!("{err}");
    SINK.with(|s| s.borrow_mut().push(err));
}

/// True once at least one diagnostic has been reported on this thread
/// since the last [`clear`].
pub fn failed() -> bool {
    SINK.with(|s| !s.borrow().is_empty())
}

/// Clears the sink, returning whatever it held. Called at session start
/// (discarding stale diagnostics from a prior session on this thread) and
/// at session end (to hand the caller the final diagnostic list).
pub fn take() -> Vec<YamaError> {
    SINK.with(|s| std::mem::take(&mut *s.borrow_mut()))
}

/// Clears the sink without returning its contents. Equivalent to
/// `let _ = take();` but names the intent at call sites.
pub fn clear() {
    SINK.with(|s| s.borrow_mut().clear());
}
