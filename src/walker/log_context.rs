//! Logging context handed to pipeline threads
//!
//! A subscriber installed with `tracing::subscriber::with_default` is only
//! visible on the thread that installed it, and a new thread starts outside
//! every span. Each component captures both on the spawning side and enters
//! them as the first thing its thread does.

use tracing::dispatcher::{self, DefaultGuard, Dispatch};
use tracing::span::EnteredSpan;
use tracing::Span;

/// Subscriber and span of the thread that spawns a pipeline component
#[derive(Debug, Clone)]
pub(crate) struct LogContext {
    dispatch: Dispatch,
    span: Span,
}

/// Keeps a captured context active until dropped
///
/// Fields drop in order: the span exits before the subscriber is reset.
pub(crate) struct LogGuard {
    _span: EnteredSpan,
    _dispatch: DefaultGuard,
}

impl LogContext {
    /// Capture the calling thread's subscriber and current span
    pub(crate) fn capture() -> Self {
        Self {
            dispatch: dispatcher::get_default(Dispatch::clone),
            span: Span::current(),
        }
    }

    /// Make the captured context current on this thread
    pub(crate) fn enter(self) -> LogGuard {
        let dispatch = dispatcher::set_default(&self.dispatch);
        LogGuard {
            _span: self.span.entered(),
            _dispatch: dispatch,
        }
    }
}
