//! Feature-gated tracing hooks.
//!
//! With the `tracing` feature the macros below forward to the `tracing` crate;
//! without it they expand to nothing and the crate carries no logging cost.

/// Opens an info-level span around a whole operation (estimate, warp, batch).
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Records an info-level event with key/value fields.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Records a debug-level event; used for per-template detail.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_debug;
pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in span guard when tracing is compiled out.
///
/// Lets call sites write `let _span = trace_span!(..).entered();` unconditionally.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns self, mirroring `tracing::Span::entered`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
