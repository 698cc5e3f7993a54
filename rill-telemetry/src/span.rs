use crate::tags::TagSet;
use chrono::{DateTime, Utc};
use rill_core::Context;
use std::sync::Arc;

/// Failures internal to the telemetry layer.
///
/// Nothing here ever reaches the pipeline caller: every variant is logged
/// and degraded to "less telemetry" at the point it occurs.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The tracing backend could not start or expose a span.
    #[error("tracing backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A payload parser could not derive tags.
    #[error("payload parse failed: {0}")]
    Parse(String),
}

/// Options applied when a span is started.
#[derive(Debug, Clone)]
pub struct SpanOptions {
    /// Explicit start timestamp, set by the caller at event time rather than
    /// whenever the backend gets around to allocating the span.
    pub start_time: DateTime<Utc>,
    /// Link the span as an asynchronous child of the current span: its
    /// lifetime may outlast the parent's.
    pub async_child: bool,
}

impl SpanOptions {
    pub fn start_time(mut self, at: DateTime<Utc>) -> Self {
        self.start_time = at;
        self
    }

    pub fn async_child(mut self) -> Self {
        self.async_child = true;
        self
    }
}

impl Default for SpanOptions {
    fn default() -> Self {
        Self {
            start_time: Utc::now(),
            async_child: false,
        }
    }
}

/// A live span handle exposed by the tracing backend.
///
/// The capability is deliberately narrow: observers may attach tags and
/// finish the span, nothing else. Handles are shared (`Arc`) between the
/// caller and any background tasks still working on the run.
pub trait Span: Send + Sync {
    /// Attach tags to the span. A key that was already set is overwritten.
    fn set_tags(&self, tags: TagSet);

    /// Mark the span complete. Called exactly once per span.
    fn finish(&self);
}

/// Context slot holding the span that is current for a run.
///
/// Backends layer this into the context they return from
/// [`Tracer::start_span`] so later lifecycle events can find the span again.
#[derive(Clone)]
pub struct ActiveSpan(pub Arc<dyn Span>);

/// The tracing backend capability.
pub trait Tracer: Send + Sync {
    /// Start a span named `name` under whatever span is current in `ctx`,
    /// returning the handle and a derived context that carries it.
    fn start_span(
        &self,
        ctx: &Context,
        name: &str,
        options: SpanOptions,
    ) -> Result<(Arc<dyn Span>, Context), TraceError>;

    /// The span current in `ctx`, if one was started on this context's
    /// lineage.
    fn span_from_context(&self, ctx: &Context) -> Option<Arc<dyn Span>> {
        ctx.get::<ActiveSpan>().map(|slot| slot.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSpan;

    impl Span for NullSpan {
        fn set_tags(&self, _tags: TagSet) {}
        fn finish(&self) {}
    }

    struct NullTracer;

    impl Tracer for NullTracer {
        fn start_span(
            &self,
            ctx: &Context,
            _name: &str,
            _options: SpanOptions,
        ) -> Result<(Arc<dyn Span>, Context), TraceError> {
            let span: Arc<dyn Span> = Arc::new(NullSpan);
            Ok((span.clone(), ctx.with(ActiveSpan(span))))
        }
    }

    #[test]
    fn test_options_builder() {
        let options = SpanOptions::default().async_child();
        assert!(options.async_child);
        assert!(options.start_time <= Utc::now());
    }

    #[test]
    fn test_default_span_lookup_reads_active_slot() {
        let tracer = NullTracer;
        let root = Context::new();
        assert!(tracer.span_from_context(&root).is_none());

        let (_, ctx) = tracer.start_span(&root, "s", SpanOptions::default()).unwrap();
        assert!(tracer.span_from_context(&ctx).is_some());
    }
}
