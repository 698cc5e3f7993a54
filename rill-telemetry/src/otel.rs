//! OpenTelemetry backend adapter.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::SystemTime;

use opentelemetry::KeyValue;
use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer as _};
use rill_core::Context;

use crate::span::{ActiveSpan, Span, SpanOptions, TraceError, Tracer};
use crate::tags::TagSet;

/// Propagation slot carrying the OpenTelemetry context of the innermost
/// started span, used to parent the next child.
#[derive(Clone)]
struct OtelContext(opentelemetry::Context);

/// [`Tracer`] backed by the global OpenTelemetry provider.
///
/// Install a provider first (see [`crate::init::init_otlp`]); without one,
/// spans are recorded against the no-op tracer and silently discarded.
///
/// OpenTelemetry has no asynchronous-child linkage mode, so
/// [`SpanOptions::async_child`] spans are linked as plain children here.
pub struct OtelTracer {
    tracer: BoxedTracer,
}

impl OtelTracer {
    /// A tracer for the given instrumentation scope.
    pub fn new(scope: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tracer: global::tracer(scope),
        }
    }
}

impl Tracer for OtelTracer {
    fn start_span(
        &self,
        ctx: &Context,
        name: &str,
        options: SpanOptions,
    ) -> Result<(Arc<dyn Span>, Context), TraceError> {
        let parent = ctx
            .get::<OtelContext>()
            .map(|slot| slot.0.clone())
            .unwrap_or_else(opentelemetry::Context::new);

        let span = self
            .tracer
            .span_builder(name.to_string())
            .with_kind(SpanKind::Internal)
            .with_start_time(SystemTime::from(options.start_time))
            .start_with_context(&self.tracer, &parent);

        let cx = parent.with_span(span);
        let handle: Arc<dyn Span> = Arc::new(OtelSpan { cx: cx.clone() });
        let ctx = ctx.with(OtelContext(cx)).with(ActiveSpan(handle.clone()));
        Ok((handle, ctx))
    }
}

struct OtelSpan {
    cx: opentelemetry::Context,
}

impl Span for OtelSpan {
    fn set_tags(&self, tags: TagSet) {
        let span = self.cx.span();
        for (key, value) in tags.iter() {
            span.set_attribute(KeyValue::new(key.to_string(), value.to_string()));
        }
    }

    fn finish(&self) {
        self.cx.span().end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::keys;

    // These run against the global no-op tracer: what is under test is the
    // adapter's context plumbing, not export.

    #[test]
    fn test_start_span_layers_active_slot() {
        let tracer = OtelTracer::new("test");
        let root = Context::new();

        let (span, ctx) = tracer
            .start_span(&root, "parent", SpanOptions::default())
            .unwrap();
        assert!(tracer.span_from_context(&ctx).is_some());
        assert!(tracer.span_from_context(&root).is_none());

        span.set_tags(TagSet::new().set(keys::NAME, "parent"));
        span.finish();
    }

    #[test]
    fn test_child_span_starts_under_parent_context() {
        let tracer = OtelTracer::new("test");
        let (_, parent_ctx) = tracer
            .start_span(&Context::new(), "parent", SpanOptions::default())
            .unwrap();
        let (child, child_ctx) = tracer
            .start_span(&parent_ctx, "child", SpanOptions::default().async_child())
            .unwrap();

        assert!(tracer.span_from_context(&child_ctx).is_some());
        child.finish();
    }
}
