//! Span lifecycle tracking.
//!
//! [`TraceHandler`] implements the pipeline's lifecycle callbacks and turns
//! them into backend spans. Streamed payloads are parsed on background
//! tasks; the per-run [`StreamGate`] keeps a span from being finished while
//! a task spawned for its run is still working.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use rill_core::{Context, DataStream, FlowError, Handler, RunInfo};
use serde_json::Value;
use tracing::warn;

use crate::gate::StreamGate;
use crate::parser::{DataParser, DefaultDataParser};
use crate::span::{Span, SpanOptions, Tracer};
use crate::tags::{Identity, error_tags, identity_tags, run_tags};

/// Lifecycle observer that reports every run as a distributed-tracing span.
///
/// Failure anywhere in this handler degrades to missing telemetry, never to
/// a broken pipeline. A span-start failure drops tracking for that run; a
/// failing or panicking parser skips tags; a missing span makes end/error
/// events no-ops.
pub struct TraceHandler {
    tracer: Arc<dyn Tracer>,
    identity: Identity,
    parser: Option<Arc<dyn DataParser>>,
}

/// Builder for [`TraceHandler`]. The JSON [`DefaultDataParser`] is installed
/// unless replaced or removed.
pub struct TraceHandlerBuilder {
    tracer: Arc<dyn Tracer>,
    identity: Identity,
    parser: Option<Arc<dyn DataParser>>,
}

impl TraceHandlerBuilder {
    /// Replace the default payload parser.
    pub fn parser(mut self, parser: Arc<dyn DataParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Run without any payload parsing; spans carry identity and run tags
    /// only.
    pub fn without_parser(mut self) -> Self {
        self.parser = None;
        self
    }

    pub fn build(self) -> TraceHandler {
        TraceHandler {
            tracer: self.tracer,
            identity: self.identity,
            parser: self.parser,
        }
    }
}

impl TraceHandler {
    pub fn builder(tracer: Arc<dyn Tracer>, identity: Identity) -> TraceHandlerBuilder {
        TraceHandlerBuilder {
            tracer,
            identity,
            parser: Some(Arc::new(DefaultDataParser)),
        }
    }

    fn open_span(&self, ctx: &Context, run: &RunInfo) -> Option<(Arc<dyn Span>, Context)> {
        let options = SpanOptions::default().start_time(Utc::now()).async_child();
        match self.tracer.start_span(ctx, run.display_name(), options) {
            Ok(started) => Some(started),
            Err(err) => {
                warn!(error = %err, run = run.display_name(), "failed to start span");
                None
            }
        }
    }

    fn set_start_tags(&self, span: &Arc<dyn Span>, run: &RunInfo) {
        span.set_tags(identity_tags(&self.identity));
        span.set_tags(run_tags(run));
    }
}

#[async_trait]
impl Handler for TraceHandler {
    async fn on_start(&self, ctx: Context, run: Option<&RunInfo>, input: Value) -> Context {
        let Some(run) = run else { return ctx };
        let Some((span, ctx)) = self.open_span(&ctx, run) else {
            return ctx;
        };

        self.set_start_tags(&span, run);

        if let Some(parser) = &self.parser {
            match parser.parse_input(&ctx, run, &input).await {
                Ok(tags) => span.set_tags(tags),
                Err(err) => warn!(error = %err, run = run.display_name(), "input parse failed"),
            }
        }

        ctx
    }

    async fn on_end(&self, ctx: Context, run: Option<&RunInfo>, output: Value) -> Context {
        let Some(run) = run else { return ctx };
        let Some(span) = self.tracer.span_from_context(&ctx) else {
            warn!(run = run.display_name(), "no active span for run end");
            return ctx;
        };

        if let Some(parser) = &self.parser {
            match parser.parse_output(&ctx, run, &output).await {
                Ok(tags) => span.set_tags(tags),
                Err(err) => warn!(error = %err, run = run.display_name(), "output parse failed"),
            }
        }

        // The input-stream parse, if one was spawned, still holds the span.
        if let Some(gate) = ctx.get::<StreamGate>() {
            gate.wait().await;
        }

        span.finish();
        ctx
    }

    async fn on_error(&self, ctx: Context, run: Option<&RunInfo>, err: &FlowError) -> Context {
        let Some(run) = run else { return ctx };
        let Some(span) = self.tracer.span_from_context(&ctx) else {
            warn!(run = run.display_name(), "no active span for run error");
            return ctx;
        };

        span.set_tags(error_tags(Some(err)));

        if let Some(gate) = ctx.get::<StreamGate>() {
            gate.wait().await;
        }

        span.finish();
        ctx
    }

    async fn on_start_with_stream_input(
        &self,
        ctx: Context,
        run: Option<&RunInfo>,
        input: DataStream,
    ) -> Context {
        let Some(run) = run else { return ctx };
        let Some((span, ctx)) = self.open_span(&ctx, run) else {
            return ctx;
        };

        self.set_start_tags(&span, run);

        let Some(parser) = self.parser.clone() else {
            // Nothing will drain the stream: no task, and no gate that
            // nothing would ever close. Dropping the stream releases it.
            return ctx;
        };

        let (gate, guard) = StreamGate::new();
        let ctx = ctx.with(gate);
        let task_ctx = ctx.clone();
        let run = run.clone();
        tokio::spawn(async move {
            // dropped on every exit path, unwind included
            let _guard = guard;
            let parsed = AssertUnwindSafe(parser.parse_stream_input(&task_ctx, &run, input))
                .catch_unwind()
                .await;
            match parsed {
                Ok(Ok(tags)) => span.set_tags(tags),
                Err(payload) => {
                    warn!(
                        panic = panic_message(payload.as_ref()),
                        run = run.display_name(),
                        "stream input parser panicked"
                    );
                }
                Ok(Err(err)) => {
                    warn!(error = %err, run = run.display_name(), "stream input parse failed");
                }
            }
        });

        ctx
    }

    async fn on_end_with_stream_output(
        &self,
        ctx: Context,
        run: Option<&RunInfo>,
        output: DataStream,
    ) -> Context {
        let Some(run) = run else { return ctx };
        let Some(span) = self.tracer.span_from_context(&ctx) else {
            warn!(run = run.display_name(), "no active span for run end");
            return ctx;
        };

        let gate = ctx.get::<StreamGate>().cloned();

        match self.parser.clone() {
            Some(parser) => {
                let task_ctx = ctx.clone();
                let run = run.clone();
                tokio::spawn(async move {
                    let parsed =
                        AssertUnwindSafe(parser.parse_stream_output(&task_ctx, &run, output))
                            .catch_unwind()
                            .await;
                    match parsed {
                        Ok(Ok(tags)) => span.set_tags(tags),
                        Err(payload) => {
                            warn!(
                                panic = panic_message(payload.as_ref()),
                                run = run.display_name(),
                                "stream output parser panicked"
                            );
                        }
                        Ok(Err(err)) => {
                            warn!(error = %err, run = run.display_name(), "stream output parse failed");
                        }
                    }
                    // The span closes even when tags are unavailable, and
                    // only after the input-side task has signalled.
                    if let Some(gate) = gate {
                        gate.wait().await;
                    }
                    span.finish();
                });
            }
            None => {
                // No parsing to wait for; release the stream and finish.
                drop(output);
                if let Some(gate) = gate {
                    gate.wait().await;
                }
                span.finish();
            }
        }

        ctx
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "opaque panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(boxed.as_ref()), "owned message");

        let boxed: Box<dyn Any + Send> = Box::new(17u32);
        assert_eq!(panic_message(boxed.as_ref()), "opaque panic payload");
    }
}
