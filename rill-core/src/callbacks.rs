use crate::{Context, FlowError, RunInfo};
use async_trait::async_trait;
use futures::stream::Stream;
use serde_json::Value;
use std::pin::Pin;

/// A lazily-produced, possibly unbounded payload stream.
///
/// Streams are single-consumption: whoever receives one owns it, drains it at
/// most once, and releases the underlying resource by dropping it.
pub type DataStream = Pin<Box<dyn Stream<Item = Value> + Send>>;

/// Lifecycle callbacks the execution engine drives for every run.
///
/// Each operation receives the current [`Context`] and the run descriptor.
/// A `None` descriptor drops the event: the input context is returned
/// unchanged and nothing else happens. Start variants return a derived
/// context that must be carried to the matching end/error event; end
/// variants return their input context as-is.
///
/// Streamed variants replace their synchronous counterparts when a
/// component's payload is produced lazily; the engine never delivers both
/// `on_start` and `on_start_with_stream_input` for the same run.
#[async_trait]
pub trait Handler: Send + Sync {
    /// A run began; `input` is its fully-materialized input payload.
    async fn on_start(&self, ctx: Context, run: Option<&RunInfo>, input: Value) -> Context;

    /// A run completed; `output` is its fully-materialized output payload.
    async fn on_end(&self, ctx: Context, run: Option<&RunInfo>, output: Value) -> Context;

    /// A run failed with `err`.
    async fn on_error(&self, ctx: Context, run: Option<&RunInfo>, err: &FlowError) -> Context;

    /// A run began whose input arrives as a stream.
    async fn on_start_with_stream_input(
        &self,
        ctx: Context,
        run: Option<&RunInfo>,
        input: DataStream,
    ) -> Context;

    /// A run completed, producing its output as a stream.
    async fn on_end_with_stream_output(
        &self,
        ctx: Context,
        run: Option<&RunInfo>,
        output: DataStream,
    ) -> Context;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentKind, RunMode};
    use async_stream::stream;
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static EVENTS: AtomicUsize = AtomicUsize::new(0);

    struct CountingHandler;

    #[async_trait]
    impl Handler for CountingHandler {
        async fn on_start(&self, ctx: Context, run: Option<&RunInfo>, _input: Value) -> Context {
            if run.is_some() {
                EVENTS.fetch_add(1, Ordering::SeqCst);
            }
            ctx
        }

        async fn on_end(&self, ctx: Context, run: Option<&RunInfo>, _output: Value) -> Context {
            if run.is_some() {
                EVENTS.fetch_add(1, Ordering::SeqCst);
            }
            ctx
        }

        async fn on_error(&self, ctx: Context, _run: Option<&RunInfo>, _err: &FlowError) -> Context {
            ctx
        }

        async fn on_start_with_stream_input(
            &self,
            ctx: Context,
            _run: Option<&RunInfo>,
            mut input: DataStream,
        ) -> Context {
            while input.next().await.is_some() {
                EVENTS.fetch_add(1, Ordering::SeqCst);
            }
            ctx
        }

        async fn on_end_with_stream_output(
            &self,
            ctx: Context,
            _run: Option<&RunInfo>,
            _output: DataStream,
        ) -> Context {
            ctx
        }
    }

    #[tokio::test]
    async fn test_handler_object_safety_and_stream_consumption() {
        let handler: Box<dyn Handler> = Box::new(CountingHandler);
        let run = RunInfo::new(ComponentKind::Lambda, "fn", RunMode::Plain);

        let ctx = handler
            .on_start(Context::new(), Some(&run), json!({"q": 1}))
            .await;
        let chunks: DataStream = Box::pin(stream! {
            yield json!("a");
            yield json!("b");
        });
        handler
            .on_start_with_stream_input(ctx, Some(&run), chunks)
            .await;

        assert!(EVENTS.load(Ordering::SeqCst) >= 3);
    }
}
