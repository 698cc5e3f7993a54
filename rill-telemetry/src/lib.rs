//! # Rill Telemetry
//!
//! Distributed tracing for Rill pipelines: every run of a pipeline
//! component becomes a span, finished only once all background work tied to
//! the run has completed. This holds even when a run's input or output is a
//! lazy stream parsed on a background task.
//!
//! ## Features
//! - [`TraceHandler`] implements the pipeline's lifecycle callbacks
//! - Stream-aware: spans stay open until background payload parsing is done
//! - Best-effort: telemetry failures degrade to missing tags or missing
//!   spans, never to pipeline errors
//! - OpenTelemetry backend adapter with OTLP export
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rill_core::{ComponentKind, Context, Handler, RunInfo, RunMode};
//! use rill_telemetry::{Identity, OtelTracer, TraceHandler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     rill_telemetry::init("my-pipeline")?;
//!
//!     let handler = TraceHandler::builder(
//!         Arc::new(OtelTracer::new("rill")),
//!         Identity::new(1024),
//!     )
//!     .build();
//!
//!     let run = RunInfo::new(ComponentKind::ChatModel, "planner", RunMode::Plain);
//!     let ctx = handler
//!         .on_start(Context::new(), Some(&run), serde_json::json!({"prompt": "hi"}))
//!         .await;
//!     // ... the component executes ...
//!     handler
//!         .on_end(ctx, Some(&run), serde_json::json!({"text": "hello"}))
//!         .await;
//!     Ok(())
//! }
//! ```

pub mod gate;
pub mod handler;
pub mod init;
pub mod otel;
pub mod parser;
pub mod span;
pub mod tags;

// Re-export tracing macros for convenience
pub use tracing::{Span as TracingSpan, debug, error, info, instrument, trace, warn};

pub use gate::{GateGuard, StreamGate};
pub use handler::{TraceHandler, TraceHandlerBuilder};
pub use init::{init, init_otlp, shutdown};
pub use otel::OtelTracer;
pub use parser::{DataParser, DefaultDataParser};
pub use span::{ActiveSpan, Span, SpanOptions, TraceError, Tracer};
pub use tags::{Identity, TagSet, error_tags, identity_tags, keys, run_tags};
