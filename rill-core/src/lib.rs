//! # rill-core
//!
//! Core contract types for Rill pipelines.
//!
//! ## Overview
//!
//! This crate defines the boundary between a pipeline's execution engine and
//! everything that observes it:
//!
//! - [`RunInfo`] - Describes one execution of a pipeline component
//! - [`Context`] - Immutable, layered value carrier propagated along a run
//! - [`Handler`] - The lifecycle callback trait (start, end, error, and their
//!   streaming variants)
//! - [`FlowError`] / [`Result`] - Unified error handling
//!
//! ## Lifecycle callbacks
//!
//! The engine drives a [`Handler`] through five transitions per run:
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait Handler: Send + Sync {
//!     async fn on_start(&self, ctx: Context, run: Option<&RunInfo>, input: Value) -> Context;
//!     async fn on_end(&self, ctx: Context, run: Option<&RunInfo>, output: Value) -> Context;
//!     async fn on_error(&self, ctx: Context, run: Option<&RunInfo>, err: &FlowError) -> Context;
//!     // ... plus the stream-input and stream-output variants
//! }
//! ```
//!
//! Contexts are never mutated in place: each callback that needs to carry
//! state forward derives a new [`Context`] layered on top of the one it was
//! given, so concurrently-active runs never race on shared state.

pub mod callbacks;
pub mod context;
pub mod error;
pub mod run;

pub use callbacks::{DataStream, Handler};
pub use context::Context;
pub use error::{FlowError, Result};
pub use run::{ComponentKind, RunInfo, RunMode};
