//! Pluggable payload-to-tag derivation.

use crate::span::TraceError;
use crate::tags::{TagSet, keys};
use async_trait::async_trait;
use futures::StreamExt;
use rill_core::{Context, DataStream, RunInfo};
use serde_json::Value;

/// Derives span tags from run payloads.
///
/// Every method has a default implementation returning an empty tag set, so
/// a parser overrides only the phases it supports; the remaining phases
/// contribute no tags. Stream variants take the stream by value: the parser
/// owns it, drains it at most once, and dropping it releases the underlying
/// resource even when parsing bails early.
#[async_trait]
pub trait DataParser: Send + Sync {
    async fn parse_input(
        &self,
        _ctx: &Context,
        _run: &RunInfo,
        _input: &Value,
    ) -> Result<TagSet, TraceError> {
        Ok(TagSet::new())
    }

    async fn parse_output(
        &self,
        _ctx: &Context,
        _run: &RunInfo,
        _output: &Value,
    ) -> Result<TagSet, TraceError> {
        Ok(TagSet::new())
    }

    async fn parse_stream_input(
        &self,
        _ctx: &Context,
        _run: &RunInfo,
        _input: DataStream,
    ) -> Result<TagSet, TraceError> {
        Ok(TagSet::new())
    }

    async fn parse_stream_output(
        &self,
        _ctx: &Context,
        _run: &RunInfo,
        _output: DataStream,
    ) -> Result<TagSet, TraceError> {
        Ok(TagSet::new())
    }
}

/// Parser installed when no custom one is configured: payloads become the
/// input/output tags verbatim, stream chunks are drained into a JSON array.
#[derive(Debug, Clone, Default)]
pub struct DefaultDataParser;

#[async_trait]
impl DataParser for DefaultDataParser {
    async fn parse_input(
        &self,
        _ctx: &Context,
        _run: &RunInfo,
        input: &Value,
    ) -> Result<TagSet, TraceError> {
        Ok(TagSet::new().set(keys::INPUT, render(input)))
    }

    async fn parse_output(
        &self,
        _ctx: &Context,
        _run: &RunInfo,
        output: &Value,
    ) -> Result<TagSet, TraceError> {
        Ok(TagSet::new().set(keys::OUTPUT, render(output)))
    }

    async fn parse_stream_input(
        &self,
        _ctx: &Context,
        _run: &RunInfo,
        input: DataStream,
    ) -> Result<TagSet, TraceError> {
        let chunks: Vec<Value> = input.collect().await;
        Ok(TagSet::new().set(keys::INPUT, render(&Value::Array(chunks))))
    }

    async fn parse_stream_output(
        &self,
        _ctx: &Context,
        _run: &RunInfo,
        output: DataStream,
    ) -> Result<TagSet, TraceError> {
        let chunks: Vec<Value> = output.collect().await;
        Ok(TagSet::new().set(keys::OUTPUT, render(&Value::Array(chunks))))
    }
}

/// Strings go through unquoted; everything else as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
