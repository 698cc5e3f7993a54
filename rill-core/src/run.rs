use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of pipeline component a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    ChatModel,
    ChatTemplate,
    Embedding,
    Indexer,
    Retriever,
    Tool,
    ToolsNode,
    Lambda,
    Graph,
    Chain,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::ChatModel => "ChatModel",
            ComponentKind::ChatTemplate => "ChatTemplate",
            ComponentKind::Embedding => "Embedding",
            ComponentKind::Indexer => "Indexer",
            ComponentKind::Retriever => "Retriever",
            ComponentKind::Tool => "Tool",
            ComponentKind::ToolsNode => "ToolsNode",
            ComponentKind::Lambda => "Lambda",
            ComponentKind::Graph => "Graph",
            ComponentKind::Chain => "Chain",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a component executes within the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Plain,
    Streaming,
    Tool,
    Agent,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Plain => "plain",
            RunMode::Streaming => "streaming",
            RunMode::Tool => "tool",
            RunMode::Agent => "agent",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes one execution of a pipeline component.
///
/// Issued by the execution engine when a component starts and carried through
/// every lifecycle event for that run. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub kind: ComponentKind,
    /// Logical name of the component instance. May be empty, in which case
    /// consumers fall back to the component kind.
    pub name: String,
    pub mode: RunMode,
}

impl RunInfo {
    pub fn new(kind: ComponentKind, name: impl Into<String>, mode: RunMode) -> Self {
        Self {
            kind,
            name: name.into(),
            mode,
        }
    }

    /// The display name for this run: the logical name, or the component
    /// kind when no name was configured.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.kind.as_str()
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_logical_name() {
        let run = RunInfo::new(ComponentKind::Retriever, "kb-search", RunMode::Plain);
        assert_eq!(run.display_name(), "kb-search");
    }

    #[test]
    fn test_display_name_falls_back_to_kind() {
        let run = RunInfo::new(ComponentKind::ChatModel, "", RunMode::Streaming);
        assert_eq!(run.display_name(), "ChatModel");
    }

    #[test]
    fn test_run_mode_serializes_lowercase() {
        let json = serde_json::to_string(&RunMode::Streaming).unwrap();
        assert_eq!(json, "\"streaming\"");
    }

    #[test]
    fn test_run_info_round_trip() {
        let run = RunInfo::new(ComponentKind::Tool, "weather", RunMode::Tool);
        let json = serde_json::to_string(&run).unwrap();
        let back: RunInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, run);
    }
}
