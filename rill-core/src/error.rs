/// Error raised by a pipeline component and reported through
/// [`Handler::on_error`](crate::Handler::on_error).
///
/// `Display` is the raw failure message with no variant prefix; the variant
/// itself is exposed through [`kind`](FlowError::kind) so observers can
/// classify failures without parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("{0}")]
    Model(String),

    #[error("{0}")]
    Template(String),

    #[error("{0}")]
    Tool(String),

    #[error("{0}")]
    Retrieval(String),

    #[error("{0}")]
    Graph(String),

    #[error("{0}")]
    Stream(String),

    #[error("{0}")]
    Cancelled(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FlowError {
    /// Stable classifier for this error, used as the error-kind span tag.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::Model(_) => "model",
            FlowError::Template(_) => "template",
            FlowError::Tool(_) => "tool",
            FlowError::Retrieval(_) => "retrieval",
            FlowError::Graph(_) => "graph",
            FlowError::Stream(_) => "stream",
            FlowError::Cancelled(_) => "cancelled",
            FlowError::Serde(_) => "serde",
            FlowError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
