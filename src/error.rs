use thiserror::Error;

/// Terminal failure carried on a stream's error channel.
///
/// Errors are cloned into every listener of a multicast stream, so the type
/// is `Clone` and keeps its payload as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// A transform (or a callback it invoked) failed while recomputing.
    #[error("operator `{operator}` failed: {message}")]
    Transform {
        /// Name of the operator whose transform failed.
        operator: &'static str,
        /// Human-readable failure description.
        message: String,
    },
    /// A producer reported a failure of its own.
    #[error("source failed: {0}")]
    Source(String),
    /// A dynamic configuration entry errored.
    #[error("configuration entry `{key}` failed: {source}")]
    Config {
        /// Field name of the failing entry.
        key: &'static str,
        /// The error emitted by the entry's stream.
        source: Box<StreamError>,
    },
}

impl StreamError {
    /// Shorthand for a [`StreamError::Source`].
    pub fn source_error(message: impl Into<String>) -> Self {
        StreamError::Source(message.into())
    }

    /// Shorthand for a [`StreamError::Transform`].
    pub fn transform(operator: &'static str, message: impl Into<String>) -> Self {
        StreamError::Transform { operator, message: message.into() }
    }
}
