use crate::foundation::core::NodeId;

/// Convenience result type used across Artifice.
pub type ArtificeResult<T> = Result<T, ArtificeError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Mismatched codec parameters between an encode and a decode stage are never errors; only
/// structurally invalid data and invalid configuration are.
#[derive(thiserror::Error, Debug)]
pub enum ArtificeError {
    /// Invalid parameter name, value or range, rejected eagerly at set-time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unknown node/port, port type mismatch, duplicate input connection, or cycle.
    #[error("connection error: {0}")]
    Connection(String),

    /// Required input left unconnected at execute-time.
    #[error("missing input: node {node} requires input '{port}'")]
    MissingInput {
        /// Node whose input is missing.
        node: NodeId,
        /// Name of the unconnected input port.
        port: String,
    },

    /// Node-internal failure (unreadable source, structurally invalid data).
    #[error("computation error: {0}")]
    Computation(String),

    /// Errors when serializing or deserializing graph descriptions.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArtificeError {
    /// Build an [`ArtificeError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build an [`ArtificeError::Connection`] value.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Build an [`ArtificeError::MissingInput`] value.
    pub fn missing_input(node: NodeId, port: impl Into<String>) -> Self {
        Self::MissingInput {
            node,
            port: port.into(),
        }
    }

    /// Build an [`ArtificeError::Computation`] value.
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    /// Build an [`ArtificeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Short stable label of the error class, used in execution summaries.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Connection(_) => "connection",
            Self::MissingInput { .. } => "missing-input",
            Self::Computation(_) => "computation",
            Self::Serde(_) => "serialization",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
