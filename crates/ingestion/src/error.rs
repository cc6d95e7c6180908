//! Ingestion error types

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Source already started
    #[error("event source {source_name} is already listening")]
    AlreadyListening { source_name: String },

    /// Source not started
    #[error("event source {source_name} is not listening")]
    NotListening { source_name: String },

    /// Receiver was already handed out
    #[error("receiver already taken")]
    ReceiverTaken,

    /// Error reported by the source itself
    #[error(transparent)]
    Source(#[from] contracts::ContractError),
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
