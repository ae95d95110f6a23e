//! Error types for audit session operations

use thiserror::Error;

use crate::schema::{SessionId, SnapshotId};

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("audit session already running: {0}")]
    AlreadyRunning(SessionId),

    #[error("no audit session is running")]
    NotRunning,

    #[error("unknown snapshot: {0}")]
    UnknownSnapshot(SnapshotId),

    #[error("session {0} has not been stopped")]
    SessionNotStopped(SessionId),

    #[error("session mismatch: collector bound to {expected}, recorder holds {actual}")]
    SessionMismatch { expected: SessionId, actual: String },

    #[error("invalid critical-issue threshold: {0} (must be >= 0)")]
    InvalidThreshold(i64),

    #[error("report digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("finding references snapshot {0} which is not part of the report")]
    OrphanFinding(SnapshotId),

    #[error("rule engine error: {0}")]
    Engine(String),

    #[error("rule engine timed out after {timeout_ms}ms evaluating {snapshot}")]
    EngineTimeout { snapshot: SnapshotId, timeout_ms: u64 },

    #[error("report store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;
