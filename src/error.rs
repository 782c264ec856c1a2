//! Core error types
//!
//! Error taxonomy for the composition core: initialization, operation,
//! resolution, and serialization faults. Handler and watcher faults are
//! logged at the dispatch site and never surface through these types.

use thiserror::Error;

/// Errors produced by the module composition core
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Module initialization failed: {0}")]
    InitializationError(String),

    #[error("Module operation failed: {0}")]
    OperationError(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("No factory registered for module variant: {0}")]
    FactoryNotFound(String),

    #[error("Invalid module specification: {0}")]
    InvalidSpec(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(e: toml::de::Error) -> Self {
        CoreError::InvalidSpec(e.to_string())
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(e: anyhow::Error) -> Self {
        CoreError::OperationError(e.to_string())
    }
}
