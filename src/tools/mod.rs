//! Macro Util tools
//!
//! Operations shared by the MCP server and the CLI. Each returns a
//! serializable response or a tagged `ToolError`.

pub mod ingredients;
pub mod journal;
pub mod recipes;
pub mod status;

use thiserror::Error;

use crate::db::DbError;
use crate::journal::DateError;
use crate::nutrition::ServingError;

/// Failure reported to a front end
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ToolError {
    /// Short machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Invalid(_) => "invalid",
            ToolError::NotFound(_) => "not_found",
            ToolError::AlreadyExists(_) => "already_exists",
            ToolError::Database(_) => "database",
        }
    }
}

impl From<ServingError> for ToolError {
    fn from(e: ServingError) -> Self {
        ToolError::Invalid(e.to_string())
    }
}

impl From<DateError> for ToolError {
    fn from(e: DateError) -> Self {
        ToolError::Invalid(e.to_string())
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
