use thiserror::Error;
use tracing::{debug, error};

use crate::engine::types::TypeTag;

/// Errors raised by the pivot transform. Every variant aborts the current
/// phase or row and surfaces to the query caller.
#[derive(Debug, Error)]
pub enum PivotError {
    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Cannot map NULL pivot column reference (input column {column})")]
    NullPivotKey { column: usize },

    #[error("Unexpected failure in finding pivot key '{key}' in map")]
    PivotKeyNotFound { key: String },

    #[error("Derived offset {slot} does not map to a pivot position (group columns: {group_columns}, row width: {width})")]
    OffsetRange {
        slot: usize,
        group_columns: usize,
        width: usize,
    },

    #[error("Unsupported pivot key type: {0}")]
    UnsupportedKeyType(TypeTag),

    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    #[error("Session state error: {0}")]
    SessionState(String),

    #[error("Session state serialization failed: {0}")]
    Serialize(#[from] bincode::Error),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl PivotError {
    pub fn parameter<S: Into<String>>(message: S) -> Self {
        Self::Parameter(message.into())
    }

    pub fn schema<S: Into<String>>(message: S) -> Self {
        Self::Schema(message.into())
    }

    pub fn lifecycle<S: Into<String>>(message: S) -> Self {
        Self::Lifecycle(message.into())
    }

    pub fn log_error(&self) {
        match self {
            PivotError::Parameter(e) => {
                error!("Pivot parameter error: {}", e);
            }
            PivotError::Schema(e) => {
                error!("Pivot schema error: {}", e);
            }
            PivotError::NullPivotKey { column } => {
                error!("NULL pivot key in input column {}", column);
            }
            PivotError::PivotKeyNotFound { key } => {
                error!("Pivot key not found in session map");
                debug!("Missing pivot key: {:?}", key);
            }
            PivotError::OffsetRange {
                slot,
                group_columns,
                width,
            } => {
                error!("Pivot slot addressing invariant violated");
                debug!(
                    "slot={} group_columns={} width={}",
                    slot, group_columns, width
                );
            }
            PivotError::UnsupportedKeyType(tag) => {
                error!("Unsupported pivot key type: {}", tag);
            }
            PivotError::Lifecycle(e) => {
                error!("Pivot lifecycle error: {}", e);
            }
            PivotError::SessionState(e) => {
                error!("Pivot session state error: {}", e);
            }
            PivotError::Serialize(e) => {
                error!("Pivot session state serialization failed: {}", e);
                debug!("Serialization error details: {:?}", e);
            }
            PivotError::Host(e) => {
                error!("Host error: {}", e);
                debug!("Host error details: {:?}", e);
            }
        }
    }
}

/// Failures reported by the host-side collaborators (row access, catalog
/// query execution, output buffers).
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Column index {index} out of bounds for row of width {width}")]
    ColumnOutOfBounds { index: usize, width: usize },

    #[error("Column {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        expected: TypeTag,
        found: String,
    },

    #[error("Unknown catalog query: {0}")]
    UnknownQuery(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Row store error: {0}")]
    RowStore(String),
}

/// Errors raised by the scalar calendar functions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Base timestamp cannot be greater than input timestamp")]
    BaseAfterInput,

    #[error("Interval must be a positive number of seconds, got {0}")]
    InvalidInterval(i32),

    #[error("Value out of calendar range: {0}")]
    OutOfRange(i64),
}
