#![forbid(unsafe_code)]

//! Core model for the ER diagram editor: element graph, business objects,
//! cardinality values, notation rules, configuration and result types.

mod cardinality;
mod config;
mod graph;
mod locale;
mod model;
mod notation;
mod property;

pub use cardinality::{
    Cardinality, CardinalityNotation, Multiplicity, Optionality, normalize_cardinality,
};
pub use config::{ErConfig, ErConfigError, ErConfigParse, parse_er_config_value};
pub use graph::{DiagramDocument, ElementGraph};
pub use locale::{Locale, LocaleLabels};
pub use model::{
    Bounds, BusinessObject, ConnectionData, ConnectionKind, Element, ElementId, ErType, Point,
    RAW_KEY_PREFIXES,
};
pub use notation::{MarkerStyle, Notation, NotationRules};
pub use property::{Property, PropertyValue, WriteStrategy};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Minimum shape width accepted by resize operations.
pub const MIN_SHAPE_WIDTH: f64 = 50.0;
/// Minimum shape height accepted by resize operations.
pub const MIN_SHAPE_HEIGHT: f64 = 30.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ElementNotFound,
    InvalidDimensions,
    InvalidCardinality,
    CardinalityNotAllowed,
    InvalidValue,
    InvalidConnection,
    HostRejected,
    ListenerFailed,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ElementNotFound => "ELEMENT_NOT_FOUND",
            Self::InvalidDimensions => "INVALID_DIMENSIONS",
            Self::InvalidCardinality => "INVALID_CARDINALITY",
            Self::CardinalityNotAllowed => "CARDINALITY_NOT_ALLOWED",
            Self::InvalidValue => "INVALID_VALUE",
            Self::InvalidConnection => "INVALID_CONNECTION",
            Self::HostRejected => "HOST_REJECTED",
            Self::ListenerFailed => "LISTENER_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq)]
pub enum ErError {
    #[error("element `{id}` not found")]
    ElementNotFound { id: String },
    #[error("dimensions {width}x{height} are below the minimum {min_width}x{min_height}")]
    InvalidDimensions {
        width: f64,
        height: f64,
        min_width: f64,
        min_height: f64,
    },
    #[error("unsupported cardinality `{value}`")]
    InvalidCardinality { value: String },
    #[error("connection `{id}` touches an attribute and cannot carry a cardinality")]
    CardinalityNotAllowed { id: String },
    #[error("invalid value `{value}` for property `{property}`")]
    InvalidValue { property: String, value: String },
    #[error("{source_type} cannot connect to {target_type} in {notation} notation")]
    InvalidConnection {
        source_type: String,
        target_type: String,
        notation: String,
    },
    #[error("host rejected the update: {message}")]
    HostRejected { message: String },
    #[error("listener {listener} failed on `{event}`: {message}")]
    ListenerFailed {
        event: String,
        listener: u64,
        message: String,
    },
}

impl ErError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ElementNotFound { .. } => ErrorCode::ElementNotFound,
            Self::InvalidDimensions { .. } => ErrorCode::InvalidDimensions,
            Self::InvalidCardinality { .. } => ErrorCode::InvalidCardinality,
            Self::CardinalityNotAllowed { .. } => ErrorCode::CardinalityNotAllowed,
            Self::InvalidValue { .. } => ErrorCode::InvalidValue,
            Self::InvalidConnection { .. } => ErrorCode::InvalidConnection,
            Self::HostRejected { .. } => ErrorCode::HostRejected,
            Self::ListenerFailed { .. } => ErrorCode::ListenerFailed,
        }
    }

    #[must_use]
    pub fn element_not_found(id: &ElementId) -> Self {
        Self::ElementNotFound { id: id.to_string() }
    }
}

/// Outcome of an outward-facing operation. Failures are reported here
/// rather than propagated, so the editor never stops on invalid input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationResult {
    pub success: bool,
    pub code: Option<ErrorCode>,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl OperationResult {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: None,
            message: message.into(),
            timestamp: now_millis(),
        }
    }

    #[must_use]
    pub fn failure(error: &ErError) -> Self {
        Self {
            success: false,
            code: Some(error.code()),
            message: error.to_string(),
            timestamp: now_millis(),
        }
    }
}

impl From<ErError> for OperationResult {
    fn from(error: ErError) -> Self {
        Self::failure(&error)
    }
}

fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}
