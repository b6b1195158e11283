//! Error types for assetkit property classes

use thiserror::Error;

/// Errors raised while reading, validating or writing property classes
#[derive(Debug, Error)]
pub enum PropertyError {
    /// A required string was empty or whitespace only
    #[error("{field} cannot be empty")]
    EmptyValue { field: String },

    /// Value could not be read as a boolean
    #[error("{field}: '{value}' is not a boolean")]
    NotBoolean { field: String, value: String },

    /// Value failed an enumeration or format check
    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// A field the wire object must carry is absent
    #[error("missing field: {field}")]
    MissingField { field: String },

    /// Wire object has the wrong shape
    #[error("malformed wire object: {0}")]
    Malformed(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node {fqi} is not a {expected} node")]
    NodeKind { fqi: String, expected: String },

    /// Node is not licensed by the data definition
    #[error("node {0} is a phantom node")]
    PhantomNode(String),

    #[error("node {0} is not a multiple field")]
    NotMultiple(String),

    #[error("instance limit reached for {fqi}: {reason}")]
    InstanceLimit { fqi: String, reason: String },

    #[error("nodes {first} and {second} are not instances of the same field")]
    NotSiblings { first: String, second: String },

    #[error("page region not found: {0}")]
    NoSuchRegion(String),

    #[error("plugin parameter not found: {0}")]
    NoSuchParameter(String),

    #[error("dynamic field not found: {0}")]
    NoSuchDynamicField(String),

    #[error("workflow step not found: {0}")]
    NoSuchStep(String),

    #[error("action '{action}' is not possible from step '{step}'")]
    ImpossibleAction { action: String, step: String },

    #[error("ability {ability} does not apply to {role_type} roles")]
    UnsupportedAbility { ability: String, role_type: String },

    #[error("configuration error: {0}")]
    Config(String),

    /// Failure reported by the remote service
    #[error("service error: {0}")]
    Service(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PropertyError {
    pub(crate) fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PropertyError::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn kind(fqi: &str, expected: &str) -> Self {
        PropertyError::NodeKind {
            fqi: fqi.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PropertyError>;
