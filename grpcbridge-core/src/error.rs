//! # Errors
//!
//! Every failure of this crate falls in one of three families:
//!
//! * **[`ConfigurationError`]**: a [`Variable`](crate::variable::Variable) names a path or field
//!   that doesn't exist on the message schema. This is a wiring defect between the routes and
//!   the message types, it doesn't depend on the request's data.
//! * **[`ValidationError`]**: a well-formed value that can't be coerced to the type of the
//!   field it targets.
//! * **[`ParsingError`]**: malformed wire bytes, an unsupported charset, or a failure of the JSON
//!   tree converter.
//!
//! [`Error`] unifies the three and knows how each one should be reported to a caller.
use crate::converter::{Charset, UrlDecodeError};

/// A variable that doesn't fit the schema of the message it is applied to.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid variable path: {variable}, looking for: '{segment}'")]
    UnknownPathSegment { variable: String, segment: String },

    #[error(
        "Invalid variable path: {variable}, segment '{segment}' is not a singular message field"
    )]
    NotAMessageSegment { variable: String, segment: String },

    #[error("Invalid variable {variable}: field '{field}' is not part of '{message}'")]
    UnknownField {
        variable: String,
        field: String,
        message: String,
    },

    #[error("Invalid variable {variable}: field '{field}' is a message and can't hold a value")]
    MessageLeaf { variable: String, field: String },
}

/// A value that can't be coerced to the type of its target field.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Value '{value}' of field '{field}' is not a valid {expected}")]
    Mismatch {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Value '{value}' of field '{field}' is not a member of enum '{enum_name}'")]
    UnknownEnumValue {
        field: String,
        value: String,
        enum_name: String,
    },

    #[error("Value {value} doesn't match the type of field '{field}'")]
    InvalidTypedValue { field: String, value: String },
}

/// Malformed wire data, or data that the target format can't represent.
#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    #[error("Failed to parse a body: '{body}': {source}")]
    MalformedBody {
        body: String,
        #[source]
        source: UrlDecodeError,
    },

    #[error("Failed to parse a body: '{body}': {source}")]
    InvalidTree {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to merge a parsed body into its builder: '{body}': {source}")]
    Merge {
        body: String,
        #[source]
        source: prost::DecodeError,
    },

    #[error("Failed to serialize a message: '{message}': {source}")]
    Print {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize a message: '{message}': field '{key}' is not a flat value")]
    NotFlat { message: String, key: String },

    #[error("Failed to serialize a message: '{message}': {charset} can't represent field '{key}'")]
    Unencodable {
        message: String,
        key: String,
        charset: Charset,
    },

    #[error("Unsupported charset '{0}'")]
    UnsupportedCharset(String),

    #[error("Invalid content type '{0}'")]
    InvalidContentType(String),
}

/// Failure to apply a variable to a message.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Any failure produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Parsing(#[from] ParsingError),
}

impl From<BindError> for Error {
    fn from(err: BindError) -> Self {
        match err {
            BindError::Configuration(e) => Error::Configuration(e),
            BindError::Validation(e) => Error::Validation(e),
        }
    }
}

impl Error {
    /// The gRPC code to report for this error.
    ///
    /// Configuration errors are server-side faults; the caller isn't to blame for them.
    pub fn code(&self) -> tonic::Code {
        match self {
            Error::Configuration(_) => tonic::Code::Internal,
            Error::Validation(_) | Error::Parsing(_) => tonic::Code::InvalidArgument,
        }
    }

    /// The HTTP status to report for this error.
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Error::Configuration(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
            Error::Validation(_) | Error::Parsing(_) => http::StatusCode::BAD_REQUEST,
        }
    }

    /// Returns `true` when the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        tonic::Status::new(err.code(), err.to_string())
    }
}
