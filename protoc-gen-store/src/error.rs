//! Error types for generation, configuration and formatting.

use std::io;
use std::process::ExitStatus;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Errors that abort a generation run
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The method-signature extension of a method could not be decoded
    #[error("failed to decode method signature of {method}: {source}")]
    MethodSignature {
        method: String,
        #[source]
        source: prost::DecodeError,
    },

    /// Invalid generator parameter
    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// Errors raised while parsing generator parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("unknown generator option `{0}`")]
    UnknownKey(String),

    #[error("generator option `{0}` requires a value")]
    MissingValue(String),

    #[error("generator option `{key}` expects {expected}, got `{value}`")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Errors raised by a post-processing formatter
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("formatter command is empty")]
    EmptyCommand,

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("formatter I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("formatter exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("formatter produced invalid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}
