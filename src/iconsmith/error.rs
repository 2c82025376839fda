use crate::checker::Violation;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failures reported by an image provider.
///
/// The sub-kinds are kept for reporting only; the pipeline treats all of
/// them as terminal `provider-error`s.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Provider API error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum IconError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Validation failed: {}", describe_violations(.0))]
    ValidationFailed(Vec<Violation>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No source image available: {0}")]
    NoSourceAvailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, IconError>;

/// The user-facing failure taxonomy. Every terminal failure maps onto
/// exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    ProviderError,
    DecodeError,
    ValidationFailed,
    IoError,
    NoSourceAvailable,
    ConfigError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ProviderError => "provider-error",
            FailureKind::DecodeError => "decode-error",
            FailureKind::ValidationFailed => "validation-failed",
            FailureKind::IoError => "io-error",
            FailureKind::NoSourceAvailable => "no-source-available",
            FailureKind::ConfigError => "config-error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IconError {
    pub fn kind(&self) -> FailureKind {
        match self {
            IconError::Provider(_) => FailureKind::ProviderError,
            IconError::Decode(_) => FailureKind::DecodeError,
            IconError::ValidationFailed(_) => FailureKind::ValidationFailed,
            IconError::Io(_) | IconError::Serialization(_) => FailureKind::IoError,
            IconError::NoSourceAvailable(_) => FailureKind::NoSourceAvailable,
            // Bad user input is caught before any work starts, same as a missing key
            IconError::Config(_) | IconError::Api(_) => FailureKind::ConfigError,
        }
    }

    /// Violations carried by a `validation-failed` error, empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            IconError::ValidationFailed(v) => v,
            _ => &[],
        }
    }
}

fn describe_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
