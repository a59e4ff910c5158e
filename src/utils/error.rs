use crate::domain::model::Protocol;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which side of the control API a failed call was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOperation {
    Read,
    Write,
}

impl fmt::Display for ControlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlOperation::Read => f.write_str("get peer port from Transmission"),
            ControlOperation::Write => f.write_str("set peer port in Transmission"),
        }
    }
}

/// Errors of a single reconciliation pass plus startup configuration errors.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to request {protocol} mapping: {source}")]
    GatewayError {
        protocol: Protocol,
        #[source]
        source: GatewayFailure,
    },

    #[error("{protocol} internal ({internal}) and external ({external}) ports do not match")]
    PortMismatchError {
        protocol: Protocol,
        internal: u16,
        external: u16,
    },

    #[error("failed to {operation}: {source}")]
    ControlApiError {
        operation: ControlOperation,
        #[source]
        source: ControlApiFailure,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: {value:?} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl SyncError {
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::GatewayError { .. } => {
                "Check that the gateway supports NAT-PMP and that --gateway.ip points at it"
            }
            SyncError::PortMismatchError { .. } => {
                "The gateway remapped the port; this is retried on the next pass"
            }
            SyncError::ControlApiError { .. } => {
                "Check that Transmission is running and --transmission.url is reachable"
            }
            SyncError::MissingConfigError { .. } => "Pass the missing flag, see --help",
            SyncError::InvalidConfigValueError { .. } => "Fix the flag value, see --help",
        }
    }
}

/// Failures of the NAT-PMP collaborator.
#[derive(Error, Debug)]
pub enum GatewayFailure {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("gateway refused mapping: {message} (result code {code})")]
    Refused { code: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the Transmission RPC collaborator.
#[derive(Error, Debug)]
pub enum ControlApiFailure {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP over unix socket failed: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("RPC returned {0:?}")]
    Rpc(String),

    #[error("malformed RPC response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid request: {0}")]
    Request(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
