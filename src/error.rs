use thiserror::Error;

/// Broker-wide error taxonomy.
///
/// Variants map to the error kinds the front-ends surface to callers
/// (`error_code` for the tool-call RPC surface, `http_status` for the
/// HTTP surface); adapter messages are carried verbatim in `AdapterError`
/// rather than wrapped in broker prose.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: session is {current}, requires one of [{required}]")]
    FailedPrecondition { current: String, required: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("adapter not found for language: {0}")]
    AdapterNotFound(String),

    #[error("capacity exceeded: {0} sessions already active")]
    CapacityExceeded(usize),

    #[error("timeout waiting for {0}")]
    Timeout(String),

    #[error("cancelled")]
    Cancelled,

    #[error("disconnected from adapter")]
    Disconnected,

    #[error("adapter error on {command}: {message}")]
    AdapterError { command: String, message: String },

    #[error("DAP error: {0}")]
    Dap(String),

    #[error("process error: {0}")]
    Process(String),

    #[error("runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("stub injection failed: {0}")]
    InjectionFailed(String),

    #[error("port allocation failed: {0}")]
    PortAllocationFailed(String),

    #[error("malformed DAP frame: {0}")]
    MalformedFrame(String),

    #[error("persisted state corrupted: {0}")]
    Corrupted(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("compilation failed: {0}")]
    Compilation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// JSON-RPC-style error code for the tool-call surface.
    pub fn error_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => -32010,
            Error::FailedPrecondition { .. } => -32011,
            Error::NotFound { .. } => -32012,
            Error::SessionNotFound(_) => -32001,
            Error::AdapterNotFound(_) => -32002,
            Error::CapacityExceeded(_) => -32013,
            Error::Timeout(_) => -32014,
            Error::Cancelled => -32015,
            Error::Disconnected => -32016,
            Error::AdapterError { .. } => -32017,
            Error::Dap(_) => -32003,
            Error::Process(_) => -32004,
            Error::RuntimeUnavailable(_) => -32018,
            Error::ContainerNotFound(_) => -32019,
            Error::InjectionFailed(_) => -32020,
            Error::PortAllocationFailed(_) => -32021,
            Error::MalformedFrame(_) => -32022,
            Error::Corrupted(_) => -32023,
            Error::InvalidRequest(_) => -32600,
            Error::MethodNotFound(_) => -32601,
            Error::Internal(_) => -32603,
            Error::Compilation(_) => -32024,
            Error::Io(_) | Error::Json(_) => -32603,
        }
    }

    /// Status code for the HTTP surface (spec §6).
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidArgument(_) | Error::Compilation(_) => 400,
            Error::SessionNotFound(_)
            | Error::AdapterNotFound(_)
            | Error::NotFound { .. }
            | Error::ContainerNotFound(_) => 404,
            Error::FailedPrecondition { .. } => 409,
            Error::Timeout(_) => 408,
            Error::CapacityExceeded(_) => 429,
            Error::AdapterError { .. }
            | Error::Dap(_)
            | Error::Process(_)
            | Error::RuntimeUnavailable(_)
            | Error::InjectionFailed(_)
            | Error::PortAllocationFailed(_)
            | Error::MalformedFrame(_)
            | Error::Corrupted(_)
            | Error::Cancelled
            | Error::Disconnected
            | Error::InvalidRequest(_)
            | Error::MethodNotFound(_)
            | Error::Internal(_)
            | Error::Io(_)
            | Error::Json(_) => 500,
        }
    }

    /// The `kind` string carried in the user-visible `{kind, message, ...}` envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::FailedPrecondition { .. } => "FailedPrecondition",
            Error::NotFound { .. } | Error::SessionNotFound(_) | Error::ContainerNotFound(_) => {
                "NotFound"
            }
            Error::AdapterNotFound(_) => "AdapterNotFound",
            Error::CapacityExceeded(_) => "CapacityExceeded",
            Error::Timeout(_) => "Timeout",
            Error::Cancelled => "Cancelled",
            Error::Disconnected => "Disconnected",
            Error::AdapterError { .. } | Error::Dap(_) => "AdapterError",
            Error::Process(_) => "Process",
            Error::RuntimeUnavailable(_) => "RuntimeUnavailable",
            Error::InjectionFailed(_) => "InjectionFailed",
            Error::PortAllocationFailed(_) => "PortAllocationFailed",
            Error::MalformedFrame(_) => "MalformedFrame",
            Error::Corrupted(_) => "Corrupted",
            Error::InvalidRequest(_) => "InvalidRequest",
            Error::MethodNotFound(_) => "MethodNotFound",
            Error::Compilation(_) => "InvalidArgument",
            Error::Internal(_) | Error::Io(_) | Error::Json(_) => "Internal",
        }
    }
}
