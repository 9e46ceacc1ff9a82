use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// How a gateway failure should be treated by callers that poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The version chooser is temporarily unreachable; retrying may succeed
    Transient,
    /// A definitive failure; retrying will not help
    Fatal,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: request to {url} failed")]
    Status { status: u16, url: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Classify this error for retry decisions
    pub fn fault(&self) -> Fault {
        match self {
            GatewayError::Unreachable(_) => Fault::Transient,
            GatewayError::Network(e) if e.is_connect() || e.is_timeout() => Fault::Transient,
            GatewayError::Network(_) => Fault::Fatal,
            // 5xx while the version chooser restarts behind the BlueOS proxy
            GatewayError::Status { status, .. } if *status >= 500 => Fault::Transient,
            GatewayError::Status { .. } => Fault::Fatal,
            GatewayError::InvalidResponse(_) => Fault::Fatal,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reasons an install workflow ends without applying the target version
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("Invalid version")]
    InvalidVersion,

    #[error("Version requested is already installed")]
    AlreadyInstalled,

    #[error("Failed to download and apply version")]
    DownloadFailed,

    #[error("Failed to download and apply version")]
    ApplyFailed,

    #[error("Another version change is already in progress")]
    InProgress,

    #[error("Failed to download and apply version: {0}")]
    Unexpected(String),
}

impl From<GatewayError> for InstallError {
    fn from(e: GatewayError) -> Self {
        InstallError::Unexpected(e.to_string())
    }
}

impl From<CatalogError> for InstallError {
    fn from(e: CatalogError) -> Self {
        InstallError::Unexpected(e.to_string())
    }
}
