use serde::{Deserialize, Serialize};

use crate::release::error::InstallError;

/// An image known to the version chooser
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag: String,
    #[serde(default)]
    pub repository: String,
}

impl Release {
    pub fn new(repository: &str, tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            repository: repository.to_string(),
        }
    }
}

/// Payload for pull and switch requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallRequest {
    pub repository: String,
    pub tag: String,
}

impl InstallRequest {
    pub fn new(repository: &str, tag: &str) -> Self {
        Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        }
    }
}

/// Result of an install workflow as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    pub success: bool,
    pub message: String,
}

impl InstallOutcome {
    pub fn applied(version: &str) -> Self {
        Self {
            success: true,
            message: format!("Downloaded and applied version {}", version),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<InstallError> for InstallOutcome {
    fn from(e: InstallError) -> Self {
        Self::failed(e.to_string())
    }
}
