//! Fault taxonomy for backend calls
//!
//! Every failure of a gateway call falls in exactly one of four classes.
//! Business-level negative outcomes (an empty result list, `false` from a
//! write) are successful replies and never show up here.

use thiserror::Error;

/// Errors that can occur when talking to the backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    /// The endpoint could not be reached or did not answer in time
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Credentials were rejected at login, or the session is no longer valid
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The backend rejected the request itself (bad model, field, access
    /// rights, constraint). `message` is the backend's text, verbatim.
    #[error("{message}")]
    RemoteMethod {
        /// Exception class reported by the backend, if any
        exception: Option<String>,
        /// Backend message
        message: String,
    },

    /// The reply could not be interpreted
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RpcError {
    /// Build a remote-method fault without an exception name
    pub fn remote(message: impl Into<String>) -> Self {
        RpcError::RemoteMethod {
            exception: None,
            message: message.into(),
        }
    }

    /// Whether this fault means the cached session must be dropped
    pub fn is_authentication(&self) -> bool {
        matches!(self, RpcError::Authentication(_))
    }

    /// Short class name, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::Connectivity(_) => "connectivity",
            RpcError::Authentication(_) => "authentication",
            RpcError::RemoteMethod { .. } => "remote_method",
            RpcError::Protocol(_) => "protocol",
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RpcError::Protocol(e.to_string())
        } else {
            RpcError::Connectivity(e.to_string())
        }
    }
}

/// Result type alias for backend operations
pub type RpcResult<T> = Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_method_message_is_verbatim() {
        let err = RpcError::RemoteMethod {
            exception: Some("odoo.exceptions.ValidationError".to_string()),
            message: "Invalid field 'nmae' on model 'res.partner'".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid field 'nmae' on model 'res.partner'");
    }

    #[test]
    fn test_kind_and_authentication_flag() {
        assert!(RpcError::Authentication("expired".into()).is_authentication());
        assert!(!RpcError::Protocol("garbage".into()).is_authentication());
        assert_eq!(RpcError::remote("x").kind(), "remote_method");
        assert_eq!(RpcError::Connectivity("refused".into()).kind(), "connectivity");
    }
}
