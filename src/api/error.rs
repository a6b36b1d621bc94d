//! Gateway error taxonomy.
//!
//! Everything the remote services can do to us collapses into one enum so
//! callers can branch on transport-vs-rejection without inspecting reqwest
//! internals. Variants carry owned data only, so results can be cloned into
//! scripted test gateways.

/// Errors from remote gateway operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("Cannot reach backend at {0}")]
    Connection(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP transport error: {0}")]
    Transport(String),
    #[error("Backend returned {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Malformed response: {0}")]
    ResponseParsing(String),
}

impl GatewayError {
    /// Whether the request never produced a usable server answer.
    ///
    /// Transport failures leave prior client state untouched; rejections
    /// (`InvalidCredentials`, `Backend`) are authoritative answers.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification() {
        assert!(GatewayError::Connection("http://x".into()).is_transport());
        assert!(GatewayError::Timeout(30).is_transport());
        assert!(GatewayError::Transport("reset".into()).is_transport());
        assert!(!GatewayError::InvalidCredentials.is_transport());
        assert!(!GatewayError::Backend {
            status: 500,
            body: String::new()
        }
        .is_transport());
    }

    #[test]
    fn display_carries_status_and_body() {
        let err = GatewayError::Backend {
            status: 422,
            body: "stock exhausted".into(),
        };
        assert_eq!(err.to_string(), "Backend returned 422: stock exhausted");
    }
}
