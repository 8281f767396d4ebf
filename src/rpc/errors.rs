use solana_client::client_error::ClientError;
use thiserror::Error;

/// Errors raised by the external collaborators (RPC node, capability
/// service, paymaster)
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    #[error("Timeout (endpoint: {endpoint})")]
    Timeout { endpoint: String },

    /// Error reported by the remote service
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    #[error("Account not found: {account} (endpoint: {endpoint})")]
    AccountNotFound { account: String, endpoint: String },

    /// Submission refused by the sponsor
    #[error("Transaction rejected: {message} (endpoint: {endpoint})")]
    Rejected { endpoint: String, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl RpcError {
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Transport { .. } => true,
            RpcError::Timeout { .. } => true,
            RpcError::RpcResponse { code, .. } => {
                // Retry on server errors (5xx)
                matches!(code, Some(c) if (500..600).contains(c))
            }
            RpcError::AccountNotFound { .. } => false,
            RpcError::Rejected { .. } => false,
            RpcError::Decode(_) => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            RpcError::Transport { .. } => "transport",
            RpcError::Timeout { .. } => "timeout",
            RpcError::RpcResponse { .. } => "response",
            RpcError::AccountNotFound { .. } => "not_found",
            RpcError::Rejected { .. } => "rejected",
            RpcError::Decode(_) => "decode",
        }
    }

    /// Classify a solana-client error by its message
    pub fn from_client_error(err: ClientError, endpoint: &str) -> Self {
        let err_str = err.to_string().to_lowercase();

        if err_str.contains("account not found") || err_str.contains("accountnotfound") {
            RpcError::AccountNotFound {
                account: "unknown".to_string(),
                endpoint: endpoint.to_string(),
            }
        } else if err_str.contains("timeout") || err_str.contains("timed out") {
            RpcError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if err_str.contains("error sending request")
            || err_str.contains("connection")
            || err_str.contains("dns")
        {
            RpcError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            let code = err_str
                .split("code:")
                .nth(1)
                .and_then(|s| s.split_whitespace().next())
                .and_then(|s| s.trim_end_matches(',').parse::<i64>().ok());

            RpcError::RpcResponse {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
                code,
            }
        }
    }

    /// Classify an HTTP client error
    pub fn from_http_error(err: reqwest::Error, endpoint: &str) -> Self {
        if err.is_timeout() {
            RpcError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if let Some(status) = err.status() {
            RpcError::RpcResponse {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
                code: Some(i64::from(status.as_u16())),
            }
        } else if err.is_decode() {
            RpcError::Decode(err.to_string())
        } else {
            RpcError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}
