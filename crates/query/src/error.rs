use weedle_http::TransportError;

pub const TIMEOUT_MESSAGE: &str = "Request timeout. Please try again.";
pub const NETWORK_MESSAGE: &str = "Network error. Please check your connection.";
pub const SERVER_MESSAGE: &str = "Server error. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Failed with an error that retrying cannot fix.
    #[error("rejected: {0}")]
    Rejected(TransportError),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: TransportError },
    #[error("decode: {0}")]
    Decode(String),
    #[error("cancelled")]
    Cancelled,
}

impl QueryError {
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            QueryError::Rejected(e) | QueryError::Exhausted { last: e, .. } => Some(e),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> { self.transport().and_then(TransportError::status) }

    /// Text fit for the person looking at the dashboard.
    pub fn user_message(&self) -> String {
        if let Some(msg) = self.transport().and_then(TransportError::server_message) {
            return msg;
        }
        match self.transport() {
            Some(TransportError::Timeout) => TIMEOUT_MESSAGE.to_string(),
            Some(TransportError::Network(_)) => NETWORK_MESSAGE.to_string(),
            _ => SERVER_MESSAGE.to_string(),
        }
    }
}
