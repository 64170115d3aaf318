/// All errors that can be returned by a TrackerBackend implementation.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The call could not complete (DNS, connect, TLS, timeout). `detail`
    /// includes any partial response the transport surfaced.
    #[error("{operation}: transport failure: {detail}")]
    Transport { operation: String, detail: String },

    /// The call completed with a non-success HTTP status.
    #[error("{operation}: tracker returned {status}: {body}")]
    Rejected {
        operation: String,
        status: u16,
        body: String,
    },

    /// The response body was not the JSON shape the operation expects.
    #[error("{operation}: could not decode response: {detail}")]
    Decode { operation: String, detail: String },

    /// The blocking worker running the request was cancelled or panicked.
    #[error("tracker request task failed: {0}")]
    Runtime(String),
}

impl TrackerError {
    /// HTTP status carried by the error, if the call got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            TrackerError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, TrackerError::Transport { .. })
    }
}
