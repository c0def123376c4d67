use thiserror::Error;

/// Failure reported by the book store. The display text is the store's own
/// message and is what clients see.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or the exchange was cut short.
    #[error("{message}")]
    Transport { message: String },

    /// The store answered with a non-success status.
    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The store answered successfully but the body was not what we expected.
    #[error("{message}")]
    Decode { message: String },
}

impl StoreError {
    pub fn message(&self) -> &str {
        match self {
            StoreError::Transport { message }
            | StoreError::Rejected { message, .. }
            | StoreError::Decode { message } => message,
        }
    }

    /// Stable tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Transport { .. } => "store_transport",
            StoreError::Rejected { .. } => "store_rejected",
            StoreError::Decode { .. } => "store_decode",
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode {
                message: err.to_string(),
            }
        } else {
            StoreError::Transport {
                message: err.to_string(),
            }
        }
    }
}
