use thiserror::Error;

/// Terminal failure of a queued send.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The operation kept failing until its retry limit was exhausted.
    /// `attempts` counts every execution, including the first.
    #[error("send failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        source: anyhow::Error,
    },

    /// The queue went away before the operation completed (runtime shutdown).
    #[error("dispatch queue dropped the send before completion")]
    Dropped,
}

impl DispatchError {
    /// The underlying operation error, when there is one.
    pub fn source_error(&self) -> Option<&anyhow::Error> {
        match self {
            DispatchError::RetriesExhausted { source, .. } => Some(source),
            DispatchError::Dropped => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_display() {
        let err = DispatchError::RetriesExhausted {
            attempts: 4,
            source: anyhow::anyhow!("connection reset"),
        };
        assert_eq!(err.to_string(), "send failed after 4 attempts: connection reset");
        assert!(err.source_error().is_some());
    }
}
