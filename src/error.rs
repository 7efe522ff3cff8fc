use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("append lock for '{keyword}' not acquired within {waited_secs}s")]
    LockTimeout { keyword: String, waited_secs: u64 },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("analysis transport error: {0}")]
    AnalysisTransport(String),

    #[error("analysis failed after {attempts} attempts: {message}")]
    Analysis { attempts: u32, message: String },
}

impl TrackerError {
    /// Transport-level analysis failures may be retried; nothing else is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::AnalysisTransport(_))
    }

    /// Fetch failures are absorbed by the lookup pipeline and degrade to a
    /// not-found observation instead of aborting the batch.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            TrackerError::Browser(_) | TrackerError::Navigation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TrackerError::AnalysisTransport("connection refused".into()).is_retryable());
        assert!(!TrackerError::Browser("launch failed".into()).is_retryable());
        assert!(!TrackerError::LockTimeout {
            keyword: "laravel".into(),
            waited_secs: 5
        }
        .is_retryable());
    }

    #[test]
    fn test_fetch_classification() {
        assert!(TrackerError::Navigation("timeout".into()).is_fetch());
        assert!(!TrackerError::Analysis {
            attempts: 3,
            message: "no response".into()
        }
        .is_fetch());
    }
}
