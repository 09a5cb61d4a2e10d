//! Error taxonomy for the EPG orchestration engine.
//!
//! Every recoverable condition the pipeline can hit is represented here so that
//! callers can match on *kind*, not on string content. Only [`TeamarrError::OutputUnwritable`]
//! and the hard-failure form of [`TeamarrError::ConfigurationMissing`] are expected to
//! unwind out of a generation run; everything else is caught and folded into run
//! statistics at the point it occurs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TeamarrError {
    #[error("upstream endpoint '{endpoint}' unavailable after retries: {reason}")]
    UpstreamUnavailable { endpoint: String, reason: String },

    #[error("malformed response from '{endpoint}': {reason}")]
    UpstreamMalformed { endpoint: String, reason: String },

    #[error("generation deadline exceeded after {elapsed_secs}s")]
    GenerationDeadlineExceeded { elapsed_secs: u64 },

    #[error("no active teams with templates configured")]
    ConfigurationMissing,

    #[error("output path '{path}' is not writable: {reason}")]
    OutputUnwritable { path: String, reason: String },
}

impl TeamarrError {
    pub fn upstream_unavailable(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream_malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamMalformed {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn output_unwritable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OutputUnwritable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error represents a condition that should be recovered from
    /// locally (i.e. never propagated past the team or event boundary that produced it).
    pub fn is_locally_recoverable(&self) -> bool {
        !matches!(
            self,
            TeamarrError::OutputUnwritable { .. } | TeamarrError::ConfigurationMissing
        )
    }
}

pub type Result<T> = std::result::Result<T, TeamarrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_are_locally_recoverable() {
        let e = TeamarrError::upstream_unavailable("scoreboard", "connection reset");
        assert!(e.is_locally_recoverable());
    }

    #[test]
    fn output_unwritable_is_not_recoverable() {
        let e = TeamarrError::OutputUnwritable {
            path: "/tmp/out.xml".into(),
            reason: "permission denied".into(),
        };
        assert!(!e.is_locally_recoverable());
    }
}
