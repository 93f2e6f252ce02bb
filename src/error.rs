//! Error types for cutscene playback

use crate::session::SessionState;

/// Errors raised by the playback sequencer
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// A start request arrived after the session had already played
    #[error("Movie is already playing (session state: {state:?})")]
    DuplicateStart { state: SessionState },

    /// The video asset has no paired audio track to bind
    #[error("Video asset '{asset}' has no audio track to bind")]
    UnboundResource { asset: String },

    /// The session state machine rejected a transition
    #[error("Invalid session transition {from:?} -> {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },

    /// The host stopped signalling rendered frames while playback was waiting
    #[error("Frame clock stopped before playback finished")]
    FrameClockStopped,

    /// The spawned playback task panicked or was cancelled
    #[error("Playback task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for PlaybackError {
    fn from(e: tokio::task::JoinError) -> Self {
        PlaybackError::TaskFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlaybackError::UnboundResource { asset: "intro".to_string() };
        assert_eq!(err.to_string(), "Video asset 'intro' has no audio track to bind");

        let err = PlaybackError::DuplicateStart { state: SessionState::Completed };
        assert!(err.to_string().contains("Completed"));
    }
}
