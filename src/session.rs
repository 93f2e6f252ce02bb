//! Playback session state
//!
//! A session lives for exactly one playback. Its state only moves forward:
//! `Idle -> Playing -> Completed`.

use crate::error::PlaybackError;
use crate::frame_rate::SavedFrameRate;
use crate::host::{AudioClip, EntityId, SceneId, SceneLoad, SubtitleTrack, VideoAsset};

/// Lifecycle state of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Bound and waiting for the playback task
    #[default]
    Idle,
    /// Video and audio started, waiting for the video to finish
    Playing,
    /// Playback finished and settings restored
    Completed,
}

impl SessionState {
    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Idle, SessionState::Playing) | (SessionState::Playing, SessionState::Completed)
        )
    }
}

/// Everything owned by one cutscene playback
pub struct PlaybackSession {
    pub(crate) owner: EntityId,
    pub(crate) video: VideoAsset,
    pub(crate) audio_clip: AudioClip,
    pub(crate) next_scene: Option<SceneId>,
    pub(crate) pending_scene: Option<Box<dyn SceneLoad>>,
    pub(crate) saved_frame_rate: Option<SavedFrameRate>,
    pub(crate) subtitles: Option<Box<dyn SubtitleTrack>>,
    state: SessionState,
}

impl PlaybackSession {
    pub(crate) fn new(
        owner: EntityId,
        video: VideoAsset,
        audio_clip: AudioClip,
        next_scene: Option<SceneId>,
        saved_frame_rate: SavedFrameRate,
    ) -> Self {
        Self {
            owner,
            video,
            audio_clip,
            next_scene,
            pending_scene: None,
            saved_frame_rate: Some(saved_frame_rate),
            subtitles: None,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn video(&self) -> &VideoAsset {
        &self.video
    }

    pub fn audio_clip(&self) -> &AudioClip {
        &self.audio_clip
    }

    pub fn next_scene(&self) -> Option<&SceneId> {
        self.next_scene.as_ref()
    }

    /// Scene load waiting for playback to finish
    pub fn pending_scene(&self) -> Option<&dyn SceneLoad> {
        self.pending_scene.as_deref()
    }

    /// Move to `next`, rejecting anything but a forward step
    pub(crate) fn transition(&mut self, next: SessionState) -> Result<(), PlaybackError> {
        if !self.state.can_transition_to(next) {
            return Err(PlaybackError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("owner", &self.owner)
            .field("video", &self.video)
            .field("next_scene", &self.next_scene)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        use SessionState::*;

        assert!(Idle.can_transition_to(Playing));
        assert!(Playing.can_transition_to(Completed));

        assert!(!Idle.can_transition_to(Completed));
        assert!(!Playing.can_transition_to(Playing));
        assert!(!Completed.can_transition_to(Playing));
        assert!(!Completed.can_transition_to(Idle));
    }

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }
}
