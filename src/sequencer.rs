//! Cutscene playback sequencer
//!
//! Binds a video and its audio track to the host, lifts the frame cap while
//! the video plays, then puts the frame cap back and lets the next scene
//! activate.
//!
//! The sequence is strictly ordered:
//! unlock frame rate, start video, start audio, start subtitles, wait one
//! rendered frame at a time until the video stops, restore frame rate,
//! allow scene activation.

use tokio::task::JoinHandle;

use crate::error::PlaybackError;
use crate::frame_rate::{self, FrameRateConfig};
use crate::host::{EntityId, HostBindings, SceneId, VideoAsset};
use crate::session::{PlaybackSession, SessionState};
use crate::telemetry::{FrameProfiler, FrameStats};

/// Summary of a finished playback
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    /// Name of the video that played
    pub video: String,
    /// Rendered frames waited while the video played
    pub frames_waited: u64,
    /// Frame timing while the frame cap was lifted
    pub frame_stats: FrameStats,
    /// Frame-rate configuration written back at the end
    pub restored: FrameRateConfig,
    /// Whether subtitles were shown
    pub subtitles_shown: bool,
    /// Scene allowed to activate after playback
    pub activated_scene: Option<SceneId>,
}

/// Plays one cutscene against the host engine
pub struct PlaybackSequencer {
    session: PlaybackSession,
    host: HostBindings,
    profiler: FrameProfiler,
    frames_waited: u64,
}

impl PlaybackSequencer {
    /// Bind a video to the host and prepare the next scene
    ///
    /// Captures the host's frame-rate settings before anything else, so they
    /// can be restored once playback ends. Fails with
    /// [`PlaybackError::UnboundResource`] if the video has no audio track.
    pub fn initialize(
        owner: EntityId,
        video: VideoAsset,
        next_scene: Option<SceneId>,
        mut host: HostBindings,
    ) -> Result<Self, PlaybackError> {
        let saved = frame_rate::capture(&*host.frame_rate);

        let clip = video
            .stream()
            .audio_clip()
            .ok_or_else(|| PlaybackError::UnboundResource {
                asset: video.name().to_string(),
            })?;

        host.display.bind_texture(video.stream().texture());
        host.audio.set_clip(clip.clone());

        let info = video.stream().info();
        tracing::info!(
            "Cutscene '{}' bound: {}x{} @ {:.2}fps, duration: {:.2}s, audio: '{}'",
            video.name(),
            info.width,
            info.height,
            info.frame_rate,
            info.duration,
            clip.name
        );

        let mut session = PlaybackSession::new(owner, video, clip, next_scene, saved);

        if let Some(scene) = session.next_scene.clone() {
            let mut load = host.scenes.load_async(&scene);
            load.set_allow_activation(false);
            tracing::info!("Preparing scene '{}' (activation deferred)", scene);
            session.pending_scene = Some(load);
        }

        Ok(Self {
            session,
            host,
            profiler: FrameProfiler::new(),
            frames_waited: 0,
        })
    }

    /// Initialize and launch playback on the tokio runtime
    pub fn start(
        owner: EntityId,
        video: VideoAsset,
        next_scene: Option<SceneId>,
        host: HostBindings,
    ) -> Result<PlaybackTask, PlaybackError> {
        Ok(Self::initialize(owner, video, next_scene, host)?.spawn())
    }

    /// Run the playback sequence as a background task
    pub fn spawn(mut self) -> PlaybackTask {
        let handle = tokio::spawn(async move {
            let result = self.run_playback_sequence().await;
            PlaybackOutcome {
                sequencer: self,
                result,
            }
        });
        PlaybackTask { handle }
    }

    /// Play the video through to the end
    ///
    /// Only an idle session starts playback. A session left mid-wait (its
    /// previous run was dropped) resumes waiting. Anything else is rejected
    /// with [`PlaybackError::DuplicateStart`] and left untouched.
    pub async fn run_playback_sequence(&mut self) -> Result<PlaybackReport, PlaybackError> {
        match self.session.state() {
            SessionState::Idle => self.begin_playback()?,
            SessionState::Playing if self.session.video.stream().is_playing() => {
                tracing::debug!("Resuming wait for '{}'", self.session.video.name());
            }
            state => {
                tracing::error!("Movie is already playing! ('{}', {:?})", self.session.video.name(), state);
                return Err(PlaybackError::DuplicateStart { state });
            }
        }

        self.wait_for_video_end().await?;
        self.finish_playback()
    }

    fn begin_playback(&mut self) -> Result<(), PlaybackError> {
        self.session.transition(SessionState::Playing)?;
        tracing::info!("Movie started: '{}'", self.session.video.name());

        frame_rate::unlock(&mut *self.host.frame_rate);
        // frames rendered before the video started do not count as playback
        self.host.frames.sync();
        self.session.video.stream_mut().play();
        self.host.audio.play();

        if self.host.subtitles_enabled() {
            let track = self
                .host
                .subtitles
                .play(self.session.owner, &self.session.audio_clip);
            self.session.subtitles = Some(track);
            tracing::debug!("Subtitles started for '{}'", self.session.audio_clip.name);
        }

        Ok(())
    }

    async fn wait_for_video_end(&mut self) -> Result<(), PlaybackError> {
        while self.session.video.stream().is_playing() {
            let frame = self.host.frames.next_frame().await?;
            self.profiler.begin_frame();
            self.frames_waited += 1;
            tracing::trace!(frame, "Waiting for movie to finish");
        }
        Ok(())
    }

    fn finish_playback(&mut self) -> Result<PlaybackReport, PlaybackError> {
        let restored = match self.session.saved_frame_rate.take() {
            Some(saved) => saved.restore(&mut *self.host.frame_rate),
            None => self.host.frame_rate.current(),
        };
        self.session.transition(SessionState::Completed)?;

        // the track follows the audio clip and may outlast the video
        let subtitles_shown = self.session.subtitles.is_some();

        let frame_stats = self.profiler.stats();
        tracing::info!(
            "Movie finished: '{}' after {} frames ({:.1} fps unlocked), frame rate restored to {}",
            self.session.video.name(),
            self.frames_waited,
            frame_stats.fps(),
            restored
        );

        let activated_scene = self.session.pending_scene.as_mut().map(|load| {
            load.set_allow_activation(true);
            tracing::info!("Activating scene '{}'", load.scene());
            load.scene().clone()
        });

        Ok(PlaybackReport {
            video: self.session.video.name().to_string(),
            frames_waited: self.frames_waited,
            frame_stats,
            restored,
            subtitles_shown,
            activated_scene,
        })
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_playing()
    }

    /// Host facilities this sequencer drives
    pub fn host(&self) -> &HostBindings {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut HostBindings {
        &mut self.host
    }
}

impl Drop for PlaybackSequencer {
    fn drop(&mut self) {
        if self.session.is_playing() {
            if let Some(saved) = self.session.saved_frame_rate.take() {
                let restored = saved.restore(&mut *self.host.frame_rate);
                tracing::warn!(
                    "Cutscene '{}' dropped mid-playback, frame rate restored to {}",
                    self.session.video.name(),
                    restored
                );
            }
            if let Some(track) = self.session.subtitles.as_mut() {
                if track.is_active() {
                    track.stop();
                }
            }
        }

        if let Some(load) = self.session.pending_scene.as_ref() {
            if !load.allows_activation() {
                tracing::warn!("Scene '{}' was prepared but never activated", load.scene());
            }
        }
    }
}

impl std::fmt::Debug for PlaybackSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSequencer")
            .field("session", &self.session)
            .field("frames_waited", &self.frames_waited)
            .finish_non_exhaustive()
    }
}

/// Sequencer handed back by a finished playback task
#[derive(Debug)]
pub struct PlaybackOutcome {
    pub sequencer: PlaybackSequencer,
    pub result: Result<PlaybackReport, PlaybackError>,
}

/// Handle to a running playback task
#[derive(Debug)]
pub struct PlaybackTask {
    handle: JoinHandle<PlaybackOutcome>,
}

impl PlaybackTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel playback; the sequencer restores frame rate as it is dropped
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the task and take back the sequencer
    pub async fn join(self) -> Result<PlaybackOutcome, PlaybackError> {
        Ok(self.handle.await?)
    }
}
