//! FMV Cutscene Library
//!
//! Plays a full-motion video cutscene through a host game engine: binds the
//! video and its audio track, lifts the frame-rate cap while the video
//! plays, then restores frame pacing and activates a pre-loaded next scene.

pub mod error;
pub mod frame_clock;
pub mod frame_rate;
pub mod headless;
pub mod host;
pub mod sequencer;
pub mod session;
pub mod settings;
pub mod telemetry;

pub use error::PlaybackError;
pub use frame_clock::{FrameClock, FrameWaiter};
pub use frame_rate::{FrameRateConfig, FrameRateControl, SavedFrameRate, SharedFrameRate, UNBOUNDED_FRAME_RATE};
pub use headless::{HeadlessHost, HostEvent, HostTrace};
pub use host::{
    AudioClip, AudioOutput, DisplaySurface, EntityId, HostBindings, PreferenceStore, SceneId, SceneLoad, SceneLoader,
    SubtitleSystem, SubtitleTrack, TextureId, VideoAsset, VideoInfo, VideoStream,
};
pub use sequencer::{PlaybackOutcome, PlaybackReport, PlaybackSequencer, PlaybackTask};
pub use session::{PlaybackSession, SessionState};
pub use settings::{AppPreferences, CutsceneSettings, SettingsError};
