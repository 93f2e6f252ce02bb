//! Host engine interfaces
//!
//! The sequencer never decodes, mixes or renders anything itself. It drives
//! the host engine through the traits in this module, bundled together in
//! [`HostBindings`].

use std::fmt;
use std::time::Duration;

use crate::frame_clock::FrameWaiter;
use crate::frame_rate::FrameRateControl;

/// Preference key controlling subtitle display
pub const SUBTITLES_PREF: &str = "subtitles";

/// Subtitle setting used when the preference store has no value
pub const DEFAULT_SUBTITLES: bool = false;

/// Identifier of the scene entity that owns the player component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// Identifier of a GPU texture exposed by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Identifier of a scene the host can load
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneId(pub String);

impl SceneId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Audio track paired with a video
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub name: String,
    pub duration: Duration,
}

/// Video metadata reported by the host
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// Duration in seconds
    pub duration: f64,
}

/// A decodable video owned by the host
pub trait VideoStream: Send {
    /// Texture the decoded frames are written into
    fn texture(&self) -> TextureId;

    /// Audio track paired with this video, if it has one
    fn audio_clip(&self) -> Option<AudioClip>;

    /// Video metadata
    fn info(&self) -> VideoInfo;

    /// Start decoding and presenting frames
    fn play(&mut self);

    /// Whether the video is still presenting frames
    fn is_playing(&self) -> bool;
}

/// A named video resource handed to the sequencer
pub struct VideoAsset {
    name: String,
    stream: Box<dyn VideoStream>,
}

impl VideoAsset {
    pub fn new(name: impl Into<String>, stream: Box<dyn VideoStream>) -> Self {
        Self {
            name: name.into(),
            stream,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stream(&self) -> &dyn VideoStream {
        self.stream.as_ref()
    }

    pub fn stream_mut(&mut self) -> &mut dyn VideoStream {
        self.stream.as_mut()
    }
}

impl fmt::Debug for VideoAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoAsset")
            .field("name", &self.name)
            .field("texture", &self.stream.texture())
            .finish()
    }
}

/// On-screen surface that displays a texture
pub trait DisplaySurface: Send {
    fn bind_texture(&mut self, texture: TextureId);
}

/// Speaker output for the component
pub trait AudioOutput: Send {
    fn set_clip(&mut self, clip: AudioClip);

    fn play(&mut self);
}

/// In-progress asynchronous scene load
pub trait SceneLoad: Send {
    /// Scene being prepared
    fn scene(&self) -> &SceneId;

    /// Allow or hold back activation once loading completes
    fn set_allow_activation(&mut self, allow: bool);

    /// Whether activation is currently allowed
    fn allows_activation(&self) -> bool;

    /// Load progress (0.0 - 1.0)
    fn progress(&self) -> f32;
}

/// Asynchronous scene loading
pub trait SceneLoader: Send {
    /// Begin preparing a scene in the background
    fn load_async(&mut self, scene: &SceneId) -> Box<dyn SceneLoad>;
}

/// Running subtitle display
pub trait SubtitleTrack: Send {
    fn is_active(&self) -> bool;

    fn stop(&mut self);
}

/// Subtitle display keyed to an audio clip's timeline
pub trait SubtitleSystem: Send {
    fn play(&mut self, owner: EntityId, clip: &AudioClip) -> Box<dyn SubtitleTrack>;
}

/// Persisted user preferences
pub trait PreferenceStore: Send {
    /// Read a boolean preference, `None` if it was never set
    fn get_bool(&self, key: &str) -> Option<bool>;
}

/// Every host facility a playback session needs
pub struct HostBindings {
    pub display: Box<dyn DisplaySurface>,
    pub audio: Box<dyn AudioOutput>,
    pub scenes: Box<dyn SceneLoader>,
    pub subtitles: Box<dyn SubtitleSystem>,
    pub preferences: Box<dyn PreferenceStore>,
    pub frame_rate: Box<dyn FrameRateControl>,
    pub frames: FrameWaiter,
}

impl HostBindings {
    /// Resolve the subtitle preference, falling back to [`DEFAULT_SUBTITLES`]
    pub fn subtitles_enabled(&self) -> bool {
        self.preferences
            .get_bool(SUBTITLES_PREF)
            .unwrap_or(DEFAULT_SUBTITLES)
    }
}

impl fmt::Debug for HostBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBindings")
            .field("frame_rate", &self.frame_rate.current())
            .field("frame", &self.frames.frame())
            .finish_non_exhaustive()
    }
}
