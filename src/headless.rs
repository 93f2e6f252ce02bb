//! Headless host engine
//!
//! In-memory implementations of every host interface. Nothing is decoded or
//! rendered: a video "plays" for a fixed number of rendered frames counted
//! from the host [`FrameClock`], and every call the sequencer makes is
//! recorded in a shared [`HostTrace`]. Used for dry runs and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::frame_clock::FrameClock;
use crate::frame_rate::{FrameRateConfig, FrameRateControl, SharedFrameRate};
use crate::host::{
    AudioClip, AudioOutput, DisplaySurface, EntityId, HostBindings, PreferenceStore, SceneId, SceneLoad, SceneLoader,
    SubtitleSystem, SubtitleTrack, TextureId, VideoAsset, VideoInfo, VideoStream,
};

/// A host call observed by the headless engine
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    FrameRateRead(FrameRateConfig),
    FrameRateApplied(FrameRateConfig),
    TextureBound(TextureId),
    AudioClipSet(String),
    SceneLoadRequested(SceneId),
    SceneActivation { scene: SceneId, allow: bool },
    /// Video playback began at `frame` with the given live frame-rate settings
    VideoStarted { frame: u64, frame_rate: FrameRateConfig },
    AudioStarted,
    SubtitlesStarted { owner: EntityId, clip: String },
    SubtitlesStopped,
}

/// Ordered log of host calls, shared by all headless collaborators
#[derive(Debug, Clone, Default)]
pub struct HostTrace {
    events: Arc<Mutex<Vec<HostEvent>>>,
}

impl HostTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: HostEvent) {
        tracing::trace!(?event, "host call");
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Snapshot of every event so far
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of recorded events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&HostEvent) -> bool) -> usize {
        self.events
            .lock()
            .map(|e| e.iter().filter(|event| predicate(event)).count())
            .unwrap_or(0)
    }
}

/// In-memory engine that hands out headless collaborators
pub struct HeadlessHost {
    pub clock: FrameClock,
    pub frame_rate: SharedFrameRate,
    pub trace: HostTrace,
    preferences: HashMap<String, bool>,
    next_texture: AtomicU64,
}

impl HeadlessHost {
    /// Create a host whose frame-rate settings start at `initial`
    pub fn new(initial: FrameRateConfig) -> Self {
        Self {
            clock: FrameClock::new(),
            frame_rate: SharedFrameRate::new(initial),
            trace: HostTrace::new(),
            preferences: HashMap::new(),
            next_texture: AtomicU64::new(1),
        }
    }

    /// Set a boolean preference served by [`HeadlessHost::bindings`]
    pub fn with_preference(mut self, key: &str, value: bool) -> Self {
        self.preferences.insert(key.to_string(), value);
        self
    }

    /// Live frame-rate settings, read without tracing
    pub fn frame_rate_config(&self) -> FrameRateConfig {
        self.frame_rate.current()
    }

    /// A video lasting `duration_frames` rendered frames, with an audio track
    pub fn video(&self, name: &str, frame_rate: f64, duration_frames: u64) -> VideoAsset {
        let clip = AudioClip {
            name: format!("{}_audio", name),
            duration: Duration::from_secs_f64(duration_frames as f64 / frame_rate.max(1.0)),
        };
        self.build_video(name, frame_rate, duration_frames, Some(clip))
    }

    /// A video with no paired audio track
    pub fn video_without_audio(&self, name: &str, frame_rate: f64, duration_frames: u64) -> VideoAsset {
        self.build_video(name, frame_rate, duration_frames, None)
    }

    fn build_video(&self, name: &str, frame_rate: f64, duration_frames: u64, clip: Option<AudioClip>) -> VideoAsset {
        let stream = HeadlessVideo {
            texture: TextureId(self.next_texture.fetch_add(1, Ordering::Relaxed)),
            clip,
            info: VideoInfo {
                width: 1920,
                height: 1080,
                frame_rate,
                duration: duration_frames as f64 / frame_rate.max(1.0),
            },
            duration_frames,
            frames: self.clock.subscribe(),
            started_at: None,
            frame_rate: self.frame_rate.clone(),
            trace: self.trace.clone(),
        };
        VideoAsset::new(name, Box::new(stream))
    }

    /// Host bindings using the preferences set on this host
    pub fn bindings(&self) -> HostBindings {
        self.bindings_with_preferences(Box::new(MemoryPreferences(self.preferences.clone())))
    }

    /// Host bindings using an external preference store
    pub fn bindings_with_preferences(&self, preferences: Box<dyn PreferenceStore>) -> HostBindings {
        HostBindings {
            display: Box::new(HeadlessDisplay { trace: self.trace.clone() }),
            audio: Box::new(HeadlessAudio {
                clip: None,
                trace: self.trace.clone(),
            }),
            scenes: Box::new(HeadlessSceneLoader { trace: self.trace.clone() }),
            subtitles: Box::new(HeadlessSubtitles { trace: self.trace.clone() }),
            preferences,
            frame_rate: Box::new(TracedFrameRate {
                inner: self.frame_rate.clone(),
                trace: self.trace.clone(),
            }),
            frames: self.clock.waiter(),
        }
    }
}

/// Preferences held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences(pub HashMap<String, bool>);

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).copied()
    }
}

struct TracedFrameRate {
    inner: SharedFrameRate,
    trace: HostTrace,
}

impl FrameRateControl for TracedFrameRate {
    fn current(&self) -> FrameRateConfig {
        let config = self.inner.current();
        self.trace.push(HostEvent::FrameRateRead(config));
        config
    }

    fn apply(&mut self, config: FrameRateConfig) {
        self.inner.apply(config);
        self.trace.push(HostEvent::FrameRateApplied(config));
    }
}

struct HeadlessVideo {
    texture: TextureId,
    clip: Option<AudioClip>,
    info: VideoInfo,
    duration_frames: u64,
    frames: watch::Receiver<u64>,
    started_at: Option<u64>,
    frame_rate: SharedFrameRate,
    trace: HostTrace,
}

impl VideoStream for HeadlessVideo {
    fn texture(&self) -> TextureId {
        self.texture
    }

    fn audio_clip(&self) -> Option<AudioClip> {
        self.clip.clone()
    }

    fn info(&self) -> VideoInfo {
        self.info.clone()
    }

    fn play(&mut self) {
        let frame = *self.frames.borrow();
        self.started_at = Some(frame);
        self.trace.push(HostEvent::VideoStarted {
            frame,
            frame_rate: self.frame_rate.current(),
        });
    }

    fn is_playing(&self) -> bool {
        match self.started_at {
            Some(start) => *self.frames.borrow() - start < self.duration_frames,
            None => false,
        }
    }
}

struct HeadlessDisplay {
    trace: HostTrace,
}

impl DisplaySurface for HeadlessDisplay {
    fn bind_texture(&mut self, texture: TextureId) {
        self.trace.push(HostEvent::TextureBound(texture));
    }
}

struct HeadlessAudio {
    clip: Option<AudioClip>,
    trace: HostTrace,
}

impl AudioOutput for HeadlessAudio {
    fn set_clip(&mut self, clip: AudioClip) {
        self.trace.push(HostEvent::AudioClipSet(clip.name.clone()));
        self.clip = Some(clip);
    }

    fn play(&mut self) {
        if self.clip.is_none() {
            tracing::warn!("Headless audio started without a clip");
        }
        self.trace.push(HostEvent::AudioStarted);
    }
}

struct HeadlessSceneLoader {
    trace: HostTrace,
}

impl SceneLoader for HeadlessSceneLoader {
    fn load_async(&mut self, scene: &SceneId) -> Box<dyn SceneLoad> {
        self.trace.push(HostEvent::SceneLoadRequested(scene.clone()));
        Box::new(HeadlessSceneLoad {
            scene: scene.clone(),
            allow_activation: true,
            trace: self.trace.clone(),
        })
    }
}

/// Loads instantly, then parks at 90% until activation is allowed
struct HeadlessSceneLoad {
    scene: SceneId,
    allow_activation: bool,
    trace: HostTrace,
}

impl SceneLoad for HeadlessSceneLoad {
    fn scene(&self) -> &SceneId {
        &self.scene
    }

    fn set_allow_activation(&mut self, allow: bool) {
        self.allow_activation = allow;
        self.trace.push(HostEvent::SceneActivation {
            scene: self.scene.clone(),
            allow,
        });
    }

    fn allows_activation(&self) -> bool {
        self.allow_activation
    }

    fn progress(&self) -> f32 {
        if self.allow_activation {
            1.0
        } else {
            0.9
        }
    }
}

struct HeadlessSubtitles {
    trace: HostTrace,
}

impl SubtitleSystem for HeadlessSubtitles {
    fn play(&mut self, owner: EntityId, clip: &AudioClip) -> Box<dyn SubtitleTrack> {
        self.trace.push(HostEvent::SubtitlesStarted {
            owner,
            clip: clip.name.clone(),
        });
        Box::new(HeadlessSubtitleTrack {
            active: true,
            trace: self.trace.clone(),
        })
    }
}

struct HeadlessSubtitleTrack {
    active: bool,
    trace: HostTrace,
}

impl SubtitleTrack for HeadlessSubtitleTrack {
    fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.trace.push(HostEvent::SubtitlesStopped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_runs_for_duration_frames() {
        let host = HeadlessHost::new(FrameRateConfig::default());
        let mut video = host.video("intro", 30.0, 2);

        assert!(!video.stream().is_playing());
        video.stream_mut().play();
        assert!(video.stream().is_playing());

        host.clock.tick();
        assert!(video.stream().is_playing());
        host.clock.tick();
        assert!(!video.stream().is_playing());
    }

    #[test]
    fn test_video_metadata() {
        let host = HeadlessHost::new(FrameRateConfig::default());
        let video = host.video("intro", 25.0, 50);

        let info = video.stream().info();
        assert_eq!(info.frame_rate, 25.0);
        assert!((info.duration - 2.0).abs() < f64::EPSILON);

        let clip = video.stream().audio_clip().unwrap();
        assert_eq!(clip.name, "intro_audio");
        assert_eq!(clip.duration, Duration::from_secs(2));
        assert!(host.video_without_audio("silent", 25.0, 50).stream().audio_clip().is_none());
    }

    #[test]
    fn test_textures_are_distinct() {
        let host = HeadlessHost::new(FrameRateConfig::default());
        let a = host.video("a", 30.0, 1);
        let b = host.video("b", 30.0, 1);
        assert_ne!(a.stream().texture(), b.stream().texture());
    }

    #[test]
    fn test_scene_load_parks_until_allowed() {
        let trace = HostTrace::new();
        let mut loader = HeadlessSceneLoader { trace: trace.clone() };
        let mut load = loader.load_async(&SceneId::new("Level2"));

        load.set_allow_activation(false);
        assert_eq!(load.progress(), 0.9);
        load.set_allow_activation(true);
        assert_eq!(load.progress(), 1.0);

        assert_eq!(trace.count(|e| matches!(e, HostEvent::SceneActivation { .. })), 2);
    }

    #[test]
    fn test_preferences_lookup() {
        let host = HeadlessHost::new(FrameRateConfig::default()).with_preference("subtitles", true);
        let bindings = host.bindings();
        assert_eq!(bindings.preferences.get_bool("subtitles"), Some(true));
        assert_eq!(bindings.preferences.get_bool("missing"), None);
        assert!(bindings.subtitles_enabled());

        let bindings = HeadlessHost::new(FrameRateConfig::default()).bindings();
        assert!(!bindings.subtitles_enabled());
    }
}
