//! Settings management for cutscene playback
//!
//! Handles loading/saving cutscene descriptions (XML) and the user's
//! persisted preferences.

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::frame_rate::{FrameRateConfig, UNBOUNDED_FRAME_RATE};
use crate::host::{PreferenceStore, SceneId, SUBTITLES_PREF};

/// One cutscene and the host state it starts from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "FmvCutscene")]
pub struct CutsceneSettings {
    /// Name of the video asset
    #[serde(rename = "videoName")]
    pub video_name: String,

    /// Native frame rate of the video (1-240)
    #[serde(rename = "frameRate", default = "default_frame_rate")]
    pub frame_rate: f64,

    /// Video length in seconds
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: f64,

    /// Scene to activate after playback; empty means stay in the current scene
    #[serde(rename = "nextScene", default, skip_serializing_if = "Option::is_none")]
    pub next_scene: Option<String>,

    /// Entity that owns the player component
    #[serde(rename = "ownerEntity", default = "default_owner_entity")]
    pub owner_entity: u64,

    /// Host target frame rate before playback (-1 = unbounded, otherwise 1-240)
    #[serde(rename = "targetFps", default = "default_target_fps")]
    pub target_fps: i32,

    /// Host vsync interval before playback (0-4)
    #[serde(rename = "vsyncCount", default = "default_vsync_count")]
    pub vsync_count: u32,
}

fn default_frame_rate() -> f64 {
    30.0
}

fn default_owner_entity() -> u64 {
    1
}

fn default_target_fps() -> i32 {
    60
}

fn default_vsync_count() -> u32 {
    1
}

impl Default for CutsceneSettings {
    fn default() -> Self {
        Self {
            video_name: "intro".to_string(),
            frame_rate: default_frame_rate(),
            duration_seconds: 3.0,
            next_scene: None,
            owner_entity: default_owner_entity(),
            target_fps: default_target_fps(),
            vsync_count: default_vsync_count(),
        }
    }
}

impl CutsceneSettings {
    /// Clamp values into their valid ranges
    pub fn sanitize(&mut self) {
        if !self.frame_rate.is_finite() {
            self.frame_rate = default_frame_rate();
        }
        self.frame_rate = self.frame_rate.clamp(1.0, 240.0);

        if !self.duration_seconds.is_finite() || self.duration_seconds < 0.0 {
            self.duration_seconds = 0.0;
        }

        if self.target_fps != UNBOUNDED_FRAME_RATE {
            self.target_fps = self.target_fps.clamp(1, 240);
        }
        self.vsync_count = self.vsync_count.min(4);

        if self.next_scene.as_deref().is_some_and(|s| s.trim().is_empty()) {
            self.next_scene = None;
        }
    }

    /// Video length in rendered frames (at least one)
    pub fn duration_frames(&self) -> u64 {
        ((self.duration_seconds * self.frame_rate).ceil() as u64).max(1)
    }

    /// Scene to activate after playback
    pub fn next_scene(&self) -> Option<SceneId> {
        self.next_scene
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SceneId::new)
    }

    /// Host frame-rate settings before playback
    pub fn frame_rate_config(&self) -> FrameRateConfig {
        FrameRateConfig::new(self.target_fps, self.vsync_count)
    }

    /// Parse settings from XML text
    pub fn from_xml(xml: &str) -> Result<Self, SettingsError> {
        let mut settings: Self = from_str(xml)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Load settings from a cutscene XML file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_xml(&contents)
    }

    /// Save settings to a cutscene XML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        write_xml(path, &to_string(self)?)
    }
}

/// User preferences (stored in config directory)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename = "FmvPreferences")]
pub struct AppPreferences {
    /// Whether subtitles are shown during cutscenes; unset falls back to the player default
    #[serde(rename = "subtitles", default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<bool>,
}

impl AppPreferences {
    /// Get the preferences file path
    fn get_prefs_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("FmvCutscene");
            p.push("preferences.xml");
            p
        })
    }

    /// Load preferences from the config directory, defaulting on any failure
    pub fn load() -> Self {
        match Self::get_prefs_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load preferences from a specific file, defaulting on any failure
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save preferences to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_xml(path, &to_string(self)?)
    }
}

impl PreferenceStore for AppPreferences {
    fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            SUBTITLES_PREF => self.subtitles,
            _ => None,
        }
    }
}

fn write_xml(path: &Path, xml: &str) -> Result<(), SettingsError> {
    let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);
    fs::write(path, formatted)?;
    Ok(())
}

/// Settings-related errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::SeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = CutsceneSettings::default();
        assert_eq!(settings.frame_rate, 30.0);
        assert_eq!(settings.duration_frames(), 90);
        assert_eq!(settings.next_scene(), None);
        assert_eq!(settings.frame_rate_config(), FrameRateConfig::new(60, 1));
    }

    #[test]
    fn test_parse_cutscene_xml() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<FmvCutscene>
    <videoName>opening</videoName>
    <frameRate>24</frameRate>
    <durationSeconds>2.5</durationSeconds>
    <nextScene>Level2</nextScene>
    <targetFps>-1</targetFps>
    <vsyncCount>2</vsyncCount>
</FmvCutscene>"#;

        let settings = CutsceneSettings::from_xml(xml).unwrap();
        assert_eq!(settings.video_name, "opening");
        assert_eq!(settings.duration_frames(), 60);
        assert_eq!(settings.next_scene(), Some(SceneId::new("Level2")));
        assert_eq!(settings.owner_entity, 1);
        assert_eq!(settings.frame_rate_config(), FrameRateConfig::new(-1, 2));
    }

    #[test]
    fn test_sanitize_clamps() {
        let mut settings = CutsceneSettings {
            frame_rate: 1000.0,
            duration_seconds: -4.0,
            next_scene: Some("   ".to_string()),
            target_fps: 500,
            vsync_count: 9,
            ..Default::default()
        };
        settings.sanitize();

        assert_eq!(settings.frame_rate, 240.0);
        assert_eq!(settings.duration_seconds, 0.0);
        assert_eq!(settings.duration_frames(), 1);
        assert_eq!(settings.next_scene, None);
        assert_eq!(settings.target_fps, 240);
        assert_eq!(settings.vsync_count, 4);

        settings.target_fps = 0;
        settings.sanitize();
        assert_eq!(settings.target_fps, 1);

        settings.target_fps = -1;
        settings.sanitize();
        assert_eq!(settings.target_fps, -1);
    }

    #[test]
    fn test_cutscene_file_round_trip() {
        let path = std::env::temp_dir().join(format!("fmv-cutscene-{}.xml", std::process::id()));
        let settings = CutsceneSettings {
            video_name: "ending".to_string(),
            frame_rate: 24.0,
            duration_seconds: 4.0,
            next_scene: Some("Credits".to_string()),
            owner_entity: 12,
            target_fps: 144,
            vsync_count: 0,
        };

        settings.save_to_file(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("<?xml"));

        let loaded = CutsceneSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.next_scene(), Some(SceneId::new("Credits")));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_preferences_file() {
        let dir = std::env::temp_dir().join(format!("fmv-cutscene-prefs-{}", std::process::id()));
        let path = dir.join("preferences.xml");

        assert_eq!(AppPreferences::load_from(&path), AppPreferences::default());

        let prefs = AppPreferences { subtitles: Some(true) };
        prefs.save_to(&path).unwrap();

        let loaded = AppPreferences::load_from(&path);
        assert_eq!(loaded.get_bool(SUBTITLES_PREF), Some(true));
        assert_eq!(loaded.get_bool("volume"), None);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unset_preference() {
        let prefs: AppPreferences = from_str("<FmvPreferences/>").unwrap();
        assert_eq!(prefs.get_bool(SUBTITLES_PREF), None);
    }
}
