//! Host frame-rate configuration
//!
//! The host exposes two process-wide values: a target frame rate and a
//! vertical-sync interval. Playback unlocks both for the duration of a
//! cutscene and puts them back afterwards. Saved values travel as a
//! [`SavedFrameRate`] token so they can only be restored once.

use std::sync::{Arc, Mutex};

/// Target frame rate meaning "render as fast as possible"
pub const UNBOUNDED_FRAME_RATE: i32 = -1;

/// Vertical-sync interval meaning "don't wait for vblank"
pub const VSYNC_DISABLED: u32 = 0;

/// Snapshot of the host's frame pacing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRateConfig {
    /// Target frame rate, or [`UNBOUNDED_FRAME_RATE`]
    pub target_frame_rate: i32,
    /// Number of vblanks between buffer swaps, 0 disables vsync
    pub vsync_count: u32,
}

impl FrameRateConfig {
    /// The unlocked configuration used while a cutscene plays
    pub const UNLOCKED: FrameRateConfig = FrameRateConfig {
        target_frame_rate: UNBOUNDED_FRAME_RATE,
        vsync_count: VSYNC_DISABLED,
    };

    pub fn new(target_frame_rate: i32, vsync_count: u32) -> Self {
        Self { target_frame_rate, vsync_count }
    }

    /// Whether this configuration leaves frame pacing uncapped
    pub fn is_unlocked(&self) -> bool {
        self.target_frame_rate == UNBOUNDED_FRAME_RATE && self.vsync_count == VSYNC_DISABLED
    }
}

impl Default for FrameRateConfig {
    fn default() -> Self {
        Self {
            target_frame_rate: 60,
            vsync_count: 1,
        }
    }
}

impl std::fmt::Display for FrameRateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.target_frame_rate == UNBOUNDED_FRAME_RATE {
            write!(f, "unbounded fps, vsync {}", self.vsync_count)
        } else {
            write!(f, "{} fps, vsync {}", self.target_frame_rate, self.vsync_count)
        }
    }
}

/// Read/write access to the host's live frame-rate settings
pub trait FrameRateControl: Send {
    /// Current live configuration
    fn current(&self) -> FrameRateConfig;

    /// Replace the live configuration
    fn apply(&mut self, config: FrameRateConfig);
}

/// Saved frame-rate settings, restored exactly once
#[derive(Debug, PartialEq, Eq)]
#[must_use = "saved frame-rate settings must be restored"]
pub struct SavedFrameRate {
    config: FrameRateConfig,
}

impl SavedFrameRate {
    /// The configuration that will be written back
    pub fn config(&self) -> FrameRateConfig {
        self.config
    }

    /// Write the saved values back to the host
    pub fn restore(self, control: &mut dyn FrameRateControl) -> FrameRateConfig {
        control.apply(self.config);
        tracing::debug!("Frame rate restored: {}", self.config);
        self.config
    }
}

/// Read the host's current settings into a restore token
pub fn capture(control: &dyn FrameRateControl) -> SavedFrameRate {
    let config = control.current();
    tracing::debug!("Frame rate captured: {}", config);
    SavedFrameRate { config }
}

/// Remove the frame cap and disable vsync
pub fn unlock(control: &mut dyn FrameRateControl) {
    control.apply(FrameRateConfig::UNLOCKED);
    tracing::debug!("Frame rate unlocked");
}

/// Frame-rate settings held in a shared cell
///
/// Clones share the same underlying configuration, so a render loop and a
/// sequencer can both hold one.
#[derive(Debug, Clone, Default)]
pub struct SharedFrameRate {
    inner: Arc<Mutex<FrameRateConfig>>,
}

impl SharedFrameRate {
    pub fn new(config: FrameRateConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }
}

impl FrameRateControl for SharedFrameRate {
    fn current(&self) -> FrameRateConfig {
        match self.inner.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn apply(&mut self, config: FrameRateConfig) {
        match self.inner.lock() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_sets_sentinels() {
        let mut control = SharedFrameRate::new(FrameRateConfig::new(30, 2));
        unlock(&mut control);
        assert_eq!(control.current(), FrameRateConfig::new(-1, 0));
        assert!(control.current().is_unlocked());
    }

    #[test]
    fn test_capture_restore_brackets_changes() {
        let mut control = SharedFrameRate::new(FrameRateConfig::new(144, 1));
        let saved = capture(&control);

        unlock(&mut control);
        control.apply(FrameRateConfig::new(24, 3));

        let restored = saved.restore(&mut control);
        assert_eq!(restored, FrameRateConfig::new(144, 1));
        assert_eq!(control.current(), FrameRateConfig::new(144, 1));
    }

    #[test]
    fn test_shared_clones_see_same_config() {
        let mut a = SharedFrameRate::new(FrameRateConfig::default());
        let b = a.clone();
        a.apply(FrameRateConfig::new(90, 0));
        assert_eq!(b.current().target_frame_rate, 90);
    }

    #[test]
    fn test_display() {
        assert_eq!(FrameRateConfig::UNLOCKED.to_string(), "unbounded fps, vsync 0");
        assert_eq!(FrameRateConfig::new(60, 1).to_string(), "60 fps, vsync 1");
    }
}
