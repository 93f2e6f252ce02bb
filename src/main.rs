//! FMV Cutscene - headless dry run
//!
//! Plays a cutscene description against the in-memory host, ticking the
//! frame clock at the video's frame rate, and logs every host call.
//!
//! Usage: `fmv-cutscene [cutscene.xml]`

use std::path::PathBuf;
use std::time::Duration;

use fmv_cutscene::telemetry::{init_logging, LogConfig};
use fmv_cutscene::{AppPreferences, CutsceneSettings, EntityId, HeadlessHost, PlaybackSequencer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _log_guard = init_logging(&LogConfig::from_env())?;

    let settings = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            tracing::info!("Loading cutscene from {}", path.display());
            CutsceneSettings::load_from_file(&path)?
        }
        None => CutsceneSettings::default(),
    };
    let preferences = AppPreferences::load();

    let host = HeadlessHost::new(settings.frame_rate_config());
    let video = host.video(&settings.video_name, settings.frame_rate, settings.duration_frames());
    let bindings = host.bindings_with_preferences(Box::new(preferences));

    let task = PlaybackSequencer::start(
        EntityId(settings.owner_entity),
        video,
        settings.next_scene(),
        bindings,
    )?;

    // Stand-in for the render loop: one frame per video frame
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / settings.frame_rate));
    while !task.is_finished() {
        interval.tick().await;
        host.clock.tick();
    }

    let outcome = task.join().await?;
    let report = outcome.result?;

    tracing::info!(
        video = %report.video,
        frames = report.frames_waited,
        avg_frame_ms = report.frame_stats.avg_ms,
        restored = %report.restored,
        subtitles = report.subtitles_shown,
        next_scene = ?report.activated_scene,
        "Cutscene complete"
    );
    for event in host.trace.events() {
        tracing::debug!(?event, "host call");
    }

    Ok(())
}
