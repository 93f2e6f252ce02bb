//! Frame timing during cutscene playback
//!
//! Measures how fast the host actually renders while the frame cap is lifted.

use std::time::{Duration, Instant};

/// Frame timing statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Average frame time in milliseconds
    pub avg_ms: f64,
    /// Minimum frame time in milliseconds
    pub min_ms: f64,
    /// Maximum frame time in milliseconds
    pub max_ms: f64,
    /// 50th percentile (median) frame time
    pub p50_ms: f64,
    /// 95th percentile frame time
    pub p95_ms: f64,
    /// Number of samples in the statistics
    pub sample_count: usize,
}

impl FrameStats {
    /// Effective frame rate derived from the average frame time
    pub fn fps(&self) -> f64 {
        if self.avg_ms > 0.0 {
            1000.0 / self.avg_ms
        } else {
            0.0
        }
    }
}

/// Collects the interval between rendered frames
///
/// Keeps every sample: a cutscene is bounded, unlike a render loop.
#[derive(Debug, Default)]
pub struct FrameProfiler {
    frame_times: Vec<Duration>,
    last_frame: Option<Instant>,
}

impl FrameProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a frame was observed now
    pub fn begin_frame(&mut self) {
        self.record_at(Instant::now());
    }

    fn record_at(&mut self, now: Instant) {
        if let Some(last) = self.last_frame {
            self.frame_times.push(now.duration_since(last));
        }
        self.last_frame = Some(now);
    }

    /// Number of frames observed
    pub fn frames(&self) -> usize {
        match self.last_frame {
            Some(_) => self.frame_times.len() + 1,
            None => 0,
        }
    }

    /// Frame timing statistics over the whole recording
    pub fn stats(&self) -> FrameStats {
        if self.frame_times.is_empty() {
            return FrameStats::default();
        }

        let mut times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_secs_f64() * 1000.0)
            .collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let sum: f64 = times.iter().sum();

        FrameStats {
            avg_ms: sum / times.len() as f64,
            min_ms: times.first().copied().unwrap_or(0.0),
            max_ms: times.last().copied().unwrap_or(0.0),
            p50_ms: percentile(&times, 0.50),
            p95_ms: percentile(&times, 0.95),
            sample_count: times.len(),
        }
    }
}

/// Calculate percentile from sorted array
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p) as usize;
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiler_intervals() {
        let mut profiler = FrameProfiler::new();
        let start = Instant::now();

        for i in 0..5u64 {
            profiler.record_at(start + Duration::from_millis(i * 10));
        }

        assert_eq!(profiler.frames(), 5);
        let stats = profiler.stats();
        assert_eq!(stats.sample_count, 4);
        assert!((stats.avg_ms - 10.0).abs() < 0.001);
        assert!((stats.fps() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_profiler() {
        let profiler = FrameProfiler::new();
        assert_eq!(profiler.frames(), 0);
        assert_eq!(profiler.stats(), FrameStats::default());
        assert_eq!(profiler.stats().fps(), 0.0);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(percentile(&values, 0.5), 5.0);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 1.0), 10.0);
    }
}
