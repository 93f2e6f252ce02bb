//! Rendered-frame signal
//!
//! The host's render loop owns a [`FrameClock`] and ticks it once per
//! presented frame. Playback tasks hold a [`FrameWaiter`] and await the next
//! tick. Built on a `tokio::sync::watch` channel carrying the frame counter.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::PlaybackError;

/// Host side of the frame signal
#[derive(Debug, Clone)]
pub struct FrameClock {
    sender: Arc<watch::Sender<u64>>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock at frame 0
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Signal that a frame was rendered, returning the new frame number
    pub fn tick(&self) -> u64 {
        let mut frame = 0;
        self.sender.send_modify(|n| {
            *n += 1;
            frame = *n;
        });
        frame
    }

    /// Number of frames rendered so far
    pub fn frame(&self) -> u64 {
        *self.sender.borrow()
    }

    /// Create a waiter that resolves on subsequent ticks
    pub fn waiter(&self) -> FrameWaiter {
        FrameWaiter {
            receiver: self.sender.subscribe(),
        }
    }

    /// Raw receiver for collaborators that track frame progress themselves
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }
}

/// Task side of the frame signal
#[derive(Debug, Clone)]
pub struct FrameWaiter {
    receiver: watch::Receiver<u64>,
}

impl FrameWaiter {
    /// Wait until the host renders the next frame
    ///
    /// Several ticks between two calls collapse into one wake-up.
    pub async fn next_frame(&mut self) -> Result<u64, PlaybackError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| PlaybackError::FrameClockStopped)?;
        Ok(*self.receiver.borrow_and_update())
    }

    /// Treat every frame rendered so far as seen
    ///
    /// The next `next_frame` call then waits for a fresh tick.
    pub fn sync(&mut self) -> u64 {
        *self.receiver.borrow_and_update()
    }

    /// Most recent frame number seen by the host
    pub fn frame(&self) -> u64 {
        *self.receiver.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_waiter_sees_tick() {
        let clock = FrameClock::new();
        let mut waiter = clock.waiter();

        assert_eq!(clock.tick(), 1);
        assert_eq!(waiter.next_frame().await.unwrap(), 1);
        assert_eq!(waiter.frame(), 1);
    }

    #[tokio::test]
    async fn test_sync_discards_earlier_ticks() {
        let clock = FrameClock::new();
        let mut waiter = clock.waiter();
        clock.tick();
        clock.tick();

        assert_eq!(waiter.sync(), 2);
        tokio::select! {
            biased;
            _ = waiter.next_frame() => panic!("frame reported before a new tick"),
            _ = tokio::task::yield_now() => {}
        }

        clock.tick();
        assert_eq!(waiter.next_frame().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_waiter_errors_when_clock_dropped() {
        let clock = FrameClock::new();
        let mut waiter = clock.waiter();
        drop(clock);

        let result = waiter.next_frame().await;
        assert!(matches!(result, Err(PlaybackError::FrameClockStopped)));
    }

    #[test]
    fn test_ticks_accumulate() {
        let clock = FrameClock::new();
        clock.tick();
        clock.tick();
        assert_eq!(clock.frame(), 2);
    }
}
