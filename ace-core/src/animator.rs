//! Frame-driven animation scheduling.
//!
//! An [`AnimationScheduler`] owns timing only: it hands out handles, tracks
//! elapsed time per handle and reports eased progress. Owners of animatable
//! values read [`AnimationScheduler::progress`] every frame and write their
//! own properties, so no callback ever outlives its owner.

use serde::{Deserialize, Serialize};

use crate::Curve;

/// Options of one animation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationOption {
    /// Duration in milliseconds; ignored for springs, which derive their own.
    pub duration_ms: u32,
    /// Delay before the animation starts, in milliseconds.
    pub delay_ms: u32,
    /// Easing curve.
    pub curve: Curve,
}

impl AnimationOption {
    /// A time-based animation.
    #[must_use]
    pub const fn new(duration_ms: u32, curve: Curve) -> Self {
        Self {
            duration_ms,
            delay_ms: 0,
            curve,
        }
    }

    /// A spring animation whose duration comes from the spring.
    #[must_use]
    pub const fn spring(curve: Curve) -> Self {
        Self::new(0, curve)
    }

    /// Delay the start of this animation.
    #[must_use]
    pub const fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Duration actually used when playing this option.
    #[must_use]
    pub fn effective_duration_ms(&self) -> u32 {
        self.curve.settle_duration_ms().unwrap_or(self.duration_ms)
    }
}

/// Opaque identifier of a started animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationHandle(u64);

impl std::fmt::Display for AnimationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anim#{}", self.0)
    }
}

/// Timing service driven by the host's frame loop.
pub trait AnimationScheduler {
    /// Current frame time in milliseconds.
    fn now_ms(&self) -> u64;

    /// Start an animation at the current frame time.
    fn start(&mut self, option: AnimationOption) -> AnimationHandle;

    /// Eased progress of `handle`, or `None` if it is unknown or stopped.
    ///
    /// A handle reported finished by [`AnimationScheduler::advance`] still
    /// reads `Some(1.0)` until the next call to `advance`.
    fn progress(&self, handle: AnimationHandle) -> Option<f32>;

    /// Whether `handle` is still running (paused counts as running).
    fn is_running(&self, handle: AnimationHandle) -> bool;

    /// Freeze `handle` at its current progress.
    fn pause(&mut self, handle: AnimationHandle);

    /// Continue a paused animation from where it stopped.
    fn resume(&mut self, handle: AnimationHandle);

    /// Cancel `handle`. Returns `false` if it was not running.
    fn stop(&mut self, handle: AnimationHandle) -> bool;

    /// Move the clock to `now_ms` and return the handles that finished.
    fn advance(&mut self, now_ms: u64) -> Vec<AnimationHandle>;
}

#[derive(Debug, Clone)]
struct Track {
    handle: AnimationHandle,
    curve: Curve,
    start_ms: u64,
    duration_ms: u32,
    paused_elapsed: Option<u64>,
    raw_fraction: f32,
    finished: bool,
}

impl Track {
    fn elapsed(&self, now_ms: u64) -> u64 {
        self.paused_elapsed
            .unwrap_or_else(|| now_ms.saturating_sub(self.start_ms))
    }

    #[allow(clippy::cast_precision_loss)]
    fn update(&mut self, now_ms: u64) {
        if now_ms < self.start_ms && self.paused_elapsed.is_none() {
            self.raw_fraction = 0.0;
            return;
        }
        self.raw_fraction = if self.duration_ms == 0 {
            1.0
        } else {
            (self.elapsed(now_ms) as f32 / self.duration_ms as f32).min(1.0)
        };
    }
}

/// Deterministic [`AnimationScheduler`] advanced explicitly by the host.
#[derive(Debug, Default)]
pub struct FrameAnimator {
    now_ms: u64,
    next_id: u64,
    tracks: Vec<Track>,
}

impl FrameAnimator {
    /// Create a scheduler whose clock starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler whose clock starts at `now_ms`.
    #[must_use]
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms,
            ..Self::default()
        }
    }

    /// Number of animations still running.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tracks.iter().filter(|t| !t.finished).count()
    }

    fn track(&self, handle: AnimationHandle) -> Option<&Track> {
        self.tracks.iter().find(|t| t.handle == handle)
    }

    fn track_mut(&mut self, handle: AnimationHandle) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.handle == handle)
    }
}

impl AnimationScheduler for FrameAnimator {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn start(&mut self, option: AnimationOption) -> AnimationHandle {
        self.next_id += 1;
        let handle = AnimationHandle(self.next_id);
        let duration_ms = option.effective_duration_ms();
        tracing::trace!(
            "Start {handle} duration={duration_ms}ms delay={}ms curve={:?}",
            option.delay_ms,
            option.curve
        );
        self.tracks.push(Track {
            handle,
            curve: option.curve,
            start_ms: self.now_ms + u64::from(option.delay_ms),
            duration_ms,
            paused_elapsed: None,
            raw_fraction: 0.0,
            finished: false,
        });
        handle
    }

    fn progress(&self, handle: AnimationHandle) -> Option<f32> {
        self.track(handle).map(|t| t.curve.transform(t.raw_fraction))
    }

    fn is_running(&self, handle: AnimationHandle) -> bool {
        self.track(handle).is_some_and(|t| !t.finished)
    }

    fn pause(&mut self, handle: AnimationHandle) {
        let now_ms = self.now_ms;
        if let Some(track) = self.track_mut(handle) {
            if track.paused_elapsed.is_none() && !track.finished {
                track.paused_elapsed = Some(now_ms.saturating_sub(track.start_ms));
            }
        }
    }

    fn resume(&mut self, handle: AnimationHandle) {
        let now_ms = self.now_ms;
        if let Some(track) = self.track_mut(handle) {
            if let Some(elapsed) = track.paused_elapsed.take() {
                track.start_ms = now_ms.saturating_sub(elapsed);
            }
        }
    }

    fn stop(&mut self, handle: AnimationHandle) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.handle != handle || t.finished);
        let stopped = self.tracks.len() != before;
        if stopped {
            tracing::trace!("Stop {handle}");
        }
        stopped
    }

    fn advance(&mut self, now_ms: u64) -> Vec<AnimationHandle> {
        self.tracks.retain(|t| !t.finished);
        self.now_ms = self.now_ms.max(now_ms);

        let mut finished = Vec::new();
        for track in &mut self.tracks {
            track.update(self.now_ms);
            if track.paused_elapsed.is_none() && track.raw_fraction >= 1.0 {
                track.finished = true;
                finished.push(track.handle);
            }
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_progress_and_finish() {
        let mut animator = FrameAnimator::new();
        let handle = animator.start(AnimationOption::new(100, Curve::Linear));

        assert!(animator.advance(50).is_empty());
        assert!((animator.progress(handle).unwrap() - 0.5).abs() < f32::EPSILON);

        assert_eq!(animator.advance(100), vec![handle]);
        assert!((animator.progress(handle).unwrap() - 1.0).abs() < f32::EPSILON);
        assert!(!animator.is_running(handle));

        animator.advance(116);
        assert!(animator.progress(handle).is_none());
    }

    #[test]
    fn test_delay() {
        let mut animator = FrameAnimator::new();
        let handle = animator.start(AnimationOption::new(100, Curve::Linear).with_delay(50));
        animator.advance(40);
        assert!(animator.progress(handle).unwrap().abs() < f32::EPSILON);
        animator.advance(100);
        assert!((animator.progress(handle).unwrap() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pause_resume() {
        let mut animator = FrameAnimator::new();
        let handle = animator.start(AnimationOption::new(100, Curve::Linear));
        animator.advance(25);
        animator.pause(handle);
        animator.advance(500);
        assert!((animator.progress(handle).unwrap() - 0.25).abs() < f32::EPSILON);
        assert!(animator.is_running(handle));

        animator.resume(handle);
        animator.advance(550);
        assert!((animator.progress(handle).unwrap() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_stop() {
        let mut animator = FrameAnimator::new();
        let handle = animator.start(AnimationOption::new(100, Curve::Linear));
        assert!(animator.stop(handle));
        assert!(!animator.stop(handle));
        assert!(animator.advance(200).is_empty());
        assert!(animator.progress(handle).is_none());
    }

    #[test]
    fn test_zero_duration_finishes_next_frame() {
        let mut animator = FrameAnimator::starting_at(10);
        let handle = animator.start(AnimationOption::new(0, Curve::Sharp));
        assert_eq!(animator.advance(10), vec![handle]);
    }

    #[test]
    fn test_spring_uses_its_own_duration() {
        let option = AnimationOption::spring(Curve::spring(0.0, 1.0, 228.0, 30.0));
        assert!(option.effective_duration_ms() > 0);
        assert_eq!(
            Some(option.effective_duration_ms()),
            option.curve.settle_duration_ms()
        );
    }
}
