//! Dot indicator animation engine.
//!
//! The modifier owns everything that changes over time: the committed page and
//! window status, the layout currently on screen, and the animation tracks
//! that move one towards the other. The host drives it by calling
//! [`DotIndicatorModifier::on_frame`] once per frame; the render tree reads
//! the published frame through a weak [`Observer`].

use ace_core::{
    AnimationHandle, AnimationOption, AnimationScheduler, FrameAnimator, ObservedValue, Observer,
};

use crate::config::IndicatorConfig;
use crate::geometry::{GeometryCalculator, IndicatorGeometry};
use crate::layout::DotLayout;
use crate::overlong::{moves_backward, GestureState, OverlongStatus, OverlongType, TouchBottomLoop};

/// Caller-supplied drag fractions, each clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveRates {
    /// Fraction of the way every dot has moved.
    pub black_point_center_move_rate: f32,
    /// Fraction of the way the long dot's left cap has moved.
    pub long_point_left_center_move_rate: f32,
    /// Fraction of the way the long dot's right cap has moved.
    pub long_point_right_center_move_rate: f32,
}

impl MoveRates {
    /// The same fraction for every part.
    #[must_use]
    pub const fn uniform(rate: f32) -> Self {
        Self {
            black_point_center_move_rate: rate,
            long_point_left_center_move_rate: rate,
            long_point_right_center_move_rate: rate,
        }
    }

    fn clamped(self) -> Self {
        Self {
            black_point_center_move_rate: self.black_point_center_move_rate.clamp(0.0, 1.0),
            long_point_left_center_move_rate: self.long_point_left_center_move_rate.clamp(0.0, 1.0),
            long_point_right_center_move_rate: self
                .long_point_right_center_move_rate
                .clamp(0.0, 1.0),
        }
    }
}

/// How the display window moves during a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowShift {
    /// Same window; only the selection moves.
    None,
    /// Window slides one page forward; a dot enters on the right.
    MoveForward,
    /// Window slides one page backward; a dot enters on the left.
    MoveBackward,
    /// Window jumps; dots morph in place.
    Jump,
}

impl WindowShift {
    fn between(from_start: usize, to_start: usize) -> Self {
        if from_start == to_start {
            Self::None
        } else if to_start == from_start + 1 {
            Self::MoveForward
        } else if to_start + 1 == from_start {
            Self::MoveBackward
        } else {
            Self::Jump
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Single,
    TouchBottomFirst,
    TouchBottomSecond,
}

#[derive(Debug, Clone, Copy)]
struct Track {
    handle: AnimationHandle,
    value: f32,
    done: bool,
}

impl Track {
    fn start<S: AnimationScheduler>(scheduler: &mut S, option: AnimationOption) -> Self {
        Self {
            handle: scheduler.start(option),
            value: 0.0,
            done: false,
        }
    }

    fn sample<S: AnimationScheduler>(&mut self, scheduler: &S) {
        self.value = scheduler.progress(self.handle).unwrap_or(1.0);
        self.done = !scheduler.is_running(self.handle);
    }
}

#[derive(Debug, Clone)]
struct RunningAnimation {
    start: DotLayout,
    end: DotLayout,
    target: DotLayout,
    target_page: usize,
    target_status: OverlongStatus,
    backward: bool,
    phase: Phase,
    points: Track,
    long_left: Track,
    long_right: Track,
    touch_bottom: Option<Track>,
}

impl RunningAnimation {
    fn tracks(&self) -> impl Iterator<Item = &Track> {
        [&self.points, &self.long_left, &self.long_right]
            .into_iter()
            .chain(self.touch_bottom.as_ref())
    }

    fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        [&mut self.points, &mut self.long_left, &mut self.long_right]
            .into_iter()
            .chain(self.touch_bottom.as_mut())
    }

    fn is_done(&self) -> bool {
        self.tracks().all(|track| track.done)
    }
}

#[derive(Debug, Clone)]
struct DragState {
    start: DotLayout,
    end: DotLayout,
    target_page: usize,
}

/// Swiper dot indicator: windowed when the configuration allows it, one dot
/// per page otherwise.
///
/// Committed state (`current_page`, selected slot, window style) only changes
/// when an animation completes or is stopped with
/// `stop_animation(false)`.
#[derive(Debug)]
pub struct DotIndicatorModifier<S: AnimationScheduler = FrameAnimator> {
    config: IndicatorConfig,
    calculator: GeometryCalculator,
    scheduler: S,
    current_page: usize,
    status: OverlongStatus,
    displayed: DotLayout,
    touch_bottom_progress: f32,
    animation: Option<RunningAnimation>,
    drag: Option<DragState>,
    published: ObservedValue<IndicatorGeometry>,
}

impl DotIndicatorModifier<FrameAnimator> {
    /// Create an indicator on page 0 driven by its own [`FrameAnimator`].
    #[must_use]
    pub fn new(config: IndicatorConfig) -> Self {
        Self::with_scheduler(config, FrameAnimator::new())
    }
}

impl<S: AnimationScheduler> DotIndicatorModifier<S> {
    /// Create an indicator on page 0 driven by `scheduler`.
    #[must_use]
    pub fn with_scheduler(config: IndicatorConfig, scheduler: S) -> Self {
        let calculator = GeometryCalculator::from_config(&config);
        let status = calculator.initial_status(0);
        let geometry = calculator.layout(0, status);
        let displayed = DotLayout::from_geometry(&geometry, config.style.item_spacing);
        let modifier = Self {
            config,
            calculator,
            scheduler,
            current_page: 0,
            status,
            displayed,
            touch_bottom_progress: 0.0,
            animation: None,
            drag: None,
            published: ObservedValue::new(geometry),
        };
        modifier.publish();
        modifier
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Geometry calculator in use.
    #[must_use]
    pub const fn calculator(&self) -> &GeometryCalculator {
        &self.calculator
    }

    /// The animation scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Committed page.
    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    /// Committed slot of the selected dot.
    #[must_use]
    pub const fn current_selected_index(&self) -> usize {
        self.status.selected_index
    }

    /// Committed edge style.
    #[must_use]
    pub const fn current_overlong_type(&self) -> OverlongType {
        self.status.overlong_type
    }

    /// Whether an animation is in flight.
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Layout currently on screen.
    #[must_use]
    pub const fn displayed(&self) -> &DotLayout {
        &self.displayed
    }

    /// Weight of the touch-bottom color in the long dot, `0` at rest.
    #[must_use]
    pub const fn touch_bottom_progress(&self) -> f32 {
        self.touch_bottom_progress
    }

    /// Latest published frame.
    #[must_use]
    pub fn geometry(&self) -> IndicatorGeometry {
        self.published.get()
    }

    /// Weak view of the published frame for the render tree.
    #[must_use]
    pub fn observer(&self) -> Observer<IndicatorGeometry> {
        self.published.observer()
    }

    /// Show `page` at rest, cancelling any animation or drag.
    pub fn set_current_page(&mut self, page: usize) {
        self.stop_handles();
        self.animation = None;
        self.drag = None;
        let page = page.min(self.config.real_item_count.saturating_sub(1));
        self.current_page = page;
        self.status = self.calculator.initial_status(page);
        self.displayed = self.rest_layout(page, self.status);
        self.touch_bottom_progress = 0.0;
        tracing::debug!("Indicator reset to page {page} ({:?})", self.status);
        self.publish();
    }

    fn spacing(&self) -> f32 {
        self.config.style.item_spacing
    }

    fn rest_layout(&self, page: usize, status: OverlongStatus) -> DotLayout {
        DotLayout::from_geometry(&self.calculator.layout(page, status), self.spacing())
    }

    fn window_start(&self, page: usize, status: OverlongStatus) -> usize {
        self.calculator.display_window(page, status).start_index
    }

    /// Start and end layouts of a transition to `target_page`, on a common base.
    fn endpoints(&self, target_page: usize, target_status: OverlongStatus) -> (DotLayout, DotLayout) {
        let from_start = self.window_start(self.current_page, self.status);
        let to_start = self.window_start(target_page, target_status);
        let shift = WindowShift::between(from_start, to_start);
        let base = match shift {
            WindowShift::MoveForward => from_start,
            WindowShift::None | WindowShift::MoveBackward | WindowShift::Jump => to_start,
        };
        let spacing = self.spacing();

        let start = if shift == WindowShift::Jump || self.displayed.base_page.abs_diff(base) > 1 {
            self.displayed.relabel(base)
        } else {
            self.displayed.rebase(base, spacing)
        };
        let end = self
            .rest_layout(target_page, target_status)
            .rebase(base, spacing);
        tracing::debug!(
            "Indicator {}->{target_page}: window {from_start}->{to_start} ({shift:?})",
            self.current_page
        );
        (start, end)
    }

    /// Animate from the frame on screen to `target_page`.
    ///
    /// Any running animation is stopped first and the new one starts from
    /// where it left the dots. A [`TouchBottomLoop`] other than `None` plays
    /// the two-phase wrap animation.
    pub fn play_indicator_animation(
        &mut self,
        now_ms: u64,
        target_page: usize,
        gesture_state: GestureState,
        touch_bottom: TouchBottomLoop,
    ) {
        self.stop_animation(true);
        self.drag = None;
        self.scheduler.advance(now_ms);

        let target_page = target_page.min(self.config.real_item_count.saturating_sub(1));
        let target_status =
            self.calculator
                .calc_target_status(self.current_page, target_page, self.status);
        let backward = moves_backward(self.current_page, target_page, gesture_state, touch_bottom);
        let target = self.rest_layout(target_page, target_status);

        let animation = if touch_bottom == TouchBottomLoop::None {
            let (start, end) = self.endpoints(target_page, target_status);
            let curves = self.config.curves;
            RunningAnimation {
                start,
                end,
                target,
                target_page,
                target_status,
                backward,
                phase: Phase::Single,
                points: Track::start(&mut self.scheduler, curves.points_option()),
                long_left: Track::start(&mut self.scheduler, curves.long_point_option(backward)),
                long_right: Track::start(&mut self.scheduler, curves.long_point_option(!backward)),
                touch_bottom: None,
            }
        } else {
            tracing::debug!(
                "Indicator wraps {}->{target_page} ({touch_bottom:?})",
                self.current_page
            );
            let start = self.displayed.clone();
            let end = start.stretched_to_edge(backward);
            let option = self.config.curves.touch_bottom_option();
            RunningAnimation {
                start,
                end,
                target,
                target_page,
                target_status,
                backward,
                phase: Phase::TouchBottomFirst,
                points: Track::start(&mut self.scheduler, option),
                long_left: Track::start(&mut self.scheduler, option),
                long_right: Track::start(&mut self.scheduler, option),
                touch_bottom: Some(Track::start(&mut self.scheduler, option)),
            }
        };
        self.animation = Some(animation);
    }

    /// Second half of the wrap: re-enter collapsed from the opposite edge.
    fn start_touch_bottom_second(&mut self, mut animation: RunningAnimation) {
        let reentry = animation.target.collapsed_at_edge(!animation.backward);
        let mut start = animation.end.relabel(animation.target.base_page);
        start.long_point = reentry.long_point;
        let curves = self.config.curves;
        let backward = animation.backward;

        animation.start = start;
        animation.end = animation.target.clone();
        animation.phase = Phase::TouchBottomSecond;
        animation.points = Track::start(&mut self.scheduler, curves.touch_bottom_option());
        animation.long_left = Track::start(&mut self.scheduler, curves.long_point_option(backward));
        animation.long_right =
            Track::start(&mut self.scheduler, curves.long_point_option(!backward));
        animation.touch_bottom = Some(Track::start(
            &mut self.scheduler,
            curves.touch_bottom_option(),
        ));
        self.displayed = animation.start.clone();
        tracing::trace!("Indicator wrap re-entering at page {}", animation.target_page);
        self.animation = Some(animation);
    }

    /// Advance to `now_ms` and update the frame on screen.
    ///
    /// Returns `true` while an animation is still running.
    pub fn on_frame(&mut self, now_ms: u64) -> bool {
        let Some(mut animation) = self.animation.take() else {
            return false;
        };
        self.scheduler.advance(now_ms);
        for track in animation.tracks_mut() {
            track.sample(&self.scheduler);
        }

        self.displayed = animation.start.blend(
            &animation.end,
            animation.points.value,
            animation.long_left.value,
            animation.long_right.value,
        );
        if let Some(track) = animation.touch_bottom {
            let weight = track.value.clamp(0.0, 1.0);
            self.touch_bottom_progress = match animation.phase {
                Phase::TouchBottomFirst => weight,
                Phase::TouchBottomSecond => 1.0 - weight,
                Phase::Single => 0.0,
            };
        }
        tracing::trace!(
            "Indicator frame at {now_ms}ms: points={:.3} left={:.3} right={:.3}",
            animation.points.value,
            animation.long_left.value,
            animation.long_right.value
        );

        let running = if !animation.is_done() {
            self.animation = Some(animation);
            true
        } else if animation.phase == Phase::TouchBottomFirst {
            self.start_touch_bottom_second(animation);
            true
        } else {
            self.commit(&animation);
            false
        };
        self.publish();
        running
    }

    fn commit(&mut self, animation: &RunningAnimation) {
        self.current_page = animation.target_page;
        self.status = animation.target_status;
        self.displayed = animation.target.clone();
        self.touch_bottom_progress = 0.0;
        tracing::debug!(
            "Indicator committed page {} ({:?})",
            self.current_page,
            self.status
        );
    }

    /// Scrub a drag towards `target_page` by caller-supplied fractions.
    ///
    /// Any running animation is frozen where it is. The committed state is
    /// untouched; releasing the finger is a regular
    /// [`DotIndicatorModifier::play_indicator_animation`] call that starts from
    /// the dragged frame.
    pub fn update_drag_progress(
        &mut self,
        target_page: usize,
        gesture_state: GestureState,
        rates: MoveRates,
    ) {
        if !gesture_state.is_follow() {
            tracing::debug!("Drag update ignored for gesture {gesture_state:?}");
            return;
        }
        if self.animation.is_some() {
            self.stop_animation(true);
        }
        let target_page = target_page.min(self.config.real_item_count.saturating_sub(1));
        let stale = match &self.drag {
            Some(drag) => drag.target_page != target_page,
            None => true,
        };
        if stale {
            let target_status =
                self.calculator
                    .calc_target_status(self.current_page, target_page, self.status);
            let (start, end) = self.endpoints(target_page, target_status);
            self.drag = Some(DragState {
                start,
                end,
                target_page,
            });
        }

        let rates = rates.clamped();
        if let Some(drag) = &self.drag {
            self.displayed = drag.start.blend(
                &drag.end,
                rates.black_point_center_move_rate,
                rates.long_point_left_center_move_rate,
                rates.long_point_right_center_move_rate,
            );
        }
        self.publish();
    }

    /// Cancel every running track.
    ///
    /// With `immediate` the dots stay exactly where the last frame put them
    /// and the committed state is kept; otherwise they jump to the target and
    /// the target is committed.
    pub fn stop_animation(&mut self, immediate: bool) {
        self.stop_handles();
        let Some(animation) = self.animation.take() else {
            return;
        };
        if immediate {
            tracing::debug!(
                "Indicator animation to page {} frozen",
                animation.target_page
            );
        } else {
            self.commit(&animation);
        }
        self.publish();
    }

    fn stop_handles(&mut self) {
        if let Some(animation) = &self.animation {
            for track in animation.tracks() {
                self.scheduler.stop(track.handle);
            }
        }
    }

    fn publish(&self) {
        self.published.set(IndicatorGeometry {
            dots: self.displayed.dots.clone(),
            long_point: self.displayed.long_point,
            selected_index: self.status.selected_index,
            overlong_type: self.status.overlong_type,
            window: self
                .calculator
                .display_window(self.current_page, self.status),
        });
    }
}

impl<S: AnimationScheduler> Drop for DotIndicatorModifier<S> {
    fn drop(&mut self) {
        self.stop_handles();
    }
}
