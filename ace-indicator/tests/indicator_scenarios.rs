//! End-to-end behaviour of the dot indicator.

use ace_indicator::{
    DotIndicatorModifier, GestureState, IndicatorConfig, IndicatorGeometry, MoveRates,
    OverlongType, TouchBottomLoop,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ace_indicator=debug")
        .with_test_writer()
        .try_init();
}

fn windowed(pages: usize, window: usize) -> DotIndicatorModifier {
    DotIndicatorModifier::new(IndicatorConfig::new(pages).with_max_display_count(window))
}

/// Play to `target` and return every published frame.
fn play(
    modifier: &mut DotIndicatorModifier,
    start_ms: u64,
    target: usize,
    gesture: GestureState,
    touch_bottom: TouchBottomLoop,
) -> (u64, Vec<IndicatorGeometry>) {
    modifier.play_indicator_animation(start_ms, target, gesture, touch_bottom);
    let mut frames = Vec::new();
    let mut now_ms = start_ms;
    loop {
        now_ms += 16;
        let running = modifier.on_frame(now_ms);
        frames.push(modifier.geometry());
        if !running {
            return (now_ms, frames);
        }
        assert!(now_ms - start_ms < 60_000, "animation never finished");
    }
}

#[test]
fn test_first_page_shows_right_fadeout() {
    init_tracing();
    let modifier = windowed(10, 6);
    assert_eq!(modifier.current_page(), 0);
    assert_eq!(modifier.current_selected_index(), 0);
    assert_eq!(
        modifier.current_overlong_type(),
        OverlongType::LeftNormalRightFadeout
    );
}

#[test]
fn test_stepping_forward_reaches_both_fadeouts_at_anchor() {
    init_tracing();
    let mut modifier = windowed(10, 6);
    let mut now_ms = 0;
    for page in 1..=5 {
        (now_ms, _) = play(
            &mut modifier,
            now_ms,
            page,
            GestureState::None,
            TouchBottomLoop::None,
        );
        let expected = if modifier.current_selected_index() >= 2 {
            OverlongType::LeftFadeoutRightFadeout
        } else {
            OverlongType::LeftNormalRightFadeout
        };
        assert_eq!(modifier.current_overlong_type(), expected, "page {page}");
    }
    assert_eq!(modifier.current_page(), 5);
    assert_eq!(modifier.current_selected_index(), 2);
    assert_eq!(
        modifier.current_overlong_type(),
        OverlongType::LeftFadeoutRightFadeout
    );
}

#[test]
fn test_last_page_shows_left_fadeout() {
    init_tracing();
    let mut modifier = windowed(10, 6);
    let mut now_ms = 0;
    for page in 1..=9 {
        (now_ms, _) = play(
            &mut modifier,
            now_ms,
            page,
            GestureState::None,
            TouchBottomLoop::None,
        );
    }
    assert_eq!(modifier.current_selected_index(), 5);
    assert_eq!(
        modifier.current_overlong_type(),
        OverlongType::LeftFadeoutRightNormal
    );
    let geometry = modifier.geometry();
    assert_eq!(geometry.window.start_index, 4);
    assert_eq!(geometry.window.end_index, 9);
}

#[test]
fn test_small_window_falls_back_to_every_dot() {
    init_tracing();
    let mut modifier = windowed(10, 3);
    assert!(!modifier.calculator().is_overlength());
    assert_eq!(modifier.current_overlong_type(), OverlongType::None);
    assert_eq!(modifier.geometry().visible_count(), 10);

    play(
        &mut modifier,
        0,
        7,
        GestureState::None,
        TouchBottomLoop::None,
    );
    let geometry = modifier.geometry();
    assert_eq!(geometry.selected_index, 7);
    assert_eq!(geometry.visible_count(), 10);
    assert!(geometry.dots.iter().all(|dot| dot.width >= 6.0 - 1e-4));
}

#[test]
fn test_resting_centers_strictly_increase() {
    let mut modifier = windowed(12, 7);
    let mut now_ms = 0;
    for page in (1..12).chain((0..11).rev()) {
        (now_ms, _) = play(
            &mut modifier,
            now_ms,
            page,
            GestureState::None,
            TouchBottomLoop::None,
        );
        let geometry = modifier.geometry();
        let visible: Vec<f32> = geometry
            .dots
            .iter()
            .filter(|dot| dot.is_visible())
            .map(|dot| dot.center_x)
            .collect();
        assert!(
            visible.windows(2).all(|pair| pair[0] < pair[1]),
            "page {page}: {visible:?}"
        );
    }
}

#[test]
fn test_frames_never_exceed_window_plus_spare() {
    for window in 6..=9 {
        let pages = window + 5;
        let mut modifier = windowed(pages, window);
        let mut now_ms = 0;
        for page in (1..pages).chain((0..pages - 1).rev()) {
            let frames;
            (now_ms, frames) = play(
                &mut modifier,
                now_ms,
                page,
                GestureState::None,
                TouchBottomLoop::None,
            );
            for frame in &frames {
                assert!(frame.dots.len() <= window + 1);
                assert!(frame.visible_count() <= window + 1);
            }
            assert!(modifier.geometry().visible_count() <= window);
        }
    }
}

#[test]
fn test_identical_plays_produce_identical_frames() {
    let run = || {
        let mut modifier = windowed(10, 6);
        modifier.set_current_page(3);
        let (_, frames) = play(
            &mut modifier,
            1_000,
            4,
            GestureState::ReleaseRight,
            TouchBottomLoop::None,
        );
        frames
    };
    let first = run();
    let second = run();
    assert!(first.len() > 2);
    assert_eq!(first, second);
}

#[test]
fn test_wrap_plays_through_touch_bottom() {
    init_tracing();
    let mut modifier = windowed(10, 6);
    modifier.set_current_page(9);
    let (_, frames) = play(
        &mut modifier,
        0,
        0,
        GestureState::None,
        TouchBottomLoop::Right,
    );
    assert!(frames.len() > 4);
    assert_eq!(modifier.current_page(), 0);
    assert_eq!(modifier.current_selected_index(), 0);
    assert_eq!(
        modifier.current_overlong_type(),
        OverlongType::LeftNormalRightFadeout
    );
}

#[test]
fn test_release_after_drag_continues_from_dragged_frame() {
    let mut modifier = windowed(10, 6);
    modifier.update_drag_progress(
        1,
        GestureState::FollowLeft,
        MoveRates {
            black_point_center_move_rate: 0.5,
            long_point_left_center_move_rate: 0.3,
            long_point_right_center_move_rate: 0.7,
        },
    );
    let dragged = modifier.geometry();
    assert_eq!(modifier.current_page(), 0);

    modifier.play_indicator_animation(500, 1, GestureState::ReleaseLeft, TouchBottomLoop::None);
    modifier.on_frame(500);
    let first = modifier.geometry();
    for (a, b) in dragged.dots.iter().zip(&first.dots) {
        assert!((a.center_x - b.center_x).abs() < 1e-3);
    }

    let mut now_ms = 500;
    while modifier.on_frame(now_ms) {
        now_ms += 16;
    }
    assert_eq!(modifier.current_page(), 1);
}

#[test]
fn test_observer_tracks_published_frames() {
    let mut modifier = windowed(10, 6);
    let observer = modifier.observer();
    play(
        &mut modifier,
        0,
        1,
        GestureState::None,
        TouchBottomLoop::None,
    );
    assert_eq!(observer.latest(), Some(modifier.geometry()));
}
