//! Display-window bookkeeping for indicators with more pages than dots.
//!
//! When an indicator has more pages than it can show, it displays a sliding
//! window of `max_display_count` dots. The dots at a window edge that has
//! more pages behind it shrink ("fade out"), and the selected dot moves
//! towards an anchor before the window starts to slide.

use serde::{Deserialize, Serialize};

/// Slot the selected dot settles on when moving backwards.
pub const LEFT_ANCHOR: usize = 3;

/// Distance from the right window edge at which the selected dot settles
/// when moving forwards (`right_anchor = max_display_count - 1 - 3`).
pub const RIGHT_ANCHOR_OFFSET: usize = 3;

/// Pages at either end that map straight onto the edge slots.
pub const EDGE_RESERVE: usize = 2;

/// Which window edges shrink their outer dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlongType {
    /// Window touches the first page; only the right edge fades.
    LeftNormalRightFadeout,
    /// Pages hidden on both sides.
    LeftFadeoutRightFadeout,
    /// Window touches the last page; only the left edge fades.
    LeftFadeoutRightNormal,
    /// No window; every page is shown.
    #[default]
    None,
}

impl OverlongType {
    /// Whether the left edge shrinks its outer dots.
    #[must_use]
    pub const fn left_fades(self) -> bool {
        matches!(
            self,
            Self::LeftFadeoutRightFadeout | Self::LeftFadeoutRightNormal
        )
    }

    /// Whether the right edge shrinks its outer dots.
    #[must_use]
    pub const fn right_fades(self) -> bool {
        matches!(
            self,
            Self::LeftNormalRightFadeout | Self::LeftFadeoutRightFadeout
        )
    }
}

/// Finger state reported by the swiper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    /// No gesture; page changes come from code or auto-play.
    #[default]
    None,
    /// Finger drags the content so the indicator follows to the left.
    FollowLeft,
    /// Finger drags the content so the indicator follows to the right.
    FollowRight,
    /// Finger lifted after a drag to the left.
    ReleaseLeft,
    /// Finger lifted after a drag to the right.
    ReleaseRight,
}

impl GestureState {
    /// Whether the caller scrubs the transition instead of playing it.
    #[must_use]
    pub const fn is_follow(self) -> bool {
        matches!(self, Self::FollowLeft | Self::FollowRight)
    }
}

/// Direction of a wrap past the first or last page of a looping swiper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchBottomLoop {
    /// No wrap.
    #[default]
    None,
    /// Wrap from the first page to the last one.
    Left,
    /// Wrap from the last page to the first one.
    Right,
}

/// Whether a transition moves the indicator towards lower pages.
///
/// A wrap or a gesture decides the direction; without either, the page
/// numbers do.
#[must_use]
pub fn moves_backward(
    current_page: usize,
    target_page: usize,
    gesture: GestureState,
    touch_bottom: TouchBottomLoop,
) -> bool {
    match touch_bottom {
        TouchBottomLoop::Left => true,
        TouchBottomLoop::Right => false,
        TouchBottomLoop::None => match gesture {
            GestureState::FollowLeft | GestureState::ReleaseLeft => true,
            GestureState::FollowRight | GestureState::ReleaseRight => false,
            GestureState::None => target_page < current_page,
        },
    }
}

/// Selected slot and edge style of the display window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OverlongStatus {
    /// Slot of the selected dot inside the window.
    pub selected_index: usize,
    /// Edge style.
    pub overlong_type: OverlongType,
}

impl OverlongStatus {
    /// Create a status.
    #[must_use]
    pub const fn new(selected_index: usize, overlong_type: OverlongType) -> Self {
        Self {
            selected_index,
            overlong_type,
        }
    }
}

/// Contiguous range of pages mapped onto the visible dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DisplayWindow {
    /// First page shown.
    pub start_index: usize,
    /// Last page shown (inclusive).
    pub end_index: usize,
    /// Dots in the window.
    pub max_display_count: usize,
    /// Pages in the swiper.
    pub real_item_count: usize,
}

impl DisplayWindow {
    /// Window showing `page` on slot `selected_index`.
    #[must_use]
    pub fn new(
        page: usize,
        selected_index: usize,
        max_display_count: usize,
        real_item_count: usize,
    ) -> Self {
        let start_index = page.saturating_sub(selected_index);
        Self {
            start_index,
            end_index: (start_index + max_display_count).saturating_sub(1),
            max_display_count,
            real_item_count,
        }
    }

    /// Whether `page` is visible.
    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        (self.start_index..=self.end_index).contains(&page)
    }
}

/// Status-transition rules for a window of `max_display_count` dots over
/// `real_item_count` pages.
///
/// Only meaningful when there are more pages than dots; callers check this
/// with [`crate::IndicatorConfig::validate_overlength`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlongWindow {
    max_display_count: usize,
    real_item_count: usize,
}

impl OverlongWindow {
    /// Create the rules for a validated window.
    #[must_use]
    pub const fn new(max_display_count: usize, real_item_count: usize) -> Self {
        Self {
            max_display_count,
            real_item_count,
        }
    }

    /// Dots in the window.
    #[must_use]
    pub const fn max_display_count(&self) -> usize {
        self.max_display_count
    }

    /// Pages in the swiper.
    #[must_use]
    pub const fn real_item_count(&self) -> usize {
        self.real_item_count
    }

    /// Slot the selected dot settles on when moving forwards.
    #[must_use]
    pub const fn right_anchor(&self) -> usize {
        self.max_display_count
            .saturating_sub(1 + RIGHT_ANCHOR_OFFSET)
    }

    fn last_page(&self) -> usize {
        self.real_item_count.saturating_sub(1)
    }

    fn last_slot(&self) -> usize {
        self.max_display_count.saturating_sub(1)
    }

    /// Slot of a page close enough to the last one to pin the window.
    fn slot_from_end(&self, page: usize) -> usize {
        self.last_slot()
            .saturating_sub(self.last_page().saturating_sub(page))
    }

    /// Status shown when the indicator first appears on `page`.
    #[must_use]
    pub fn initial_status(&self, page: usize) -> OverlongStatus {
        let page = page.min(self.last_page());
        let status = if page < self.right_anchor() {
            OverlongStatus::new(page, OverlongType::LeftNormalRightFadeout)
        } else if page + RIGHT_ANCHOR_OFFSET >= self.real_item_count {
            OverlongStatus::new(
                self.slot_from_end(page),
                OverlongType::LeftFadeoutRightNormal,
            )
        } else {
            OverlongStatus::new(self.right_anchor(), OverlongType::LeftFadeoutRightFadeout)
        };
        self.clamp(page, status)
    }

    /// Status after moving from `current_page` (shown with `current`) to
    /// `target_page`.
    #[must_use]
    pub fn calc_target_status(
        &self,
        current_page: usize,
        target_page: usize,
        current: OverlongStatus,
    ) -> OverlongStatus {
        let last_page = self.last_page();
        let target_page = target_page.min(last_page);

        if target_page == current_page {
            return current;
        }
        if current_page == last_page && target_page == 0 {
            return OverlongStatus::new(0, OverlongType::LeftNormalRightFadeout);
        }
        if current_page == 0 && target_page == last_page {
            return OverlongStatus::new(self.last_slot(), OverlongType::LeftFadeoutRightNormal);
        }

        let status = if target_page > current_page {
            self.forward(target_page, target_page - current_page, current)
        } else {
            self.backward(target_page, current_page - target_page, current)
        };
        tracing::trace!(
            "Overlong status {current_page}->{target_page}: {:?} -> {:?}",
            current,
            status
        );
        self.clamp(target_page, status)
    }

    fn forward(&self, target_page: usize, step: usize, current: OverlongStatus) -> OverlongStatus {
        if target_page + EDGE_RESERVE >= self.last_page() {
            return OverlongStatus::new(
                self.slot_from_end(target_page),
                OverlongType::LeftFadeoutRightNormal,
            );
        }

        let anchor = self.right_anchor();
        let selected = if current.selected_index < anchor {
            (current.selected_index + step).min(anchor)
        } else {
            current.selected_index
        };
        let overlong_type = if selected >= anchor {
            OverlongType::LeftFadeoutRightFadeout
        } else {
            current.overlong_type
        };
        OverlongStatus::new(selected, overlong_type)
    }

    fn backward(&self, target_page: usize, step: usize, current: OverlongStatus) -> OverlongStatus {
        if target_page <= EDGE_RESERVE {
            return OverlongStatus::new(target_page, OverlongType::LeftNormalRightFadeout);
        }

        let selected = if current.selected_index > LEFT_ANCHOR {
            current.selected_index.saturating_sub(step).max(LEFT_ANCHOR)
        } else {
            current.selected_index
        };
        let overlong_type = if selected <= LEFT_ANCHOR {
            OverlongType::LeftFadeoutRightFadeout
        } else {
            current.overlong_type
        };
        OverlongStatus::new(selected, overlong_type)
    }

    /// Keep the window inside `[0, real_item_count)`.
    fn clamp(&self, page: usize, status: OverlongStatus) -> OverlongStatus {
        let hidden_pages = self.real_item_count.saturating_sub(self.max_display_count);
        let low = page.saturating_sub(hidden_pages);
        let high = self.last_slot().min(page);
        OverlongStatus::new(
            status.selected_index.clamp(low, high.max(low)),
            status.overlong_type,
        )
    }

    /// Window showing `page` with `status`.
    #[must_use]
    pub fn display_window(&self, page: usize, status: OverlongStatus) -> DisplayWindow {
        DisplayWindow::new(
            page,
            status.selected_index,
            self.max_display_count,
            self.real_item_count,
        )
    }
}
