//! Pure dot geometry.
//!
//! The calculator places dots along the main axis; everything is computed in
//! horizontal coordinates and transposed at paint time for vertical
//! indicators.

use serde::{Deserialize, Serialize};

use crate::config::{DotIndicatorStyle, EdgeRatios, IndicatorConfig};
use crate::overlong::{DisplayWindow, OverlongStatus, OverlongType, OverlongWindow};

/// Half extents of unselected and selected dots.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemHalfSizes {
    /// Half width of an unselected dot.
    pub item_half_width: f32,
    /// Half height of an unselected dot.
    pub item_half_height: f32,
    /// Half width of the selected dot.
    pub selected_half_width: f32,
    /// Half height of the selected dot.
    pub selected_half_height: f32,
}

/// One dot slot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DotRecord {
    /// Main-axis center.
    pub center_x: f32,
    /// Main-axis extent.
    pub width: f32,
    /// Cross-axis extent.
    pub height: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

impl DotRecord {
    /// A slot that takes no space and draws nothing.
    #[must_use]
    pub const fn hidden(center_x: f32) -> Self {
        Self {
            center_x,
            width: 0.0,
            height: 0.0,
            opacity: 0.0,
        }
    }

    /// Whether the slot draws anything.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && self.width > 0.0 && self.height > 0.0
    }
}

/// Span of the selected (long) dot, as the centers of its rounded ends.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LongPoint {
    /// Center of the left cap.
    pub left_center_x: f32,
    /// Center of the right cap.
    pub right_center_x: f32,
}

/// A complete indicator frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorGeometry {
    /// Dot slots in main-axis order.
    pub dots: Vec<DotRecord>,
    /// Selected dot span.
    pub long_point: LongPoint,
    /// Slot of the selected dot.
    pub selected_index: usize,
    /// Edge style.
    pub overlong_type: OverlongType,
    /// Pages mapped onto the slots.
    pub window: DisplayWindow,
}

impl IndicatorGeometry {
    /// Number of slots that draw something.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.dots.iter().filter(|dot| dot.is_visible()).count()
    }
}

/// Which layout the calculator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMode {
    /// Sliding window over more pages than dots.
    Overlength(OverlongWindow),
    /// One dot per page.
    Unbounded {
        /// Pages in the swiper.
        real_item_count: usize,
    },
}

impl IndicatorMode {
    /// Number of dots laid out at rest.
    #[must_use]
    pub const fn display_count(&self) -> usize {
        match self {
            Self::Overlength(window) => window.max_display_count(),
            Self::Unbounded { real_item_count } => *real_item_count,
        }
    }

    /// Pages in the swiper.
    #[must_use]
    pub const fn real_item_count(&self) -> usize {
        match self {
            Self::Overlength(window) => window.real_item_count(),
            Self::Unbounded { real_item_count } => *real_item_count,
        }
    }
}

/// Computes dot positions and sizes for a given selection.
#[derive(Debug, Clone)]
pub struct GeometryCalculator {
    style: DotIndicatorStyle,
    edge_ratios: EdgeRatios,
    mode: IndicatorMode,
}

impl GeometryCalculator {
    /// Create a calculator, falling back to the unbounded layout when the
    /// window configuration is unusable.
    #[must_use]
    pub fn from_config(config: &IndicatorConfig) -> Self {
        let mode = match config.validate_overlength() {
            Ok(count) => IndicatorMode::Overlength(OverlongWindow::new(count, config.real_item_count)),
            Err(err) => {
                if config.max_display_count.is_some() {
                    tracing::warn!("Overlength indicator disabled: {err}");
                }
                IndicatorMode::Unbounded {
                    real_item_count: config.real_item_count,
                }
            }
        };
        Self {
            style: config.style.clone(),
            edge_ratios: config.edge_ratios,
            mode,
        }
    }

    /// Layout mode in use.
    #[must_use]
    pub const fn mode(&self) -> IndicatorMode {
        self.mode
    }

    /// Whether the sliding window is active.
    #[must_use]
    pub const fn is_overlength(&self) -> bool {
        matches!(self.mode, IndicatorMode::Overlength(_))
    }

    /// Dot style.
    #[must_use]
    pub const fn style(&self) -> &DotIndicatorStyle {
        &self.style
    }

    /// Scale applied to `slot` of `count` slots for the given edge style.
    fn edge_scale(&self, slot: usize, count: usize, overlong_type: OverlongType) -> f32 {
        let from_right = count.saturating_sub(1).saturating_sub(slot);
        let ratio_for = |distance: usize| match distance {
            0 => Some(self.edge_ratios.outermost),
            1 => Some(self.edge_ratios.second),
            _ => None,
        };
        let left = overlong_type
            .left_fades()
            .then(|| ratio_for(slot))
            .flatten();
        let right = overlong_type
            .right_fades()
            .then(|| ratio_for(from_right))
            .flatten();
        match (left, right) {
            (Some(l), Some(r)) => l.min(r),
            (Some(scale), None) | (None, Some(scale)) => scale,
            (None, None) => 1.0,
        }
    }

    fn clamp_selected(selected_index: usize, count: usize) -> usize {
        if count > 0 && selected_index >= count {
            tracing::warn!("Selected index {selected_index} outside {count} dots; clamping");
            return count - 1;
        }
        selected_index
    }

    /// Main-axis centers of `count` slots and the long dot span.
    ///
    /// The cursor starts at `margin_x + padding` and `item_spacing` separates
    /// neighbouring slots. Unselected slots on a fading edge shrink by the
    /// configured edge ratios; the selected slot keeps its full width.
    #[must_use]
    pub fn calc_indicator_center_x(
        &self,
        half_sizes: &ItemHalfSizes,
        selected_index: usize,
        overlong_type: OverlongType,
        count: usize,
    ) -> (Vec<f32>, LongPoint) {
        let selected_index = Self::clamp_selected(selected_index, count);
        let mut centers = Vec::with_capacity(count);
        let mut cursor = self.style.content_start();
        let mut long_point = LongPoint::default();

        for slot in 0..count {
            if slot > 0 {
                cursor += self.style.item_spacing;
            }
            let half_width = if slot == selected_index {
                half_sizes.selected_half_width
            } else {
                half_sizes.item_half_width * self.edge_scale(slot, count, overlong_type)
            };
            let center = cursor + half_width;
            if slot == selected_index {
                let reach = half_sizes.selected_half_width - half_sizes.selected_half_height;
                long_point = LongPoint {
                    left_center_x: center - reach,
                    right_center_x: center + reach,
                };
            }
            centers.push(center);
            cursor += half_width * 2.0;
        }
        (centers, long_point)
    }

    /// `(width, height)` of `count` slots with edge scaling applied to both
    /// dimensions.
    #[must_use]
    pub fn calc_indicator_size(
        &self,
        half_sizes: &ItemHalfSizes,
        selected_index: usize,
        overlong_type: OverlongType,
        count: usize,
    ) -> Vec<(f32, f32)> {
        let selected_index = Self::clamp_selected(selected_index, count);
        (0..count)
            .map(|slot| {
                if slot == selected_index {
                    (
                        half_sizes.selected_half_width * 2.0,
                        half_sizes.selected_half_height * 2.0,
                    )
                } else {
                    let scale = self.edge_scale(slot, count, overlong_type);
                    (
                        half_sizes.item_half_width * 2.0 * scale,
                        half_sizes.item_half_height * 2.0 * scale,
                    )
                }
            })
            .collect()
    }

    /// Status of the indicator when it first shows `page`.
    #[must_use]
    pub fn initial_status(&self, page: usize) -> OverlongStatus {
        match self.mode {
            IndicatorMode::Overlength(window) => window.initial_status(page),
            IndicatorMode::Unbounded { real_item_count } => OverlongStatus::new(
                page.min(real_item_count.saturating_sub(1)),
                OverlongType::None,
            ),
        }
    }

    /// Status after moving from `current_page` to `target_page`.
    #[must_use]
    pub fn calc_target_status(
        &self,
        current_page: usize,
        target_page: usize,
        current: OverlongStatus,
    ) -> OverlongStatus {
        match self.mode {
            IndicatorMode::Overlength(window) => {
                window.calc_target_status(current_page, target_page, current)
            }
            IndicatorMode::Unbounded { .. } => self.initial_status(target_page),
        }
    }

    /// Window mapping pages onto slots for `page` shown with `status`.
    #[must_use]
    pub fn display_window(&self, page: usize, status: OverlongStatus) -> DisplayWindow {
        match self.mode {
            IndicatorMode::Overlength(window) => window.display_window(page, status),
            IndicatorMode::Unbounded { real_item_count } => {
                DisplayWindow::new(0, 0, real_item_count, real_item_count)
            }
        }
    }

    /// Full frame for `page` shown with `status`.
    #[must_use]
    pub fn layout(&self, page: usize, status: OverlongStatus) -> IndicatorGeometry {
        let count = self.mode.display_count();
        let half_sizes = self.style.half_sizes();
        let (centers, long_point) = self.calc_indicator_center_x(
            &half_sizes,
            status.selected_index,
            status.overlong_type,
            count,
        );
        let sizes = self.calc_indicator_size(
            &half_sizes,
            status.selected_index,
            status.overlong_type,
            count,
        );
        let dots = centers
            .into_iter()
            .zip(sizes)
            .map(|(center_x, (width, height))| DotRecord {
                center_x,
                width,
                height,
                opacity: 1.0,
            })
            .collect();
        IndicatorGeometry {
            dots,
            long_point,
            selected_index: Self::clamp_selected(status.selected_index, count),
            overlong_type: status.overlong_type,
            window: self.display_window(page, status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator(pages: usize, window: Option<usize>) -> GeometryCalculator {
        let mut config = IndicatorConfig::new(pages);
        config.max_display_count = window;
        GeometryCalculator::from_config(&config)
    }

    #[test]
    fn test_unbounded_spacing() {
        let calc = calculator(4, None);
        let half = calc.style().half_sizes();
        let (centers, long_point) = calc.calc_indicator_center_x(&half, 1, OverlongType::None, 4);
        // padding 12, dot 6, spacing 8, selected 12
        for (center, expected) in centers.iter().zip([15.0, 32.0, 49.0, 63.0]) {
            assert!((center - expected).abs() < f32::EPSILON);
        }
        assert!((long_point.left_center_x - 29.0).abs() < f32::EPSILON);
        assert!((long_point.right_center_x - 35.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_edge_scaling() {
        let calc = calculator(10, Some(6));
        let half = calc.style().half_sizes();
        let sizes =
            calc.calc_indicator_size(&half, 2, OverlongType::LeftFadeoutRightFadeout, 6);
        assert!((sizes[0].0 - 2.0).abs() < 1e-5);
        assert!((sizes[1].0 - 4.0).abs() < 1e-5);
        assert!((sizes[2].0 - 12.0).abs() < 1e-5);
        assert!((sizes[3].0 - 6.0).abs() < 1e-5);
        assert!((sizes[4].0 - 4.0).abs() < 1e-5);
        assert!((sizes[5].0 - 2.0).abs() < 1e-5);
        assert!((sizes[5].1 - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_selected_edge_slot_never_shrinks() {
        let calc = calculator(10, Some(6));
        let half = calc.style().half_sizes();
        let sizes = calc.calc_indicator_size(&half, 5, OverlongType::LeftFadeoutRightNormal, 6);
        assert!((sizes[5].0 - 12.0).abs() < 1e-5);
        assert!((sizes[0].0 - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_centers_strictly_increase() {
        let calc = calculator(10, Some(6));
        let half = calc.style().half_sizes();
        for overlong_type in [
            OverlongType::LeftNormalRightFadeout,
            OverlongType::LeftFadeoutRightFadeout,
            OverlongType::LeftFadeoutRightNormal,
        ] {
            for selected in 0..6 {
                let (centers, _) = calc.calc_indicator_center_x(&half, selected, overlong_type, 6);
                assert!(centers.windows(2).all(|pair| pair[0] < pair[1]));
            }
        }
    }

    #[test]
    fn test_out_of_range_selection_is_clamped() {
        let calc = calculator(10, Some(6));
        let half = calc.style().half_sizes();
        let (centers, long_point) =
            calc.calc_indicator_center_x(&half, 42, OverlongType::LeftNormalRightFadeout, 6);
        assert_eq!(centers.len(), 6);
        assert!(long_point.right_center_x > centers[4]);
    }

    #[test]
    fn test_invalid_window_falls_back() {
        assert!(!calculator(10, Some(3)).is_overlength());
        assert!(!calculator(5, Some(6)).is_overlength());
        assert!(calculator(10, Some(9)).is_overlength());

        let calc = calculator(10, Some(3));
        let geometry = calc.layout(7, calc.initial_status(7));
        assert_eq!(geometry.dots.len(), 10);
        assert_eq!(geometry.selected_index, 7);
        assert_eq!(geometry.overlong_type, OverlongType::None);
        assert!(geometry.dots.iter().all(|dot| (dot.width - 6.0).abs() < 1e-5
            || (dot.width - 12.0).abs() < 1e-5));
    }

    #[test]
    fn test_layout_window() {
        let calc = calculator(10, Some(6));
        let status = calc.initial_status(5);
        let geometry = calc.layout(5, status);
        assert_eq!(geometry.visible_count(), 6);
        assert_eq!(geometry.window.start_index, 3);
        assert_eq!(geometry.window.end_index, 8);
    }
}
