//! Page-addressed dot layouts used as animation endpoints.
//!
//! A [`DotLayout`] labels each slot with the page it shows (`base_page + slot`).
//! Two layouts with the same base can be blended slot by slot, which is how a
//! one-page window shift slides a dot in at one edge and out at the other.

use ace_core::lerp;

use crate::geometry::{DotRecord, IndicatorGeometry, LongPoint};

/// Dots, long dot and selection of one frame, addressed by page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DotLayout {
    /// Page shown by slot 0.
    pub base_page: usize,
    /// Slots; one more than the window holds, the spare one hidden at rest.
    pub dots: Vec<DotRecord>,
    /// Selected dot span.
    pub long_point: LongPoint,
    /// Slot of the selected dot.
    pub selected_slot: usize,
}

impl DotLayout {
    /// Layout of a resting frame with a hidden spare slot after the last dot.
    #[must_use]
    pub fn from_geometry(geometry: &IndicatorGeometry, spacing: f32) -> Self {
        let mut dots = geometry.dots.clone();
        let spare = dots
            .last()
            .map_or(0.0, |dot| dot.center_x + spacing);
        dots.push(DotRecord::hidden(spare));
        Self {
            base_page: geometry.window.start_index,
            dots,
            long_point: geometry.long_point,
            selected_slot: geometry.selected_index,
        }
    }

    /// Page shown by the selected slot.
    #[must_use]
    pub fn selected_page(&self) -> usize {
        self.base_page + self.selected_slot
    }

    /// Re-address the slots so slot 0 shows `base_page`.
    ///
    /// Pages this layout does not cover become hidden slots stacked next to
    /// the nearest edge slot, so they can grow out of (or shrink into) it.
    #[must_use]
    pub fn rebase(&self, base_page: usize, spacing: f32) -> Self {
        let len = self.dots.len();
        let (Some(first), Some(last)) = (self.dots.first(), self.dots.last()) else {
            return Self {
                base_page,
                ..Self::default()
            };
        };
        let last_page = self.base_page + len - 1;

        #[allow(clippy::cast_precision_loss)]
        let dots = (0..len)
            .map(|slot| {
                let page = base_page + slot;
                if page < self.base_page {
                    DotRecord::hidden(first.center_x - spacing * (self.base_page - page) as f32)
                } else if page > last_page {
                    DotRecord::hidden(last.center_x + spacing * (page - last_page) as f32)
                } else {
                    self.dots[page - self.base_page]
                }
            })
            .collect();

        Self {
            base_page,
            dots,
            long_point: self.long_point,
            selected_slot: self
                .selected_page()
                .saturating_sub(base_page)
                .min(len - 1),
        }
    }

    /// Keep the slots as they are but label them from `base_page`.
    ///
    /// Used for jumps too far for a slide: each dot morphs in place.
    #[must_use]
    pub fn relabel(&self, base_page: usize) -> Self {
        Self {
            base_page,
            ..self.clone()
        }
    }

    /// Blend towards `end`.
    ///
    /// Dots move with `points`, the long dot caps with `long_left` and
    /// `long_right`. Springs may pass values above `1.0`.
    #[must_use]
    pub fn blend(&self, end: &Self, points: f32, long_left: f32, long_right: f32) -> Self {
        let dots = self
            .dots
            .iter()
            .zip(&end.dots)
            .map(|(from, to)| DotRecord {
                center_x: lerp(from.center_x, to.center_x, points),
                width: lerp(from.width, to.width, points).max(0.0),
                height: lerp(from.height, to.height, points).max(0.0),
                opacity: lerp(from.opacity, to.opacity, points).clamp(0.0, 1.0),
            })
            .collect();
        Self {
            base_page: end.base_page,
            dots,
            long_point: LongPoint {
                left_center_x: lerp(
                    self.long_point.left_center_x,
                    end.long_point.left_center_x,
                    long_left,
                ),
                right_center_x: lerp(
                    self.long_point.right_center_x,
                    end.long_point.right_center_x,
                    long_right,
                ),
            },
            selected_slot: end.selected_slot,
        }
    }

    /// Copy of this layout with the long dot stretched to the outermost
    /// visible dot on one side.
    #[must_use]
    pub fn stretched_to_edge(&self, towards_start: bool) -> Self {
        let mut visible = self.dots.iter().filter(|dot| dot.is_visible());
        let edge = if towards_start {
            visible.next()
        } else {
            visible.last()
        };
        let mut stretched = self.clone();
        if let Some(edge) = edge {
            if towards_start {
                stretched.long_point.left_center_x = edge.center_x;
            } else {
                stretched.long_point.right_center_x = edge.center_x;
            }
        }
        stretched
    }

    /// Copy of this layout with the long dot collapsed onto the outermost
    /// visible dot on one side.
    #[must_use]
    pub fn collapsed_at_edge(&self, at_start: bool) -> Self {
        let mut visible = self.dots.iter().filter(|dot| dot.is_visible());
        let edge = if at_start {
            visible.next()
        } else {
            visible.last()
        };
        let mut collapsed = self.clone();
        if let Some(edge) = edge {
            collapsed.long_point = LongPoint {
                left_center_x: edge.center_x,
                right_center_x: edge.center_x,
            };
        }
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndicatorConfig;
    use crate::geometry::GeometryCalculator;

    fn resting(calc: &GeometryCalculator, page: usize) -> DotLayout {
        let status = calc.initial_status(page);
        DotLayout::from_geometry(&calc.layout(page, status), calc.style().item_spacing)
    }

    #[test]
    fn test_spare_slot_is_hidden() {
        let calc = GeometryCalculator::from_config(&IndicatorConfig::new(10).with_max_display_count(6));
        let layout = resting(&calc, 0);
        assert_eq!(layout.dots.len(), 7);
        assert!(!layout.dots[6].is_visible());
        assert!(layout.dots[6].center_x > layout.dots[5].center_x);
        assert_eq!(layout.selected_page(), 0);
    }

    #[test]
    fn test_rebase_slides_window_back() {
        let calc = GeometryCalculator::from_config(&IndicatorConfig::new(10).with_max_display_count(6));
        // window 2..=7, slid back one page at a time
        let layout = resting(&calc, 4).rebase(1, 8.0);
        assert_eq!(layout.base_page, 1);

        let shifted = layout.rebase(0, 8.0);
        assert_eq!(shifted.base_page, 0);
        assert!(!shifted.dots[0].is_visible());
        assert!((shifted.dots[0].center_x - (layout.dots[0].center_x - 8.0)).abs() < 1e-5);
        assert_eq!(shifted.dots[1], layout.dots[0]);
        assert_eq!(shifted.selected_page(), layout.selected_page());
    }

    #[test]
    fn test_blend_endpoints() {
        let calc = GeometryCalculator::from_config(&IndicatorConfig::new(10).with_max_display_count(6));
        let start = resting(&calc, 0);
        let end = resting(&calc, 1);
        assert_eq!(start.blend(&end, 0.0, 0.0, 0.0).dots, start.dots);
        let blended = start.blend(&end, 1.0, 1.0, 1.0);
        assert_eq!(blended.selected_slot, end.selected_slot);
        for (dot, expected) in blended.dots.iter().zip(&end.dots) {
            assert!((dot.center_x - expected.center_x).abs() < 1e-4);
            assert!((dot.width - expected.width).abs() < 1e-4);
        }
    }

    #[test]
    fn test_edge_helpers() {
        let calc = GeometryCalculator::from_config(&IndicatorConfig::new(4));
        let layout = resting(&calc, 3);
        let stretched = layout.stretched_to_edge(true);
        assert!((stretched.long_point.left_center_x - layout.dots[0].center_x).abs() < 1e-5);
        assert!(
            (stretched.long_point.right_center_x - layout.long_point.right_center_x).abs() < 1e-5
        );

        let collapsed = layout.collapsed_at_edge(false);
        assert!(
            (collapsed.long_point.left_center_x - collapsed.long_point.right_center_x).abs()
                < 1e-5
        );
        assert!((collapsed.long_point.left_center_x - layout.dots[3].center_x).abs() < 1e-5);
    }
}
