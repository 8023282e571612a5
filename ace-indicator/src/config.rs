//! Indicator configuration.
//!
//! All values are plain data with defaults matching the stock swiper
//! indicator; hosts override them from JSON with [`IndicatorConfig::from_json`].

use ace_core::{AnimationOption, Axis, Color, Curve};
use serde::{Deserialize, Serialize};

use crate::geometry::ItemHalfSizes;
use crate::{IndicatorError, IndicatorResult};

/// Smallest display window the windowed layout supports.
pub const MIN_OVERLENGTH_DISPLAY_COUNT: usize = 6;

/// Largest display window the windowed layout supports.
pub const MAX_OVERLENGTH_DISPLAY_COUNT: usize = 9;

/// Visual style of the dots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotIndicatorStyle {
    /// Width of an unselected dot.
    pub item_width: f32,
    /// Height of an unselected dot.
    pub item_height: f32,
    /// Width of the selected (long) dot.
    pub selected_item_width: f32,
    /// Height of the selected (long) dot.
    pub selected_item_height: f32,
    /// Gap between neighbouring dots.
    pub item_spacing: f32,
    /// Inner padding between the indicator bounds and the first dot.
    pub padding: f32,
    /// Offset of the indicator bounds along the main axis.
    pub margin_x: f32,
    /// Offset of the indicator bounds along the cross axis.
    pub margin_y: f32,
    /// Unselected dot color.
    pub color: Color,
    /// Selected dot color.
    pub selected_color: Color,
    /// Color the long dot fades to while looping past the first/last page.
    pub touch_bottom_color: Color,
    /// Optional background drawn behind the dots.
    pub background_color: Option<Color>,
    /// Layout direction.
    pub axis: Axis,
}

impl Default for DotIndicatorStyle {
    fn default() -> Self {
        Self {
            item_width: 6.0,
            item_height: 6.0,
            selected_item_width: 12.0,
            selected_item_height: 6.0,
            item_spacing: 8.0,
            padding: 12.0,
            margin_x: 0.0,
            margin_y: 0.0,
            color: Color::from_argb(0x1A18_2431),
            selected_color: Color::from_argb(0xFF00_7DFF),
            touch_bottom_color: Color::from_argb(0x6600_7DFF),
            background_color: None,
            axis: Axis::Horizontal,
        }
    }
}

impl DotIndicatorStyle {
    /// Half extents of unselected and selected dots.
    #[must_use]
    pub fn half_sizes(&self) -> ItemHalfSizes {
        ItemHalfSizes {
            item_half_width: self.item_width * 0.5,
            item_half_height: self.item_height * 0.5,
            selected_half_width: self.selected_item_width * 0.5,
            selected_half_height: self.selected_item_height * 0.5,
        }
    }

    /// Main-axis position where the first dot starts.
    #[must_use]
    pub fn content_start(&self) -> f32 {
        self.margin_x + self.padding
    }

    /// Cross-axis center line of every dot.
    #[must_use]
    pub fn cross_center(&self) -> f32 {
        self.margin_y + self.padding + self.item_height.max(self.selected_item_height) * 0.5
    }
}

/// Shrink factors applied to the dots on a fading window edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeRatios {
    /// Scale of the outermost dot.
    pub outermost: f32,
    /// Scale of the dot next to the outermost one.
    pub second: f32,
}

impl Default for EdgeRatios {
    fn default() -> Self {
        Self {
            outermost: 1.0 / 3.0,
            second: 2.0 / 3.0,
        }
    }
}

/// Curves and timings of the page-change animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorCurves {
    /// Curve moving every dot's position, size and opacity.
    pub points: Curve,
    /// Duration of the dot movement in milliseconds.
    pub points_duration_ms: u32,
    /// Spring of the long dot edge that leads in the direction of travel.
    pub long_point_leading: Curve,
    /// Spring of the long dot edge that trails behind.
    pub long_point_trailing: Curve,
    /// Duration of each half of the loop-past-the-edge animation.
    pub touch_bottom_duration_ms: u32,
}

impl Default for IndicatorCurves {
    fn default() -> Self {
        Self {
            points: Curve::Friction,
            points_duration_ms: 400,
            long_point_leading: Curve::spring(0.0, 1.0, 228.0, 30.0),
            long_point_trailing: Curve::spring(0.0, 1.0, 81.0, 11.0),
            touch_bottom_duration_ms: 200,
        }
    }
}

impl IndicatorCurves {
    /// Option for the all-dots animation.
    #[must_use]
    pub fn points_option(&self) -> AnimationOption {
        AnimationOption::new(self.points_duration_ms, self.points)
    }

    /// Option for one long dot edge.
    #[must_use]
    pub fn long_point_option(&self, leading: bool) -> AnimationOption {
        let curve = if leading {
            self.long_point_leading
        } else {
            self.long_point_trailing
        };
        AnimationOption::new(self.points_duration_ms, curve)
    }

    /// Option for one half of the loop animation.
    #[must_use]
    pub fn touch_bottom_option(&self) -> AnimationOption {
        AnimationOption::new(self.touch_bottom_duration_ms, self.points)
    }
}

/// Full indicator configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Dot style.
    pub style: DotIndicatorStyle,
    /// Number of pages.
    pub real_item_count: usize,
    /// Size of the display window, `None` to always show every page.
    pub max_display_count: Option<usize>,
    /// Edge shrink factors of the windowed layout.
    pub edge_ratios: EdgeRatios,
    /// Animation curves.
    pub curves: IndicatorCurves,
}

impl IndicatorConfig {
    /// Configuration for `real_item_count` pages with default style.
    #[must_use]
    pub fn new(real_item_count: usize) -> Self {
        Self {
            real_item_count,
            ..Self::default()
        }
    }

    /// Set the display window size.
    #[must_use]
    pub fn with_max_display_count(mut self, max_display_count: usize) -> Self {
        self.max_display_count = Some(max_display_count);
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> IndicatorResult<Self> {
        serde_json::from_str(json).map_err(IndicatorError::Serialization)
    }

    /// Serialize the configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> IndicatorResult<String> {
        serde_json::to_string(self).map_err(IndicatorError::Serialization)
    }

    /// Check whether the windowed layout applies and return its window size.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError::InvalidGeometryRequest`] when no window is
    /// configured, the window is outside
    /// `[MIN_OVERLENGTH_DISPLAY_COUNT, MAX_OVERLENGTH_DISPLAY_COUNT]`, or every
    /// page already fits.
    pub fn validate_overlength(&self) -> IndicatorResult<usize> {
        let Some(count) = self.max_display_count else {
            return Err(IndicatorError::InvalidGeometryRequest(
                "no display window configured".to_string(),
            ));
        };
        if !(MIN_OVERLENGTH_DISPLAY_COUNT..=MAX_OVERLENGTH_DISPLAY_COUNT).contains(&count) {
            return Err(IndicatorError::InvalidGeometryRequest(format!(
                "max display count {count} outside [{MIN_OVERLENGTH_DISPLAY_COUNT}, {MAX_OVERLENGTH_DISPLAY_COUNT}]"
            )));
        }
        if self.real_item_count <= count {
            return Err(IndicatorError::InvalidGeometryRequest(format!(
                "{} pages fit in a window of {count}",
                self.real_item_count
            )));
        }
        Ok(count)
    }
}
