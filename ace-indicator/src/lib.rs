//! # Ace Indicator
//!
//! Swiper dot indicator: geometry, page-change animation and painting.
//!
//! When a swiper has more pages than the indicator can show, a window of
//! 6 to 9 dots slides over the pages and the dots at an edge with hidden
//! pages behind it shrink. Any other configuration shows one dot per page.
//!
//! ## Example
//!
//! ```
//! use ace_indicator::{DotIndicatorModifier, GestureState, IndicatorConfig, TouchBottomLoop};
//!
//! let mut indicator = DotIndicatorModifier::new(IndicatorConfig::new(10).with_max_display_count(6));
//! indicator.play_indicator_animation(0, 1, GestureState::None, TouchBottomLoop::None);
//!
//! let mut now_ms = 0;
//! while indicator.on_frame(now_ms) {
//!     now_ms += 16;
//! }
//! assert_eq!(indicator.current_page(), 1);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod modifier;
pub mod overlong;
pub mod paint;

pub use config::{
    DotIndicatorStyle, EdgeRatios, IndicatorConfig, IndicatorCurves, MAX_OVERLENGTH_DISPLAY_COUNT,
    MIN_OVERLENGTH_DISPLAY_COUNT,
};
pub use error::{IndicatorError, IndicatorResult};
pub use geometry::{
    DotRecord, GeometryCalculator, IndicatorGeometry, IndicatorMode, ItemHalfSizes, LongPoint,
};
pub use layout::DotLayout;
pub use modifier::{DotIndicatorModifier, MoveRates, WindowShift};
pub use overlong::{
    DisplayWindow, GestureState, OverlongStatus, OverlongType, OverlongWindow, TouchBottomLoop,
    EDGE_RESERVE, LEFT_ANCHOR,
};
pub use paint::paint_indicator;
