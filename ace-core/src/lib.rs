//! # Ace Core
//!
//! Shared primitives for the Ace native engine: geometry, colors, the drawing
//! surface the paint methods talk to, and the frame-driven animation
//! scheduler the indicator engine runs on.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  ace-core                   │
//! ├──────────────────────┬──────────────────────┤
//! │  Drawing             │  Animation           │
//! │  - GraphicsSurface   │  - Curves / springs  │
//! │  - Paintable         │  - FrameAnimator     │
//! │  - RecordingSurface  │  - ObservedValue     │
//! ├──────────────────────┴──────────────────────┤
//! │  Geometry (PointF / SizeF / RectF), Color   │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animator;
pub mod color;
pub mod curve;
pub mod error;
pub mod geometry;
pub mod observe;
pub mod recording;
pub mod surface;

pub use animator::{AnimationHandle, AnimationOption, AnimationScheduler, FrameAnimator};
pub use color::Color;
pub use curve::Curve;
pub use error::{CoreError, CoreResult};
pub use geometry::{lerp, Axis, PointF, RectF, SizeF};
pub use observe::{ObservedValue, Observer};
pub use recording::{DrawCommand, RecordingSurface};
pub use surface::{Brush, DrawingContext, GraphicsSurface, Paintable, Pen};

/// Ace core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
