//! Drawing surface abstraction.
//!
//! The graphics backend (Skia, Drawing, a GPU canvas...) supplies an
//! implementation of [`GraphicsSurface`]; paint methods only ever issue the
//! primitive calls below through a [`DrawingContext`].

use crate::{Color, PointF, RectF};

/// Fill style attached before drawing filled shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    /// Fill color.
    pub color: Color,
    /// Whether edges are anti-aliased.
    pub anti_alias: bool,
}

impl Brush {
    /// An anti-aliased brush of the given color.
    #[must_use]
    pub const fn new(color: Color) -> Self {
        Self {
            color,
            anti_alias: true,
        }
    }
}

/// Stroke style attached before drawing outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f32,
    /// Whether edges are anti-aliased.
    pub anti_alias: bool,
}

impl Pen {
    /// An anti-aliased pen of the given color and width.
    #[must_use]
    pub const fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            anti_alias: true,
        }
    }
}

/// Canvas primitives consumed by paint methods.
///
/// Angles are in degrees; a negative sweep runs counter-clockwise.
pub trait GraphicsSurface {
    /// Use `brush` for subsequent fills.
    fn attach_brush(&mut self, brush: &Brush);

    /// Stop filling.
    fn detach_brush(&mut self);

    /// Use `pen` for subsequent strokes.
    fn attach_pen(&mut self, pen: &Pen);

    /// Stop stroking.
    fn detach_pen(&mut self);

    /// Draw a circle.
    fn draw_circle(&mut self, center: PointF, radius: f32);

    /// Draw a rectangle with elliptical corners.
    fn draw_round_rect(&mut self, rect: RectF, rx: f32, ry: f32);

    /// Draw an arc inscribed in `rect`.
    fn draw_arc(&mut self, rect: RectF, start_angle: f32, sweep_angle: f32);

    /// Intersect the clip with `rect`.
    fn clip_rect(&mut self, rect: RectF);

    /// Push the current clip/transform state.
    fn save(&mut self);

    /// Pop the state pushed by the matching [`GraphicsSurface::save`].
    fn restore(&mut self);
}

/// Per-frame drawing context handed to [`Paintable::on_draw`].
pub struct DrawingContext<'a> {
    /// The surface to draw on.
    pub surface: &'a mut dyn GraphicsSurface,
    /// Width of the content area.
    pub width: f32,
    /// Height of the content area.
    pub height: f32,
}

impl<'a> DrawingContext<'a> {
    /// Create a drawing context over `surface`.
    pub fn new(surface: &'a mut dyn GraphicsSurface, width: f32, height: f32) -> Self {
        Self {
            surface,
            width,
            height,
        }
    }
}

impl std::fmt::Debug for DrawingContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Anything that paints itself onto a [`DrawingContext`].
pub trait Paintable {
    /// Issue the draw calls for the current frame.
    fn on_draw(&self, context: &mut DrawingContext<'_>);
}
