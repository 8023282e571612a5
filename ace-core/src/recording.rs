//! A [`GraphicsSurface`] that records draw calls instead of rasterizing.
//!
//! Used by hosts that replay the command list onto a real canvas later, and
//! by tests asserting on what a paint method drew.

use crate::{Brush, Color, GraphicsSurface, Pen, PointF, RectF};

/// One recorded drawing operation, with the styles active when it was issued.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// A circle.
    Circle {
        /// Center point.
        center: PointF,
        /// Radius.
        radius: f32,
        /// Active fill, if any.
        fill: Option<Color>,
        /// Active stroke, if any.
        stroke: Option<Color>,
    },
    /// A rounded rectangle.
    RoundRect {
        /// Bounds.
        rect: RectF,
        /// Horizontal corner radius.
        rx: f32,
        /// Vertical corner radius.
        ry: f32,
        /// Active fill, if any.
        fill: Option<Color>,
        /// Active stroke, if any.
        stroke: Option<Color>,
    },
    /// An arc.
    Arc {
        /// Bounds of the ellipse the arc lies on.
        rect: RectF,
        /// Start angle in degrees.
        start_angle: f32,
        /// Sweep in degrees, negative for counter-clockwise.
        sweep_angle: f32,
        /// Active fill, if any.
        fill: Option<Color>,
        /// Active stroke, if any.
        stroke: Option<Color>,
    },
    /// A clip intersection.
    ClipRect(RectF),
    /// State push.
    Save,
    /// State pop.
    Restore,
}

impl DrawCommand {
    /// Fill color of a shape command.
    #[must_use]
    pub fn fill(&self) -> Option<Color> {
        match self {
            Self::Circle { fill, .. } | Self::RoundRect { fill, .. } | Self::Arc { fill, .. } => {
                *fill
            }
            Self::ClipRect(_) | Self::Save | Self::Restore => None,
        }
    }
}

/// Surface recording every call into a command list.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    brush: Option<Brush>,
    pen: Option<Pen>,
    save_depth: usize,
}

impl RecordingSurface {
    /// Create an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Only the round-rect commands, in drawing order.
    pub fn round_rects(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::RoundRect { .. }))
    }

    /// Current `save` nesting depth.
    #[must_use]
    pub fn save_depth(&self) -> usize {
        self.save_depth
    }

    /// Drop every recorded command and reset styles.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.brush = None;
        self.pen = None;
        self.save_depth = 0;
    }

    fn fill(&self) -> Option<Color> {
        self.brush.map(|b| b.color)
    }

    fn stroke(&self) -> Option<Color> {
        self.pen.map(|p| p.color)
    }
}

impl GraphicsSurface for RecordingSurface {
    fn attach_brush(&mut self, brush: &Brush) {
        self.brush = Some(*brush);
    }

    fn detach_brush(&mut self) {
        self.brush = None;
    }

    fn attach_pen(&mut self, pen: &Pen) {
        self.pen = Some(*pen);
    }

    fn detach_pen(&mut self) {
        self.pen = None;
    }

    fn draw_circle(&mut self, center: PointF, radius: f32) {
        tracing::trace!("Record circle at ({}, {}) r={radius}", center.x, center.y);
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            fill: self.fill(),
            stroke: self.stroke(),
        });
    }

    fn draw_round_rect(&mut self, rect: RectF, rx: f32, ry: f32) {
        tracing::trace!(
            "Record round rect ({}, {}, {}, {}) r=({rx}, {ry})",
            rect.left,
            rect.top,
            rect.right,
            rect.bottom
        );
        self.commands.push(DrawCommand::RoundRect {
            rect,
            rx,
            ry,
            fill: self.fill(),
            stroke: self.stroke(),
        });
    }

    fn draw_arc(&mut self, rect: RectF, start_angle: f32, sweep_angle: f32) {
        self.commands.push(DrawCommand::Arc {
            rect,
            start_angle,
            sweep_angle,
            fill: self.fill(),
            stroke: self.stroke(),
        });
    }

    fn clip_rect(&mut self, rect: RectF) {
        self.commands.push(DrawCommand::ClipRect(rect));
    }

    fn save(&mut self) {
        self.save_depth += 1;
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        if self.save_depth == 0 {
            tracing::warn!("restore() without matching save(), ignored");
            return;
        }
        self.save_depth -= 1;
        self.commands.push(DrawCommand::Restore);
    }
}
