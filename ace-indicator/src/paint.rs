//! Painting of dot indicator frames.

use ace_core::{
    AnimationScheduler, Axis, Brush, DrawingContext, GraphicsSurface, Paintable, PointF, RectF,
};

use crate::config::DotIndicatorStyle;
use crate::layout::DotLayout;
use crate::modifier::DotIndicatorModifier;

fn oriented(rect: RectF, axis: Axis) -> RectF {
    match axis {
        Axis::Horizontal => rect,
        Axis::Vertical => rect.transposed(),
    }
}

fn fill_round_rect(surface: &mut dyn GraphicsSurface, rect: RectF, radius: f32, brush: &Brush) {
    surface.attach_brush(brush);
    surface.draw_round_rect(rect, radius, radius);
    surface.detach_brush();
}

/// Bounds of everything drawn, padded by the style's padding.
fn content_bounds(style: &DotIndicatorStyle, layout: &DotLayout) -> Option<RectF> {
    let cross = style.cross_center();
    let half_height = style.item_height.max(style.selected_item_height) * 0.5;
    let cap = style.selected_item_height * 0.5;

    let (mut left, mut right) = (f32::MAX, f32::MIN);
    for dot in layout.dots.iter().filter(|dot| dot.is_visible()) {
        left = left.min(dot.center_x - dot.width * 0.5);
        right = right.max(dot.center_x + dot.width * 0.5);
    }
    if left > right {
        return None;
    }
    left = left.min(layout.long_point.left_center_x - cap);
    right = right.max(layout.long_point.right_center_x + cap);

    Some(RectF::new(
        left - style.padding,
        cross - half_height - style.padding,
        right + style.padding,
        cross + half_height + style.padding,
    ))
}

/// Draw `layout` with `style`.
///
/// Dots are drawn first, then the long dot on top in the selected color
/// blended towards the touch-bottom color by `touch_bottom_progress`.
pub fn paint_indicator(
    context: &mut DrawingContext<'_>,
    style: &DotIndicatorStyle,
    layout: &DotLayout,
    touch_bottom_progress: f32,
) {
    let axis = style.axis;
    let cross = style.cross_center();
    let surface = &mut *context.surface;
    surface.save();

    if let Some(background) = style.background_color {
        if let Some(bounds) = content_bounds(style, layout) {
            let radius = bounds.height().min(bounds.width()) * 0.5;
            fill_round_rect(surface, oriented(bounds, axis), radius, &Brush::new(background));
        }
    }

    let mut drawn = 0_usize;
    for dot in layout.dots.iter().filter(|dot| dot.is_visible()) {
        let rect = RectF::from_center(PointF::new(dot.center_x, cross), dot.width, dot.height);
        let radius = dot.width.min(dot.height) * 0.5;
        let brush = Brush::new(style.color.with_opacity(dot.opacity));
        fill_round_rect(surface, oriented(rect, axis), radius, &brush);
        drawn += 1;
    }

    let cap = style.selected_item_height * 0.5;
    let (from, to) = (
        layout.long_point.left_center_x,
        layout.long_point.right_center_x,
    );
    let long_rect = RectF::new(from.min(to) - cap, cross - cap, from.max(to) + cap, cross + cap);
    let color = style
        .selected_color
        .blend(style.touch_bottom_color, touch_bottom_progress.clamp(0.0, 1.0));
    fill_round_rect(surface, oriented(long_rect, axis), cap, &Brush::new(color));

    surface.restore();
    tracing::trace!(
        "Painted indicator: {drawn} dots, long dot {:.1}..{:.1}",
        from,
        to
    );
}

impl<S: AnimationScheduler> Paintable for DotIndicatorModifier<S> {
    fn on_draw(&self, context: &mut DrawingContext<'_>) {
        paint_indicator(
            context,
            &self.config().style,
            self.displayed(),
            self.touch_bottom_progress(),
        );
    }
}
