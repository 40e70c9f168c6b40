use super::scene::{CairoScene, FONT_FAMILY, Node};
use crate::gui::theme::ThemeColors;
use cairo::Context;
use carousel::{NodeId, NodeKind, Positioning};
use gdk_pixbuf::Pixbuf;
use gdk4::prelude::*;
use palette::Srgba;
use std::time::Instant;

const FOCUS_RING_PADDING: f64 = 6.0;
const FOCUS_RING_WIDTH: f64 = 2.0;

fn set_source(cr: &Context, color: Srgba<f64>, opacity: f64) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a * opacity);
}

struct NodeRenderer<'a> {
    node: &'a Node,
    opacity: f64,
    reveal: f64,
}

impl<'a> NodeRenderer<'a> {
    fn new(node: &'a Node, now: Instant) -> Self {
        Self {
            node,
            opacity: node.opacity.value(now).clamp(0.0, 1.0),
            reveal: node.reveal.value(now).clamp(0.0, 1.0),
        }
    }

    fn is_visible(&self) -> bool {
        self.opacity > f64::EPSILON && self.reveal > f64::EPSILON
    }

    /// Moves the origin to the node's box corner. Flow nodes hang off their
    /// left-center anchor and turn with the circle.
    fn place(&self, cr: &Context) {
        cr.translate(self.node.position.x, self.node.position.y);
        if self.node.positioning == Positioning::Flow {
            cr.rotate(self.node.angle);
            cr.translate(0.0, -self.node.size.height / 2.0);
        }
    }

    fn draw_label(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        let Some(text) = &self.node.text else {
            return Ok(());
        };
        cr.save()?;
        cr.translate(self.node.position.x, self.node.position.y);
        cr.rotate(self.node.angle);
        cr.select_font_face(
            FONT_FAMILY,
            cairo::FontSlant::Normal,
            cairo::FontWeight::Normal,
        );
        cr.set_font_size(self.node.font_size);
        set_source(cr, colors.label, self.opacity);
        // baseline sits a third of the em below the anchor line
        cr.move_to(0.0, self.node.font_size / 3.0);
        cr.show_text(text)?;
        cr.restore()
    }

    fn draw_image(
        &self,
        cr: &Context,
        pixbuf: Option<&Pixbuf>,
        colors: &ThemeColors,
    ) -> Result<(), cairo::Error> {
        let (w, h) = (self.node.size.width, self.node.size.height);
        if w <= 0.0 || h <= 0.0 {
            return Ok(());
        }

        cr.save()?;
        self.place(cr);
        cr.rectangle(0.0, 0.0, w, h * self.reveal);
        cr.clip();

        match pixbuf {
            Some(pixbuf) => {
                // cover: fill the box, crop the overflow
                let (pw, ph) = (pixbuf.width() as f64, pixbuf.height() as f64);
                let scale = (w / pw).max(h / ph);
                cr.translate((w - pw * scale) / 2.0, (h - ph * scale) / 2.0);
                cr.scale(scale, scale);
                cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
                cr.paint_with_alpha(self.opacity)?;
            }
            None => draw_broken(cr, w, h, colors, self.opacity)?,
        }
        cr.restore()
    }
}

fn draw_broken(
    cr: &Context,
    w: f64,
    h: f64,
    colors: &ThemeColors,
    opacity: f64,
) -> Result<(), cairo::Error> {
    set_source(cr, colors.broken, opacity);
    cr.rectangle(0.0, 0.0, w, h);
    cr.fill()?;

    set_source(cr, colors.label, opacity * 0.5);
    cr.set_line_width(2.0);
    cr.move_to(0.0, 0.0);
    cr.line_to(w, h);
    cr.move_to(w, 0.0);
    cr.line_to(0.0, h);
    cr.stroke()
}

fn draw_focus_ring(cr: &Context, node: &Node, colors: &ThemeColors) -> Result<(), cairo::Error> {
    cr.save()?;
    cr.translate(node.position.x, node.position.y);
    cr.rotate(node.angle);
    set_source(cr, colors.focus, 1.0);
    cr.set_line_width(FOCUS_RING_WIDTH);
    cr.rectangle(
        -FOCUS_RING_PADDING,
        -node.size.height / 2.0 - FOCUS_RING_PADDING,
        node.size.width + 2.0 * FOCUS_RING_PADDING,
        node.size.height + 2.0 * FOCUS_RING_PADDING,
    );
    cr.stroke()?;
    cr.restore()
}

/// Paints the center image, then labels, then hover images on top.
pub fn draw(
    cr: &Context,
    scene: &CairoScene,
    focus: Option<NodeId>,
    colors: &ThemeColors,
    now: Instant,
) -> Result<(), cairo::Error> {
    set_source(cr, colors.background, 1.0);
    cr.paint()?;

    for (_, node) in scene.nodes_of(NodeKind::CenterImage) {
        let renderer = NodeRenderer::new(node, now);
        if renderer.is_visible() {
            let pixbuf = node.image.as_ref().and_then(|i| scene.pixbuf(i));
            renderer.draw_image(cr, pixbuf, colors)?;
        }
    }

    for (_, node) in scene.nodes_of(NodeKind::Label) {
        let renderer = NodeRenderer::new(node, now);
        if renderer.is_visible() {
            renderer.draw_label(cr, colors)?;
        }
    }

    if let Some(node) = focus.and_then(|id| scene.node(id)) {
        draw_focus_ring(cr, node, colors)?;
    }

    for (_, node) in scene.nodes_of(NodeKind::ImageLayer) {
        let renderer = NodeRenderer::new(node, now);
        if renderer.is_visible() {
            let pixbuf = node.image.as_ref().and_then(|i| scene.pixbuf(i));
            renderer.draw_image(cr, pixbuf, colors)?;
        }
    }
    Ok(())
}
