//! Donut chart of used versus free space.

use std::f32::consts::{FRAC_PI_2, TAU};

use egui::{Align2, Color32, FontId, Pos2, Response, Sense, Shape, Stroke, Ui, Vec2};

use crate::storage::{format_percent, Reading};

/// Used space (#FF5722)
pub const USED_COLOR: Color32 = Color32::from_rgb(0xFF, 0x57, 0x22);
/// Free space (#4CAF50)
pub const FREE_COLOR: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);

/// Largest angle covered by one painted quad.
const MAX_STEP: f32 = TAU / 120.0;

/// Inner radius as a share of the outer radius.
const HOLE_RATIO: f32 = 0.6;

/// Convex quads covering the ring between `inner` and `outer` radius from
/// angle `start` to `end` (radians, clockwise from 12 o'clock).
pub fn ring_quads(center: Pos2, inner: f32, outer: f32, start: f32, end: f32) -> Vec<[Pos2; 4]> {
    if end <= start {
        return Vec::new();
    }

    let steps = ((end - start) / MAX_STEP - 1e-4).ceil().max(1.0) as usize;
    let step = (end - start) / steps as f32;
    let point = |radius: f32, angle: f32| {
        let a = angle - FRAC_PI_2;
        center + Vec2::new(a.cos(), a.sin()) * radius
    };

    (0..steps)
        .map(|i| {
            let a0 = start + step * i as f32;
            let a1 = a0 + step;
            [
                point(outer, a0),
                point(outer, a1),
                point(inner, a1),
                point(inner, a0),
            ]
        })
        .collect()
}

/// Angle at which the used slice ends.
pub fn used_sweep(reading: &Reading) -> f32 {
    if !reading.has_data() {
        return 0.0;
    }
    (reading.snapshot.used_percent() as f32 / 100.0).clamp(0.0, 1.0) * TAU
}

/// Paint a donut for `reading` into a square of `diameter`.
///
/// Without data the ring is drawn in `empty` and the center reads "-".
pub fn donut(ui: &mut Ui, reading: &Reading, diameter: f32, empty: Color32) -> Response {
    let (response, painter) = ui.allocate_painter(Vec2::splat(diameter), Sense::hover());
    let center = response.rect.center();
    let outer = diameter / 2.0 - 2.0;
    let inner = outer * HOLE_RATIO;

    let paint = |start: f32, end: f32, color: Color32| {
        for quad in ring_quads(center, inner, outer, start, end) {
            painter.add(Shape::convex_polygon(quad.to_vec(), color, Stroke::NONE));
        }
    };

    let label = if reading.has_data() {
        let sweep = used_sweep(reading);
        paint(0.0, sweep, USED_COLOR);
        paint(sweep, TAU, FREE_COLOR);
        format!("{}%", format_percent(reading.snapshot.used_percent()))
    } else {
        paint(0.0, TAU, empty);
        "-".to_string()
    };

    painter.text(
        center,
        Align2::CENTER_CENTER,
        label,
        FontId::proportional(diameter / 8.0),
        ui.visuals().text_color(),
    );

    response
}

/// A small colored square followed by `text`.
pub fn legend_entry(ui: &mut Ui, color: Color32, text: &str) {
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(12.0), Sense::hover());
        ui.painter().rect_filled(rect, 2.0, color);
        ui.label(text);
    });
}
