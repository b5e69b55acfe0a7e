//! Placement of resolved runs on a canvas.
//!
//! Text measurement belongs to whoever paints: callers supply a
//! [`TextMeasure`]. The output lists every draw operation in paint order so a
//! presentation layer can render without repeating any of this logic.

use serde::Serialize;

use crate::color::Rgb;
use crate::document::DialogueFields;
use crate::overrides::{resolve_runs, ResolvedRun};
use crate::style::{self, Alignment, HorizontalAlign, StyleRecord, VerticalAlign};

/// Distance of the bottom and top baselines from the canvas edge.
pub const EDGE_MARGIN: f64 = 20.0;

/// Measures the advance width of a string drawn with a style's font
/// (family, size, bold, italic).
pub trait TextMeasure {
    fn measure(&self, text: &str, style: &StyleRecord) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, &StyleRecord) -> f64,
{
    fn measure(&self, text: &str, style: &StyleRecord) -> f64 {
        self(text, style)
    }
}

/// Rough metrics for when no font engine is available.
#[derive(Debug, Clone, Copy)]
pub struct EstimatedMeasure {
    pub glyph_ratio: f64,
    pub bold_factor: f64,
}

impl Default for EstimatedMeasure {
    fn default() -> Self {
        Self {
            glyph_ratio: 0.6,
            bold_factor: 1.1,
        }
    }
}

impl TextMeasure for EstimatedMeasure {
    fn measure(&self, text: &str, style: &StyleRecord) -> f64 {
        let glyph = style.font_size as f64 * self.glyph_ratio;
        let width = text.chars().count() as f64 * glyph;
        if style.bold {
            width * self.bold_factor
        } else {
            width
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawKind {
    Shadow,
    Outline,
    Fill,
}

/// One copy of a run's text, offset from the run origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawOp {
    pub kind: DrawKind,
    pub dx: i32,
    pub dy: i32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPlacement {
    pub run: ResolvedRun,
    /// Offset from the anchor.
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    /// Paint order: shadow, outline ring, fill.
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlacement {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    pub anchor_x: f64,
    /// Baseline of the line.
    pub anchor_y: f64,
    pub total_width: f64,
    pub runs: Vec<RunPlacement>,
}

impl LayoutPlacement {
    /// Absolute canvas position of each run.
    pub fn run_positions(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.runs
            .iter()
            .map(|r| (self.anchor_x + r.origin_x, self.anchor_y + r.origin_y))
    }
}

/// Pixel extent of an outline or shadow, capped at [`style::MAX_BORDER_SIZE`].
fn border_extent(size: u32) -> i32 {
    i32::try_from(size.min(style::MAX_BORDER_SIZE)).unwrap_or(0)
}

/// Draw operations for one run.
pub fn draw_ops(style: &StyleRecord) -> Vec<DrawOp> {
    let mut ops = Vec::new();

    let offset = border_extent(style.shadow_offset);
    if offset > 0 {
        ops.push(DrawOp {
            kind: DrawKind::Shadow,
            dx: offset,
            dy: offset,
            color: style.outline_color,
        });
    }

    let w = border_extent(style.outline_width);
    for dx in -w..=w {
        for dy in -w..=w {
            if dx != 0 || dy != 0 {
                ops.push(DrawOp {
                    kind: DrawKind::Outline,
                    dx,
                    dy,
                    color: style.outline_color,
                });
            }
        }
    }

    ops.push(DrawOp {
        kind: DrawKind::Fill,
        dx: 0,
        dy: 0,
        color: style.primary_color,
    });
    ops
}

/// Place `runs` on one line of `canvas`.
pub fn layout<M: TextMeasure + ?Sized>(
    runs: &[ResolvedRun],
    alignment: Alignment,
    canvas: Canvas,
    measure: &M,
) -> LayoutPlacement {
    let widths: Vec<f64> = runs
        .iter()
        .map(|run| measure.measure(&run.text, &run.style).max(0.0))
        .collect();
    let total_width: f64 = widths.iter().sum();

    let canvas_width = canvas.width as f64;
    let canvas_height = canvas.height as f64;

    let horizontal = alignment.horizontal();
    let anchor_x = match horizontal {
        HorizontalAlign::Left => 0.0,
        HorizontalAlign::Center => (canvas_width - total_width) / 2.0,
        HorizontalAlign::Right => canvas_width - total_width,
    };

    let vertical = alignment.vertical();
    let anchor_y = match vertical {
        VerticalAlign::Bottom => canvas_height - EDGE_MARGIN,
        VerticalAlign::Middle => canvas_height / 2.0,
        VerticalAlign::Top => {
            let tallest = runs.iter().map(|r| r.style.font_size).max().unwrap_or(0);
            EDGE_MARGIN + tallest as f64
        }
    };

    let mut cursor = 0.0;
    let placements = runs
        .iter()
        .zip(widths)
        .map(|(run, width)| {
            let placement = RunPlacement {
                run: run.clone(),
                origin_x: cursor,
                origin_y: 0.0,
                width,
                ops: draw_ops(&run.style),
            };
            cursor += width;
            placement
        })
        .collect();

    LayoutPlacement {
        horizontal,
        vertical,
        anchor_x,
        anchor_y,
        total_width,
        runs: placements,
    }
}

/// Lay out the dialogue line an editor cursor sits on.
///
/// The style table is rebuilt from `document` on every call. Lines that are
/// not dialogue events give an empty layout.
pub fn preview_line<M: TextMeasure + ?Sized>(
    document: &str,
    line: &str,
    canvas: Canvas,
    measure: &M,
) -> LayoutPlacement {
    let Some(fields) = DialogueFields::split(line) else {
        return layout(&[], Alignment::BOTTOM_CENTER, canvas, measure);
    };

    let styles = style::parse_styles(document);
    let base = styles.resolve(fields.style_name);
    let runs = resolve_runs(fields.text, &base);
    layout(&runs, base.alignment, canvas, measure)
}
