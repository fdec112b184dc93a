//! Chart layouts: category charts, horizontal bars and heatmaps

use image::Rgb;

use super::canvas::{self, Canvas, ACCENT, AXIS, BLACK, GRID, STRIPE};
use super::font::{text_height, text_width};
use super::{format_value, truncate_label, ChartKind, ChartSpec, Grid, Palette, Point};

const WIDTH: u32 = 1000;
const MARGIN: i64 = 30;
const TITLE_SCALE: u32 = 3;
const SCALE: u32 = 2;
const TITLE_BAND: i64 = 70;
const PLOT_HEIGHT: i64 = 360;
const MAX_LABEL_CHARS: usize = 32;
const TICKS: usize = 5;

pub(crate) fn draw_chart(spec: &ChartSpec) -> Canvas {
    match &spec.kind {
        ChartKind::Line(points) => category_chart(spec, points, true),
        ChartKind::VerticalBar(points) => category_chart(spec, points, false),
        ChartKind::HorizontalBar(points) => horizontal_bar_chart(spec, points),
        ChartKind::Heatmap(grid) => heatmap(spec, grid),
    }
}

/// Smallest "round" number (1, 2, 2.5 or 5 times a power of ten) not below
/// `max`; 1 for empty or non-positive data
fn nice_max(max: f64) -> f64 {
    if !max.is_finite() || max <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(max.log10().floor());
    [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|v| *v >= max)
        .unwrap_or(10.0 * magnitude)
}

fn axis_max(points: &[Point]) -> f64 {
    let max = points
        .iter()
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);
    nice_max(max)
}

fn draw_title(canvas: &mut Canvas, title: &str) {
    let cx = canvas.width() as i64 / 2;
    canvas.text_centered(cx, 24, title, TITLE_SCALE, BLACK);
}

fn draw_empty(canvas: &mut Canvas) {
    let cx = canvas.width() as i64 / 2;
    let cy = canvas.height() as i64 / 2;
    canvas.text_centered(cx, cy, "No data", SCALE, AXIS);
}

fn labels(points: &[Point]) -> Vec<String> {
    points
        .iter()
        .map(|p| truncate_label(&p.label, MAX_LABEL_CHARS))
        .collect()
}

fn widest(labels: &[String], scale: u32) -> i64 {
    labels.iter().map(|l| text_width(l, scale)).max().unwrap_or(0) as i64
}

/// Line or vertical-bar chart with categories along the x axis
fn category_chart(spec: &ChartSpec, points: &[Point], as_line: bool) -> Canvas {
    let x_labels = labels(points);
    let label_band = widest(&x_labels, SCALE) + 12;
    let line = canvas::line_height(SCALE) as i64;
    let max = axis_max(points);

    let tick_labels: Vec<String> = (0..=TICKS)
        .map(|i| format_value(max * i as f64 / TICKS as f64))
        .collect();
    let tick_band = widest(&tick_labels, SCALE) + 10;

    let height = TITLE_BAND + PLOT_HEIGHT + label_band + line + MARGIN;
    let mut canvas = Canvas::new(WIDTH, height as u32);
    draw_title(&mut canvas, &spec.title);

    let left = MARGIN + line + tick_band;
    let right = WIDTH as i64 - MARGIN;
    let top = TITLE_BAND;
    let bottom = top + PLOT_HEIGHT;
    let plot_width = right - left;

    // Value grid and y ticks
    for (i, label) in tick_labels.iter().enumerate() {
        let y = bottom - (PLOT_HEIGHT * i as i64) / TICKS as i64;
        canvas.line(left, y, right, y, GRID);
        canvas.text_right(left - 6, y - text_height(SCALE) as i64 / 2, label, SCALE, AXIS);
    }
    canvas.line(left, top, left, bottom, AXIS);
    canvas.line(left, bottom, right, bottom, AXIS);

    canvas.text_vertical(MARGIN, (top + bottom) / 2 + text_width(&spec.y_label, SCALE) as i64 / 2, &spec.y_label, SCALE, BLACK);
    canvas.text_centered((left + right) / 2, height - MARGIN, &spec.x_label, SCALE, BLACK);

    if points.is_empty() {
        draw_empty(&mut canvas);
        return canvas;
    }

    let n = points.len() as i64;
    let slot = plot_width as f64 / n as f64;
    let center = |i: usize| left + (slot * (i as f64 + 0.5)) as i64;
    let y_of = |v: f64| bottom - ((v.max(0.0) / max) * PLOT_HEIGHT as f64).round() as i64;

    if as_line {
        for (i, pair) in points.windows(2).enumerate() {
            canvas.thick_line(center(i), y_of(pair[0].value), center(i + 1), y_of(pair[1].value), 3, ACCENT);
        }
        for (i, p) in points.iter().enumerate() {
            canvas.fill_rect(center(i) - 3, y_of(p.value) - 3, 7, 7, ACCENT);
        }
    } else {
        let bar_width = ((slot * 0.7) as i64).max(1);
        for (i, p) in points.iter().enumerate() {
            let y = y_of(p.value);
            canvas.fill_rect(center(i) - bar_width / 2, y, bar_width, bottom - y, ACCENT);
        }
    }

    // Rotated category labels; thin them out when they would overlap
    let stride = ((n * line) as f64 / plot_width as f64).ceil().max(1.0) as usize;
    let glyph = text_height(SCALE) as i64;
    for (i, label) in x_labels.iter().enumerate().step_by(stride) {
        let label_bottom = bottom + 8 + text_width(label, SCALE) as i64;
        canvas.text_vertical(center(i) - glyph / 2, label_bottom, label, SCALE, BLACK);
    }

    canvas
}

/// Horizontal bars, first point at the top
fn horizontal_bar_chart(spec: &ChartSpec, points: &[Point]) -> Canvas {
    const ROW_HEIGHT: i64 = 26;

    let y_labels = labels(points);
    let line = canvas::line_height(SCALE) as i64;
    let max = axis_max(points);
    let value_band = text_width("0.000", SCALE) as i64 + 12;

    let left = MARGIN + line + widest(&y_labels, SCALE) + 10;
    let right = WIDTH as i64 - MARGIN - value_band;
    let top = TITLE_BAND;
    let bottom = top + (points.len() as i64 * ROW_HEIGHT).max(ROW_HEIGHT * 2);
    let height = bottom + 2 * line + MARGIN + 10;
    let plot_width = (right - left).max(1);

    let mut canvas = Canvas::new(WIDTH, height as u32);
    draw_title(&mut canvas, &spec.title);

    for i in 0..=TICKS {
        let x = left + (plot_width * i as i64) / TICKS as i64;
        canvas.line(x, top, x, bottom, GRID);
        let label = format_value(max * i as f64 / TICKS as f64);
        canvas.text_centered(x, bottom + 6, &label, SCALE, canvas::AXIS);
    }
    canvas.line(left, top, left, bottom, AXIS);
    canvas.line(left, bottom, right, bottom, AXIS);

    canvas.text_centered((left + right) / 2, bottom + line + 14, &spec.x_label, SCALE, BLACK);
    canvas.text_vertical(MARGIN, (top + bottom) / 2 + text_width(&spec.y_label, SCALE) as i64 / 2, &spec.y_label, SCALE, BLACK);

    if points.is_empty() {
        draw_empty(&mut canvas);
        return canvas;
    }

    let glyph = text_height(SCALE) as i64;
    for (i, (p, label)) in points.iter().zip(&y_labels).enumerate() {
        let row_top = top + i as i64 * ROW_HEIGHT;
        let bar_len = ((p.value.max(0.0) / max) * plot_width as f64).round() as i64;
        let text_y = row_top + (ROW_HEIGHT - glyph) / 2;

        canvas.fill_rect(left + 1, row_top + 4, bar_len, ROW_HEIGHT - 8, ACCENT);
        canvas.text_right(left - 8, text_y, label, SCALE, BLACK);
        canvas.text(left + bar_len + 6, text_y, &format_value(p.value), SCALE, AXIS);
    }

    canvas
}

fn palette_color(palette: Palette, t: f64) -> Rgb<u8> {
    match palette {
        Palette::Blues => canvas::lerp(Rgb([247, 251, 255]), Rgb([8, 48, 107]), t),
        Palette::Viridis => {
            let low = Rgb([68, 1, 84]);
            let mid = Rgb([33, 145, 140]);
            let high = Rgb([253, 231, 37]);
            if t < 0.5 {
                canvas::lerp(low, mid, t * 2.0)
            } else {
                canvas::lerp(mid, high, (t - 0.5) * 2.0)
            }
        }
    }
}

/// Matrix of colored cells with a gradient legend on the right
fn heatmap(spec: &ChartSpec, grid: &Grid) -> Canvas {
    const LEGEND_WIDTH: i64 = 90;

    let row_labels: Vec<String> = grid.rows.iter().map(|r| truncate_label(r, MAX_LABEL_CHARS)).collect();
    let col_labels: Vec<String> = grid.columns.iter().map(|c| truncate_label(c, MAX_LABEL_CHARS)).collect();
    let line = canvas::line_height(SCALE) as i64;

    let values: Vec<f64> = grid
        .cells
        .iter()
        .flatten()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let n_cols = grid.columns.len().max(1) as i64;
    let n_rows = grid.rows.len().max(1) as i64;
    let cell_width = if grid.annotate { 90 } else { 40 };
    let cell_height = if grid.annotate { 60 } else { 24 };

    let left = MARGIN + line + widest(&row_labels, SCALE) + 10;
    let top = TITLE_BAND;
    let plot_right = left + n_cols * cell_width;
    let bottom = top + n_rows * cell_height;
    let label_band = widest(&col_labels, SCALE) + 12;

    let title_width = text_width(&spec.title, TITLE_SCALE) as i64 + 2 * MARGIN;
    let width = (plot_right + LEGEND_WIDTH + MARGIN).max(title_width);
    let height = bottom + label_band + line + MARGIN;

    let mut canvas = Canvas::new(width as u32, height as u32);
    draw_title(&mut canvas, &spec.title);

    canvas.text_vertical(MARGIN, (top + bottom) / 2 + text_width(&spec.y_label, SCALE) as i64 / 2, &spec.y_label, SCALE, BLACK);
    canvas.text_centered((left + plot_right) / 2, height - MARGIN, &spec.x_label, SCALE, BLACK);

    if values.is_empty() {
        draw_empty(&mut canvas);
        return canvas;
    }

    let span = max - min;
    let scale_of = |v: f64| if span > 0.0 { (v - min) / span } else { 0.5 };
    let glyph = text_height(SCALE) as i64;

    for (r, row) in grid.cells.iter().enumerate() {
        let y = top + r as i64 * cell_height;
        for (c, cell) in row.iter().enumerate() {
            let x = left + c as i64 * cell_width;
            match cell {
                Some(v) if v.is_finite() => {
                    let color = palette_color(grid.palette, scale_of(*v));
                    canvas.fill_rect(x, y, cell_width, cell_height, color);
                    if grid.annotate {
                        let text = format!("{:.2}", v);
                        canvas.text_centered(x + cell_width / 2, y + (cell_height - glyph) / 2, &text, SCALE, canvas::contrast_text(color));
                    }
                }
                _ => canvas.fill_rect(x, y, cell_width, cell_height, STRIPE),
            }
        }
    }

    for (r, label) in row_labels.iter().enumerate() {
        let y = top + r as i64 * cell_height + (cell_height - glyph) / 2;
        canvas.text_right(left - 8, y, label, SCALE, BLACK);
    }
    for (c, label) in col_labels.iter().enumerate() {
        let x = left + c as i64 * cell_width + (cell_width - glyph) / 2;
        canvas.text_vertical(x, bottom + 8 + text_width(label, SCALE) as i64, label, SCALE, BLACK);
    }

    // Gradient legend
    let legend_x = plot_right + 20;
    let legend_height = bottom - top;
    for i in 0..legend_height {
        let t = 1.0 - i as f64 / legend_height.max(1) as f64;
        canvas.fill_rect(legend_x, top + i, 16, 1, palette_color(grid.palette, t));
    }
    canvas.stroke_rect(legend_x, top, 16, legend_height, AXIS);
    canvas.text(legend_x + 20, top, &format!("{:.2}", max), SCALE, AXIS);
    canvas.text(legend_x + 20, bottom - glyph, &format!("{:.2}", min), SCALE, AXIS);

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: ChartKind) -> ChartSpec {
        ChartSpec {
            id: "test".into(),
            title: "Test Chart".into(),
            x_label: "x".into(),
            y_label: "y".into(),
            kind,
        }
    }

    #[test]
    fn test_nice_max() {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        assert!(close(nice_max(0.0), 1.0));
        assert!(close(nice_max(0.42), 0.5));
        assert!(close(nice_max(0.18), 0.2));
        assert!(close(nice_max(1.0), 1.0));
        assert!(close(nice_max(230.0), 250.0));
        assert!(close(nice_max(f64::NAN), 1.0));
    }

    #[test]
    fn test_vertical_bar_height_grows_with_labels() {
        let short = draw_chart(&spec(ChartKind::VerticalBar(vec![Point::new("a", 1.0)])));
        let long = draw_chart(&spec(ChartKind::VerticalBar(vec![Point::new(
            "Unable to contact - Bad Contact Information",
            1.0,
        )])));
        assert_eq!(short.width(), WIDTH);
        assert!(long.height() > short.height());
    }

    #[test]
    fn test_horizontal_bar_draws_bar_color() {
        let canvas = draw_chart(&spec(ChartKind::HorizontalBar(vec![
            Point::new("w1", 1.0),
            Point::new("w2", 0.5),
        ])));
        let row_mid = (TITLE_BAND + 13) as u32;
        let found = (0..canvas.width()).any(|x| canvas.pixel(x, row_mid) == ACCENT);
        assert!(found);
    }

    #[test]
    fn test_heatmap_size_follows_grid() {
        let grid = Grid {
            rows: vec!["Low".into(), "High".into()],
            columns: vec!["Low".into(), "Medium".into(), "High".into()],
            cells: vec![vec![Some(0.1), None, Some(0.3)], vec![Some(0.5), Some(0.7), Some(0.9)]],
            annotate: true,
            palette: Palette::Blues,
        };
        let canvas = draw_chart(&spec(ChartKind::Heatmap(grid)));
        assert!(canvas.width() >= 3 * 90);
        assert!(canvas.height() >= (TITLE_BAND + 2 * 60) as u32);
    }

    #[test]
    fn test_empty_series_still_renders() {
        let canvas = draw_chart(&spec(ChartKind::Line(Vec::new())));
        assert!(canvas.height() > 0);
    }
}
