//! Table images: a header row followed by every data row, striped

use anyhow::Result;
use polars::prelude::*;

use super::canvas::{self, Canvas, BLACK, GRID, HEADER, STRIPE, WHITE};
use super::font::{text_height, text_width};
use super::{format_value, truncate_label};

const SCALE: u32 = 2;
const TITLE_SCALE: u32 = 3;
const MARGIN: i64 = 20;
const TITLE_BAND: i64 = 56;
const ROW_HEIGHT: i64 = 26;
const PADDING: i64 = 8;
const MAX_CELL_CHARS: usize = 40;

/// Display text of one cell
fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float64(v) => format_value(*v),
        AnyValue::Float32(v) => format_value(*v as f64),
        other => other.to_string(),
    }
}

pub(crate) fn draw_table(df: &DataFrame, title: &str) -> Result<Canvas> {
    let header: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| truncate_label(n, MAX_CELL_CHARS))
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let row = df
            .get_columns()
            .iter()
            .map(|c| c.get(i).map(|v| truncate_label(&cell_text(&v), MAX_CELL_CHARS)))
            .collect::<PolarsResult<Vec<_>>>()?;
        rows.push(row);
    }

    let widths: Vec<i64> = header
        .iter()
        .enumerate()
        .map(|(c, h)| {
            let body = rows.iter().map(|r| text_width(&r[c], SCALE)).max().unwrap_or(0);
            text_width(h, SCALE).max(body) as i64 + 2 * PADDING
        })
        .collect();

    let table_width: i64 = widths.iter().sum();
    let body_rows = rows.len().max(1) as i64;
    let width = (table_width + 2 * MARGIN).max(text_width(title, TITLE_SCALE) as i64 + 2 * MARGIN);
    let height = TITLE_BAND + (body_rows + 1) * ROW_HEIGHT + MARGIN;

    let mut canvas = Canvas::new(width as u32, height as u32);
    canvas.text(MARGIN, 18, title, TITLE_SCALE, BLACK);

    let glyph = text_height(SCALE) as i64;
    let text_offset = (ROW_HEIGHT - glyph) / 2;

    // Header
    let mut x = MARGIN;
    canvas.fill_rect(MARGIN, TITLE_BAND, table_width, ROW_HEIGHT, HEADER);
    for (h, w) in header.iter().zip(&widths) {
        canvas.text(x + PADDING, TITLE_BAND + text_offset, h, SCALE, WHITE);
        x += w;
    }

    if rows.is_empty() {
        canvas.text(MARGIN + PADDING, TITLE_BAND + ROW_HEIGHT + text_offset, "(no rows)", SCALE, canvas::AXIS);
    }

    for (r, row) in rows.iter().enumerate() {
        let y = TITLE_BAND + (r as i64 + 1) * ROW_HEIGHT;
        if r % 2 == 1 {
            canvas.fill_rect(MARGIN, y, table_width, ROW_HEIGHT, STRIPE);
        }
        let mut x = MARGIN;
        for (text, w) in row.iter().zip(&widths) {
            canvas.text(x + PADDING, y + text_offset, text, SCALE, BLACK);
            x += w;
        }
        canvas.line(MARGIN, y + ROW_HEIGHT - 1, MARGIN + table_width - 1, y + ROW_HEIGHT - 1, GRID);
    }

    canvas.stroke_rect(MARGIN, TITLE_BAND, table_width, (body_rows + 1) * ROW_HEIGHT, canvas::AXIS);

    Ok(canvas)
}
