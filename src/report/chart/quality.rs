use super::svg::{
    Frame, category_range, diverging_color, draw_axis_labels, draw_legend, draw_x_categories,
    draw_y_axis_ticks, draw_y_axis_ticks_right, draw_y_bands, escape_svg, svg_line,
};
use super::{HEIGHT, WIDTH};
use crate::core::table::Table;
use anyhow::Result;
use std::collections::HashMap;
use std::fmt::Write;

const BAND_POOR: &str = "#e6b0aa";
const BAND_FAIR: &str = "#f5d9a6";
const BAND_GOOD: &str = "#b8e0b8";

/// Per-position quality box plot with FastQC's red/orange/green background.
pub fn per_base_quality(table: &Table) -> Result<String> {
    let labels = table.position_labels();
    let mean = table.column_f64("Mean")?;
    let median = table.column_f64("Median")?;
    let lq = table.column_f64("Lower Quartile")?;
    let uq = table.column_f64("Upper Quartile")?;
    let p10 = table.column_f64("10th Percentile")?;
    let p90 = table.column_f64("90th Percentile")?;

    let top_q = p90
        .iter()
        .chain(uq.iter())
        .copied()
        .filter(|v| v.is_finite())
        .fold(40.0, f64::max);
    let y = (0.0, top_q.ceil() + 1.0);
    let x = category_range(labels.len());

    let f = Frame::new(WIDTH, HEIGHT);
    let mut out = String::new();
    f.open(&mut out, "Quality scores across all bases")?;
    draw_y_bands(
        &mut out,
        &f,
        y,
        &[
            (0.0, 20.0, BAND_POOR),
            (20.0, 28.0, BAND_FAIR),
            (28.0, y.1, BAND_GOOD),
        ],
    )?;
    draw_y_axis_ticks(&mut out, &f, y, 6)?;
    draw_y_axis_ticks_right(&mut out, &f, y, 6)?;
    draw_x_categories(&mut out, &f, &labels, false)?;
    draw_axis_labels(&mut out, &f, "Position in read (bp)", "Phred quality")?;

    let slot = f.plot_w() / labels.len().max(1) as f64;
    let box_w = (slot * 0.7).max(1.0);
    let cap_w = (box_w * 0.6).max(1.0);
    for i in 0..labels.len() {
        let vals = [median[i], lq[i], uq[i], p10[i], p90[i]];
        if vals.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let cx = f.x_px(i as f64, x);
        let box_x = cx - box_w / 2.0;
        let y_m = f.y_px(median[i], y);
        let y_lq = f.y_px(lq[i], y);
        let y_uq = f.y_px(uq[i], y);
        let y_p10 = f.y_px(p10[i], y);
        let y_p90 = f.y_px(p90[i], y);
        writeln!(
            out,
            "<line x1=\"{cx}\" y1=\"{y_p90}\" x2=\"{cx}\" y2=\"{y_p10}\" stroke=\"#555\" stroke-width=\"1\"/>"
        )?;
        for cap in [y_p10, y_p90] {
            writeln!(
                out,
                "<line x1=\"{}\" y1=\"{cap}\" x2=\"{}\" y2=\"{cap}\" stroke=\"#555\" stroke-width=\"1\"/>",
                cx - cap_w / 2.0,
                cx + cap_w / 2.0
            )?;
        }
        writeln!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#f2e36b\" stroke=\"#666\"/>",
            box_x,
            y_uq,
            box_w,
            (y_lq - y_uq).max(0.0)
        )?;
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{y_m}\" x2=\"{}\" y2=\"{y_m}\" stroke=\"#c0392b\" stroke-width=\"1.5\"/>",
            box_x,
            box_x + box_w
        )?;
    }

    let mean_line: Vec<(f64, f64)> = mean
        .iter()
        .enumerate()
        .map(|(i, m)| (i as f64, *m))
        .collect();
    svg_line(&mut out, &f, &mean_line, x, y, "#2c5fa8", false)?;
    f.plot_border(&mut out)?;
    draw_legend(
        &mut out,
        &f,
        &[("Median", "#c0392b"), ("Mean", "#2c5fa8"), ("IQR", "#f2e36b")],
    )?;
    f.close(&mut out)?;
    Ok(out)
}

/// Tile by position heatmap of the deviation from the mean quality.
pub fn per_tile_quality(table: &Table) -> Result<String> {
    let tile_col = table.column("Tile")?;
    let base_col = table.column("Base")?;
    let values = table.column_f64("Mean")?;

    let tiles = first_seen(&tile_col);
    let bases = first_seen(&base_col);
    let tile_idx: HashMap<&str, usize> = tiles.iter().enumerate().map(|(i, t)| (*t, i)).collect();
    let base_idx: HashMap<&str, usize> = bases.iter().enumerate().map(|(i, b)| (*b, i)).collect();

    let mut grid = vec![vec![f64::NAN; bases.len()]; tiles.len()];
    for ((tile, base), v) in tile_col.iter().zip(base_col.iter()).zip(values.iter()) {
        grid[tile_idx[tile]][base_idx[base]] = *v;
    }

    let max_abs = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .map(f64::abs)
        .fold(0.0, f64::max);
    let lim = max_abs.max(2.0);

    let f = Frame::new(WIDTH, HEIGHT).with_left(72.0);
    let mut out = String::new();
    f.open(&mut out, "Quality per tile")?;
    let cell_w = f.plot_w() / bases.len().max(1) as f64;
    let cell_h = f.plot_h() / tiles.len().max(1) as f64;
    for (ti, row) in grid.iter().enumerate() {
        for (bi, v) in row.iter().enumerate() {
            let fill = if v.is_finite() {
                diverging_color(v / lim)
            } else {
                "#eeeeee".to_string()
            };
            writeln!(
                out,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
                f.left + bi as f64 * cell_w,
                f.top + ti as f64 * cell_h,
                cell_w + 0.05,
                cell_h + 0.05,
                fill
            )?;
        }
    }

    let max_tile_labels = (f.plot_h() / 11.0).floor().max(1.0) as usize;
    let step = tiles.len().div_ceil(max_tile_labels).max(1);
    for (ti, tile) in tiles.iter().enumerate().step_by(step) {
        writeln!(
            out,
            "<text x=\"{}\" y=\"{:.2}\" font-size=\"9\" fill=\"#666\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            f.left - 4.0,
            f.top + (ti as f64 + 0.5) * cell_h,
            escape_svg(tile)
        )?;
    }
    draw_x_categories(&mut out, &f, &bases, false)?;
    draw_axis_labels(&mut out, &f, "Position in read (bp)", "Tile")?;
    f.plot_border(&mut out)?;

    let lo = format!("-{:.1}", lim);
    let hi = format!("+{:.1}", lim);
    draw_legend(
        &mut out,
        &f,
        &[
            (lo.as_str(), "#4575b4"),
            ("0", "#dddddd"),
            (hi.as_str(), "#d73027"),
        ],
    )?;
    f.close(&mut out)?;
    Ok(out)
}

fn first_seen<'a>(values: &[&'a str]) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for v in values {
        if !seen.contains(v) {
            seen.push(*v);
        }
    }
    seen
}
