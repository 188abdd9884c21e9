//! SVG drawing primitives shared by every chart.

use anyhow::Result;
use std::fmt::Write;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Canvas size plus the margins around the plotting area.
#[derive(Clone, Copy, Debug)]
pub struct Frame {
    pub w: f64,
    pub h: f64,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Frame {
    pub fn new(w: f64, h: f64) -> Self {
        Self {
            w,
            h,
            left: 56.0,
            right: 40.0,
            top: 30.0,
            bottom: 40.0,
        }
    }

    pub fn with_bottom(mut self, bottom: f64) -> Self {
        self.bottom = bottom;
        self
    }

    pub fn with_left(mut self, left: f64) -> Self {
        self.left = left;
        self
    }

    pub fn plot_w(&self) -> f64 {
        self.w - self.left - self.right
    }

    pub fn plot_h(&self) -> f64 {
        self.h - self.top - self.bottom
    }

    pub fn x_px(&self, v: f64, (min, max): (f64, f64)) -> f64 {
        self.left + (v - min) / (max - min).max(1e-9) * self.plot_w()
    }

    pub fn y_px(&self, v: f64, (min, max): (f64, f64)) -> f64 {
        self.top + self.plot_h() - (v - min) / (max - min).max(1e-9) * self.plot_h()
    }

    pub fn open(&self, out: &mut String, title: &str) -> Result<()> {
        writeln!(
            out,
            "<svg xmlns=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"Helvetica, Arial, sans-serif\">",
            SVG_NS, self.w, self.h, self.w, self.h
        )?;
        writeln!(
            out,
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#fff\"/>",
            self.w, self.h
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"19\" font-size=\"13\" fill=\"#333\" text-anchor=\"middle\">{}</text>",
            self.w / 2.0,
            escape_svg(title)
        )?;
        Ok(())
    }

    pub fn plot_border(&self, out: &mut String) -> Result<()> {
        writeln!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#bbb\"/>",
            self.left,
            self.top,
            self.plot_w(),
            self.plot_h()
        )?;
        Ok(())
    }

    pub fn close(&self, out: &mut String) -> Result<()> {
        writeln!(out, "</svg>")?;
        Ok(())
    }
}

pub fn draw_y_axis_ticks(out: &mut String, f: &Frame, y: (f64, f64), ticks: usize) -> Result<()> {
    for v in tick_values(y, ticks) {
        let py = f.y_px(v, y);
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#eee\"/>",
            f.left,
            py,
            f.left + f.plot_w(),
            py
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            f.left - 4.0,
            py,
            fmt_tick(v)
        )?;
    }
    Ok(())
}

pub fn draw_y_axis_ticks_right(
    out: &mut String,
    f: &Frame,
    y: (f64, f64),
    ticks: usize,
) -> Result<()> {
    for v in tick_values(y, ticks) {
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"start\" dominant-baseline=\"middle\">{}</text>",
            f.left + f.plot_w() + 4.0,
            f.y_px(v, y),
            fmt_tick(v)
        )?;
    }
    Ok(())
}

pub fn draw_x_axis_ticks(out: &mut String, f: &Frame, x: (f64, f64), ticks: usize) -> Result<()> {
    for v in tick_values(x, ticks) {
        let px = f.x_px(v, x);
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#eee\"/>",
            px,
            f.top,
            px,
            f.top + f.plot_h()
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"middle\" dominant-baseline=\"hanging\">{}</text>",
            px,
            f.top + f.plot_h() + 4.0,
            fmt_tick(v)
        )?;
    }
    Ok(())
}

/// Labels for a categorical x axis; `labels[i]` sits at x = i on the range `(-0.5, n - 0.5)`.
pub fn draw_x_categories(out: &mut String, f: &Frame, labels: &[&str], rotate: bool) -> Result<()> {
    if labels.is_empty() {
        return Ok(());
    }
    let x = category_range(labels.len());
    let slot = if rotate { 12.0 } else { 36.0 };
    let max_labels = (f.plot_w() / slot).floor().max(1.0) as usize;
    let step = labels.len().div_ceil(max_labels).max(1);
    for (i, label) in labels.iter().enumerate().step_by(step) {
        let px = f.x_px(i as f64, x);
        let py = f.top + f.plot_h() + 6.0;
        if rotate {
            writeln!(
                out,
                "<text x=\"{}\" y=\"{}\" font-size=\"9\" fill=\"#666\" text-anchor=\"end\" dominant-baseline=\"middle\" transform=\"rotate(-45 {} {})\">{}</text>",
                px,
                py,
                px,
                py,
                escape_svg(label)
            )?;
        } else {
            writeln!(
                out,
                "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"middle\" dominant-baseline=\"hanging\">{}</text>",
                px,
                py - 2.0,
                escape_svg(label)
            )?;
        }
    }
    Ok(())
}

pub fn category_range(n: usize) -> (f64, f64) {
    (-0.5, n as f64 - 0.5)
}

pub fn draw_axis_labels(out: &mut String, f: &Frame, x_label: &str, y_label: &str) -> Result<()> {
    let x = f.left + f.plot_w() / 2.0;
    let y = f.h - 6.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#444\" text-anchor=\"middle\">{}</text>",
        x,
        y,
        escape_svg(x_label)
    )?;
    let yx = 14.0;
    let yy = f.top + f.plot_h() / 2.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#444\" text-anchor=\"middle\" transform=\"rotate(-90 {} {})\">{}</text>",
        yx,
        yy,
        yx,
        yy,
        escape_svg(y_label)
    )?;
    Ok(())
}

pub fn draw_y_bands(
    out: &mut String,
    f: &Frame,
    y: (f64, f64),
    bands: &[(f64, f64, &str)],
) -> Result<()> {
    let (min_y, max_y) = y;
    let y_range = (max_y - min_y).max(1e-9);
    for (lo, hi, color) in bands {
        let start = ((*lo - min_y) / y_range).clamp(0.0, 1.0);
        let end = ((*hi - min_y) / y_range).clamp(0.0, 1.0);
        let y1 = f.top + f.plot_h() - end * f.plot_h();
        let y2 = f.top + f.plot_h() - start * f.plot_h();
        let h = (y2 - y1).max(0.0);
        if h > 0.0 {
            writeln!(
                out,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" opacity=\"0.35\"/>",
                f.left,
                y1,
                f.plot_w(),
                h,
                color
            )?;
        }
    }
    Ok(())
}

/// Polyline through `data`; non-finite points lift the pen.
pub fn svg_line(
    out: &mut String,
    f: &Frame,
    data: &[(f64, f64)],
    x: (f64, f64),
    y: (f64, f64),
    color: &str,
    dashed: bool,
) -> Result<()> {
    let mut path = String::new();
    let mut pen_down = false;
    for (xv, yv) in data {
        if !xv.is_finite() || !yv.is_finite() {
            pen_down = false;
            continue;
        }
        let cmd = if pen_down { 'L' } else { 'M' };
        if !path.is_empty() {
            path.push(' ');
        }
        write!(path, "{} {:.2} {:.2}", cmd, f.x_px(*xv, x), f.y_px(*yv, y))?;
        pen_down = true;
    }
    if path.is_empty() {
        return Ok(());
    }
    let dash = if dashed {
        " stroke-dasharray=\"5 3\""
    } else {
        ""
    };
    writeln!(
        out,
        "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"{}/>",
        path, color, dash
    )?;
    Ok(())
}

/// Series swatches stacked in the top-right corner of the plot.
pub fn draw_legend(out: &mut String, f: &Frame, entries: &[(&str, &str)]) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let longest = entries
        .iter()
        .map(|(n, _)| n.chars().count())
        .max()
        .unwrap_or(0);
    let box_w = 30.0 + longest as f64 * 6.0;
    let box_h = 8.0 + entries.len() as f64 * 14.0;
    let x0 = f.left + f.plot_w() - box_w - 6.0;
    let y0 = f.top + 6.0;
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#fff\" fill-opacity=\"0.85\" stroke=\"#ccc\"/>",
        x0, y0, box_w, box_h
    )?;
    for (i, (name, color)) in entries.iter().enumerate() {
        let cy = y0 + 11.0 + i as f64 * 14.0;
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"3\"/>",
            x0 + 6.0,
            cy,
            x0 + 22.0,
            cy,
            color
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#333\" dominant-baseline=\"middle\">{}</text>",
            x0 + 26.0,
            cy,
            escape_svg(name)
        )?;
    }
    Ok(())
}

/// Blue for negative, white at zero, red for positive; `t` is clamped to [-1, 1].
pub fn diverging_color(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(-1.0, 1.0) } else { 0.0 };
    let (to, k) = if t >= 0.0 {
        ((215.0, 48.0, 39.0), t)
    } else {
        ((69.0, 117.0, 180.0), -t)
    };
    let mix = |c: f64| (255.0 + (c - 255.0) * k).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(to.0), mix(to.1), mix(to.2))
}

pub fn fmt_tick(v: f64) -> String {
    if (v - v.round()).abs() < 0.001 {
        format!("{}", v.round() as i64)
    } else if v.abs() < 10.0 {
        format!("{:.2}", v)
    } else {
        format!("{:.1}", v)
    }
}

pub fn nice_ticks(min: f64, max: f64, ticks: usize) -> (f64, f64, usize) {
    let range = (max - min).abs().max(1e-9);
    let rough = range / (ticks as f64 - 1.0);
    let mag = 10f64.powf(rough.abs().log10().floor());
    let norm = rough / mag;
    let step = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    } * mag;
    let start = (min / step).floor() * step;
    let end = (max / step).ceil() * step;
    let count = ((end - start) / step).round() as usize + 1;
    (start, step, count)
}

/// Tick positions from `nice_ticks` that fall inside the range.
fn tick_values((min, max): (f64, f64), ticks: usize) -> Vec<f64> {
    if ticks < 2 || !min.is_finite() || !max.is_finite() || (max - min).abs() < 1e-9 {
        return Vec::new();
    }
    let (start, step, count) = nice_ticks(min, max, ticks);
    let eps = step * 1e-6;
    (0..count)
        .map(|i| start + step * i as f64)
        .filter(|v| *v >= min - eps && *v <= max + eps)
        .collect()
}

pub fn auto_range<I: Iterator<Item = f64>>(
    values: I,
    min_bound: f64,
    max_bound: f64,
) -> (f64, f64) {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if !min_v.is_finite() || !max_v.is_finite() {
        return (min_bound, max_bound);
    }
    let span = (max_v - min_v).max(1e-6);
    let pad = (span * 0.2).max(1.0);
    let y_min = (min_v - pad).max(min_bound);
    let y_max = (max_v + pad).min(max_bound);
    if (y_max - y_min) < 1e-6 {
        (min_bound, max_bound)
    } else {
        (y_min, y_max)
    }
}

/// `[0, max * 1.05]`, never degenerate.
pub fn zero_based_range<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max <= 0.0 {
        (0.0, 1.0)
    } else {
        (0.0, max * 1.05)
    }
}

pub fn simple_text_svg(title: &str, lines: &[String]) -> String {
    let w = 800;
    let h = 120 + 18 * lines.len();
    let mut out = String::new();
    out.push_str(&format!(
        "<svg xmlns=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"Helvetica, Arial, sans-serif\">",
        SVG_NS, w, h, w, h
    ));
    out.push_str(&format!(
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#fff\" stroke=\"#ddd\"/>",
        w, h
    ));
    out.push_str(&format!(
        "<text x=\"16\" y=\"28\" font-size=\"14\" fill=\"#333\">{}</text>",
        escape_svg(title)
    ));
    let mut y = 54;
    for l in lines {
        out.push_str(&format!(
            "<text x=\"16\" y=\"{}\" font-size=\"12\" fill=\"#333\">{}</text>",
            y,
            escape_svg(l)
        ));
        y += 18;
    }
    out.push_str("</svg>\n");
    out
}

pub fn escape_svg(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
