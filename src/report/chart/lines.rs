use super::svg::{
    Frame, auto_range, category_range, draw_axis_labels, draw_legend, draw_x_axis_ticks,
    draw_x_categories, draw_y_axis_ticks, draw_y_axis_ticks_right, svg_line, zero_based_range,
};
use super::{HEIGHT, PALETTE, WIDTH};
use crate::core::table::Table;
use anyhow::Result;

pub(super) enum XAxis<'a> {
    Numeric((f64, f64)),
    Categories(Vec<&'a str>),
}

pub(super) struct Series {
    pub name: String,
    pub color: String,
    pub points: Vec<(f64, f64)>,
    pub dashed: bool,
}

pub(super) struct LineChart<'a> {
    pub title: String,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub x: XAxis<'a>,
    pub y: (f64, f64),
    pub series: Vec<Series>,
    pub legend: bool,
}

impl LineChart<'_> {
    pub fn render(&self) -> Result<String> {
        let f = Frame::new(WIDTH, HEIGHT);
        let mut out = String::new();
        f.open(&mut out, &self.title)?;
        draw_y_axis_ticks(&mut out, &f, self.y, 6)?;
        draw_y_axis_ticks_right(&mut out, &f, self.y, 6)?;
        let x = match &self.x {
            XAxis::Numeric(range) => {
                draw_x_axis_ticks(&mut out, &f, *range, 8)?;
                *range
            }
            XAxis::Categories(labels) => {
                draw_x_categories(&mut out, &f, labels, false)?;
                category_range(labels.len())
            }
        };
        draw_axis_labels(&mut out, &f, self.x_label, self.y_label)?;
        for s in &self.series {
            svg_line(&mut out, &f, &s.points, x, self.y, &s.color, s.dashed)?;
        }
        f.plot_border(&mut out)?;
        if self.legend {
            let entries: Vec<(&str, &str)> = self
                .series
                .iter()
                .map(|s| (s.name.as_str(), s.color.as_str()))
                .collect();
            draw_legend(&mut out, &f, &entries)?;
        }
        f.close(&mut out)?;
        Ok(out)
    }
}

/// Min/max of the x values, widened when all points share one x.
fn x_span(xs: &[f64]) -> (f64, f64) {
    let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        (0.0, 1.0)
    } else if (max - min).abs() < 1e-9 {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

fn position_xs(table: &Table) -> Result<Vec<f64>> {
    Ok(table.positions()?.iter().map(|p| p.midpoint()).collect())
}

fn zip_points(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter().copied().zip(ys.iter().copied()).collect()
}

/// One series per column after the first.
fn value_series(
    table: &Table,
    xs: &[f64],
    color_of: impl Fn(usize, &str) -> String,
) -> Result<Vec<Series>> {
    let mut series = Vec::new();
    for (i, name) in table.header.iter().enumerate().skip(1) {
        let ys = table.column_f64_at(i)?;
        series.push(Series {
            name: name.clone(),
            color: color_of(i - 1, name),
            points: zip_points(xs, &ys),
            dashed: false,
        });
    }
    Ok(series)
}

fn palette(i: usize) -> String {
    PALETTE[i % PALETTE.len()].to_string()
}

pub fn per_seq_quality(table: &Table) -> Result<String> {
    let xs = table.column_f64_at(0)?;
    let counts = table.column_f64_at(1)?;
    LineChart {
        title: "Quality score distribution over all sequences".into(),
        x_label: "Mean Sequence Quality (Phred Score)",
        y_label: "Count",
        x: XAxis::Numeric(x_span(&xs)),
        y: zero_based_range(counts.iter().copied()),
        series: vec![Series {
            name: "Average Quality per read".into(),
            color: "#d62728".into(),
            points: zip_points(&xs, &counts),
            dashed: false,
        }],
        legend: true,
    }
    .render()
}

pub fn per_base_content(table: &Table) -> Result<String> {
    let xs = position_xs(table)?;
    let series = value_series(table, &xs, |i, name| {
        match name {
            "G" => "#882255",
            "A" => "#332288",
            "T" => "#117733",
            "C" => "#DDCC77",
            _ => return palette(i),
        }
        .to_string()
    })?;
    let series = series
        .into_iter()
        .map(|s| Series {
            name: format!("%{}", s.name),
            ..s
        })
        .collect();
    LineChart {
        title: "Sequence content across all bases".into(),
        x_label: "Position in read (bp)",
        y_label: "Percent",
        x: XAxis::Numeric(x_span(&xs)),
        y: (0.0, 100.0),
        series,
        legend: true,
    }
    .render()
}

pub fn per_seq_gc(table: &Table) -> Result<String> {
    let xs = table.column_f64_at(0)?;
    let counts = table.column_f64_at(1)?;
    let theory = theoretical_distribution(&xs, &counts);
    LineChart {
        title: "GC distribution over all sequences".into(),
        x_label: "Mean GC content (%)",
        y_label: "Count",
        x: XAxis::Numeric(x_span(&xs)),
        y: zero_based_range(counts.iter().chain(theory.iter()).copied()),
        series: vec![
            Series {
                name: "GC count per read".into(),
                color: "#d62728".into(),
                points: zip_points(&xs, &counts),
                dashed: false,
            },
            Series {
                name: "Theoretical Distribution".into(),
                color: "#1f4fa8".into(),
                points: zip_points(&xs, &theory),
                dashed: true,
            },
        ],
        legend: true,
    }
    .render()
}

pub fn per_base_n(table: &Table) -> Result<String> {
    let xs = position_xs(table)?;
    let ys = table.column_f64_at(1)?;
    LineChart {
        title: "N content across all bases".into(),
        x_label: "Position in read (bp)",
        y_label: "Percent N",
        x: XAxis::Numeric(x_span(&xs)),
        y: (0.0, 100.0),
        series: vec![Series {
            name: "%N".into(),
            color: "#d62728".into(),
            points: zip_points(&xs, &ys),
            dashed: false,
        }],
        legend: true,
    }
    .render()
}

pub fn duplication(table: &Table) -> Result<String> {
    let labels = table.position_labels();
    let xs: Vec<f64> = (0..labels.len()).map(|i| i as f64).collect();
    let series = value_series(table, &xs, |i, _| palette(i))?;
    let title = match table.meta("Total Deduplicated Percentage") {
        Some(v) => match v.trim().parse::<f64>() {
            Ok(pct) => format!("Percent of seqs remaining if deduplicated {:.2}%", pct),
            Err(_) => format!("Percent of seqs remaining if deduplicated {}", v.trim()),
        },
        None => "Sequence duplication levels".into(),
    };
    let legend = series.len() > 1;
    LineChart {
        title,
        x_label: "Sequence Duplication Level",
        y_label: "Percent",
        x: XAxis::Categories(labels),
        y: (0.0, 100.0),
        series,
        legend,
    }
    .render()
}

pub fn adapter_content(table: &Table) -> Result<String> {
    let xs = position_xs(table)?;
    let series = value_series(table, &xs, |i, _| palette(i))?;
    let y = auto_range(
        series.iter().flat_map(|s| s.points.iter().map(|(_, y)| *y)),
        0.0,
        100.0,
    );
    LineChart {
        title: "% Adapter".into(),
        x_label: "Position in read (bp)",
        y_label: "Percent",
        x: XAxis::Numeric(x_span(&xs)),
        y,
        series,
        legend: true,
    }
    .render()
}

/// Normal curve fitted to the observed distribution and scaled to its total count.
pub(super) fn theoretical_distribution(xs: &[f64], counts: &[f64]) -> Vec<f64> {
    let total: f64 = counts.iter().filter(|c| c.is_finite()).sum();
    if total <= 0.0 {
        return vec![0.0; xs.len()];
    }
    let pairs = || {
        xs.iter()
            .zip(counts)
            .filter(|(x, c)| x.is_finite() && c.is_finite())
    };
    let mean = pairs().map(|(x, c)| x * c).sum::<f64>() / total;
    let var = pairs().map(|(x, c)| c * (x - mean).powi(2)).sum::<f64>() / total;
    let sd = var.sqrt();
    if sd <= 0.0 {
        return xs
            .iter()
            .map(|x| if (x - mean).abs() < 0.5 { total } else { 0.0 })
            .collect();
    }
    let norm = total / (sd * (2.0 * std::f64::consts::PI).sqrt());
    xs.iter()
        .map(|x| norm * (-(x - mean).powi(2) / (2.0 * var)).exp())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Status;

    fn table(header: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            title: "t".into(),
            status: Status::Warn,
            meta: Vec::new(),
            header: header.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn theoretical_curve_preserves_mass() {
        let xs: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let counts: Vec<f64> = xs
            .iter()
            .map(|x| 1000.0 * (-(x - 50.0f64).powi(2) / 50.0).exp())
            .collect();
        let total: f64 = counts.iter().sum();
        let theory = theoretical_distribution(&xs, &counts);
        let fitted: f64 = theory.iter().sum();
        assert!((fitted - total).abs() / total < 0.01);
        let peak = theory
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(50));
    }

    #[test]
    fn theoretical_curve_handles_degenerate_input() {
        assert_eq!(theoretical_distribution(&[1.0, 2.0], &[0.0, 0.0]), [0.0, 0.0]);
        assert_eq!(
            theoretical_distribution(&[1.0, 2.0, 3.0], &[0.0, 5.0, 0.0]),
            [0.0, 5.0, 0.0]
        );
    }

    #[test]
    fn base_content_has_series_per_base() {
        let t = table(
            &["Base", "G", "A", "T", "C"],
            &[
                &["1", "20.0", "30.0", "30.0", "20.0"],
                &["2-3", "21.0", "29.0", "29.0", "21.0"],
            ],
        );
        let svg = per_base_content(&t).unwrap();
        assert_eq!(svg.matches("<path ").count(), 4);
        for name in ["%G", "%A", "%T", "%C"] {
            assert!(svg.contains(&format!(">{}<", name)), "{name}");
        }
    }

    #[test]
    fn duplication_uses_category_labels_and_meta_title() {
        let mut t = table(
            &[
                "Duplication Level",
                "Percentage of deduplicated",
                "Percentage of total",
            ],
            &[&["1", "80.0", "60.0"], &[">10", "1.0", "9.0"]],
        );
        t.meta
            .push(("Total Deduplicated Percentage".into(), "73.456".into()));
        let svg = duplication(&t).unwrap();
        assert!(svg.contains("&gt;10"));
        assert!(svg.contains("deduplicated 73.46%"));
        assert_eq!(svg.matches("<path ").count(), 2);
    }

    #[test]
    fn gc_chart_draws_observed_and_fit() {
        let t = table(
            &["GC Content", "Count"],
            &[&["40", "10.0"], &["50", "30.0"], &["60", "10.0"]],
        );
        let svg = per_seq_gc(&t).unwrap();
        assert_eq!(svg.matches("<path ").count(), 2);
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn non_numeric_adapter_value_fails() {
        let t = table(&["Position", "Illumina"], &[&["1", "zero"]]);
        assert!(adapter_content(&t).is_err());
    }

    #[test]
    fn single_point_span_is_widened() {
        assert_eq!(x_span(&[5.0]), (4.5, 5.5));
        assert_eq!(x_span(&[]), (0.0, 1.0));
    }
}
