use super::svg::{
    Frame, category_range, draw_axis_labels, draw_x_categories, draw_y_axis_ticks,
    draw_y_axis_ticks_right, zero_based_range,
};
use super::{HEIGHT, WIDTH};
use crate::core::table::Table;
use anyhow::Result;
use std::fmt::Write;

/// Bars of the maximum observed/expected ratio, one per reported k-mer.
pub fn kmer_content(table: &Table) -> Result<String> {
    let seqs = table.column("Sequence")?;
    let ratios = table.column_f64("Obs/Exp Max")?;

    let f = Frame::new(WIDTH, HEIGHT).with_bottom(96.0);
    let x = category_range(seqs.len());
    let y = zero_based_range(ratios.iter().copied());

    let mut out = String::new();
    f.open(&mut out, "Enriched k-mers (Obs/Exp Max)")?;
    draw_y_axis_ticks(&mut out, &f, y, 6)?;
    draw_y_axis_ticks_right(&mut out, &f, y, 6)?;
    draw_x_categories(&mut out, &f, &seqs, true)?;
    draw_axis_labels(&mut out, &f, "K-mer", "Obs/Exp Max")?;

    let bar_w = (f.plot_w() / seqs.len().max(1) as f64 * 0.8).max(1.0);
    for (i, r) in ratios.iter().enumerate() {
        if !r.is_finite() {
            continue;
        }
        let top = f.y_px(*r, y);
        let base = f.y_px(0.0, y);
        writeln!(
            out,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"#7db8da\"/>",
            f.x_px(i as f64, x) - bar_w / 2.0,
            top,
            bar_w,
            (base - top).max(0.0)
        )?;
    }
    f.plot_border(&mut out)?;
    f.close(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Status;

    #[test]
    fn one_bar_per_kmer() {
        let t = Table {
            title: "Kmer Content".into(),
            status: Status::Fail,
            meta: Vec::new(),
            header: [
                "Sequence",
                "Count",
                "PValue",
                "Obs/Exp Max",
                "Max Obs/Exp Position",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            rows: vec![
                vec!["AAAAAAA".into(), "120".into(), "0.0".into(), "12.5".into(), "3".into()],
                vec!["CCGGTTA".into(), "80".into(), "1.2E-4".into(), "7.1".into(), "40-44".into()],
            ],
        };
        let svg = kmer_content(&t).unwrap();
        assert_eq!(svg.matches("fill=\"#7db8da\"").count(), 2);
        assert!(svg.contains(">AAAAAAA<"));
        assert!(svg.contains("rotate(-45"));
    }
}
