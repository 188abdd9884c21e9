//! SVG charts for the chartable report modules.

mod kmer;
mod lines;
mod quality;
pub mod svg;

use crate::core::model::Section;
use crate::core::table::Table;
use anyhow::{Context, Result};

pub const WIDTH: f64 = 800.0;
pub const HEIGHT: f64 = 450.0;

const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
];

/// Render the chart for `section`, or `None` when the section is tabular only.
pub fn render(section: Section, table: &Table) -> Result<Option<String>> {
    if !section.is_chartable() {
        return Ok(None);
    }
    if table.is_empty() {
        return Ok(Some(svg::simple_text_svg(
            section.title(),
            &[format!("No data ({})", table.status.as_str_lower())],
        )));
    }
    let svg = match section {
        Section::PerBaseSeqQual => quality::per_base_quality(table),
        Section::PerTileSeqQual => quality::per_tile_quality(table),
        Section::PerSeqQualScores => lines::per_seq_quality(table),
        Section::PerBaseSeqContent => lines::per_base_content(table),
        Section::PerSeqGcCont => lines::per_seq_gc(table),
        Section::PerBaseNCont => lines::per_base_n(table),
        Section::SeqDup => lines::duplication(table),
        Section::AdapCont => lines::adapter_content(table),
        Section::KmerCont => kmer::kmer_content(table),
        Section::SeqLenDist | Section::OverSeq => return Ok(None),
    }
    .with_context(|| format!("failed to chart {}", section.title()))?;
    Ok(Some(svg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Status;

    fn empty(title: &str) -> Table {
        Table {
            title: title.into(),
            status: Status::Pass,
            meta: Vec::new(),
            header: vec!["Base".into(), "N-Count".into()],
            rows: Vec::new(),
        }
    }

    #[test]
    fn tabular_sections_have_no_chart() {
        let t = empty("Overrepresented sequences");
        assert!(render(Section::OverSeq, &t).unwrap().is_none());
        assert!(render(Section::SeqLenDist, &t).unwrap().is_none());
    }

    #[test]
    fn empty_table_renders_placeholder() {
        let svg = render(Section::PerBaseNCont, &empty("Per base N content"))
            .unwrap()
            .unwrap();
        assert!(svg.contains("No data (pass)"));
    }

    #[test]
    fn chart_errors_name_the_section() {
        let mut t = empty("Per base N content");
        t.rows.push(vec!["1".into(), "x".into()]);
        let err = render(Section::PerBaseNCont, &t).unwrap_err();
        assert!(format!("{err:#}").contains("failed to chart Per base N content"));
    }
}
