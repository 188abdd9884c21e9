use crate::core::model::Status;
use crate::core::section::Report;
use crate::core::table::Table;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct Listing<'a> {
    pub file: Option<&'a str>,
    pub version: Option<&'a str>,
    pub sections: Vec<ListEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ListEntry<'a> {
    pub title: &'a str,
    /// Command-line key when the module is extractable.
    pub key: Option<&'static str>,
    pub status: Status,
    pub line: usize,
    /// `None` when the module body does not form a table.
    pub rows: Option<usize>,
}

pub fn build(report: &Report) -> Listing<'_> {
    let sections = report
        .sections
        .iter()
        .map(|raw| {
            let rows = match Table::from_raw(raw) {
                Ok(t) => Some(t.rows.len()),
                Err(e) => {
                    warn!(title = %raw.title, error = %e, "module is not tabular");
                    None
                }
            };
            ListEntry {
                title: &raw.title,
                key: raw.section().map(|s| s.key()),
                status: raw.status,
                line: raw.start_line,
                rows,
            }
        })
        .collect();
    Listing {
        file: report.source_filename(),
        version: report.version.as_deref(),
        sections,
    }
}

pub fn write_text(w: &mut dyn Write, listing: &Listing) -> Result<()> {
    for e in &listing.sections {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            e.status.as_str_upper(),
            e.key.unwrap_or("-"),
            e.title,
            e.rows.map(|r| r.to_string()).unwrap_or_else(|| "?".into())
        )?;
    }
    Ok(())
}

pub fn write_json(w: &mut dyn Write, listing: &Listing) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, listing)?;
    writeln!(w)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::section::scan;

    const TEXT: &str = "##FastQC\t0.12.1\n\
>>Basic Statistics\tpass\n\
#Measure\tValue\n\
Filename\tx.fq\n\
>>END_MODULE\n\
>>Adapter Content\twarn\n\
#Position\tA\n\
1\t0.0\n\
2\t0.5\n\
>>END_MODULE\n";

    #[test]
    fn text_listing() {
        let report = scan(TEXT).unwrap();
        let mut buf = Vec::new();
        write_text(&mut buf, &build(&report)).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "PASS\t-\tBasic Statistics\t1\nWARN\tadap_cont\tAdapter Content\t2\n"
        );
    }

    #[test]
    fn json_listing() {
        let report = scan(TEXT).unwrap();
        let mut buf = Vec::new();
        write_json(&mut buf, &build(&report)).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["file"], "x.fq");
        assert_eq!(v["version"], "0.12.1");
        assert_eq!(v["sections"][1]["key"], "adap_cont");
        assert_eq!(v["sections"][1]["status"], "warn");
        assert_eq!(v["sections"][1]["rows"], 2);
        assert_eq!(v["sections"][0]["key"], serde_json::Value::Null);
    }
}
