use crate::core::io;
use crate::core::model::{Output, Section};
use crate::core::section::{self, BASIC_STATISTICS, RawSection};
use crate::core::table::Table;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};

/// A requested section and the artefacts to produce for it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedArg {
    pub section: Section,
    pub required_outputs: Vec<Output>,
}

impl ParsedArg {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            required_outputs: section.required_outputs(),
        }
    }

    pub fn wants(&self, output: Output) -> bool {
        self.required_outputs.contains(&output)
    }
}

pub struct RunConfig {
    pub input: PathBuf,
    pub sections: Vec<ParsedArg>,
}

#[derive(Debug)]
pub struct Extracted {
    pub arg: ParsedArg,
    pub raw: RawSection,
    pub table: Table,
}

#[derive(Debug)]
pub struct RunOutput {
    pub version: Option<String>,
    /// `Filename` from Basic Statistics, else the input's file name.
    pub file_name: String,
    pub extracted: Vec<Extracted>,
    pub missing: Vec<Section>,
}

pub fn run(cfg: &RunConfig) -> Result<RunOutput> {
    let t_read = Instant::now();
    let text = io::read_report(&cfg.input)?;
    debug!(bytes = text.len(), elapsed = ?t_read.elapsed(), "report loaded");

    let basic = section::locate_by(&text, |t| t == BASIC_STATISTICS)
        .with_context(|| format!("failed to parse {}", cfg.input.display()))?;
    let file_name = match basic.as_ref().and_then(|b| b.lookup("Filename")) {
        Some(name) => name.to_string(),
        None => cfg
            .input
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .context("failed to determine file name from input path")?,
    };

    let mut extracted = Vec::with_capacity(cfg.sections.len());
    let mut missing = Vec::new();
    for arg in &cfg.sections {
        let t_section = Instant::now();
        let found = section::locate(&text, arg.section)
            .with_context(|| format!("failed to parse {}", cfg.input.display()))?;
        let Some(raw) = found else {
            warn!(
                section = arg.section.key(),
                title = arg.section.title(),
                "section not found in report"
            );
            missing.push(arg.section);
            continue;
        };
        let table =
            Table::from_raw(&raw).with_context(|| format!("failed to tabulate {}", raw.title))?;
        debug!(
            section = arg.section.key(),
            status = %raw.status,
            rows = table.rows.len(),
            elapsed = ?t_section.elapsed(),
            "section extracted"
        );
        extracted.push(Extracted {
            arg: arg.clone(),
            raw,
            table,
        });
    }

    if extracted.is_empty() && basic.is_none() {
        bail!(
            "{} does not look like a FastQC report: no requested module found",
            cfg.input.display()
        );
    }

    Ok(RunOutput {
        version: section::report_version(&text),
        file_name,
        extracted,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Status;

    const REPORT: &str = "##FastQC\t0.12.1\n\
>>Basic Statistics\tpass\n\
#Measure\tValue\n\
Filename\tlane1.fq.gz\n\
>>END_MODULE\n\
>>Sequence Length Distribution\twarn\n\
#Length\tCount\n\
150\t9000.0\n\
>>END_MODULE\n";

    fn config(dir: &tempfile::TempDir, text: &str, sections: &[Section]) -> RunConfig {
        let input = dir.path().join("fastqc_data.txt");
        std::fs::write(&input, text).unwrap();
        RunConfig {
            input,
            sections: sections.iter().copied().map(ParsedArg::new).collect(),
        }
    }

    #[test]
    fn parsed_arg_outputs() {
        let a = ParsedArg::new(Section::SeqLenDist);
        assert!(a.wants(Output::Raw));
        assert!(!a.wants(Output::Plot));
        assert!(ParsedArg::new(Section::AdapCont).wants(Output::Plot));
    }

    #[test]
    fn extracts_present_and_records_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, REPORT, &[Section::SeqLenDist, Section::KmerCont]);
        let out = run(&cfg).unwrap();
        assert_eq!(out.version.as_deref(), Some("0.12.1"));
        assert_eq!(out.file_name, "lane1.fq.gz");
        assert_eq!(out.extracted.len(), 1);
        assert_eq!(out.extracted[0].raw.status, Status::Warn);
        assert_eq!(out.extracted[0].table.rows, [["150", "9000.0"]]);
        assert_eq!(out.missing, [Section::KmerCont]);
    }

    #[test]
    fn falls_back_to_input_name() {
        let dir = tempfile::tempdir().unwrap();
        let text = ">>Adapter Content\tpass\n#Position\tA\n1\t0.0\n>>END_MODULE\n";
        let out = run(&config(&dir, text, &[Section::AdapCont])).unwrap();
        assert_eq!(out.file_name, "fastqc_data.txt");
        assert_eq!(out.version, None);
    }

    #[test]
    fn rejects_non_report() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&config(&dir, "hello\nworld\n", &[Section::AdapCont])).unwrap_err();
        assert!(err.to_string().contains("does not look like a FastQC report"));
    }

    #[test]
    fn malformed_table_is_reported_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let text = ">>Per base N content\tfail\n#Base\tN-Count\n1\t0.0\t9\n>>END_MODULE\n";
        let err = run(&config(&dir, text, &[Section::PerBaseNCont])).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("failed to tabulate Per base N content"), "{msg}");
        assert!(msg.contains("line 3: expected 2 fields, found 3"), "{msg}");
    }
}
