//! Splitting a FastQC report into its `>>Title\tstatus` ... `>>END_MODULE` modules.

use crate::core::error::ParseError;
use crate::core::model::{Section, Status};
use memchr::memchr;
use std::ops::ControlFlow;

const MODULE_PREFIX: &str = ">>";
const END_MODULE: &str = "END_MODULE";
const VERSION_PREFIX: &str = "##FastQC";
pub const BASIC_STATISTICS: &str = "Basic Statistics";

/// Body of one module, markers excluded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawSection {
    pub title: String,
    pub status: Status,
    /// 1-based line of the opening marker.
    pub start_line: usize,
    pub lines: Vec<String>,
}

impl RawSection {
    pub fn section(&self) -> Option<Section> {
        Section::from_title(&self.title)
    }

    /// Report line number of `lines[idx]`.
    pub fn line_no(&self, idx: usize) -> usize {
        self.start_line + 1 + idx
    }

    /// Value of a `Key\tValue` row, as in Basic Statistics.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|l| {
            let (k, v) = l.split_once('\t')?;
            (k == key).then_some(v)
        })
    }

    /// The module exactly as it would appear in the report.
    pub fn to_report_text(&self) -> String {
        let mut out = format!(
            "{}{}\t{}\n",
            MODULE_PREFIX,
            self.title,
            self.status.as_str_lower()
        );
        for l in &self.lines {
            out.push_str(l);
            out.push('\n');
        }
        out.push_str(MODULE_PREFIX);
        out.push_str(END_MODULE);
        out.push('\n');
        out
    }
}

#[derive(Clone, Debug, Default)]
pub struct Report {
    pub version: Option<String>,
    pub sections: Vec<RawSection>,
}

impl Report {
    pub fn get_title(&self, title: &str) -> Option<&RawSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// `Filename` entry of Basic Statistics.
    pub fn source_filename(&self) -> Option<&str> {
        self.get_title(BASIC_STATISTICS)?.lookup("Filename")
    }
}

/// Scan the whole report.
pub fn scan(text: &str) -> Result<Report, ParseError> {
    let mut sections = Vec::new();
    let version = walk(text, |s| {
        sections.push(s);
        ControlFlow::Continue(())
    })?;
    Ok(Report { version, sections })
}

/// Find the first module for `section`, stopping as soon as it is closed.
pub fn locate(text: &str, section: Section) -> Result<Option<RawSection>, ParseError> {
    locate_by(text, |title| section.matches_title(title))
}

/// Find the first module whose title satisfies `want`.
pub fn locate_by<P>(text: &str, want: P) -> Result<Option<RawSection>, ParseError>
where
    P: Fn(&str) -> bool,
{
    let mut found = None;
    walk(text, |s| {
        if want(&s.title) {
            found = Some(s);
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;
    Ok(found)
}

/// Version from a leading `##FastQC\t<version>` line.
pub fn report_version(text: &str) -> Option<String> {
    let (_, first) = Lines::new(text).next()?;
    parse_version(first)
}

fn parse_version(line: &str) -> Option<String> {
    line.strip_prefix(VERSION_PREFIX)?
        .split_once('\t')
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

enum Marker<'a> {
    Open { title: &'a str, status: &'a str },
    End,
}

fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let body = line.strip_prefix(MODULE_PREFIX)?;
    if body.trim_end() == END_MODULE {
        return Some(Marker::End);
    }
    let (title, status) = body.split_once('\t').unwrap_or((body, ""));
    Some(Marker::Open {
        title: title.trim(),
        status,
    })
}

struct Open {
    title: String,
    status: Status,
    start_line: usize,
    lines: Vec<String>,
}

fn walk<F>(text: &str, mut visit: F) -> Result<Option<String>, ParseError>
where
    F: FnMut(RawSection) -> ControlFlow<()>,
{
    let mut version = None;
    let mut open: Option<Open> = None;

    for (line_no, line) in Lines::new(text) {
        if line_no == 1 && line.starts_with(VERSION_PREFIX) {
            version = parse_version(line);
            continue;
        }
        match parse_marker(line) {
            Some(Marker::Open { title, status }) => {
                if let Some(cur) = &open {
                    return Err(ParseError::NestedModule {
                        line: line_no,
                        title: title.to_string(),
                        open: cur.title.clone(),
                    });
                }
                let status = Status::parse(status).ok_or_else(|| ParseError::BadStatus {
                    line: line_no,
                    title: title.to_string(),
                    status: status.to_string(),
                })?;
                open = Some(Open {
                    title: title.to_string(),
                    status,
                    start_line: line_no,
                    lines: Vec::new(),
                });
            }
            Some(Marker::End) => {
                let Some(cur) = open.take() else {
                    return Err(ParseError::StrayEnd { line: line_no });
                };
                let raw = RawSection {
                    title: cur.title,
                    status: cur.status,
                    start_line: cur.start_line,
                    lines: cur.lines,
                };
                if visit(raw).is_break() {
                    return Ok(version);
                }
            }
            None => {
                if let Some(cur) = open.as_mut() {
                    cur.lines.push(line.to_string());
                }
            }
        }
    }

    if let Some(cur) = open {
        return Err(ParseError::Unterminated {
            line: cur.start_line,
            title: cur.title,
        });
    }
    Ok(version)
}

/// Newline-delimited lines with 1-based numbers, `\r` stripped.
struct Lines<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            rest: text,
            line: 0,
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, rest) = match memchr(b'\n', self.rest.as_bytes()) {
            Some(i) => (&self.rest[..i], &self.rest[i + 1..]),
            None => (self.rest, ""),
        };
        self.rest = rest;
        self.line += 1;
        Some((self.line, line.strip_suffix('\r').unwrap_or(line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "##FastQC\t0.11.9\n\
>>Basic Statistics\tpass\n\
#Measure\tValue\n\
Filename\treads_R1.fastq.gz\n\
>>END_MODULE\n\
>>Per base N content\twarn\n\
#Base\tN-Count\n\
1\t0.0\n\
2\t1.5\n\
>>END_MODULE\n\
>>Overrepresented sequences\tpass\n\
>>END_MODULE\n";

    #[test]
    fn scan_reads_version_and_modules() {
        let report = scan(REPORT).unwrap();
        assert_eq!(report.version.as_deref(), Some("0.11.9"));
        let titles: Vec<_> = report
            .sections
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(
            titles,
            ["Basic Statistics", "Per base N content", "Overrepresented sequences"]
        );
        assert_eq!(report.source_filename(), Some("reads_R1.fastq.gz"));
    }

    #[test]
    fn locate_returns_body_without_markers() {
        let raw = locate(REPORT, Section::PerBaseNCont).unwrap().unwrap();
        assert_eq!(raw.status, Status::Warn);
        assert_eq!(raw.start_line, 6);
        assert_eq!(raw.lines, ["#Base\tN-Count", "1\t0.0", "2\t1.5"]);
        assert_eq!(raw.line_no(1), 8);
    }

    #[test]
    fn version_without_full_scan() {
        assert_eq!(report_version(REPORT).as_deref(), Some("0.11.9"));
        assert_eq!(report_version(">>Adapter Content\tpass\n"), None);
        assert_eq!(report_version("##FastQC\n"), None);
    }

    #[test]
    fn locate_by_title() {
        let raw = locate_by(REPORT, |t| t == "Basic Statistics")
            .unwrap()
            .unwrap();
        assert_eq!(raw.lines.len(), 2);
    }

    #[test]
    fn locate_missing_section_is_none() {
        assert_eq!(locate(REPORT, Section::KmerCont).unwrap(), None);
    }

    #[test]
    fn empty_module_has_no_lines() {
        let raw = locate(REPORT, Section::OverSeq).unwrap().unwrap();
        assert!(raw.lines.is_empty());
    }

    #[test]
    fn crlf_is_stripped() {
        let text = ">>Adapter Content\tpass\r\n#Position\tA\r\n1\t0.0\r\n>>END_MODULE\r\n";
        let raw = locate(text, Section::AdapCont).unwrap().unwrap();
        assert_eq!(raw.lines, ["#Position\tA", "1\t0.0"]);
    }

    #[test]
    fn unterminated_module_is_an_error() {
        let text = ">>Per base N content\tpass\n#Base\tN-Count\n1\t0.0\n";
        assert_eq!(
            scan(text).unwrap_err(),
            ParseError::Unterminated {
                line: 1,
                title: "Per base N content".into()
            }
        );
    }

    #[test]
    fn nested_module_is_an_error() {
        let text = ">>Per base N content\tpass\n>>Adapter Content\tpass\n>>END_MODULE\n";
        assert!(matches!(
            scan(text),
            Err(ParseError::NestedModule { line: 2, .. })
        ));
    }

    #[test]
    fn stray_end_and_bad_status() {
        assert_eq!(
            scan(">>END_MODULE\n").unwrap_err(),
            ParseError::StrayEnd { line: 1 }
        );
        assert!(matches!(
            scan(">>Adapter Content\tmaybe\n>>END_MODULE\n"),
            Err(ParseError::BadStatus { line: 1, .. })
        ));
    }

    #[test]
    fn first_duplicate_wins() {
        let text = ">>Adapter Content\tpass\n#Position\tA\n>>END_MODULE\n\
>>Adapter Content\tfail\n#Position\tB\n>>END_MODULE\n";
        let raw = locate(text, Section::AdapCont).unwrap().unwrap();
        assert_eq!(raw.status, Status::Pass);
        assert_eq!(raw.lines, ["#Position\tA"]);
    }

    #[test]
    fn kmer_alias_is_found() {
        let text = ">>K-mer Content\twarn\n#Sequence\tCount\n>>END_MODULE\n";
        let raw = locate(text, Section::KmerCont).unwrap().unwrap();
        assert_eq!(raw.title, "K-mer Content");
    }

    #[test]
    fn report_text_round_trips_markers() {
        let raw = locate(REPORT, Section::PerBaseNCont).unwrap().unwrap();
        assert_eq!(
            raw.to_report_text(),
            ">>Per base N content\twarn\n#Base\tN-Count\n1\t0.0\n2\t1.5\n>>END_MODULE\n"
        );
    }
}
