use crate::core::error::ParseError;
use crate::core::model::Status;
use crate::core::section::RawSection;
use std::str::FromStr;

/// Structured form of one report module.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub title: String,
    pub status: Status,
    /// `#Key\tValue` rows that precede the column header.
    pub meta: Vec<(String, String)>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_raw(raw: &RawSection) -> Result<Self, ParseError> {
        let mut comments: Vec<&str> = Vec::new();
        let mut meta = Vec::new();
        let mut header: Vec<String> = Vec::new();
        let mut rows = Vec::new();

        for (idx, line) in raw.lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if header.is_empty() {
                    comments.push(comment);
                } else {
                    meta.push(split_meta(comment));
                }
                continue;
            }
            if header.is_empty() {
                let Some(last) = comments.pop() else {
                    return Err(ParseError::MissingHeader {
                        line: raw.line_no(idx),
                    });
                };
                header = split_fields(last);
                meta.extend(comments.drain(..).map(split_meta));
            }
            let fields = split_fields(line);
            if fields.len() != header.len() {
                return Err(ParseError::RaggedRow {
                    line: raw.line_no(idx),
                    expected: header.len(),
                    found: fields.len(),
                });
            }
            rows.push(fields);
        }

        // Header-only module.
        if header.is_empty()
            && let Some(last) = comments.pop()
        {
            header = split_fields(last);
            meta.extend(comments.drain(..).map(split_meta));
        }

        Ok(Self {
            title: raw.title.clone(),
            status: raw.status,
            meta,
            header,
            rows,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn column_index(&self, name: &str) -> Result<usize, ParseError> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ParseError::NoSuchColumn {
                column: name.to_string(),
            })
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>, ParseError> {
        let idx = self.column_index(name)?;
        Ok(self.column_at(idx))
    }

    pub fn column_at(&self, idx: usize) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|r| r.get(idx).map(String::as_str))
            .collect()
    }

    pub fn column_f64(&self, name: &str) -> Result<Vec<f64>, ParseError> {
        let idx = self.column_index(name)?;
        self.column_f64_at(idx)
    }

    pub fn column_f64_at(&self, idx: usize) -> Result<Vec<f64>, ParseError> {
        let column = self.header.get(idx).cloned().unwrap_or_default();
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let cell = r.get(idx).map(String::as_str).unwrap_or("");
                cell.trim()
                    .parse::<f64>()
                    .map_err(|_| ParseError::NotNumeric {
                        row: i + 1,
                        column: column.clone(),
                        value: cell.to_string(),
                    })
            })
            .collect()
    }

    /// First-column labels (base position, quality, level, ...).
    pub fn position_labels(&self) -> Vec<&str> {
        self.column_at(0)
    }

    pub fn positions(&self) -> Result<Vec<Position>, ParseError> {
        let column = self.header.first().cloned().unwrap_or_default();
        self.position_labels()
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                label
                    .parse::<Position>()
                    .map_err(|_| ParseError::NotNumeric {
                        row: i + 1,
                        column: column.clone(),
                        value: label.to_string(),
                    })
            })
            .collect()
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_string).collect()
}

fn split_meta(comment: &str) -> (String, String) {
    match comment.split_once('\t') {
        Some((k, v)) => (k.to_string(), v.to_string()),
        None => (comment.to_string(), String::new()),
    }
}

/// Base position label, either `7` or a grouped range such as `10-14`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub start: f64,
    pub end: f64,
}

impl Position {
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

impl FromStr for Position {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('-') {
            Some((a, b)) if !a.is_empty() => Ok(Position {
                start: a.trim().parse()?,
                end: b.trim().parse()?,
            }),
            _ => {
                let v = s.parse()?;
                Ok(Position { start: v, end: v })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(lines: &[&str]) -> RawSection {
        RawSection {
            title: "Sequence Duplication Levels".into(),
            status: Status::Warn,
            start_line: 10,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn meta_header_and_rows_are_split() {
        let t = Table::from_raw(&raw(&[
            "#Total Deduplicated Percentage\t41.2",
            "#Duplication Level\tPercentage of deduplicated\tPercentage of total",
            "1\t53.1\t21.9",
            ">10\t1.2\t8.4",
        ]))
        .unwrap();
        assert_eq!(t.meta("Total Deduplicated Percentage"), Some("41.2"));
        assert_eq!(
            t.header,
            [
                "Duplication Level",
                "Percentage of deduplicated",
                "Percentage of total"
            ]
        );
        assert_eq!(t.position_labels(), ["1", ">10"]);
        assert_eq!(t.column_f64("Percentage of total").unwrap(), [21.9, 8.4]);
    }

    #[test]
    fn header_only_module_is_empty() {
        let t = Table::from_raw(&raw(&["#Sequence\tCount\tPercentage\tPossible Source"])).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.header.len(), 4);
        assert!(t.meta.is_empty());
    }

    #[test]
    fn no_lines_gives_empty_table() {
        let t = Table::from_raw(&raw(&[])).unwrap();
        assert!(t.is_empty());
        assert!(t.header.is_empty());
    }

    #[test]
    fn ragged_row_reports_report_line() {
        let err = Table::from_raw(&raw(&["#Base\tN-Count", "1\t0.0", "2"])).unwrap_err();
        assert_eq!(
            err,
            ParseError::RaggedRow {
                line: 13,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn data_before_header_is_an_error() {
        let err = Table::from_raw(&raw(&["1\t0.0"])).unwrap_err();
        assert_eq!(err, ParseError::MissingHeader { line: 11 });
    }

    #[test]
    fn blank_lines_are_skipped() {
        let t = Table::from_raw(&raw(&["#Base\tN-Count", "", "1\t0.0"])).unwrap();
        assert_eq!(t.rows.len(), 1);
    }

    #[test]
    fn non_numeric_cell_is_named() {
        let t = Table::from_raw(&raw(&["#Base\tN-Count", "1\t0.0", "2\tabc"])).unwrap();
        assert_eq!(
            t.column_f64("N-Count").unwrap_err(),
            ParseError::NotNumeric {
                row: 2,
                column: "N-Count".into(),
                value: "abc".into()
            }
        );
        assert!(matches!(
            t.column("Mean"),
            Err(ParseError::NoSuchColumn { .. })
        ));
    }

    #[test]
    fn positions_parse_ranges() {
        let t = Table::from_raw(&raw(&["#Base\tMean", "9\t30.0", "10-14\t31.0"])).unwrap();
        let pos = t.positions().unwrap();
        assert_eq!(pos[0], Position { start: 9.0, end: 9.0 });
        assert_eq!(pos[1].midpoint(), 12.0);
    }
}
