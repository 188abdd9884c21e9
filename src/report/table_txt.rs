use crate::core::section::RawSection;
use crate::core::table::Table;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TableFormat {
    Csv,
    Tsv,
}

impl TableFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Tsv => "tsv",
        }
    }

    fn separator(self) -> char {
        match self {
            TableFormat::Csv => ',',
            TableFormat::Tsv => '\t',
        }
    }
}

/// Module text including its `>>` markers.
pub fn write_raw(path: &Path, raw: &RawSection) -> Result<()> {
    let mut w = BufWriter::new(
        File::create(path).with_context(|| format!("create {} failed", path.display()))?,
    );
    w.write_all(raw.to_report_text().as_bytes())?;
    w.flush()?;
    Ok(())
}

pub fn write_table(path: &Path, table: &Table, format: TableFormat) -> Result<()> {
    let mut w = BufWriter::new(
        File::create(path).with_context(|| format!("create {} failed", path.display()))?,
    );
    write_delimited(&mut w, table, format)?;
    w.flush()?;
    Ok(())
}

pub fn write_delimited(w: &mut dyn Write, table: &Table, format: TableFormat) -> Result<()> {
    let sep = format.separator();
    for (k, v) in &table.meta {
        writeln!(w, "# {}{}{}", cell(k, format), sep, cell(v, format))?;
    }
    if !table.header.is_empty() {
        write_row(w, &table.header, format)?;
    }
    for row in &table.rows {
        write_row(w, row, format)?;
    }
    Ok(())
}

fn write_row(w: &mut dyn Write, fields: &[String], format: TableFormat) -> Result<()> {
    let sep = format.separator();
    for (i, f) in fields.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", sep)?;
        }
        write!(w, "{}", cell(f, format))?;
    }
    writeln!(w)?;
    Ok(())
}

/// CSV cells are quoted when they carry a separator, quote or line break.
/// TSV cells come from tab-split fields and are written as-is.
fn cell(s: &str, format: TableFormat) -> Cow<'_, str> {
    match format {
        TableFormat::Tsv => Cow::Borrowed(s),
        TableFormat::Csv => {
            if s.contains([',', '"', '\n', '\r']) {
                Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
            } else {
                Cow::Borrowed(s)
            }
        }
    }
}
