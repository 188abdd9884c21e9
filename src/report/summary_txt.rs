use crate::core::section::RawSection;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// FastQC-style `STATUS\tModule\tFilename` lines for the extracted modules.
pub fn write(path: &Path, sections: &[&RawSection], file_name: &str) -> Result<()> {
    let mut w = BufWriter::new(File::create(path).with_context(|| "create summary.txt failed")?);
    write_lines(&mut w, sections, file_name)?;
    w.flush()?;
    Ok(())
}

fn write_lines(w: &mut dyn Write, sections: &[&RawSection], file_name: &str) -> Result<()> {
    for s in sections {
        writeln!(w, "{}\t{}\t{}", s.status.as_str_upper(), s.title, file_name)?;
    }
    Ok(())
}
