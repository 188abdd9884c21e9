use anyhow::{Context, Result, anyhow, bail};
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::Utf8Error;
use tracing::debug;
use zip::ZipArchive;

const REPORT_ENTRY: &str = "fastqc_data.txt";

pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        // SAFETY: read-only file mapping.
        let mmap = unsafe { Mmap::map(&file) }.with_context(|| "mmap failed")?;
        Ok(Self { mmap })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputKind {
    Plain,
    Gzip,
    Zip,
}

pub fn detect_input_kind(path: &Path) -> Result<InputKind> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut magic = [0u8; 4];
    let n = file
        .read(&mut magic)
        .with_context(|| "failed to read magic bytes")?;
    if n >= 2 && magic[..2] == [0x1f, 0x8b] {
        Ok(InputKind::Gzip)
    } else if n == 4 && magic == *b"PK\x03\x04" {
        Ok(InputKind::Zip)
    } else {
        Ok(InputKind::Plain)
    }
}

/// Load the report text from a plain, gzipped or FastQC zip input.
pub fn read_report(path: &Path) -> Result<String> {
    let kind = detect_input_kind(path)?;
    debug!(input = %path.display(), ?kind, "loading report");
    match kind {
        InputKind::Plain => {
            let len = path
                .metadata()
                .with_context(|| format!("failed to stat {}", path.display()))?
                .len();
            if len == 0 {
                return Ok(String::new());
            }
            // Checked on the mapping, then copied once.
            let src = MmapSource::open(path)?;
            Ok(as_utf8(path, src.bytes())?.to_owned())
        }
        InputKind::Gzip => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            let mut out = Vec::new();
            MultiGzDecoder::new(BufReader::new(file))
                .read_to_end(&mut out)
                .with_context(|| format!("gzip decompression failed for {}", path.display()))?;
            into_utf8(path, out)
        }
        InputKind::Zip => into_utf8(path, read_zip_entry(path)?),
    }
}

fn as_utf8<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| not_utf8(path, &e))
}

fn into_utf8(path: &Path, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| not_utf8(path, &e.utf8_error()))
}

fn not_utf8(path: &Path, e: &Utf8Error) -> anyhow::Error {
    anyhow!(
        "{} is not valid UTF-8 (byte offset {})",
        path.display(),
        e.valid_up_to()
    )
}

fn read_zip_entry(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("failed to read zip archive {}", path.display()))?;

    let Some(name) = find_report_entry(archive.file_names()) else {
        bail!("{} contains no {}", path.display(), REPORT_ENTRY);
    };
    debug!(entry = %name, "reading report from archive");
    let mut entry = archive
        .by_name(&name)
        .with_context(|| format!("failed to open {} in {}", name, path.display()))?;
    let mut out = Vec::new();
    entry
        .read_to_end(&mut out)
        .with_context(|| format!("failed to read {} in {}", name, path.display()))?;
    Ok(out)
}

/// Shallowest `fastqc_data.txt` entry, which in a FastQC archive is `<sample>_fastqc/fastqc_data.txt`.
fn find_report_entry<'a, I>(names: I) -> Option<String>
where
    I: Iterator<Item = &'a str>,
{
    names
        .filter(|n| *n == REPORT_ENTRY || n.ends_with(&format!("/{}", REPORT_ENTRY)))
        .min_by_key(|n| n.matches('/').count())
        .map(str::to_string)
}
