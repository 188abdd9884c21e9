use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Bundle the listed outputs of `dir` into `<parent>/<dir name>.zip`, rooted at `<dir name>/`.
///
/// `files` are `/`-separated paths relative to `dir`; nothing else under `dir` is archived.
pub fn write_zip(dir: &Path, files: &[String]) -> Result<PathBuf> {
    let root = dir
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .context("output directory has no usable name")?;
    let parent = dir.parent().unwrap_or_else(|| Path::new("."));
    let zip_path = parent.join(format!("{}.zip", root));
    let tmp_path = parent.join(format!("{}.zip.tmp", root));

    let file = File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let result = write_zip_entries(&mut zip, dir, &root, files);

    match result.and_then(|_| zip.finish().with_context(|| "failed to finalize zip")) {
        Ok(_) => {
            fs::rename(&tmp_path, &zip_path)
                .with_context(|| format!("failed to move zip to {}", zip_path.display()))?;
            Ok(zip_path)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

/// Entries are added in sorted order so archives are reproducible.
fn write_zip_entries(
    zip: &mut ZipWriter<File>,
    dir: &Path,
    root: &str,
    files: &[String],
) -> Result<()> {
    let epoch = zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0)
        .map_err(|e| anyhow::anyhow!("invalid zip timestamp: {e}"))?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(epoch);

    zip.add_directory(format!("{}/", root), options)
        .with_context(|| "failed to add directory entry to zip")?;

    let files: BTreeSet<&str> = files.iter().map(String::as_str).collect();
    let mut dirs = BTreeSet::new();
    for name in files {
        if let Some((sub, _)) = name.rsplit_once('/')
            && dirs.insert(sub)
        {
            zip.add_directory(format!("{}/{}/", root, sub), options)
                .with_context(|| format!("failed to add {} to zip", sub))?;
        }
        let src_path = name.split('/').fold(dir.to_path_buf(), |p, c| p.join(c));
        let zip_path = format!("{}/{}", root, name);
        add_file(zip, &src_path, &zip_path, options)
            .with_context(|| format!("failed to add {} to zip", name))?;
    }
    Ok(())
}

fn add_file(
    zip: &mut ZipWriter<File>,
    src_path: &Path,
    zip_path: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    let mut file =
        File::open(src_path).with_context(|| format!("failed to open {}", src_path.display()))?;
    zip.start_file(zip_path, options)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        zip.write_all(&buf[..n])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::ZipArchive;

    #[test]
    fn bundles_listed_outputs_only() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("run1");
        fs::create_dir_all(out.join("adap_cont")).unwrap();
        fs::create_dir_all(out.join("kmer_cont")).unwrap();
        fs::write(out.join("summary.txt"), "PASS\tAdapter Content\tx\n").unwrap();
        fs::write(out.join("adap_cont").join("adap_cont.csv"), "Position,A\n").unwrap();
        fs::write(out.join("adap_cont").join("adap_cont.txt"), ">>END_MODULE\n").unwrap();
        fs::write(out.join("kmer_cont").join("kmer_cont.csv"), "stale\n").unwrap();
        fs::write(out.join("reads.bam"), "not ours").unwrap();

        let files = [
            "summary.txt".to_string(),
            "adap_cont/adap_cont.txt".to_string(),
            "adap_cont/adap_cont.csv".to_string(),
        ];
        let zip_path = write_zip(&out, &files).unwrap();
        assert_eq!(zip_path, tmp.path().join("run1.zip"));
        assert!(!tmp.path().join("run1.zip.tmp").exists());

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(|s| s.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            [
                "run1/",
                "run1/adap_cont/",
                "run1/adap_cont/adap_cont.csv",
                "run1/adap_cont/adap_cont.txt",
                "run1/summary.txt"
            ]
        );
        let mut csv = String::new();
        archive
            .by_name("run1/adap_cont/adap_cont.csv")
            .unwrap()
            .read_to_string(&mut csv)
            .unwrap();
        assert_eq!(csv, "Position,A\n");
    }

    #[test]
    fn missing_listed_file_fails_and_leaves_no_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("run2");
        fs::create_dir_all(&out).unwrap();
        let err = write_zip(&out, &["summary.txt".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("failed to add summary.txt to zip"));
        assert!(!tmp.path().join("run2.zip.tmp").exists());
        assert!(!tmp.path().join("run2.zip").exists());
    }
}
