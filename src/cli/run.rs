use crate::cli::args::{Cli, Commands, ExtractArgs, FormatArg, ListArgs, SectionFlags};
use crate::core::engine::{self, Extracted, ParsedArg, RunConfig};
use crate::core::io;
use crate::core::model::Output;
use crate::core::section::{self, RawSection};
use crate::report;
use crate::report::html::PageSection;
use crate::report::table_txt::TableFormat;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FQX_LOG";
const SUMMARY_FILE: &str = "summary.txt";
const INDEX_FILE: &str = "fastqc_extract.html";

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Commands::Extract(args) => extract(args),
        Commands::List(args) => list(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Selected sections, each with its required outputs configured.
pub fn handle_cli_args(flags: &SectionFlags) -> Result<Vec<ParsedArg>> {
    let sections = flags.selected();
    if sections.is_empty() {
        bail!("no section selected; pass at least one section flag such as -b or --all");
    }
    let parsed: Vec<ParsedArg> = sections.into_iter().map(ParsedArg::new).collect();
    for p in &parsed {
        let outputs: String = p.required_outputs.iter().map(|o| o.code()).collect();
        debug!(section = p.section.key(), outputs = %outputs, "section requested");
    }
    Ok(parsed)
}

fn extract(args: ExtractArgs) -> Result<()> {
    let t0 = Instant::now();

    stage("preflight", || {
        if !args.input.is_file() {
            bail!("input file not found: {}", args.input.display());
        }
        Ok(())
    })?;

    let sections = handle_cli_args(&args.sections)?;
    let format = match args.format {
        FormatArg::Csv => TableFormat::Csv,
        FormatArg::Tsv => TableFormat::Tsv,
    };

    let t_out = Instant::now();
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create output dir {}", args.output_dir.display()))?;
    let out_dir = fs::canonicalize(&args.output_dir)
        .with_context(|| format!("failed to resolve {}", args.output_dir.display()))?;
    stage_done("mkdir", t_out);

    let config = RunConfig {
        input: args.input.clone(),
        sections,
    };
    let t_engine = Instant::now();
    let output = engine::run(&config)?;
    stage_done("extract", t_engine);

    if output.extracted.is_empty() {
        bail!(
            "none of the requested sections were found in {}",
            args.input.display()
        );
    }

    // Paths relative to `out_dir` written by this run; only these go into the zip.
    let mut written: Vec<String> = Vec::new();
    let mut charts: Vec<Option<String>> = Vec::with_capacity(output.extracted.len());
    for e in &output.extracted {
        let t_section = Instant::now();
        let svg = write_section(&out_dir, e, &output.file_name, format, &args, &mut written)?;
        charts.push(svg);
        info!(
            section = e.arg.section.key(),
            status = %e.raw.status,
            rows = e.table.rows.len(),
            "section written"
        );
        stage_done(e.arg.section.key(), t_section);
    }

    let t_summary = Instant::now();
    let summary_path = out_dir.join(SUMMARY_FILE);
    let raws: Vec<&RawSection> = output.extracted.iter().map(|e| &e.raw).collect();
    report::summary_txt::write(&summary_path, &raws, &output.file_name)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    written.push(SUMMARY_FILE.to_string());
    stage_done("summary", t_summary);

    let t_html = Instant::now();
    let index_path = out_dir.join(INDEX_FILE);
    let pages: Vec<PageSection> = output
        .extracted
        .iter()
        .zip(charts.iter())
        .map(|(e, svg)| PageSection {
            section: e.arg.section,
            table: &e.table,
            svg: svg.as_deref(),
        })
        .collect();
    report::html::write_index(
        &index_path,
        &output.file_name,
        output.version.as_deref(),
        &pages,
    )
    .with_context(|| format!("failed to write {}", index_path.display()))?;
    written.push(INDEX_FILE.to_string());
    stage_done("html", t_html);

    if !args.no_zip {
        let t_zip = Instant::now();
        let zip_path = report::zip::write_zip(&out_dir, &written)
            .with_context(|| "failed to create zip output")?;
        stage_done("zip", t_zip);
        info!(path = %zip_path.display(), "archive written");
    }

    info!(
        output_dir = %out_dir.display(),
        sections = output.extracted.len(),
        missing = output.missing.len(),
        total = %fmt_dur(t0.elapsed()),
        "done"
    );
    Ok(())
}

/// Write the R/F/P artefacts of one section under `<out_dir>/<key>/`; returns the chart.
/// Each file written is appended to `written` as `<key>/<file>`.
fn write_section(
    out_dir: &Path,
    e: &Extracted,
    file_name: &str,
    format: TableFormat,
    args: &ExtractArgs,
    written: &mut Vec<String>,
) -> Result<Option<String>> {
    let key = e.arg.section.key();
    let dir = out_dir.join(key);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output dir {}", dir.display()))?;

    let mut record = |name: String| {
        let path = dir.join(&name);
        written.push(format!("{}/{}", key, name));
        path
    };

    if e.arg.wants(Output::Raw) {
        let path = record(format!("{}.txt", key));
        report::table_txt::write_raw(&path, &e.raw)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if e.arg.wants(Output::Formatted) {
        let path = record(format!("{}.{}", key, format.extension()));
        report::table_txt::write_table(&path, &e.table, format)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if !e.arg.wants(Output::Plot) || args.no_plot {
        return Ok(None);
    }
    let Some(svg) = report::chart::render(e.arg.section, &e.table)? else {
        return Ok(None);
    };
    let svg_path = record(format!("{}.svg", key));
    fs::write(&svg_path, &svg)
        .with_context(|| format!("failed to write {}", svg_path.display()))?;

    let html_path = record(format!("{}.html", key));
    let page = PageSection {
        section: e.arg.section,
        table: &e.table,
        svg: Some(&svg),
    };
    report::html::write_section_page(&html_path, file_name, &page)
        .with_context(|| format!("failed to write {}", html_path.display()))?;

    if args.pdf {
        let pdf_path = record(format!("{}.pdf", key));
        report::pdf::write(&pdf_path, &svg)?;
    }
    Ok(Some(svg))
}

fn list(args: ListArgs) -> Result<()> {
    let t_read = Instant::now();
    let text = io::read_report(&args.input)?;
    stage_done("read", t_read);

    let report = section::scan(&text)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    let listing = report::listing::build(&report);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        report::listing::write_json(&mut out, &listing)?;
    } else {
        report::listing::write_text(&mut out, &listing)?;
    }
    out.flush()?;
    Ok(())
}

fn stage<F>(name: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let t = Instant::now();
    let res = f();
    stage_done(name, t);
    res
}

fn stage_done(name: &str, t: Instant) {
    debug!(stage = name, time = %fmt_dur(t.elapsed()), "stage finished");
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
