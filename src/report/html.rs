use crate::core::model::{Section, Status};
use crate::core::table::Table;
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// One extracted module as shown on a page.
pub struct PageSection<'a> {
    pub section: Section,
    pub table: &'a Table,
    pub svg: Option<&'a str>,
}

/// Standalone page for a single module: chart plus its table.
pub fn write_section_page(path: &Path, source: &str, entry: &PageSection) -> Result<()> {
    let mut html = String::with_capacity(64 * 1024);
    write_head(
        &mut html,
        &format!("{} - {}", entry.section.title(), source),
    )?;
    writeln!(html, "<body>")?;
    writeln!(
        html,
        "<div class=\"meta\">File: {}</div>",
        escape_html(source)
    )?;
    module(&mut html, entry, false)?;
    write_script(&mut html);
    writeln!(html, "</body></html>")?;
    write_file(path, &html)
}

/// Index page linking every extracted module with its status and chart.
pub fn write_index(
    path: &Path,
    source: &str,
    version: Option<&str>,
    entries: &[PageSection],
) -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut html = String::with_capacity(256 * 1024);
    write_head(&mut html, &format!("fastqc-extract: {}", source))?;
    writeln!(html, "<body>")?;
    writeln!(html, "<h1>fastqc-extract</h1>")?;
    writeln!(
        html,
        "<div class=\"meta\">File: <b>{}</b><br/>FastQC version: {}<br/>Generated: {}</div>",
        escape_html(source),
        version.map(escape_html).unwrap_or_else(|| "unknown".into()),
        fmt_timestamp(ts)
    )?;

    writeln!(html, "<h2>Summary</h2>")?;
    writeln!(html, "<table class=\"summary\">")?;
    writeln!(html, "<tr><th>Status</th><th>Module</th></tr>")?;
    for e in entries {
        summary_row(&mut html, e.table.status, e.section)?;
    }
    writeln!(html, "</table>")?;

    for e in entries {
        module(&mut html, e, true)?;
    }
    write_script(&mut html);
    writeln!(html, "</body></html>")?;
    write_file(path, &html)
}

fn write_head(html: &mut String, title: &str) -> Result<()> {
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>"
    )?;
    writeln!(html, "<title>{}</title>", escape_html(title))?;
    writeln!(html, "<style>")?;
    writeln!(
        html,
        "body{{font-family:Arial,Helvetica,sans-serif;margin:20px;color:#222;background:#fff;}}"
    )?;
    writeln!(html, "h1{{margin:0 0 8px 0;font-size:24px;}}")?;
    writeln!(html, "h2{{margin:24px 0 8px 0;font-size:20px;}}")?;
    writeln!(
        html,
        ".meta{{color:#555;font-size:13px;margin-bottom:16px;}}"
    )?;
    writeln!(
        html,
        ".summary{{border-collapse:collapse;margin:12px 0 20px 0;width:100%;max-width:900px;}}"
    )?;
    writeln!(
        html,
        ".summary th,.summary td{{border:1px solid #ddd;padding:6px 10px;text-align:left;}}"
    )?;
    writeln!(html, ".pass{{color:#0a7a0a;font-weight:bold;}}")?;
    writeln!(html, ".warn{{color:#d98200;font-weight:bold;}}")?;
    writeln!(html, ".fail{{color:#c00000;font-weight:bold;}}")?;
    writeln!(
        html,
        ".module{{border-top:1px solid #eee;padding-top:8px;}}"
    )?;
    writeln!(html, ".plot{{margin:8px 0 6px 0;}}")?;
    writeln!(
        html,
        ".kv{{color:#444;font-size:13px;margin:4px 0 10px 0;}}"
    )?;
    writeln!(
        html,
        ".table{{border-collapse:collapse;width:100%;max-width:1000px;font-size:12px;}}"
    )?;
    writeln!(
        html,
        ".table th,.table td{{border:1px solid #ddd;padding:4px 6px;text-align:right;}}"
    )?;
    writeln!(
        html,
        ".table th:first-child,.table td:first-child{{text-align:left;}}"
    )?;
    writeln!(html, "details{{margin:6px 0 18px 0;}}")?;
    writeln!(html, "svg{{background:#fafafa;border:1px solid #e5e5e5;}}")?;
    writeln!(html, "</style>")?;
    writeln!(html, "</head>")?;
    Ok(())
}

fn write_script(html: &mut String) {
    html.push_str("<script>");
    html.push_str(r#"document.querySelectorAll('table.sortable').forEach(t=>{const h=t.querySelectorAll('th');h.forEach((th,i)=>{th.style.cursor='pointer';th.addEventListener('click',()=>{const rows=[...t.querySelectorAll('tr')].slice(1);const asc=th.getAttribute('data-asc')!=='true';rows.sort((a,b)=>{const av=a.children[i].innerText;const bv=b.children[i].innerText;const an=parseFloat(av);const bn=parseFloat(bv);if(!isNaN(an)&&!isNaN(bn)){return asc?an-bn:bn-an;}return asc?av.localeCompare(bv):bv.localeCompare(av);});th.setAttribute('data-asc',asc);rows.forEach(r=>t.appendChild(r));});});});"#);
    html.push_str("</script>\n");
}

fn write_file(path: &Path, html: &str) -> Result<()> {
    let mut w = BufWriter::new(
        File::create(path).with_context(|| format!("create {} failed", path.display()))?,
    );
    w.write_all(html.as_bytes())?;
    w.flush()?;
    Ok(())
}

fn summary_row(out: &mut String, status: Status, section: Section) -> Result<()> {
    writeln!(
        out,
        "<tr><td class=\"{}\">{}</td><td><a href=\"#{}\">{}</a></td></tr>",
        status.as_str_lower(),
        status.as_str_upper(),
        section.key(),
        section.title()
    )?;
    Ok(())
}

fn module(out: &mut String, entry: &PageSection, collapse_table: bool) -> Result<()> {
    let status = entry.table.status;
    writeln!(
        out,
        "<div class=\"module\" id=\"{}\"><h2><span class=\"{}\">[{}]</span> {}</h2>",
        entry.section.key(),
        status.as_str_lower(),
        status.as_str_upper(),
        entry.section.title()
    )?;
    if !entry.table.meta.is_empty() {
        writeln!(out, "<div class=\"kv\">")?;
        for (k, v) in &entry.table.meta {
            writeln!(out, "{}: <b>{}</b><br/>", escape_html(k), escape_html(v))?;
        }
        writeln!(out, "</div>")?;
    }
    if let Some(svg) = entry.svg {
        writeln!(out, "<div class=\"plot\">{}</div>", svg)?;
    }
    if entry.table.header.is_empty() && entry.table.is_empty() {
        writeln!(out, "<div class=\"kv\">No entries.</div>")?;
    } else if collapse_table {
        writeln!(out, "<details><summary>Table</summary>")?;
        table_html(out, entry.table)?;
        writeln!(out, "</details>")?;
    } else {
        table_html(out, entry.table)?;
    }
    writeln!(out, "</div>")?;
    Ok(())
}

fn table_html(out: &mut String, table: &Table) -> Result<()> {
    writeln!(out, "<table class=\"table sortable\">")?;
    write!(out, "<tr>")?;
    for h in &table.header {
        write!(out, "<th>{}</th>", escape_html(h))?;
    }
    writeln!(out, "</tr>")?;
    for row in &table.rows {
        write!(out, "<tr>")?;
        for c in row {
            write!(out, "<td>{}</td>", escape_html(c))?;
        }
        writeln!(out, "</tr>")?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn fmt_timestamp(ts: u64) -> String {
    let days = (ts / 86_400) as i64;
    let secs = (ts % 86_400) as u32;
    let hour = secs / 3_600;
    let min = (secs % 3_600) / 60;
    let sec = secs % 60;

    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = mp + if mp < 10 { 3 } else { -9 };
    let year = y + if m <= 2 { 1 } else { 0 };

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        year, m, d, hour, min, sec
    )
}
