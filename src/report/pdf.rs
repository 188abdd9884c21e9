use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use svg2pdf::{ConversionOptions, PageOptions, usvg};

pub fn write(path: &Path, svg: &str) -> Result<()> {
    let pdf = svg_to_pdf(svg)
        .with_context(|| format!("failed to convert {} to PDF", path.display()))?;
    fs::write(path, pdf).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|e| anyhow::anyhow!("usvg parse failed: {e}"))?;
    let pdf = svg2pdf::to_pdf(&tree, ConversionOptions::default(), PageOptions::default())
        .map_err(|e| anyhow::anyhow!("svg2pdf conversion failed: {e}"))?;
    Ok(pdf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_chart_svg() {
        let svg = crate::report::chart::svg::simple_text_svg("Adapter Content", &[]);
        let pdf = svg_to_pdf(&svg).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn rejects_malformed_svg() {
        assert!(svg_to_pdf("<svg").is_err());
    }
}
