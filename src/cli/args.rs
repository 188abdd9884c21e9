use crate::core::model::Section;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fastqc-extract",
    version,
    about = "Extract, tabulate and chart sections of FastQC reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write tables and charts for the selected sections.
    Extract(ExtractArgs),
    /// Print the modules present in a report.
    List(ListArgs),
}

#[derive(Parser)]
pub struct ExtractArgs {
    /// fastqc_data.txt, a gzipped copy of it, or a FastQC _fastqc.zip archive.
    pub input: PathBuf,

    /// Directory to save tables and plots in.
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub sections: SectionFlags,

    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,

    #[arg(long, default_value_t = false)]
    pub no_plot: bool,

    /// Also convert each chart to PDF.
    #[arg(long, default_value_t = false)]
    pub pdf: bool,

    #[arg(long, default_value_t = false)]
    pub no_zip: bool,
}

#[derive(Parser)]
pub struct ListArgs {
    pub input: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// At least one section must be chosen; clap rejects the command otherwise.
#[derive(Args, Clone, Debug, Default)]
#[group(required = true, multiple = true)]
pub struct SectionFlags {
    /// Extract and plot per base sequence quality.
    #[arg(short = 'b', long = "per_base_seq_qual")]
    pub per_base_seq_qual: bool,
    /// Extract and plot per tile sequence quality.
    #[arg(short = 't', long = "per_tile_seq_qual")]
    pub per_tile_seq_qual: bool,
    /// Extract and plot per sequence quality scores.
    #[arg(short = 's', long = "per_seq_qual_scores")]
    pub per_seq_qual_scores: bool,
    /// Extract and plot per base sequence content.
    #[arg(short = 'c', long = "per_base_seq_content")]
    pub per_base_seq_content: bool,
    /// Extract and plot per sequence GC content.
    #[arg(short = 'g', long = "per_seq_GC_cont")]
    pub per_seq_gc_cont: bool,
    /// Extract and plot per base N content.
    #[arg(short = 'n', long = "per_base_N_cont")]
    pub per_base_n_cont: bool,
    /// Extract sequence length distribution.
    #[arg(short = 'l', long = "seq_len_dist")]
    pub seq_len_dist: bool,
    /// Extract and plot sequence duplication levels.
    #[arg(short = 'd', long = "seq_dup")]
    pub seq_dup: bool,
    /// Extract overrepresented sequences.
    #[arg(short = 'o', long = "over_seq")]
    pub over_seq: bool,
    /// Extract and plot adapter content.
    #[arg(short = 'p', long = "adap_cont")]
    pub adap_cont: bool,
    /// Extract and plot k-mer content.
    #[arg(short = 'k', long = "kmer_cont")]
    pub kmer_cont: bool,
    /// Extract and plot all of the above.
    #[arg(short = 'a', long = "all")]
    pub all: bool,
}

impl SectionFlags {
    /// Selected sections in report order, without duplicates.
    pub fn selected(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|s| self.all || self.flag(*s))
            .collect()
    }

    fn flag(&self, section: Section) -> bool {
        match section {
            Section::PerBaseSeqQual => self.per_base_seq_qual,
            Section::PerTileSeqQual => self.per_tile_seq_qual,
            Section::PerSeqQualScores => self.per_seq_qual_scores,
            Section::PerBaseSeqContent => self.per_base_seq_content,
            Section::PerSeqGcCont => self.per_seq_gc_cont,
            Section::PerBaseNCont => self.per_base_n_cont,
            Section::SeqLenDist => self.seq_len_dist,
            Section::SeqDup => self.seq_dup,
            Section::OverSeq => self.over_seq,
            Section::AdapCont => self.adap_cont,
            Section::KmerCont => self.kmer_cont,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    #[value(name = "csv")]
    Csv,
    #[value(name = "tsv")]
    Tsv,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> ExtractArgs {
        let mut argv = vec!["fastqc-extract", "extract", "in.txt", "out"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Extract(a) => a,
            Commands::List(_) => panic!("expected extract"),
        }
    }

    #[test]
    fn short_and_long_flags_select_sections() {
        let a = parse(&["-l", "--seq_dup", "-o"]);
        assert_eq!(
            a.sections.selected(),
            [Section::SeqLenDist, Section::SeqDup, Section::OverSeq]
        );
        assert!(!a.no_zip);
        assert!(matches!(a.format, FormatArg::Csv));
    }

    #[test]
    fn mixed_case_long_flags() {
        let a = parse(&["--per_seq_GC_cont", "--per_base_N_cont", "--format", "tsv"]);
        assert_eq!(
            a.sections.selected(),
            [Section::PerSeqGcCont, Section::PerBaseNCont]
        );
        assert!(matches!(a.format, FormatArg::Tsv));
    }

    #[test]
    fn all_selects_everything_once() {
        let a = parse(&["-a", "-b"]);
        assert_eq!(a.sections.selected(), Section::ALL);
    }

    #[test]
    fn missing_section_flag_is_a_usage_error() {
        let err = Cli::try_parse_from(["fastqc-extract", "extract", "in.txt", "out"])
            .err()
            .expect("no section flag must be rejected");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn list_needs_no_section_flag() {
        let cli = Cli::try_parse_from(["fastqc-extract", "list", "in.txt", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::List(ListArgs { json: true, .. })));
    }
}
