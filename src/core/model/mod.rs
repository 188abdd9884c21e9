use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("pass") {
            Some(Status::Pass)
        } else if s.eq_ignore_ascii_case("warn") {
            Some(Status::Warn)
        } else if s.eq_ignore_ascii_case("fail") {
            Some(Status::Fail)
        } else {
            None
        }
    }

    pub fn as_str_lower(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Warn => "warn",
            Status::Fail => "fail",
        }
    }

    pub fn as_str_upper(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_lower())
    }
}

/// One of the three artefacts an extracted section can produce.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Output {
    /// Section text as it appears in the report.
    Raw,
    /// Chart rendered from the table.
    Plot,
    /// Table file (CSV/TSV).
    Formatted,
}

impl Output {
    pub fn code(self) -> char {
        match self {
            Output::Raw => 'R',
            Output::Plot => 'P',
            Output::Formatted => 'F',
        }
    }
}

pub const DEFAULT_OUTPUTS: [Output; 3] = [Output::Raw, Output::Plot, Output::Formatted];

/// The QC modules of a FastQC report that can be extracted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Section {
    PerBaseSeqQual,
    PerTileSeqQual,
    PerSeqQualScores,
    PerBaseSeqContent,
    PerSeqGcCont,
    PerBaseNCont,
    SeqLenDist,
    SeqDup,
    OverSeq,
    AdapCont,
    KmerCont,
}

impl Section {
    pub const ALL: [Section; 11] = [
        Section::PerBaseSeqQual,
        Section::PerTileSeqQual,
        Section::PerSeqQualScores,
        Section::PerBaseSeqContent,
        Section::PerSeqGcCont,
        Section::PerBaseNCont,
        Section::SeqLenDist,
        Section::SeqDup,
        Section::OverSeq,
        Section::AdapCont,
        Section::KmerCont,
    ];

    /// Command-line key, also used for output directory and file names.
    pub fn key(self) -> &'static str {
        match self {
            Section::PerBaseSeqQual => "per_base_seq_qual",
            Section::PerTileSeqQual => "per_tile_seq_qual",
            Section::PerSeqQualScores => "per_seq_qual_scores",
            Section::PerBaseSeqContent => "per_base_seq_content",
            Section::PerSeqGcCont => "per_seq_GC_cont",
            Section::PerBaseNCont => "per_base_N_cont",
            Section::SeqLenDist => "seq_len_dist",
            Section::SeqDup => "seq_dup",
            Section::OverSeq => "over_seq",
            Section::AdapCont => "adap_cont",
            Section::KmerCont => "kmer_cont",
        }
    }

    /// Module title as written after `>>` in the report.
    pub fn title(self) -> &'static str {
        match self {
            Section::PerBaseSeqQual => "Per base sequence quality",
            Section::PerTileSeqQual => "Per tile sequence quality",
            Section::PerSeqQualScores => "Per sequence quality scores",
            Section::PerBaseSeqContent => "Per base sequence content",
            Section::PerSeqGcCont => "Per sequence GC content",
            Section::PerBaseNCont => "Per base N content",
            Section::SeqLenDist => "Sequence Length Distribution",
            Section::SeqDup => "Sequence Duplication Levels",
            Section::OverSeq => "Overrepresented sequences",
            Section::AdapCont => "Adapter Content",
            Section::KmerCont => "Kmer Content",
        }
    }

    /// Alternative titles seen in the wild.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Section::KmerCont => &["K-mer Content"],
            _ => &[],
        }
    }

    pub fn matches_title(self, title: &str) -> bool {
        self.title() == title || self.aliases().contains(&title)
    }

    pub fn from_title(title: &str) -> Option<Self> {
        Section::ALL.into_iter().find(|s| s.matches_title(title))
    }

    /// Length distribution and overrepresented sequences are tabular only.
    pub fn is_chartable(self) -> bool {
        !matches!(self, Section::SeqLenDist | Section::OverSeq)
    }

    pub fn required_outputs(self) -> Vec<Output> {
        DEFAULT_OUTPUTS
            .into_iter()
            .filter(|o| *o != Output::Plot || self.is_chartable())
            .collect()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_drop_plot_for_tabular_sections() {
        assert_eq!(
            Section::SeqLenDist.required_outputs(),
            vec![Output::Raw, Output::Formatted]
        );
        assert_eq!(
            Section::OverSeq.required_outputs(),
            vec![Output::Raw, Output::Formatted]
        );
        assert_eq!(
            Section::SeqDup.required_outputs(),
            vec![Output::Raw, Output::Plot, Output::Formatted]
        );
    }

    #[test]
    fn titles_resolve_including_aliases() {
        assert_eq!(
            Section::from_title("Per base N content"),
            Some(Section::PerBaseNCont)
        );
        assert_eq!(Section::from_title("K-mer Content"), Some(Section::KmerCont));
        assert_eq!(Section::from_title("Kmer Content"), Some(Section::KmerCont));
        assert_eq!(Section::from_title("Basic Statistics"), None);
    }

    #[test]
    fn titles_round_trip() {
        for s in Section::ALL {
            assert_eq!(Section::from_title(s.title()), Some(s));
        }
    }

    #[test]
    fn status_is_case_insensitive() {
        assert_eq!(Status::parse("PASS"), Some(Status::Pass));
        assert_eq!(Status::parse("warn "), Some(Status::Warn));
        assert_eq!(Status::parse("Fail"), Some(Status::Fail));
        assert_eq!(Status::parse("ok"), None);
    }
}
