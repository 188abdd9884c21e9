use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: module `{title}` opened before `{open}` was closed")]
    NestedModule {
        line: usize,
        title: String,
        open: String,
    },
    #[error("module `{title}` opened at line {line} is missing >>END_MODULE")]
    Unterminated { line: usize, title: String },
    #[error("line {line}: >>END_MODULE without an open module")]
    StrayEnd { line: usize },
    #[error("line {line}: unknown status `{status}` for module `{title}`")]
    BadStatus {
        line: usize,
        title: String,
        status: String,
    },
    #[error("line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: data row before any #header row")]
    MissingHeader { line: usize },
    #[error("column `{column}` not found")]
    NoSuchColumn { column: String },
    #[error("row {row}, column `{column}`: `{value}` is not a number")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },
}
