use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Ragged table {what}: row {row} has {found} columns, expected {expected}")]
    Shape {
        what: &'static str,
        row: usize,
        found: usize,
        expected: usize,
    },
}
