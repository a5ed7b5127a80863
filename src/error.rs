use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop the load -> aggregate -> plot pipeline.
/// None of these are recovered from; the binary reports and exits.
#[derive(Error, Debug)]
pub enum Error {
    #[error("input file `{}` not found", .path.display())]
    InputNotFound { path: PathBuf },

    /// Not valid delimited text, a required column is missing,
    /// or a `Views` cell is not a non-negative integer.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unparseable date `{value}` on line {line}")]
    UnparseableDate { line: u64, value: String },

    #[error("no rows with non-zero views to plot")]
    EmptySeries,

    #[error("failed to draw the chart: {0}")]
    Render(String),

    /// No graphical viewer could be opened, e.g. without a display.
    #[error("failed to display the chart: {0}")]
    Display(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// I/O failures while reading stay I/O errors; everything else csv reports
/// (ragged rows, invalid UTF-8) is malformed input.
impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        let msg = e.to_string();
        match e.into_kind() {
            csv::ErrorKind::Io(io) => Error::Io(io),
            _ => Error::MalformedInput(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
