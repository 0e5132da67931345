//! Error types shared across the labeling library.

use thiserror::Error;

/// Result alias for labeling operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Tile id did not split into exactly two numeric coordinates.
    #[error("malformed tile identifier `{0}`: expected `<lat>_<lon>[.ext]`")]
    MalformedIdentifier(String),

    /// The table has no numeric category columns.
    #[error("no numeric category columns in {0}")]
    EmptyCategorySet(String),

    /// Cursor addressed outside the current subset.
    #[error("index {index} out of range for subset of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    /// A stored label has no matching subset row. Labels and subset are
    /// replaced together, so this indicates a lifecycle bug.
    #[error("label for `{0}` has no matching row in the current subset")]
    LabelJoin(String),

    /// Filter referenced a category the table does not have.
    #[error("unknown category `{0}`")]
    UnknownCategory(String),

    /// Variant profile file could not be parsed.
    #[error("invalid profile: {0}")]
    Profile(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
