use thiserror::Error;

/// Errors raised by a transactional store.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Unsupported value type: {0}")]
    UnsupportedValue(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

/// Errors raised while reading a PMTM file. Always fatal, and always raised
/// before any store interaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid PMTM file: first line is not the PMTM header")]
    InvalidHeader,

    #[error("Incomplete PMTM file: end of file marker not found")]
    IncompleteFile,

    #[error("Incomplete PMTM file: no PMTM version line found")]
    MissingVersion,

    #[error("Line {0} is not valid UTF-8")]
    InvalidEncoding(usize),

    #[error("Unknown line type '{0}'")]
    UnknownLineType(String),

    #[error("Line '{line}' is missing field {index}")]
    MissingField { line: String, index: usize },

    #[error("Invalid rank '{0}'")]
    InvalidRank(String),

    #[error("Invalid PMTM version '{0}'")]
    InvalidVersion(String),

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Invalid date or time '{0}'")]
    InvalidDateTime(String),
}

/// Coarse classification used when reporting a failed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Format,
    Integrity,
    Precondition,
    Store,
}

/// Errors raised while importing a parsed file into a store.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Multiple entries found for {0}")]
    AmbiguousKey(String),

    #[error("Failed to save {0}")]
    InsertFailed(String),

    #[error("Failed to save {0}: no id found after insert")]
    UnresolvedId(String),

    #[error("Run already in database (id {0})")]
    RunAlreadyImported(i64),

    #[error(transparent)]
    Store(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Format(_) => ErrorCategory::Format,
            Self::AmbiguousKey(_) | Self::InsertFailed(_) | Self::UnresolvedId(_) => {
                ErrorCategory::Integrity
            }
            Self::Store(DbError::UnsupportedValue(_)) => ErrorCategory::Integrity,
            Self::RunAlreadyImported(_) => ErrorCategory::Precondition,
            Self::Store(_) | Self::Io(_) => ErrorCategory::Store,
        }
    }
}
