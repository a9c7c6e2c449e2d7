pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, ErrorCategory, FormatError, ImportError, Result};
pub use types::{Column, Row, Schema};
pub use value::{DataType, Value};
