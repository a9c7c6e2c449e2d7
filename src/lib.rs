// ============================================================================
// PMTM Import Library
// ============================================================================

pub mod config;
pub mod core;
pub mod format;
pub mod import;
pub mod model;
pub mod parser;
pub mod sql;
pub mod storage;

use std::path::Path;

pub use config::ImportConfig;
pub use core::{DataType, DbError, ErrorCategory, FormatError, ImportError, Value};
pub use format::{FormatReader, FormatVersion};
pub use import::{ImportOrchestrator, ImportReport};
pub use model::PmtmRecord;
pub use storage::{MemoryStore, Store};

/// Result of reading or importing a PMTM file.
pub type Result<T> = std::result::Result<T, ImportError>;

// ============================================================================
// High-level API
// ============================================================================

/// Open the store named by `config` and import one file into it.
///
/// Without a `store_path` the store lives in memory only, which is useful
/// together with `dry_run` to validate a file.
///
/// # Examples
///
/// ```no_run
/// use pmtm_import::{ImportConfig, import_path};
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ImportConfig::from_env().store_path("results.db");
/// let report = import_path(Path::new("chimaera.pmtm"), config)?;
/// println!("Imported run {} ({} timers)", report.run_id, report.timers);
/// # Ok(())
/// # }
/// ```
pub fn import_path(path: &Path, config: ImportConfig) -> Result<ImportReport> {
    let mut store = match &config.store_path {
        Some(store_path) => MemoryStore::open(store_path)?,
        None => MemoryStore::new(),
    };
    ImportOrchestrator::new(config).import_file(&mut store, path)
}
