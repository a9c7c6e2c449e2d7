pub mod dispatch;
pub mod rank;
pub mod reader;
pub mod tokenizer;
pub mod version;

pub use dispatch::{LineKind, RecordBuilder};
pub use rank::{RankComponent, RankId, SymbolicRank, decode_rank};
pub use reader::{FormatReader, ReaderState};
pub use version::{FormatVersion, VersionParts};
