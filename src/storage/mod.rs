pub mod catalog;
pub mod engine;
pub mod memory;
pub mod persistence;
pub mod schema;
pub mod table;

pub use catalog::Catalog;
pub use engine::Store;
pub use memory::MemoryStore;
pub use persistence::{DatabaseSnapshot, SnapshotManager};
pub use table::{ID_COLUMN, Table, TableSchema};
