//! Database repository implementations

pub mod directory_repository;
pub mod sqlite_store;

pub use directory_repository::DirectoryRepository;
pub use sqlite_store::{SqliteInboxStore, SqliteInboxTransaction};
