//! Golden Cubes Persistence - SQLite-backed record store

pub mod sqlite;

pub use sqlite::Database;
