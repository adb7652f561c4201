//! SQLite persistence for entity snapshots and the processing checkpoint.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
