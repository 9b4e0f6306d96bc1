//! SQLite storage implementation for the AlphaStream refresh engine.
//!
//! The only crate in the workspace with Diesel dependencies. It implements
//! the storage traits defined in `alphastream-core` and contains:
//! - Connection pooling and pragmas
//! - Embedded migrations
//! - The single-writer actor
//! - The cache repository (records + outcome log)
//!
//! ```text
//! core (policy/orchestration)
//!            │
//!            ▼
//!   storage-sqlite (this crate)
//!            │
//!            ▼
//!        SQLite DB
//! ```

pub mod cache;
pub mod db;
pub mod errors;
pub mod schema;

// Re-export database utilities
pub use db::{create_pool, get_connection, run_migrations, spawn_writer, DbConnection, DbPool, WriteHandle};

// Re-export the repository
pub use cache::CacheRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from alphastream-core for convenience
pub use alphastream_core::{DatabaseError, Error, Result};
