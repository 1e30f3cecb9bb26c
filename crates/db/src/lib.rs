//! Persistence core for the dealerlot backend.
//!
//! Hand-written SQL over a sqlx Postgres pool: concurrency-stamped CRUD
//! repositories for cars, dealers, and users, a credential store for the
//! external identity layer, role storage, and the transactional cascading
//! delete of a dealer.

pub mod error;
pub mod models;
pub mod repositories;

pub use error::{DbError, DbResult};
