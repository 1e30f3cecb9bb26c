//! Concurrency stamp generation.
//!
//! A stamp is an opaque version marker on a row, replaced on every successful
//! write and compared in the write's WHERE clause to detect lost updates. It
//! only needs to be unguessable across concurrent writers, not
//! cryptographically strong.

use uuid::Uuid;

/// Generate a fresh opaque concurrency stamp.
pub fn new_stamp() -> String {
    Uuid::new_v4().to_string()
}
