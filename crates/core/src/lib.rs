//! Domain leaves shared across the dealerlot workspace: id/stamp primitives,
//! well-known role names, and the pure ownership-policy rules.

pub mod policy;
pub mod roles;
pub mod stamp;
pub mod types;
