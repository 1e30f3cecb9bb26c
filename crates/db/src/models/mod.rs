//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row (joined reads also
//!   carry the owning dealer's name)
//! - A `Deserialize` create DTO for inserts
//! - Update DTOs where the update surface is more than a pair of scalars

pub mod car;
pub mod dealer;
pub mod role;
pub mod user;

pub use car::{Car, CreateCar, UpdateCarDetails};
pub use dealer::{CreateDealer, Dealer};
pub use role::Role;
pub use user::{CreateUser, UpdateUserProfile, User};
