//! Well-known role name constants.
//!
//! These must match the seed data in `20260810000004_create_roles_table.sql`.

/// Unrestricted administrator: passes every ownership policy check.
pub const ROLE_SUPER_ADMIN: &str = "SuperAdmin";

/// Dealership staff: scoped to their own user row and their own dealer.
pub const ROLE_DEALER: &str = "Dealer";

/// Case-fold a name into its normalized lookup form.
///
/// Normalized username, email, and role-name columns all store this form so
/// lookups never case-fold at query time.
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase()
}
