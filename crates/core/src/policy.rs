//! Resource-ownership policy rules.
//!
//! Both rules answer "may the acting principal touch the resource addressed
//! by this route id" and are evaluated by the authorization middleware before
//! any repository call. They are pure functions of the principal's claims and
//! the raw route segment: no I/O, no ambient request context, and a malformed
//! input is a [`PolicyDecision::Fail`], never an error.

use serde::{Deserialize, Serialize};

use crate::roles::ROLE_SUPER_ADMIN;
use crate::types::DbId;

/// Claims extracted from the principal's access token.
///
/// Claim values arrive as raw strings from the token layer; parsing into ids
/// happens here, at evaluation time, so an unparseable claim fails the policy
/// instead of failing token validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrincipalClaims {
    /// Role names the principal holds.
    pub roles: Vec<String>,
    /// The principal's own user id claim, if present.
    pub user_id: Option<String>,
    /// The dealer the principal belongs to, if any. Trusted as embedded in
    /// the token; deliberately not re-checked against the database.
    pub dealer_id: Option<String>,
}

impl PrincipalClaims {
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Succeed,
    Fail,
}

/// The principal may only address their own user row.
///
/// Succeeds for super-admins, or when the numeric user-id claim equals the
/// route's `id` segment. An unparseable route id or a missing/unparseable
/// claim fails.
pub fn must_be_own_user(claims: &PrincipalClaims, route_id: &str) -> PolicyDecision {
    if claims.is_in_role(ROLE_SUPER_ADMIN) {
        return PolicyDecision::Succeed;
    }
    match (parse_id(route_id), claims.user_id.as_deref().and_then(parse_id)) {
        (Some(route), Some(user)) if route == user => PolicyDecision::Succeed,
        _ => PolicyDecision::Fail,
    }
}

/// The principal may only address resources of their own dealer.
///
/// Succeeds for super-admins, or when the `dealerId` claim equals the route's
/// `id` segment. A principal without a dealer claim fails.
pub fn must_have_same_dealer(claims: &PrincipalClaims, route_id: &str) -> PolicyDecision {
    if claims.is_in_role(ROLE_SUPER_ADMIN) {
        return PolicyDecision::Succeed;
    }
    match (parse_id(route_id), claims.dealer_id.as_deref().and_then(parse_id)) {
        (Some(route), Some(dealer)) if route == dealer => PolicyDecision::Succeed,
        _ => PolicyDecision::Fail,
    }
}

fn parse_id(raw: &str) -> Option<DbId> {
    raw.parse::<DbId>().ok()
}
