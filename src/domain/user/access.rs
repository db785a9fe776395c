//! Role-gated access rules
//!
//! The caller's roles come from the verified token claims; target roles come
//! from the stored record the route loads. Each rule is a plain predicate so
//! handlers decide the response and tests can cover the table directly.

use super::entity::{User, UserId};
use super::role::{Role, Roles};

/// Identity and roles of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub roles: Roles,
}

impl Caller {
    pub fn new(id: UserId, roles: Roles) -> Self {
        Self { id, roles }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is(&self, id: &UserId) -> bool {
        &self.id == id
    }
}

/// Whether the caller may read the target's profile
///
/// Anyone may read their own profile. Staff may read customers; management
/// may read anyone.
pub fn can_view_profile(caller: &Caller, target: &User) -> bool {
    caller.is(target.id())
        || caller.has_role(Role::Management)
        || (caller.has_role(Role::Staff) && target.has_role(Role::Customer))
}

/// Whether the caller could read some other account's profile at all
pub fn may_view_other_profiles(caller: &Caller) -> bool {
    caller.has_role(Role::Staff) || caller.has_role(Role::Management)
}

pub fn can_edit_profile(caller: &Caller, target_id: &UserId) -> bool {
    caller.is(target_id)
}

/// Staff flip buy approval on customers
pub fn can_toggle_buy(caller: &Caller, target: &User) -> bool {
    caller.has_role(Role::Staff) && target.has_role(Role::Customer)
}

/// Management edit the permissions of staff
pub fn can_edit_permissions(caller: &Caller, target: &User) -> bool {
    caller.has_role(Role::Management) && target.has_role(Role::Staff)
}

pub fn can_list_customers(caller: &Caller) -> bool {
    caller.has_role(Role::Staff)
}

pub fn can_list_staff(caller: &Caller) -> bool {
    caller.has_role(Role::Management)
}
