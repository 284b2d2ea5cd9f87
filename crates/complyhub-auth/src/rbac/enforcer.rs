//! RBAC enforcement: checks whether a role holds a required capability.

use complyhub_core::error::AppError;
use complyhub_entity::user::Role;

use super::policies::{Capability, RbacPolicies};

/// Enforces role-based access control.
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer {
    policies: RbacPolicies,
}

impl RbacEnforcer {
    /// Creates a new enforcer with the default policy set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Ok(())` if `role` holds `capability`, otherwise an
    /// `Authorization` error.
    pub fn require(&self, role: Role, capability: Capability) -> Result<(), AppError> {
        if self.policies.allows(role, capability) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role {role} lacks capability {capability:?}"
            )))
        }
    }

    /// Boolean form of [`Self::require`].
    pub fn allows(&self, role: Role, capability: Capability) -> bool {
        self.policies.allows(role, capability)
    }

    /// Returns a reference to the underlying policies.
    pub fn policies(&self) -> &RbacPolicies {
        &self.policies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_holds_everything() {
        let rbac = RbacEnforcer::new();
        for cap in [
            Capability::ViewWebhooks,
            Capability::ManageWebhooks,
            Capability::ReplayIncoming,
            Capability::ManageActions,
            Capability::ManageKnowledge,
            Capability::ManageApiKeys,
        ] {
            assert!(rbac.require(Role::Admin, cap).is_ok());
        }
    }

    #[test]
    fn test_viewer_is_read_only() {
        let rbac = RbacEnforcer::new();
        assert!(rbac.allows(Role::Viewer, Capability::ViewActions));
        let err = rbac.require(Role::Viewer, Capability::ManageActions).unwrap_err();
        assert!(err.is(complyhub_core::ErrorKind::Authorization));
    }

    #[test]
    fn test_officer_moves_actions_but_not_webhooks() {
        let rbac = RbacEnforcer::new();
        assert!(rbac.allows(Role::Officer, Capability::ManageActions));
        assert!(!rbac.allows(Role::Officer, Capability::ManageWebhooks));
    }

    #[test]
    fn test_only_admin_manages_keys() {
        let rbac = RbacEnforcer::new();
        assert!(!rbac.allows(Role::Manager, Capability::ManageApiKeys));
        assert_eq!(
            rbac.policies().capabilities(Role::Admin).len(),
            rbac.policies().capabilities(Role::Manager).len() + 1
        );
    }
}
