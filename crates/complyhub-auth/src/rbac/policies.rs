//! Role-to-capability mapping definitions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use complyhub_entity::user::Role;

/// Something a caller may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Read endpoints, events and deliveries.
    ViewWebhooks,
    /// Register, edit, suspend, resume and disable endpoints; record events.
    ManageWebhooks,
    /// Inspect and resolve incoming webhook logs.
    ReplayIncoming,
    /// Read remedial actions.
    ViewActions,
    /// Raise and move remedial actions.
    ManageActions,
    /// Read knowledge articles.
    ViewKnowledge,
    /// Write knowledge articles.
    ManageKnowledge,
    /// Create, list and revoke API keys.
    ManageApiKeys,
}

/// Static mapping from each role to its capability set.
#[derive(Debug, Clone)]
pub struct RbacPolicies {
    policies: HashMap<Role, HashSet<Capability>>,
}

impl RbacPolicies {
    /// Creates the default policy set.
    pub fn new() -> Self {
        use Capability::*;

        let viewer: HashSet<Capability> = [ViewWebhooks, ViewActions, ViewKnowledge].into();

        let mut officer = viewer.clone();
        officer.extend([ManageActions]);

        let mut manager = officer.clone();
        manager.extend([ManageWebhooks, ReplayIncoming, ManageKnowledge]);

        let mut admin = manager.clone();
        admin.extend([ManageApiKeys]);

        let policies = HashMap::from([
            (Role::Viewer, viewer),
            (Role::Officer, officer),
            (Role::Manager, manager),
            (Role::Admin, admin),
        ]);

        Self { policies }
    }

    /// Check whether `role` holds `capability`.
    pub fn allows(&self, role: Role, capability: Capability) -> bool {
        self.policies
            .get(&role)
            .is_some_and(|caps| caps.contains(&capability))
    }

    /// All capabilities of `role`, in a stable order.
    pub fn capabilities(&self, role: Role) -> Vec<Capability> {
        let mut caps: Vec<Capability> = self
            .policies
            .get(&role)
            .map(|c| c.iter().copied().collect())
            .unwrap_or_default();
        caps.sort_by_key(|c| *c as u8);
        caps
    }
}

impl Default for RbacPolicies {
    fn default() -> Self {
        Self::new()
    }
}
