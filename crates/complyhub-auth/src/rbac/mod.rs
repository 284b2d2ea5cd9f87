//! Role-based access control.

pub mod enforcer;
pub mod policies;

pub use enforcer::RbacEnforcer;
pub use policies::{Capability, RbacPolicies};
