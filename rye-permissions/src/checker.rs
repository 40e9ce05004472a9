//! The fail-closed dispatch check and spawn-time attenuation (spec
//! §4.F). Grounded on the teacher's `neuron-tool::builtin` permission
//! gate shape, generalized from a single allow-list to fnmatch'd
//! capability strings with an `ALL` sentinel.

use crate::capability::{capability_string, CapabilitySet};
use crate::error::PermissionError;
use crate::fnmatch::fnmatch;

/// Item ids under this prefix are the runtime's own internal dispatch
/// hooks and are always permitted, independent of capabilities.
pub const ALWAYS_PERMITTED_PREFIX: &str = "rye/agent/threads/internal/";

/// Checks dispatches against an effective capability set.
pub struct PermissionChecker {
    caps: CapabilitySet,
}

impl PermissionChecker {
    /// Build a checker over an effective (already attenuated) capability
    /// set.
    pub fn new(caps: CapabilitySet) -> Self {
        Self { caps }
    }

    /// The effective capability set this checker enforces.
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.caps
    }

    /// Check whether `(primary, item_type, item_id)` is permitted.
    pub fn check(&self, primary: &str, item_type: &str, item_id: &str) -> Result<(), PermissionError> {
        if item_id.starts_with(ALWAYS_PERMITTED_PREFIX) {
            return Ok(());
        }
        let required = capability_string(primary, item_type, item_id);
        if self.caps.permits(&required) {
            Ok(())
        } else {
            Err(PermissionError::Denied { required })
        }
    }
}

/// Compute a spawned child's effective capabilities: the child's own
/// declared set, clipped to never exceed the parent's, falling back to
/// inheriting the parent's set entirely when the child declares none.
/// Capabilities the child declared but the parent doesn't cover are
/// dropped and logged (spec §4.F).
pub fn attenuate(child_declared: Option<&CapabilitySet>, parent: &CapabilitySet) -> CapabilitySet {
    let Some(declared) = child_declared else {
        return parent.clone();
    };

    match (declared, parent) {
        (CapabilitySet::All, CapabilitySet::All) => CapabilitySet::All,
        (CapabilitySet::All, CapabilitySet::Some(parent_caps)) => CapabilitySet::Some(parent_caps.clone()),
        (CapabilitySet::Some(child_caps), CapabilitySet::All) => CapabilitySet::Some(child_caps.clone()),
        (CapabilitySet::Some(child_caps), CapabilitySet::Some(parent_caps)) => {
            let mut kept = std::collections::HashSet::new();
            for cap in child_caps {
                if parent_caps.iter().any(|p| fnmatch(cap, p)) {
                    kept.insert(cap.clone());
                } else {
                    tracing::warn!(capability = %cap, "dropping child capability not covered by parent");
                }
            }
            CapabilitySet::Some(kept)
        }
    }
}
