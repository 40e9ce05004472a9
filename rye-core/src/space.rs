//! The three visibility tiers items and capabilities resolve and attenuate
//! across: project, user, system (optionally scoped to a bundle).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an item or key lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Space {
    /// `./.ai/` — highest precedence.
    Project,
    /// `${USER_SPACE:-$HOME}/.ai/`.
    User,
    /// One or more registered bundles; each may restrict category visibility.
    System {
        /// Bundle identifier, if this space is bundle-scoped.
        bundle_id: Option<String>,
    },
}

impl Space {
    /// Precedence integer: project=3, user=2, system=1.
    ///
    /// Used by the chain resolver's space-precedence invariant: a chain
    /// element may only depend on an element whose space precedence is
    /// less than or equal to its own.
    pub fn precedence(&self) -> u8 {
        match self {
            Space::Project => 3,
            Space::User => 2,
            Space::System { .. } => 1,
        }
    }

    /// Construct an unscoped system space (no bundle restriction).
    pub fn system() -> Self {
        Space::System { bundle_id: None }
    }

    /// Construct a bundle-scoped system space.
    pub fn system_bundle(bundle_id: impl Into<String>) -> Self {
        Space::System {
            bundle_id: Some(bundle_id.into()),
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Space::Project => write!(f, "project"),
            Space::User => write!(f, "user"),
            Space::System { bundle_id: None } => write!(f, "system"),
            Space::System {
                bundle_id: Some(id),
            } => write!(f, "system:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_is_strictly_ordered() {
        assert!(Space::Project.precedence() > Space::User.precedence());
        assert!(Space::User.precedence() > Space::system().precedence());
    }

    #[test]
    fn system_display_includes_bundle_when_present() {
        assert_eq!(Space::system().to_string(), "system");
        assert_eq!(Space::system_bundle("core").to_string(), "system:core");
    }
}
