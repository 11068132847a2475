//! Predicates supplied by the host: who is signed in and what their plan allows.

use serde::{Serialize, Deserialize};

use crate::scene::catalog::Archetype;
use crate::scene::room::FloorMaterial;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
    Ultra,
}

impl Plan {
    /// True if this plan grants everything `tier` grants.
    pub fn includes(self, tier: Plan) -> bool {
        self >= tier
    }

    pub fn label(self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Premium => "Premium",
            Plan::Ultra => "Ultra",
        }
    }
}

/// Host-provided gates consulted by the editing session.
pub trait SessionContext {
    fn is_authenticated(&self) -> bool;

    fn allows_archetype(&self, _archetype: Archetype) -> bool {
        true
    }

    fn allows_floor_material(&self, _material: FloorMaterial) -> bool {
        true
    }
}

/// Context for the standalone desktop build: an optional local user name and a plan.
#[derive(Debug, Clone, Default)]
pub struct LocalSession {
    pub user: Option<String>,
    pub plan: Plan,
}

impl LocalSession {
    pub fn signed_in(user: impl Into<String>, plan: Plan) -> Self {
        Self { user: Some(user.into()), plan }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl SessionContext for LocalSession {
    fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn allows_archetype(&self, archetype: Archetype) -> bool {
        self.plan.includes(archetype.info().tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_ordering() {
        assert!(Plan::Ultra.includes(Plan::Premium));
        assert!(Plan::Premium.includes(Plan::Free));
        assert!(!Plan::Free.includes(Plan::Premium));
    }

    #[test]
    fn local_session_gates() {
        let anon = LocalSession::anonymous();
        assert!(!anon.is_authenticated());
        assert!(anon.allows_archetype(Archetype::Sofa));
        assert!(anon.allows_floor_material(FloorMaterial::Marble));

        let pro = LocalSession::signed_in("dana", Plan::Premium);
        assert!(pro.is_authenticated());
        assert_eq!(pro.plan.label(), "Premium");
    }
}
