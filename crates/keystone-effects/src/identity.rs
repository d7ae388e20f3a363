//! Admin standing from a fixed list

use async_trait::async_trait;
use keystone_core::effects::IdentityEffects;
use std::collections::HashSet;

/// Admin lookup against a configured set of identities
#[derive(Debug, Clone, Default)]
pub struct StaticAdminHandler {
    admins: HashSet<String>,
}

impl StaticAdminHandler {
    /// Create a handler granting admin standing to `admins`
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl IdentityEffects for StaticAdminHandler {
    async fn is_admin(&self, identity: &str) -> bool {
        self.admins.contains(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn only_listed_identities_are_admins() {
        let handler = StaticAdminHandler::new(["root@x"]);
        assert!(handler.is_admin("root@x").await);
        assert!(!handler.is_admin("bob@x").await);
        assert!(!StaticAdminHandler::default().is_admin("root@x").await);
    }
}
