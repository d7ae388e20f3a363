//! Subcommand handlers

pub mod agent;
pub mod grant;

use anyhow::{bail, Result};
use keystone_core::Principal;
use keystone_runtime::Broker;
use serde::Serialize;

/// Who is issuing the command
pub struct Caller(Option<Principal>);

impl Caller {
    /// Resolve `--agent-token` (preferred) or `--as`
    pub async fn resolve(
        broker: &Broker,
        as_identity: Option<String>,
        agent_token: Option<String>,
    ) -> Result<Self> {
        if let Some(token) = agent_token {
            let principal = broker.authenticator().authenticate_bearer(&token).await?;
            return Ok(Self(Some(principal)));
        }
        Ok(Self(as_identity.map(Principal::session)))
    }

    /// Caller, if any
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }

    /// Caller, failing when none was given
    pub fn require(&self) -> Result<&Principal> {
        match &self.0 {
            Some(principal) => Ok(principal),
            None => bail!("this command needs a caller: pass --as <identity> or --agent-token"),
        }
    }
}

/// Print `value` to stdout as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
