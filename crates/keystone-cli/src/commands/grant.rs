//! `keystone grant ...`

use super::{print_json, Caller};
use anyhow::Result;
use clap::Subcommand;
use keystone_core::{GrantFilter, GrantRequestInput};
use keystone_runtime::Broker;

#[derive(Subcommand)]
pub enum GrantCommand {
    /// Request a grant
    Create {
        /// Requesting identity (ignored when acting as an agent)
        #[arg(long)]
        requester: Option<String>,
        /// Target identity
        #[arg(long)]
        target: String,
        /// once, timed or always
        #[arg(long = "type")]
        grant_type: String,
        /// Window in seconds for timed grants
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Approve a pending grant and print its credential
    Approve { id: String },
    /// Deny a pending grant
    Deny { id: String },
    /// Revoke an approved grant
    Revoke { id: String },
    /// Redeem a grant
    Use { id: String },
    /// Show a grant
    Show { id: String },
    /// List grants visible to the caller
    List {
        /// Only grants from this requester
        #[arg(long)]
        requester: Option<String>,
    },
    /// Fetch a credential for the calling agent's approved grant
    Token { id: String },
    /// Verify an authz credential (redeems once grants)
    Verify { token: String },
}

pub async fn run(broker: &Broker, caller: &Caller, cmd: GrantCommand) -> Result<()> {
    let grants = broker.grants();
    match cmd {
        GrantCommand::Create {
            requester,
            target,
            grant_type,
            duration,
        } => {
            let input = GrantRequestInput {
                requester,
                target: Some(target),
                grant_type: Some(grant_type),
                duration,
            };
            print_json(&grants.create_grant(input, caller.principal()).await?)
        }
        GrantCommand::Approve { id } => {
            print_json(&grants.approve_grant(&id, caller.require()?).await?)
        }
        GrantCommand::Deny { id } => print_json(&grants.deny_grant(&id, caller.require()?).await?),
        GrantCommand::Revoke { id } => {
            print_json(&grants.revoke_grant(&id, caller.require()?).await?)
        }
        GrantCommand::Use { id } => print_json(&grants.use_grant(&id).await?),
        GrantCommand::Show { id } => print_json(&grants.introspect_grant(&id).await?),
        GrantCommand::List { requester } => {
            let filter = GrantFilter { requester };
            print_json(&grants.list_grants(&filter, caller.principal()).await?)
        }
        GrantCommand::Token { id } => {
            print_json(&grants.issue_grant_token(&id, caller.require()?).await?)
        }
        GrantCommand::Verify { token } => {
            print_json(&grants.verify_grant_credential(&token).await?)
        }
    }
}
