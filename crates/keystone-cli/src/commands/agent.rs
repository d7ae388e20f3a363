//! `keystone agent ...`

use super::{print_json, Caller};
use anyhow::{Context, Result};
use clap::Subcommand;
use keystone_core::AgentEnrollment;
use keystone_runtime::Broker;

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Register an agent (admin)
    Enroll {
        /// Display name
        #[arg(long)]
        name: String,
        /// Public key line, `ssh-ed25519 <base64>`
        #[arg(long)]
        public_key: String,
        /// Agent id; generated when omitted
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Defaults to the enrolling admin
        #[arg(long)]
        owner: Option<String>,
        /// Defaults to the enrolling admin
        #[arg(long)]
        approver: Option<String>,
    },
    /// Deactivate an agent (admin)
    Deactivate { id: String },
    /// List registered agents (admin)
    List,
    /// Issue a challenge for an agent
    Challenge { id: String },
    /// Answer a challenge and print the agent credential
    Authenticate {
        id: String,
        /// Challenge token
        #[arg(long)]
        challenge: String,
        /// Hex-encoded Ed25519 signature over the challenge
        #[arg(long)]
        signature: String,
    },
}

pub async fn run(broker: &Broker, caller: &Caller, cmd: AgentCommand) -> Result<()> {
    match cmd {
        AgentCommand::Enroll {
            name,
            public_key,
            id,
            email,
            owner,
            approver,
        } => {
            let fields = AgentEnrollment {
                id,
                email,
                name: Some(name),
                public_key: Some(public_key),
                owner,
                approver,
            };
            let enrolled = broker
                .enrollment()
                .enroll_agent(&fields, caller.require()?)
                .await?;
            print_json(&enrolled)
        }
        AgentCommand::Deactivate { id } => {
            let agent = broker
                .enrollment()
                .deactivate_agent(&id, caller.require()?)
                .await?;
            print_json(&agent)
        }
        AgentCommand::List => print_json(&broker.enrollment().list_agents(caller.require()?).await?),
        AgentCommand::Challenge { id } => {
            print_json(&broker.authenticator().create_agent_challenge(&id).await?)
        }
        AgentCommand::Authenticate {
            id,
            challenge,
            signature,
        } => {
            let signature = hex::decode(signature.trim()).context("signature must be hex")?;
            let session = broker
                .authenticator()
                .authenticate_agent(&id, &challenge, &signature)
                .await?;
            print_json(&session)
        }
    }
}
