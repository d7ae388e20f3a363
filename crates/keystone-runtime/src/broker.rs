//! Broker assembly
//!
//! Everything with state is built exactly once here: one storage handle, the
//! two ledgers and the agent directory over it, and the services that share
//! them. Callers hold a `Broker` for the process lifetime and pass it around.

use keystone_authentication::{AgentAuthenticator, EnrollmentService};
use keystone_core::effects::{
    AgentDirectoryEffects, CredentialEffects, IdentityEffects, PhysicalTimeEffects,
    RandomCoreEffects, SignatureEffects, StorageCoreEffects,
};
use keystone_core::{KeystoneConfig, KeystoneError, Result};
use keystone_effects::{
    Ed25519CredentialHandler, Ed25519SignatureHandler, FilesystemStorageHandler,
    MemoryStorageHandler, RealRandomHandler, RealTimeHandler, StaticAdminHandler,
};
use keystone_grants::{GrantConfig, GrantService};
use keystone_store::{
    ChallengeLedger, GrantLedger, StorageAgentDirectory, StorageChallengeLedger,
    StorageGrantLedger,
};
use std::sync::Arc;

/// Storage key of the credential signing secret
pub const SIGNING_KEY_KEY: &str = "keys:signing";

/// Shared storage handle type used by every ledger
pub type SharedStorage = Arc<dyn StorageCoreEffects>;

/// Infrastructure handlers a broker is built from
#[derive(Clone)]
pub struct BrokerEffects {
    /// Key-value store backing every ledger
    pub storage: SharedStorage,
    /// Wall clock
    pub time: Arc<dyn PhysicalTimeEffects>,
    /// Randomness for ids and challenges
    pub random: Arc<dyn RandomCoreEffects>,
    /// Signing collaborator
    pub credentials: Arc<dyn CredentialEffects>,
    /// Agent signature verification
    pub signatures: Arc<dyn SignatureEffects>,
    /// Admin standing
    pub identity: Arc<dyn IdentityEffects>,
}

/// Load the signing secret from `storage`, generating it on first use
pub async fn load_or_create_signing_secret(
    storage: &dyn StorageCoreEffects,
    random: &dyn RandomCoreEffects,
) -> Result<[u8; 32]> {
    if let Some(stored) = storage.retrieve(SIGNING_KEY_KEY).await? {
        let decoded = hex::decode(String::from_utf8_lossy(&stored).trim())
            .map_err(|e| KeystoneError::config(format!("Stored signing key is malformed: {e}")))?;
        return <[u8; 32]>::try_from(decoded.as_slice())
            .map_err(|_| KeystoneError::config("Stored signing key must be 32 bytes"));
    }

    let secret = random.random_bytes_32().await;
    storage
        .store(SIGNING_KEY_KEY, hex::encode(secret).into_bytes())
        .await?;
    tracing::info!("generated new credential signing key");
    Ok(secret)
}

/// Fully wired grant broker
#[derive(Clone)]
pub struct Broker {
    config: KeystoneConfig,
    grants: GrantService,
    enrollment: EnrollmentService,
    authenticator: AgentAuthenticator,
    challenges: Arc<dyn ChallengeLedger>,
    agents: Arc<dyn AgentDirectoryEffects>,
}

impl Broker {
    /// Wire a broker from explicit handlers
    pub fn with_effects(config: KeystoneConfig, effects: BrokerEffects) -> Self {
        let ledger: Arc<dyn GrantLedger> =
            Arc::new(StorageGrantLedger::new(effects.storage.clone()));
        let challenges: Arc<dyn ChallengeLedger> = Arc::new(StorageChallengeLedger::with_ttl(
            effects.storage.clone(),
            effects.time.clone(),
            effects.random.clone(),
            config.challenge_ttl_ms,
        ));
        let agents: Arc<dyn AgentDirectoryEffects> =
            Arc::new(StorageAgentDirectory::new(effects.storage.clone()));

        let grants = GrantService::new(
            GrantConfig::from(&config),
            ledger,
            agents.clone(),
            effects.identity.clone(),
            effects.credentials.clone(),
            effects.time.clone(),
            effects.random.clone(),
        );
        let enrollment = EnrollmentService::new(
            config.public_key_prefix.clone(),
            agents.clone(),
            effects.identity,
            effects.signatures.clone(),
            effects.time.clone(),
            effects.random,
        );
        let authenticator = AgentAuthenticator::new(
            config.agent_token_ttl_secs,
            config.challenge_ttl_ms,
            agents.clone(),
            challenges.clone(),
            effects.signatures,
            effects.credentials,
            effects.time,
        );

        Self {
            config,
            grants,
            enrollment,
            authenticator,
            challenges,
            agents,
        }
    }

    /// Broker over `storage` with system clock, system randomness, and a
    /// signing key persisted in the same store
    pub async fn with_storage(config: KeystoneConfig, storage: SharedStorage) -> Result<Self> {
        config.validate()?;
        let random = Arc::new(RealRandomHandler::new());
        let secret = load_or_create_signing_secret(storage.as_ref(), random.as_ref()).await?;
        let credentials = Ed25519CredentialHandler::from_secret_bytes(config.issuer.clone(), &secret);
        tracing::debug!(kid = credentials.kid(), issuer = %config.issuer, "credential signer ready");

        let effects = BrokerEffects {
            storage,
            time: Arc::new(RealTimeHandler::new()),
            random,
            credentials: Arc::new(credentials),
            signatures: Arc::new(Ed25519SignatureHandler::new()),
            identity: Arc::new(StaticAdminHandler::new(config.admins.iter().cloned())),
        };
        Ok(Self::with_effects(config, effects))
    }

    /// Broker persisting to `config.storage_path`
    pub async fn open(config: KeystoneConfig) -> Result<Self> {
        let storage = Arc::new(FilesystemStorageHandler::new(config.storage_path.clone()));
        tracing::info!(path = %config.storage_path.display(), "opening filesystem store");
        Self::with_storage(config, storage).await
    }

    /// Broker over a fresh in-memory store
    pub async fn in_memory(config: KeystoneConfig) -> Result<Self> {
        Self::with_storage(config, Arc::new(MemoryStorageHandler::new())).await
    }

    /// Active configuration
    pub fn config(&self) -> &KeystoneConfig {
        &self.config
    }

    /// Grant lifecycle operations
    pub fn grants(&self) -> &GrantService {
        &self.grants
    }

    /// Agent enrollment operations
    pub fn enrollment(&self) -> &EnrollmentService {
        &self.enrollment
    }

    /// Agent authentication operations
    pub fn authenticator(&self) -> &AgentAuthenticator {
        &self.authenticator
    }

    /// Challenge ledger
    pub fn challenges(&self) -> &Arc<dyn ChallengeLedger> {
        &self.challenges
    }

    /// Agent directory
    pub fn agents(&self) -> &Arc<dyn AgentDirectoryEffects> {
        &self.agents
    }
}
