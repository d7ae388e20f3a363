//! A filesystem-backed broker keeps its state and signing key across reopen

use ed25519_dalek::SigningKey;
use keystone_core::{AgentEnrollment, GrantRequestInput, GrantStatus, KeystoneConfig, Principal};
use keystone_effects::encode_ssh_ed25519;
use keystone_runtime::Broker;

fn config(dir: &tempfile::TempDir) -> KeystoneConfig {
    KeystoneConfig {
        storage_path: dir.path().to_path_buf(),
        admins: vec!["root@x".to_string()],
        ..KeystoneConfig::default()
    }
}

#[tokio::test]
async fn state_and_credentials_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let admin = Principal::session("root@x");

    let first = Broker::open(config(&dir)).await.unwrap();
    let grant = first
        .grants()
        .create_grant(
            GrantRequestInput {
                requester: Some("alice@x".to_string()),
                target: Some("bob@x".to_string()),
                grant_type: Some("always".to_string()),
                duration: None,
            },
            None,
        )
        .await
        .unwrap();
    let approved = first.grants().approve_grant(&grant.id, &admin).await.unwrap();
    drop(first);

    let reopened = Broker::open(config(&dir)).await.unwrap();
    let stored = reopened.grants().introspect_grant(&grant.id).await.unwrap();
    assert_eq!(stored.status, GrantStatus::Approved);

    let outcome = reopened
        .grants()
        .verify_grant_credential(&approved.token)
        .await
        .unwrap();
    assert!(outcome.valid, "{:?}", outcome.error);
}

fn enrollment(id: &str, seed: u8) -> AgentEnrollment {
    AgentEnrollment {
        id: Some(id.to_string()),
        name: Some(id.to_string()),
        public_key: Some(encode_ssh_ed25519(
            &SigningKey::from_bytes(&[seed; 32]).verifying_key(),
        )),
        ..AgentEnrollment::default()
    }
}

#[tokio::test]
async fn dotted_agent_ids_get_separate_records() {
    let dir = tempfile::tempdir().unwrap();
    let admin = Principal::session("root@x");

    let broker = Broker::open(config(&dir)).await.unwrap();
    broker
        .enrollment()
        .enroll_agent(&enrollment("bot.v1", 1), &admin)
        .await
        .unwrap();
    broker
        .enrollment()
        .enroll_agent(&enrollment("bot.v2", 2), &admin)
        .await
        .unwrap();
    drop(broker);

    let reopened = Broker::open(config(&dir)).await.unwrap();
    let v1 = reopened.agents().find_by_id("bot.v1").await.unwrap().unwrap();
    let v2 = reopened.agents().find_by_id("bot.v2").await.unwrap().unwrap();
    assert_ne!(v1.public_key, v2.public_key);

    let mut ids: Vec<String> = reopened
        .agents()
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    ids.sort();
    assert_eq!(ids, ["bot.v1", "bot.v2"]);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let bad = KeystoneConfig {
        challenge_ttl_ms: 0,
        ..KeystoneConfig::default()
    };
    assert!(Broker::in_memory(bad).await.is_err());
}
