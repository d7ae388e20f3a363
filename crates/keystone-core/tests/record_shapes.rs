//! Persisted record shapes
//!
//! The ledgers persist records as JSON; these tests pin the field names that
//! other processes sharing the store depend on.

use keystone_core::{Agent, Challenge, CredentialClaims, Grant, GrantRequest, GrantType};
use serde_json::json;

#[test]
fn agent_record_fields() {
    let agent = Agent {
        id: "a1".to_string(),
        email: None,
        name: "builder".to_string(),
        public_key: "ssh-ed25519 AAAA".to_string(),
        owner: "alice@x".to_string(),
        approver: "carol@x".to_string(),
        created_at: 42,
        is_active: true,
    };
    assert_eq!(
        serde_json::to_value(&agent).unwrap(),
        json!({
            "id": "a1",
            "name": "builder",
            "public_key": "ssh-ed25519 AAAA",
            "owner": "alice@x",
            "approver": "carol@x",
            "created_at": 42,
            "is_active": true,
        })
    );
    assert_eq!(agent.identity(), "agent:a1");
}

#[test]
fn challenge_record_fields() {
    let challenge = Challenge {
        token: "ab".repeat(32),
        agent_id: "a1".to_string(),
        expires_at: 60_000,
    };
    let value = serde_json::to_value(&challenge).unwrap();
    assert_eq!(value["agent_id"], "a1");
    assert_eq!(value["expires_at"], 60_000);
    assert!(!challenge.is_expired(60_000));
    assert!(challenge.is_expired(60_001));
}

#[test]
fn grant_round_trips_through_json() {
    let grant = Grant::pending(
        "g1",
        GrantRequest {
            requester: "agent:a1".to_string(),
            target: "bob@x".to_string(),
            grant_type: GrantType::Once,
            duration: None,
        },
        7,
    );
    let bytes = serde_json::to_vec(&grant).unwrap();
    let back: Grant = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back, grant);
}

#[test]
fn authz_claims_name_grant_and_parties() {
    let grant = Grant::pending(
        "g1",
        GrantRequest {
            requester: "agent:a1".to_string(),
            target: "bob@x".to_string(),
            grant_type: GrantType::Always,
            duration: None,
        },
        7,
    );
    let claims = CredentialClaims::authz(&grant, "keystone", 10, 20);
    let value = serde_json::to_value(&claims).unwrap();
    assert_eq!(value["sub"], "agent:a1");
    assert_eq!(value["aud"], "bob@x");
    assert_eq!(value["grant_id"], "g1");
    assert_eq!(value["grant_type"], "always");
    assert_eq!(value["kind"], "authz");
}
