//! End-to-end grant lifecycle against an in-memory broker

use assert_matches::assert_matches;
use keystone_core::{GrantFilter, GrantRequestInput, GrantStatus, KeystoneError, Principal};
use keystone_testkit::{grant_input, TestAgent, TestBroker};

#[tokio::test]
async fn once_grant_flow() {
    let tb = TestBroker::new();
    let a1 = TestAgent::new("a1", 1);
    tb.enroll(&a1, "alice@x", "carol@x").await;
    let grants = tb.broker.grants();

    let grant = grants
        .create_grant(grant_input("agent:a1", "bob@x", "once", None), None)
        .await
        .unwrap();
    assert_eq!(grant.status, GrantStatus::Pending);

    let approved = grants
        .approve_grant(&grant.id, &Principal::session("carol@x"))
        .await
        .unwrap();
    assert_eq!(approved.grant.status, GrantStatus::Approved);
    assert_eq!(approved.grant.decided_by.as_deref(), Some("carol@x"));

    let used = grants.use_grant(&grant.id).await.unwrap();
    assert_eq!(used.status, GrantStatus::Used);
    assert!(used.used_at.is_some());

    assert_matches!(
        grants.use_grant(&grant.id).await,
        Err(KeystoneError::InvalidState { status: GrantStatus::Used, .. })
    );
    let outcome = grants.verify_grant_credential(&approved.token).await.unwrap();
    assert!(!outcome.valid);
    assert_eq!(
        outcome.error.as_deref(),
        Some("Grant is not approved (status: used)")
    );
}

#[tokio::test]
async fn missing_fields_persist_nothing() {
    let tb = TestBroker::new();
    let grants = tb.broker.grants();

    for input in [
        GrantRequestInput::default(),
        GrantRequestInput {
            target: None,
            ..grant_input("alice@x", "bob@x", "always", None)
        },
        grant_input("alice@x", "bob@x", "forever", None),
        grant_input("alice@x", "bob@x", "timed", None),
    ] {
        assert_matches!(
            grants.create_grant(input, None).await,
            Err(KeystoneError::InvalidRequest { .. })
        );
    }
    let all = grants
        .list_grants(&GrantFilter::default(), Some(&tb.admin()))
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn timed_grant_expires_at_redemption() {
    let tb = TestBroker::new();
    let grants = tb.broker.grants();
    let grant = grants
        .create_grant(grant_input("alice@x", "bob@x", "timed", Some(60)), None)
        .await
        .unwrap();
    assert_eq!(grant.status, GrantStatus::Pending);

    let approved = grants.approve_grant(&grant.id, &tb.admin()).await.unwrap();
    let window_end_secs = approved.grant.window_end_ms().unwrap() / 1000;
    assert_eq!(approved.expires_at, window_end_secs);

    tb.clock.advance_time(30_000);
    assert_eq!(
        grants.use_grant(&grant.id).await.unwrap().status,
        GrantStatus::Approved
    );

    tb.clock.advance_time(30_001);
    assert_matches!(
        grants.use_grant(&grant.id).await,
        Err(KeystoneError::Expired { .. })
    );
}

#[tokio::test]
async fn approve_from_closed_states_names_status() {
    let tb = TestBroker::new();
    let grants = tb.broker.grants();
    let admin = tb.admin();

    let denied = grants
        .create_grant(grant_input("alice@x", "bob@x", "always", None), None)
        .await
        .unwrap();
    grants.deny_grant(&denied.id, &admin).await.unwrap();

    let err = grants.approve_grant(&denied.id, &admin).await.unwrap_err();
    assert_matches!(err, KeystoneError::InvalidState { status: GrantStatus::Denied, .. });
    assert!(err.to_string().contains("denied"));

    let approved = grants
        .create_grant(grant_input("alice@x", "bob@x", "always", None), None)
        .await
        .unwrap();
    grants.approve_grant(&approved.id, &admin).await.unwrap();
    assert_matches!(
        grants.approve_grant(&approved.id, &admin).await,
        Err(KeystoneError::InvalidState { status: GrantStatus::Approved, .. })
    );
}

#[tokio::test]
async fn revoke_is_idempotent_and_stops_verification() {
    let tb = TestBroker::new();
    let grants = tb.broker.grants();
    let admin = tb.admin();

    let grant = grants
        .create_grant(grant_input("alice@x", "bob@x", "always", None), None)
        .await
        .unwrap();
    assert_matches!(
        grants.revoke_grant(&grant.id, &admin).await,
        Err(KeystoneError::InvalidState { status: GrantStatus::Pending, .. })
    );

    let approved = grants.approve_grant(&grant.id, &admin).await.unwrap();
    assert!(grants.verify_grant_credential(&approved.token).await.unwrap().valid);

    let revoked = grants.revoke_grant(&grant.id, &admin).await.unwrap();
    assert_eq!(revoked.status, GrantStatus::Revoked);
    assert_eq!(grants.revoke_grant(&grant.id, &admin).await.unwrap(), revoked);

    let outcome = grants.verify_grant_credential(&approved.token).await.unwrap();
    assert!(!outcome.valid);
}

#[tokio::test]
async fn only_approver_or_admin_decides() {
    let tb = TestBroker::new();
    let a1 = TestAgent::new("a1", 1);
    tb.enroll(&a1, "alice@x", "carol@x").await;
    let grants = tb.broker.grants();

    let grant = grants
        .create_grant(grant_input("agent:a1", "bob@x", "once", None), None)
        .await
        .unwrap();
    for outsider in ["alice@x", "bob@x", "agent:a1"] {
        assert_matches!(
            grants
                .approve_grant(&grant.id, &Principal::session(outsider))
                .await,
            Err(KeystoneError::Forbidden { .. })
        );
    }
    // The rejected attempts did not touch the grant.
    assert_eq!(
        grants.introspect_grant(&grant.id).await.unwrap().status,
        GrantStatus::Pending
    );
    assert_matches!(
        grants.introspect_grant("missing").await,
        Err(KeystoneError::NotFound { .. })
    );
}

#[tokio::test]
async fn agent_fetches_token_for_its_own_grant() {
    let tb = TestBroker::new();
    let a1 = TestAgent::new("a1", 1);
    let a2 = TestAgent::new("a2", 2);
    tb.enroll(&a1, "alice@x", "carol@x").await;
    tb.enroll(&a2, "alice@x", "carol@x").await;
    let auth = tb.broker.authenticator();
    let grants = tb.broker.grants();

    let session = tb.authenticate(&a1).await;
    let principal = auth.authenticate_bearer(&session.token).await.unwrap();

    // The agent is recorded as requester whatever the body claims.
    let grant = grants
        .create_grant(grant_input("agent:a2", "bob@x", "always", None), Some(&principal))
        .await
        .unwrap();
    assert_eq!(grant.request.requester, "agent:a1");

    assert_matches!(
        grants.issue_grant_token(&grant.id, &principal).await,
        Err(KeystoneError::InvalidState { status: GrantStatus::Pending, .. })
    );
    grants
        .approve_grant(&grant.id, &Principal::session("carol@x"))
        .await
        .unwrap();

    let issued = grants.issue_grant_token(&grant.id, &principal).await.unwrap();
    let outcome = grants.verify_grant_credential(&issued.token).await.unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.claims.unwrap().sub, "agent:a1");

    let other = Principal::agent("a2");
    assert_matches!(
        grants.issue_grant_token(&grant.id, &other).await,
        Err(KeystoneError::Forbidden { .. })
    );
    // Approver and admin have no override.
    assert_matches!(
        grants.issue_grant_token(&grant.id, &tb.admin()).await,
        Err(KeystoneError::Forbidden { .. })
    );
}

#[tokio::test]
async fn verification_fuses_once_redemption() {
    let tb = TestBroker::new();
    let grants = tb.broker.grants();
    let grant = grants
        .create_grant(grant_input("alice@x", "bob@x", "once", None), None)
        .await
        .unwrap();
    let approved = grants.approve_grant(&grant.id, &tb.admin()).await.unwrap();

    let first = grants.verify_grant_credential(&approved.token).await.unwrap();
    assert!(first.valid);
    assert_eq!(first.grant.unwrap().status, GrantStatus::Used);

    let second = grants.verify_grant_credential(&approved.token).await.unwrap();
    assert!(!second.valid);

    let garbage = grants.verify_grant_credential("a.b.c").await.unwrap();
    assert!(!garbage.valid);
}

#[tokio::test]
async fn agent_credentials_are_not_grant_credentials() {
    let tb = TestBroker::new();
    let a1 = TestAgent::new("a1", 1);
    tb.enroll(&a1, "alice@x", "carol@x").await;
    let session = tb.authenticate(&a1).await;

    let outcome = tb
        .broker
        .grants()
        .verify_grant_credential(&session.token)
        .await
        .unwrap();
    assert!(!outcome.valid);
}
