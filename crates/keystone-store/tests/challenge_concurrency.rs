//! Concurrent redemption of one challenge token succeeds at most once.

use futures::future::join_all;
use keystone_effects::{
    FilesystemStorageHandler, MemoryStorageHandler, RealRandomHandler, SimulatedTimeHandler,
};
use keystone_core::effects::StorageCoreEffects;
use keystone_store::{ChallengeLedger, StorageChallengeLedger};
use std::sync::Arc;

async fn redeem_concurrently<S>(storage: S, contenders: usize) -> usize
where
    S: StorageCoreEffects + 'static,
{
    let ledger = Arc::new(StorageChallengeLedger::new(
        storage,
        Arc::new(SimulatedTimeHandler::new(5_000)),
        Arc::new(RealRandomHandler::new()),
    ));
    let token = ledger.create_challenge("a1").await.unwrap();

    let attempts = (0..contenders).map(|_| {
        let ledger = Arc::clone(&ledger);
        let token = token.clone();
        tokio::spawn(async move { ledger.consume_challenge(&token, "a1").await.unwrap() })
    });

    join_all(attempts)
        .await
        .into_iter()
        .filter(|r| *r.as_ref().unwrap())
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_concurrent_redemption_in_memory() {
    for _ in 0..25 {
        assert_eq!(redeem_concurrently(MemoryStorageHandler::new(), 12).await, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_concurrent_redemption_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    for _ in 0..10 {
        let storage = FilesystemStorageHandler::new(dir.path());
        assert_eq!(redeem_concurrently(storage, 12).await, 1);
    }
}

#[tokio::test]
async fn ledgers_share_one_store_without_interference() {
    use keystone_core::{Grant, GrantRequest, GrantType};
    use keystone_store::{GrantLedger, StorageGrantLedger};

    let storage = MemoryStorageHandler::new();
    let grants = StorageGrantLedger::new(storage.clone());
    let challenges = StorageChallengeLedger::new(
        storage.clone(),
        Arc::new(SimulatedTimeHandler::new(0)),
        Arc::new(RealRandomHandler::new()),
    );

    grants
        .save(&Grant::pending(
            "g1",
            GrantRequest {
                requester: "agent:a1".to_string(),
                target: "bob@x".to_string(),
                grant_type: GrantType::Always,
                duration: None,
            },
            1,
        ))
        .await
        .unwrap();
    challenges.create_challenge("a1").await.unwrap();

    assert_eq!(grants.find_all().await.unwrap().len(), 1);
    assert_eq!(storage.list_keys(None).await.unwrap().len(), 2);
}
