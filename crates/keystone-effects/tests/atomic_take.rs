//! Concurrent `take` on the same key must hand the value to exactly one caller.

use futures::future::join_all;
use keystone_core::effects::StorageCoreEffects;
use keystone_effects::{FilesystemStorageHandler, MemoryStorageHandler};
use std::sync::Arc;

async fn race_take<S>(storage: Arc<S>, contenders: usize) -> usize
where
    S: StorageCoreEffects + 'static,
{
    storage
        .store("challenges:race", b"nonce".to_vec())
        .await
        .unwrap();

    let tasks = (0..contenders).map(|_| {
        let storage = Arc::clone(&storage);
        tokio::spawn(async move { storage.take("challenges:race").await.unwrap() })
    });

    join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .filter(Option::is_some)
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_take_has_one_winner() {
    for _ in 0..20 {
        let winners = race_take(Arc::new(MemoryStorageHandler::new()), 16).await;
        assert_eq!(winners, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn filesystem_take_has_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    for _ in 0..10 {
        let storage = Arc::new(FilesystemStorageHandler::new(dir.path()));
        let winners = race_take(storage, 16).await;
        assert_eq!(winners, 1);
    }
}
