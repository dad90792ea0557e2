//! Connection registry integration tests

mod common;

use common::{ids, members, SwitchableStore};
use fanout_gateway::store::{ConnectionId, ConnectionStore, FileStore, MemoryStore};
use fanout_gateway::config::StoreBackend;
use fanout_gateway::{Config, GatewayError, GatewayServer, LifecycleManager};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio_test::assert_ok;

/// Apply a join/leave script and compare against a model set
async fn run_script(manager: &LifecycleManager, script: &[(bool, &str)]) -> BTreeSet<ConnectionId> {
    let mut expected = BTreeSet::new();
    for (join, id) in script {
        if *join {
            assert_ok!(manager.on_join((*id).into()).await);
            expected.insert(ConnectionId::from(*id));
        } else {
            assert_ok!(manager.on_leave(&(*id).into()).await);
            expected.remove(&ConnectionId::from(*id));
        }
    }
    expected
}

#[tokio::test]
async fn test_membership_matches_joined_minus_left() {
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(store.clone());

    let script = [
        (true, "a"),
        (true, "b"),
        (false, "c"),
        (true, "a"),
        (true, "c"),
        (false, "a"),
        (false, "a"),
        (true, "d"),
        (false, "b"),
        (true, "b"),
    ];
    let expected = run_script(&manager, &script).await;

    let actual: BTreeSet<_> = members(store.as_ref()).await.into_iter().collect();
    assert_eq!(actual, expected);
    let want: BTreeSet<_> = ids(&["b", "c", "d"]).into_iter().collect();
    assert_eq!(actual, want);
}

#[tokio::test]
async fn test_join_join_leave_leaves_store_empty() {
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(store.clone());

    manager.on_join("A".into()).await.unwrap();
    manager.on_join("A".into()).await.unwrap();
    manager.on_leave(&"A".into()).await.unwrap();

    assert!(members(store.as_ref()).await.is_empty());
}

#[tokio::test]
async fn test_leave_twice_matches_leave_once() {
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(store.clone());
    for id in ["a", "b", "c"] {
        manager.on_join(id.into()).await.unwrap();
    }

    manager.on_leave(&"b".into()).await.unwrap();
    let after_once = members(store.as_ref()).await;
    manager.on_leave(&"b".into()).await.unwrap();
    let after_twice = members(store.as_ref()).await;

    assert_eq!(after_once, after_twice);
    assert_eq!(after_twice, ids(&["a", "c"]));
}

#[tokio::test]
async fn test_store_unavailable_is_surfaced() {
    let store = SwitchableStore::new();
    let manager = LifecycleManager::new(store.clone());
    manager.on_join("a".into()).await.unwrap();

    store.set_offline(true);
    let join = manager.on_join("b".into()).await;
    let leave = manager.on_leave(&"a".into()).await;

    assert!(matches!(join, Err(GatewayError::StoreUnavailable(_))));
    assert!(matches!(leave, Err(GatewayError::StoreUnavailable(_))));

    store.set_offline(false);
    assert_eq!(members(store.as_ref()).await, ids(&["a"]));
}

#[tokio::test]
async fn test_concurrent_joins_and_leaves() {
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(store.clone());

    let mut handles = Vec::new();
    for i in 0..50 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let id = ConnectionId::from(format!("conn-{}", i));
            manager.on_join(id.clone()).await.unwrap();
            if i % 2 == 0 {
                manager.on_leave(&id).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let remaining = members(store.as_ref()).await;
    assert_eq!(remaining.len(), 25);
    assert!(remaining.iter().all(|id| {
        let n: usize = id.as_str().trim_start_matches("conn-").parse().unwrap();
        n % 2 == 1
    }));
}

#[tokio::test]
async fn test_file_store_registry_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("connections.json");

    {
        let store: Arc<dyn ConnectionStore> = Arc::new(FileStore::open(&path).await.unwrap());
        let manager = LifecycleManager::new(store);
        manager.on_join("a".into()).await.unwrap();
        manager.on_join("b".into()).await.unwrap();
        manager.on_leave(&"a".into()).await.unwrap();
    }

    let reopened = FileStore::open(&path).await.unwrap();
    assert_eq!(members(&reopened).await, ids(&["b"]));
}

#[tokio::test]
async fn test_clear_on_startup_drops_previous_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("connections.json");

    {
        let store: Arc<dyn ConnectionStore> = Arc::new(FileStore::open(&path).await.unwrap());
        let manager = LifecycleManager::new(store);
        manager.on_join("left-over".into()).await.unwrap();
    }

    let mut config = Config::default();
    config.store.backend = StoreBackend::File;
    config.store.path = Some(path.clone());
    config.store.clear_on_startup = true;
    let (shutdown, _) = broadcast::channel(1);

    let server = GatewayServer::new(config, shutdown).await.unwrap();

    assert!(members(server.state().gateway.store().as_ref()).await.is_empty());
    let reopened = FileStore::open(&path).await.unwrap();
    assert!(members(&reopened).await.is_empty());
}

#[tokio::test]
async fn test_stale_entries_kept_without_clear_on_startup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("connections.json");

    {
        let store: Arc<dyn ConnectionStore> = Arc::new(FileStore::open(&path).await.unwrap());
        LifecycleManager::new(store).on_join("left-over".into()).await.unwrap();
    }

    let mut config = Config::default();
    config.store.backend = StoreBackend::File;
    config.store.path = Some(path);
    let (shutdown, _) = broadcast::channel(1);

    let server = GatewayServer::new(config, shutdown).await.unwrap();

    assert_eq!(members(server.state().gateway.store().as_ref()).await, ids(&["left-over"]));
}
