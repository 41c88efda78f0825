// tests/store_tests.rs

use std::sync::Arc;

use anyhow::Result;

use shutup_common::models::ConversationId;
use shutup_core::SilenceStore;

fn cid(id: &str) -> ConversationId {
    ConversationId::from(id)
}

#[tokio::test]
async fn test_missing_file_loads_empty() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SilenceStore::open(dir.path().join("silence_map.json"), 0.0).await;

    assert!(store.snapshot().await.is_empty());
    assert!(!store.path().exists(), "loading must not create the file");
    Ok(())
}

#[tokio::test]
async fn test_malformed_file_loads_empty() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("silence_map.json");
    std::fs::write(&path, "{ this is not json")?;

    let store = SilenceStore::open(&path, 0.0).await;
    assert!(store.snapshot().await.is_empty());

    // Still usable afterwards; the next mutation overwrites the junk.
    store.set(&cid("c1"), 500.0).await;
    let reopened = SilenceStore::open(&path, 0.0).await;
    assert_eq!(reopened.get(&cid("c1")).await, Some(500.0));
    Ok(())
}

#[tokio::test]
async fn test_round_trip_preserves_fractional_expiry() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("silence_map.json");

    let store = SilenceStore::new(&path);
    store.set(&cid("group_1"), 1_700_000_123.456).await;
    store.set(&cid("group_2"), 1_700_000_999.0).await;

    let reopened = SilenceStore::open(&path, 1_700_000_000.0).await;
    let map = reopened.snapshot().await;
    assert_eq!(map.len(), 2);
    assert!((map[&cid("group_1")] - 1_700_000_123.456).abs() < 1e-3);
    assert!((map[&cid("group_2")] - 1_700_000_999.0).abs() < 1e-3);

    // On-disk shape is a flat object of id -> epoch seconds.
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert!(raw.get("group_1").and_then(|v| v.as_f64()).is_some());
    Ok(())
}

#[tokio::test]
async fn test_save_creates_missing_directories() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("deeper").join("silence_map.json");

    let store = SilenceStore::new(&path);
    store.set(&cid("c1"), 10.0).await;

    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());
    Ok(())
}

#[tokio::test]
async fn test_open_prunes_expired_records() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("silence_map.json");
    std::fs::write(&path, r#"{"old": 100.0, "edge": 200.0, "live": 300.5}"#)?;

    let store = SilenceStore::open(&path, 200.0).await;
    let map = store.snapshot().await;
    assert_eq!(map.keys().map(|k| k.as_str()).collect::<Vec<_>>(), vec!["live"]);

    // Pruning was written back.
    let reopened = SilenceStore::open(&path, 0.0).await;
    assert_eq!(reopened.snapshot().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_clear_and_clear_if_lapsed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SilenceStore::new(dir.path().join("silence_map.json"));

    store.set(&cid("c1"), 100.0).await;
    assert!(!store.clear_if_lapsed(&cid("c1"), 99.0).await);
    assert_eq!(store.active_expiry(&cid("c1"), 99.0).await, Some(100.0));
    assert_eq!(store.active_expiry(&cid("c1"), 100.0).await, None);
    assert!(store.clear_if_lapsed(&cid("c1"), 100.0).await);
    assert_eq!(store.get(&cid("c1")).await, None);

    store.set(&cid("c2"), 50.0).await;
    assert_eq!(store.clear(&cid("c2")).await, Some(50.0));
    assert_eq!(store.clear(&cid("c2")).await, None);
    Ok(())
}

#[tokio::test]
async fn test_save_failure_keeps_memory_state() -> Result<()> {
    let dir = tempfile::tempdir()?;
    // The parent "directory" is a regular file, so every save fails.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x")?;
    let store = SilenceStore::new(blocker.join("silence_map.json"));

    store.set(&cid("c1"), 100.0).await;
    assert_eq!(store.get(&cid("c1")).await, Some(100.0));
    store.flush().await;
    Ok(())
}

#[tokio::test]
async fn test_clear_memory_leaves_file_alone() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("silence_map.json");
    let store = SilenceStore::new(&path);

    store.set(&cid("c1"), 1000.0).await;
    store.clear_memory().await;
    assert!(store.snapshot().await.is_empty());

    let reopened = SilenceStore::open(&path, 0.0).await;
    assert_eq!(reopened.get(&cid("c1")).await, Some(1000.0));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_mutations_converge() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("silence_map.json");
    let store = Arc::new(SilenceStore::new(&path));

    let mut tasks = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            let id = ConversationId::new(format!("c{}", i));
            store.set(&id, 1000.0 + i as f64).await;
            if i % 2 == 0 {
                store.clear(&id).await;
            }
        }));
    }
    for task in tasks {
        task.await?;
    }

    let in_memory = store.snapshot().await;
    assert_eq!(in_memory.len(), 10);
    assert!(in_memory.keys().all(|k| {
        let n: u32 = k.as_str()[1..].parse().unwrap();
        n % 2 == 1
    }));

    let on_disk = SilenceStore::open(&path, 0.0).await.snapshot().await;
    assert_eq!(on_disk, in_memory);
    Ok(())
}

#[tokio::test]
async fn test_view_tracks_store_without_mutators() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SilenceStore::new(dir.path().join("silence_map.json"));
    let view = store.view();
    assert_eq!(view.path(), store.path());
    assert!(view.snapshot().await.is_empty());

    store.set(&cid("c1"), 100.0).await;
    assert_eq!(view.get(&cid("c1")).await, Some(100.0));
    assert_eq!(view.active_expiry(&cid("c1"), 50.0).await, Some(100.0));
    assert_eq!(view.active_expiry(&cid("c1"), 100.0).await, None);

    store.clear(&cid("c1")).await;
    assert_eq!(view.get(&cid("c1")).await, None);
    Ok(())
}
