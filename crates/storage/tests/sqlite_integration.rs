use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_roundtrip_persists_values() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get_item("english-learning-progress").await.unwrap(), None);

    repo.set_item("english-learning-progress", r#"{"markedItems":[]}"#)
        .await
        .unwrap();
    repo.set_item("english-learning-progress", r#"{"lastVisitedPage":{"words":2}}"#)
        .await
        .unwrap();

    let stored = repo.get_item("english-learning-progress").await.unwrap();
    assert_eq!(stored.as_deref(), Some(r#"{"lastVisitedPage":{"words":2}}"#));

    repo.remove_item("english-learning-progress").await.unwrap();
    assert_eq!(repo.get_item("english-learning-progress").await.unwrap(), None);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.set_item("k", "v").await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.get_item("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn storage_sqlite_exposes_kv() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.kv.set_item("a", "1").await.unwrap();
    storage.kv.set_item("b", "2").await.unwrap();
    assert_eq!(storage.kv.get_item("a").await.unwrap().as_deref(), Some("1"));
    assert_eq!(storage.kv.get_item("b").await.unwrap().as_deref(), Some("2"));
}
