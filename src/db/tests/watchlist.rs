use super::{episode, film, series};
use crate::Error;
use crate::catalog::ServiceId;
use crate::db::*;
use crate::types::{EventKind, ItemId, ReconciliationEvent};
use chrono::{TimeZone, Utc};
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_insert_and_get_item() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let next = episode((2024, 5, 8), 2, 4);
    let inserted = db
        .insert_item(&series(1396, "Some Show"), Some(&next), now)
        .await
        .unwrap();

    assert!(inserted.id.get() > 0);
    assert!(!inserted.notified);

    let loaded = db.get_item(inserted.id).await.unwrap().unwrap();
    assert_eq!(loaded, inserted, "row must round-trip every field");
    assert_eq!(loaded.next_episode, Some(next));
    assert_eq!(loaded.providers.len(), 1);

    db.close().await;
}

#[tokio::test]
async fn test_duplicate_external_id_and_kind_rejected() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let now = Utc::now();

    db.insert_item(&film(603, "Film"), None, now).await.unwrap();
    let err = db.insert_item(&film(603, "Film again"), None, now).await.unwrap_err();
    assert!(matches!(err, Error::Duplicate(_)), "got {err:?}");

    // Same TMDB id for a different media kind is a different item
    db.insert_item(&series(603, "Series"), None, now).await.unwrap();

    db.close().await;
}

#[tokio::test]
async fn test_list_items_in_insertion_order() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let now = Utc::now();

    db.insert_item(&series(3, "C"), None, now).await.unwrap();
    db.insert_item(&film(1, "A"), None, now).await.unwrap();
    db.insert_item(&series(2, "B"), None, now).await.unwrap();

    let titles: Vec<String> = db
        .list_items()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.title)
        .collect();
    assert_eq!(titles, vec!["C", "A", "B"]);

    db.close().await;
}

#[tokio::test]
async fn test_delete_item() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let item = db.insert_item(&film(1, "A"), None, Utc::now()).await.unwrap();
    assert!(db.delete_item(item.id).await.unwrap());
    assert!(!db.delete_item(item.id).await.unwrap(), "second delete finds nothing");
    assert!(db.get_item(item.id).await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_save_pass_updates_items_and_logs_events() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    let added = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let checked = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();

    let mut item = db.insert_item(&film(603, "Film"), None, added).await.unwrap();
    item.providers.insert(ServiceId::Prime);
    item.providers.insert(ServiceId::Netflix);
    item.notified = true;
    item.last_checked = checked;

    let event = ReconciliationEvent::new(
        &item,
        EventKind::NowAvailable {
            services: item.providers.iter().copied().collect(),
        },
    );

    db.save_pass(std::slice::from_ref(&item), &[event], checked)
        .await
        .unwrap();

    let loaded = db.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(loaded, item);

    let log = db.list_notifications(false, 10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].item_id, item.id);
    assert_eq!(log[0].kind, "now_available");
    assert_eq!(log[0].body, "Film is now available on Netflix, Amazon Prime Video!");
    assert_eq!(log[0].created_at, checked);

    db.close().await;
}

#[tokio::test]
async fn test_save_pass_skips_items_deleted_meanwhile() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let mut item = db.insert_item(&film(1, "Gone"), None, Utc::now()).await.unwrap();
    db.delete_item(item.id).await.unwrap();

    item.notified = true;
    let event = ReconciliationEvent::new(&item, EventKind::NowAvailable { services: vec![] });
    db.save_pass(&[item], &[event], Utc::now()).await.unwrap();

    assert!(db.list_items().await.unwrap().is_empty());
    assert!(db.list_notifications(true, 10).await.unwrap().is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_corrupt_media_kind_is_reported() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    sqlx::query(
        "INSERT INTO tracked_items (external_id, title, media_kind, last_checked, added_at) VALUES (1, 'x', 'podcast', 0, 0)",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let err = db.get_item(ItemId(1)).await.unwrap_err();
    assert!(
        matches!(err, Error::Database(crate::error::DatabaseError::CorruptRow(_))),
        "got {err:?}"
    );

    db.close().await;
}
