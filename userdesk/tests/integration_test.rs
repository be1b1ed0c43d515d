//! Integration tests for userdesk
//!
//! These tests drive the controller end to end against:
//! - The local backend (SQLite + directory blob store)
//! - The in-memory backend, whose journals expose call ordering

use std::sync::Arc;
use tempfile::TempDir;
use userdesk::database::{create_pool, Repository};
use userdesk::services::{
    DeleteOutcome, ImageUpload, RecordsService, RemoveOutcome, SaveOutcome, ViewController,
};
use userdesk::storage::{
    BlobOp, BlobOpKind, DirBlobStore, InMemoryBlobStore, InMemoryRecordStore, RecordOp,
    RecordStore,
};

/// Helper to build a controller over a fresh local backend
async fn create_local_controller() -> (ViewController, Repository, TempDir) {
    let temp_dir = TempDir::new().unwrap();

    let pool = create_pool(&temp_dir.path().join("test.db")).await.unwrap();
    let repo = Repository::new(pool);

    let blob_store = DirBlobStore::new(temp_dir.path().join("blobs"));
    blob_store.initialize().await.unwrap();

    let service = RecordsService::new(
        Arc::new(repo.clone()),
        Arc::new(blob_store),
        "Img",
    );

    (ViewController::new(service), repo, temp_dir)
}

/// Helper to build a controller over in-memory stores whose first id is `first_id`
fn create_memory_controller(
    first_id: i64,
) -> (ViewController, InMemoryRecordStore, InMemoryBlobStore) {
    let records = InMemoryRecordStore::starting_at(first_id);
    let blobs = InMemoryBlobStore::new();
    let service = RecordsService::new(Arc::new(records.clone()), Arc::new(blobs.clone()), "Img");
    (ViewController::new(service), records, blobs)
}

fn fill(controller: &ViewController, name: &str, age: &str, email: &str) {
    controller.set_name(name);
    controller.set_age(age);
    controller.set_email(email);
}

#[tokio::test]
async fn test_create_edit_delete_scenario() {
    let (controller, records, blobs) = create_memory_controller(7);

    // Create Ann with an image; the store assigns id 7
    fill(&controller, "Ann", "30", "a@x.com");
    let outcome = controller
        .save(Some(ImageUpload::jpeg(b"ann.jpg".to_vec())))
        .await
        .unwrap();

    let created = match outcome {
        SaveOutcome::Created(record) => record,
        other => panic!("expected a created record, got {:?}", other),
    };
    assert_eq!(created.id, 7);
    assert_eq!(blobs.get("Img", "7.jpg").await, Some(b"ann.jpg".to_vec()));

    let state = controller.snapshot();
    assert_eq!(state.records.len(), 1);
    assert_eq!(state.records[0].record.name, "Ann");
    assert_eq!(state.records[0].image_url, "memory://Img/7.jpg");

    // Edit id 7, changing age to 31, with no new image
    let before_edit = blobs.mutations().await.len();
    controller.begin_edit(7).unwrap();
    controller.set_age("31");
    assert_eq!(controller.save(None).await.unwrap(), SaveOutcome::Updated(7));

    assert_eq!(records.get(7).await.unwrap().age, 31);
    assert_eq!(blobs.mutations().await.len(), before_edit);
    assert_eq!(blobs.get("Img", "7.jpg").await, Some(b"ann.jpg".to_vec()));
    assert!(!controller.snapshot().form.is_editing());

    // Delete id 7
    let outcome = controller.delete(7).await.unwrap();
    assert_eq!(
        outcome,
        RemoveOutcome::Deleted(DeleteOutcome {
            id: 7,
            orphaned_image: false,
        })
    );
    assert!(records.get(7).await.is_none());
    assert!(blobs.keys("Img").await.is_empty());
    assert!(controller
        .snapshot()
        .records
        .iter()
        .all(|view| view.record.id != 7));
}

#[tokio::test]
async fn test_edit_with_new_image_removes_before_upload() {
    let (controller, _records, blobs) = create_memory_controller(1);

    fill(&controller, "Ann", "30", "a@x.com");
    controller
        .save(Some(ImageUpload::jpeg(b"old".to_vec())))
        .await
        .unwrap();

    controller.begin_edit(1).unwrap();
    controller
        .save(Some(ImageUpload::jpeg(b"new".to_vec())))
        .await
        .unwrap();

    let mutations = blobs.mutations().await;
    let remove_at = mutations
        .iter()
        .position(|op| matches!(op, BlobOp::Remove { keys, .. } if keys == &["1.jpg".to_string()]))
        .expect("old image removed");
    let upload_at = mutations
        .iter()
        .rposition(|op| matches!(op, BlobOp::Upload { key, .. } if key == "1.jpg"))
        .expect("new image uploaded");

    assert!(remove_at < upload_at);
    assert_eq!(blobs.get("Img", "1.jpg").await, Some(b"new".to_vec()));
}

#[tokio::test]
async fn test_list_has_one_url_per_record_in_store_order() {
    let (controller, records, blobs) = create_memory_controller(1);

    for (name, image) in [("Ann", true), ("Bob", false), ("Cid", true)] {
        fill(&controller, name, "20", &format!("{}@x.com", name));
        let image = image.then(|| ImageUpload::jpeg(name.as_bytes().to_vec()));
        controller.save(image).await.unwrap();
    }

    let state = controller.snapshot();
    let ids: Vec<i64> = state.records.iter().map(|v| v.record.id).collect();
    let urls: Vec<&str> = state.records.iter().map(|v| v.image_url.as_str()).collect();

    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(
        urls,
        vec!["memory://Img/1.jpg", "memory://Img/2.jpg", "memory://Img/3.jpg"]
    );
    // Bob never had an image, yet still gets a URL
    assert_eq!(blobs.keys("Img").await, vec!["1.jpg", "3.jpg"]);
    assert_eq!(records.select().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_empty_field_save_is_noop() {
    let (controller, records, blobs) = create_memory_controller(1);

    fill(&controller, "Ann", "30", "");
    let outcome = controller
        .save(Some(ImageUpload::jpeg(b"img".to_vec())))
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::Incomplete);
    assert!(records.calls().await.is_empty());
    assert!(blobs.journal().await.is_empty());
}

#[tokio::test]
async fn test_delete_without_image_succeeds() {
    let (controller, records, _blobs) = create_memory_controller(1);

    fill(&controller, "Bob", "40", "b@x.com");
    controller.save(None).await.unwrap();

    let outcome = controller.delete(1).await.unwrap();

    assert_eq!(
        outcome,
        RemoveOutcome::Deleted(DeleteOutcome {
            id: 1,
            orphaned_image: false,
        })
    );
    assert!(records.get(1).await.is_none());
}

#[tokio::test]
async fn test_failed_upload_on_create_leaves_no_row() {
    let (controller, records, blobs) = create_memory_controller(1);
    blobs.fail_on(BlobOpKind::Upload).await;

    fill(&controller, "Ann", "30", "a@x.com");
    let result = controller
        .save(Some(ImageUpload::jpeg(b"img".to_vec())))
        .await;

    assert!(result.is_err());
    assert!(records.select().await.unwrap().is_empty());
    assert_eq!(
        &records.calls().await[..2],
        &[RecordOp::Insert, RecordOp::Delete]
    );
    // The draft survives for a retry
    assert_eq!(controller.snapshot().form.draft.name, "Ann");
}

#[tokio::test]
async fn test_local_backend_round_trip() {
    let (controller, repo, temp) = create_local_controller().await;
    let blob_dir = temp.path().join("blobs").join("Img");

    fill(&controller, "Ann", "30", "a@x.com");
    let created = match controller
        .save(Some(ImageUpload::jpeg(b"first".to_vec())))
        .await
        .unwrap()
    {
        SaveOutcome::Created(record) => record,
        other => panic!("expected a created record, got {:?}", other),
    };

    let key = format!("{}.jpg", created.id);
    assert_eq!(std::fs::read(blob_dir.join(&key)).unwrap(), b"first");

    let state = controller.snapshot();
    assert_eq!(state.records.len(), 1);
    assert!(state.records[0].image_url.starts_with("file://"));
    assert!(state.records[0].image_url.ends_with(&format!("/Img/{}", key)));

    // Replacing the image goes through remove-then-upload, which the
    // directory store needs because it refuses to overwrite
    controller.begin_edit(created.id).unwrap();
    controller.set_name("Ann B.");
    controller
        .save(Some(ImageUpload::jpeg(b"second".to_vec())))
        .await
        .unwrap();

    assert_eq!(repo.select().await.unwrap()[0].name, "Ann B.");
    assert_eq!(std::fs::read(blob_dir.join(&key)).unwrap(), b"second");

    controller.delete(created.id).await.unwrap();

    assert!(repo.select().await.unwrap().is_empty());
    assert!(!blob_dir.join(&key).exists());
    assert!(controller.snapshot().records.is_empty());
}

#[tokio::test]
async fn test_local_backend_persists_across_pools() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    {
        let repo = Repository::new(create_pool(&db_path).await.unwrap());
        repo.insert(&userdesk::database::NewRecord {
            name: "Ann".to_string(),
            age: 30,
            email: "a@x.com".to_string(),
        })
        .await
        .unwrap();
    }

    let repo = Repository::new(create_pool(&db_path).await.unwrap());
    let records = repo.select().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].email, "a@x.com");
}
