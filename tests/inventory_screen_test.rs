mod common;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use common::{jpeg_dimensions, png, screen, submit_product};
use inventory_admin::{
    errors::ServiceError,
    models::ProductId,
    repositories::InventoryRepository,
    screen::{
        ActionOutcome, FormMode, ListAction, NoticeLevel, ProductField, ARCHIVE_FAILED,
        DELETE_FAILED, IMAGE_FAILED, SUBMIT_FAILED, SUBMIT_SUCCEEDED,
    },
    services::RawImage,
    store::{DocumentStore, MemoryStore, StoreError},
};
use mockall::mock;
use serde_json::{json, Map, Value};

mock! {
    pub Store {}

    #[async_trait]
    impl DocumentStore for Store {
        async fn read(&self, path: &str) -> Result<Option<Value>, StoreError>;
        async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;
        async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;
        async fn delete(&self, path: &str) -> Result<(), StoreError>;
    }
}

fn memory_repository() -> (Arc<MemoryStore>, InventoryRepository) {
    let store = Arc::new(MemoryStore::new());
    (store.clone(), InventoryRepository::new(store))
}

fn unavailable() -> StoreError {
    StoreError::Transport("connection refused".into())
}

#[tokio::test]
async fn submitting_widget_a_creates_one_active_record_with_resized_image() {
    let (_, repository) = memory_repository();
    let mut screen = screen(repository, true);
    screen.load().await;
    assert!(screen.snapshot().list.rows.is_empty());

    submit_product(&mut screen, "Widget A", "basic widget").await;

    let snapshot = screen.snapshot();
    assert_eq!(snapshot.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Success));
    assert_eq!(snapshot.notice.unwrap().message, SUBMIT_SUCCEEDED);
    assert_eq!(snapshot.form.mode, FormMode::Create);
    assert!(snapshot.form.fields.product_name.is_empty());
    assert!(snapshot.form.image_preview.is_none());

    assert_eq!(snapshot.list.rows.len(), 1);
    let row = &snapshot.list.rows[0];
    assert!(row.record.id().as_str().parse::<i64>().is_ok());
    assert_eq!(row.record.product.product_name, "Widget A");
    assert!(!row.record.product.archive);
    assert_eq!(row.image_label, None);
    assert_eq!(row.archive_label, "Archive");
    let image = row.record.image.as_deref().expect("image stored");
    assert_eq!(jpeg_dimensions(image), (300, 200));
}

#[tokio::test]
async fn archived_match_sorts_after_active_match() {
    let (_, repository) = memory_repository();
    let mut screen = screen(repository, true);
    submit_product(&mut screen, "Lamp", "Red widget").await;
    submit_product(&mut screen, "Red Widget spare", "spare part").await;
    submit_product(&mut screen, "Chair", "wooden").await;

    let first = screen.list().records()[0].id().clone();
    let outcome = screen
        .dispatch(ListAction::ToggleArchive(first.clone()))
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Applied);

    screen.set_query("RED");
    let rows = screen.snapshot().list.rows;
    let names: Vec<&str> = rows
        .iter()
        .map(|row| row.record.product.product_name.as_str())
        .collect();
    assert_eq!(names, vec!["Red Widget spare", "Lamp"]);
    assert_eq!(rows[1].archive_label, "Unarchive");
}

#[tokio::test]
async fn declined_delete_changes_nothing() {
    let (store, repository) = memory_repository();
    let mut seeding = screen(repository.clone(), true);
    submit_product(&mut seeding, "Keep me", "still here").await;
    let before = store.dump().await;

    let mut screen = screen(repository, false);
    screen.load().await;
    let id = screen.list().records()[0].id().clone();

    let outcome = screen.dispatch(ListAction::Delete(id)).await.unwrap();

    assert_eq!(outcome, ActionOutcome::Declined);
    assert_eq!(store.dump().await, before);
    assert_eq!(screen.snapshot().list.rows.len(), 1);
    assert!(screen.notice().is_none());
}

#[tokio::test]
async fn confirmed_delete_removes_product_and_image() {
    let (store, repository) = memory_repository();
    let mut screen = screen(repository, true);
    submit_product(&mut screen, "Gone soon", "temporary").await;
    let id = screen.list().records()[0].id().clone();

    let outcome = screen.dispatch(ListAction::Delete(id)).await.unwrap();

    assert_eq!(outcome, ActionOutcome::Applied);
    assert!(screen.snapshot().list.rows.is_empty());
    assert_eq!(store.dump().await, json!({}));
}

#[tokio::test]
async fn editing_keeps_id_and_stored_image() {
    let (_, repository) = memory_repository();
    let mut screen = screen(repository, true);
    submit_product(&mut screen, "Widget A", "basic widget").await;
    let original = screen.list().records()[0].clone();

    screen
        .dispatch(ListAction::Edit(original.id().clone()))
        .await
        .unwrap();
    assert_eq!(screen.snapshot().form.title, "Edit Product");
    assert!(!screen.snapshot().form.image_required);
    screen.set_field(ProductField::StockTotal, "25");
    let id = screen.submit().await.unwrap();

    assert_eq!(&id, original.id());
    let records = screen.list().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].product.stock_total, 25);
    assert_eq!(records[0].image, original.image);
}

#[tokio::test]
async fn undecodable_upload_keeps_form_and_raises_notice() {
    let (_, repository) = memory_repository();
    let mut screen = screen(repository, true);
    screen
        .select_image(Some(RawImage::new(png(10, 10))))
        .await
        .unwrap();
    let before = screen.snapshot().form;

    let err = screen
        .select_image(Some(RawImage::new(b"GIF89a-not-really".to_vec())))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::ImageError(_)));
    assert_eq!(screen.snapshot().form, before);
    let notice = screen.notice().expect("image notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, IMAGE_FAILED);

    screen
        .select_image(Some(RawImage::new(png(12, 12))))
        .await
        .unwrap();
    assert!(screen.notice().is_none());
}

#[tokio::test]
async fn missing_fields_block_submit_without_notice() {
    let mut store = MockStore::new();
    store.expect_write().never();
    let repository = InventoryRepository::new(Arc::new(store));
    let mut screen = screen(repository, true);
    screen.set_field(ProductField::ProductName, "Half done");

    let err = screen.submit().await.unwrap_err();

    assert!(matches!(err, ServiceError::ValidationError(_)));
    assert!(screen.notice().is_none());
    let errors = screen.snapshot().form.errors;
    assert!(errors.iter().any(|e| e.field == "mrp"));
    assert!(errors.iter().any(|e| e.field == "image"));
    assert_eq!(screen.form().fields().product_name, "Half done");
}

#[tokio::test]
async fn failed_image_write_keeps_form_and_reports() {
    let mut store = MockStore::new();
    store
        .expect_write()
        .withf(|path, _| path.starts_with("products/"))
        .times(1)
        .returning(|_, _| Ok(()));
    store
        .expect_write()
        .withf(|path, _| path.starts_with("images/"))
        .times(1)
        .returning(|_, _| Err(unavailable()));
    let repository = InventoryRepository::new(Arc::new(store));
    let mut screen = screen(repository, true);

    screen.set_field(ProductField::ProductName, "Widget A");
    for (field, value) in common::widget_fields() {
        screen.set_field(field, value);
    }
    screen
        .select_image(Some(RawImage::new(png(20, 20))))
        .await
        .unwrap();

    let err = screen.submit().await.unwrap_err();

    assert!(matches!(err, ServiceError::StoreError(StoreError::Transport(_))));
    let snapshot = screen.snapshot();
    let notice = snapshot.notice.expect("failure notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, SUBMIT_FAILED);
    assert_eq!(snapshot.form.fields.product_name, "Widget A");
    assert!(snapshot.form.image_preview.is_some());
}

#[tokio::test]
async fn read_failure_shows_empty_list() {
    let mut store = MockStore::new();
    store.expect_read().returning(|_| Err(unavailable()));
    let mut screen = screen(InventoryRepository::new(Arc::new(store)), true);

    screen.load().await;

    let list = screen.snapshot().list;
    assert!(!list.loading);
    assert!(list.rows.is_empty());
    assert!(screen.notice().is_none());
}

#[tokio::test]
async fn failed_archive_update_raises_notice() {
    let mut store = MockStore::new();
    store.expect_read().returning(|path| {
        Ok(match path {
            "products/42" => Some(json!({ "productName": "Stuck", "archive": false })),
            _ => None,
        })
    });
    store
        .expect_update()
        .times(1)
        .returning(|_, _| Err(StoreError::Status {
            status: 401,
            body: "Permission denied".into(),
        }));
    let mut screen = screen(InventoryRepository::new(Arc::new(store)), true);

    let id = ProductId::parse("42").unwrap();
    let err = screen.dispatch(ListAction::ToggleArchive(id)).await.unwrap_err();

    assert!(matches!(err, ServiceError::StoreError(StoreError::Status { status: 401, .. })));
    assert_eq!(screen.notice().unwrap().message, ARCHIVE_FAILED);
}

#[tokio::test]
async fn failed_delete_raises_notice_and_skips_image_delete() {
    let mut store = MockStore::new();
    store
        .expect_delete()
        .withf(|path| path.starts_with("products/"))
        .times(1)
        .returning(|_| Err(unavailable()));
    store
        .expect_delete()
        .withf(|path| path.starts_with("images/"))
        .never();
    let mut screen = screen(InventoryRepository::new(Arc::new(store)), true);

    let id = ProductId::parse("7").unwrap();
    screen.dispatch(ListAction::Delete(id)).await.unwrap_err();

    assert_eq!(screen.notice().unwrap().message, DELETE_FAILED);
}

#[tokio::test]
async fn image_delete_failure_after_product_delete_leaves_product_gone() {
    let product_deleted = Arc::new(AtomicBool::new(false));
    let mut store = MockStore::new();

    let deleted = product_deleted.clone();
    store.expect_read().returning(move |path| {
        Ok(match path {
            "products" if !deleted.load(Ordering::SeqCst) => {
                Some(json!({ "7": { "productName": "Lamp", "archive": false } }))
            }
            "images" => Some(json!({ "7": { "image": "data:image/jpeg;base64,AA==" } })),
            _ => None,
        })
    });

    let deleted = product_deleted.clone();
    store
        .expect_delete()
        .withf(|path| path.starts_with("products/"))
        .times(1)
        .returning(move |_| {
            deleted.store(true, Ordering::SeqCst);
            Ok(())
        });
    store
        .expect_delete()
        .withf(|path| path.starts_with("images/"))
        .times(1)
        .returning(|_| Err(unavailable()));

    let mut screen = screen(InventoryRepository::new(Arc::new(store)), true);
    screen.load().await;
    assert_eq!(screen.snapshot().list.rows.len(), 1);

    let id = ProductId::parse("7").unwrap();
    screen.dispatch(ListAction::Delete(id.clone())).await.unwrap_err();

    assert_eq!(screen.notice().unwrap().message, DELETE_FAILED);
    assert!(product_deleted.load(Ordering::SeqCst));

    screen.load().await;
    assert!(screen.list().find(&id).is_none());
    assert!(screen.snapshot().list.rows.is_empty());
}
