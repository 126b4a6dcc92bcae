#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use inventory_admin::{
    config::AppConfig,
    repositories::InventoryRepository,
    screen::{AutoConfirm, InventoryScreen, ProductField},
    services::{ImagePreprocessor, RawImage},
    store::MemoryStore,
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper harness wiring the full router over an in-memory store.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            AppConfig::default(),
            store.clone(),
            ImagePreprocessor::default(),
        );
        let router = inventory_admin::app_router(state.clone());
        Self {
            router,
            state,
            store,
        }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not json")
}

/// Solid-colour PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([20, 120, 220, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

pub fn png_base64(width: u32, height: u32) -> String {
    STANDARD.encode(png(width, height))
}

/// Decodes a stored `data:image/jpeg;base64,` URL and returns its pixel size.
pub fn jpeg_dimensions(data_url: &str) -> (u32, u32) {
    let payload = data_url
        .strip_prefix("data:image/jpeg;base64,")
        .expect("not a jpeg data url");
    let bytes = STANDARD.decode(payload).expect("bad base64");
    assert_eq!(image::guess_format(&bytes).expect("unknown format"), ImageFormat::Jpeg);
    let img = image::load_from_memory(&bytes).expect("undecodable jpeg");
    (img.width(), img.height())
}

/// Every input except name and image, as typed into the form.
pub fn widget_fields() -> Vec<(ProductField, &'static str)> {
    vec![
        (ProductField::Mrp, "100"),
        (ProductField::PurchasePrice, "50"),
        (ProductField::RetailSellPrice, "90"),
        (ProductField::WholesaleSellPrice, "70"),
        (ProductField::StockTotal, "10"),
        (ProductField::Rank, "1"),
        (ProductField::Category, "Tools"),
        (ProductField::Brand, "Acme"),
        (ProductField::Description, "basic widget"),
        (ProductField::Discount, "0"),
    ]
}

pub fn widget_json(name: &str, description: &str) -> Value {
    json!({
        "productName": name,
        "mrp": "100",
        "purchasePrice": "50",
        "retailSellPrice": "90",
        "wholesaleSellPrice": "70",
        "stockTotal": "10",
        "rank": "1",
        "category": "Tools",
        "brand": "Acme",
        "description": description,
        "discount": "0"
    })
}

pub fn screen(repository: InventoryRepository, confirm: bool) -> InventoryScreen {
    InventoryScreen::new(
        repository,
        ImagePreprocessor::default(),
        Arc::new(AutoConfirm(confirm)),
    )
}

/// Fills and submits a complete product with a fresh photo.
pub async fn submit_product(screen: &mut InventoryScreen, name: &str, description: &str) {
    screen.set_field(ProductField::ProductName, name);
    for (field, value) in widget_fields() {
        screen.set_field(field, value);
    }
    screen.set_field(ProductField::Description, description);
    screen
        .select_image(Some(RawImage::new(png(600, 400))))
        .await
        .expect("image accepted");
    screen.submit().await.expect("submit succeeds");
}
