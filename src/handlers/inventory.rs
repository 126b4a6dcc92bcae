use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ServiceError;
use crate::models::{InventoryRecord, ProductId};
use crate::repositories::InventoryRepository;
use crate::screen::{ConfirmPrompt, FormController, FormFields, InventoryListView, ListSnapshot};
use crate::services::{ImagePreprocessor, RawImage};
use crate::ApiResponse;

// Trait for inventory handler state that provides access to the repository
pub trait InventoryHandlerState: Clone + Send + Sync + 'static {
    fn repository(&self) -> &InventoryRepository;
    fn preprocessor(&self) -> &ImagePreprocessor;
}

/// Body of create and update requests
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub fields: FormFields,
    /// Photo as bare base64 or a `data:` URL
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryFilters {
    /// Case-insensitive search over name and description
    pub q: Option<String>,
}

/// Query string of destructive routes
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
    /// Target archive state, defaults to archiving
    #[serde(default)]
    pub archived: Option<bool>,
}

/// Result of a confirmation-gated action
#[derive(Debug, Serialize)]
pub struct ActionResult {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl ActionResult {
    fn declined(prompt: ConfirmPrompt) -> Self {
        Self {
            applied: false,
            message: Some(prompt.message()),
        }
    }

    fn applied() -> Self {
        Self {
            applied: true,
            message: None,
        }
    }
}

/// Create the inventory router
pub fn inventory_router<S>() -> Router<S>
where
    S: InventoryHandlerState,
{
    Router::new()
        .route("/", get(list_inventory::<S>).post(create_product::<S>))
        .route(
            "/:id",
            get(get_product::<S>)
                .put(update_product::<S>)
                .delete(delete_product::<S>),
        )
        .route("/:id/archive", post(archive_product::<S>))
}

/// List products, non-archived first, optionally filtered
pub async fn list_inventory<S>(
    State(state): State<S>,
    Query(filters): Query<InventoryFilters>,
) -> Json<ApiResponse<ListSnapshot>>
where
    S: InventoryHandlerState,
{
    let mut view = InventoryListView::new();
    view.set_query(filters.q.unwrap_or_default());
    view.reload(state.repository()).await;
    Json(ApiResponse::success(view.snapshot()))
}

/// Get a single product with its image
pub async fn get_product<S>(
    State(state): State<S>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<InventoryRecord>>, ServiceError>
where
    S: InventoryHandlerState,
{
    let id = ProductId::parse(id)?;
    let record = fetch(state.repository(), &id).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// Create a product; an image is required
pub async fn create_product<S>(
    State(state): State<S>,
    Json(payload): Json<ProductRequest>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let mut form = FormController::new();
    form.set_fields(payload.fields);
    let record = submit(&state, form, payload.image_base64).await?;
    info!(product_id = %record.id(), "Product created via API");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(record).with_message(crate::screen::SUBMIT_SUCCEEDED)),
    ))
}

/// Overwrite a product in place; the stored image is kept when none is sent
pub async fn update_product<S>(
    State(state): State<S>,
    Path(id): Path<String>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<ApiResponse<InventoryRecord>>, ServiceError>
where
    S: InventoryHandlerState,
{
    let id = ProductId::parse(id)?;
    let existing = fetch(state.repository(), &id).await?;

    let mut form = FormController::new();
    form.begin_edit(&existing);
    form.set_fields(payload.fields);
    let record = submit(&state, form, payload.image_base64).await?;
    Ok(Json(
        ApiResponse::success(record).with_message(crate::screen::SUBMIT_SUCCEEDED),
    ))
}

/// Set the archive flag; requires `confirm=true`
pub async fn archive_product<S>(
    State(state): State<S>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<ActionResult>, ServiceError>
where
    S: InventoryHandlerState,
{
    let id = ProductId::parse(id)?;
    let archived = params.archived.unwrap_or(true);
    if !params.confirm {
        return Ok(Json(ActionResult::declined(ConfirmPrompt::for_archive(
            archived,
        ))));
    }
    state.repository().set_archived(&id, archived).await?;
    Ok(Json(ActionResult::applied()))
}

/// Delete a product and its image; requires `confirm=true`
pub async fn delete_product<S>(
    State(state): State<S>,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<ActionResult>, ServiceError>
where
    S: InventoryHandlerState,
{
    let id = ProductId::parse(id)?;
    if !params.confirm {
        return Ok(Json(ActionResult::declined(ConfirmPrompt::Delete)));
    }
    state.repository().remove(&id).await?;
    Ok(Json(ActionResult::applied()))
}

async fn fetch(repository: &InventoryRepository, id: &ProductId) -> Result<InventoryRecord, ServiceError> {
    repository
        .find(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {id}")))
}

async fn submit<S>(
    state: &S,
    mut form: FormController,
    image_base64: Option<String>,
) -> Result<InventoryRecord, ServiceError>
where
    S: InventoryHandlerState,
{
    let raw = image_base64
        .filter(|encoded| !encoded.trim().is_empty())
        .map(|encoded| RawImage::from_base64(&encoded))
        .transpose()?;
    form.select_image(state.preprocessor(), raw).await?;
    let id = form.submit(state.repository()).await?;
    fetch(state.repository(), &id).await
}
