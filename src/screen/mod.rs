//! Inventory admin screen state.
//!
//! [`InventoryScreen`] owns the form, the table and the latest notice for one
//! user session. Front ends drive it through its methods and render from
//! [`InventoryScreen::snapshot`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::errors::ServiceError;
use crate::models::{InventoryRecord, ProductId};
use crate::repositories::InventoryRepository;
use crate::services::{ImagePreprocessor, RawImage};

pub mod confirm;
pub mod form;
pub mod list;
pub mod session;

pub use confirm::{AutoConfirm, ConfirmPrompt, Confirmer};
pub use form::{FieldError, FormController, FormFields, FormMode, FormSnapshot, ProductField};
pub use list::{filter_and_sort, InventoryListView, ListAction, ListSnapshot, RowView};
pub use session::CurrentUser;

pub const SUBMIT_SUCCEEDED: &str = "Product and image submitted successfully!";
pub const SUBMIT_FAILED: &str = "Failed to submit product and image.";
pub const ARCHIVE_FAILED: &str = "Failed to update archive status.";
pub const DELETE_FAILED: &str = "Failed to delete product.";
pub const IMAGE_FAILED: &str = "Failed to process the selected image.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-facing alert raised by the last action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: &str) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.to_string(),
        }
    }
}

/// Result of a dispatched row action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionOutcome {
    Applied,
    /// The user said no; nothing was sent to the store
    Declined,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenSnapshot {
    pub greeting: Option<String>,
    pub form: FormSnapshot,
    pub list: ListSnapshot,
    pub notice: Option<Notice>,
}

pub struct InventoryScreen {
    repository: InventoryRepository,
    preprocessor: ImagePreprocessor,
    confirmer: Arc<dyn Confirmer>,
    form: FormController,
    list: InventoryListView,
    notice: Option<Notice>,
    user: Option<CurrentUser>,
}

impl InventoryScreen {
    pub fn new(
        repository: InventoryRepository,
        preprocessor: ImagePreprocessor,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            repository,
            preprocessor,
            confirmer,
            form: FormController::new(),
            list: InventoryListView::new(),
            notice: None,
            user: None,
        }
    }

    pub fn with_user(mut self, user: CurrentUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn list(&self) -> &InventoryListView {
        &self.list
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Fetches the table. Read failures end in an empty list, never an error.
    pub async fn load(&mut self) {
        self.list.reload(&self.repository).await;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.list.set_query(query);
    }

    pub fn set_field(&mut self, field: ProductField, value: impl Into<String>) {
        self.form.set_field(field, value);
    }

    pub fn set_fields(&mut self, fields: FormFields) {
        self.form.set_fields(fields);
    }

    /// Stores the resized preview. A decode failure keeps the previous
    /// preview and raises the image notice.
    pub async fn select_image(&mut self, raw: Option<RawImage>) -> Result<(), ServiceError> {
        match self.form.select_image(&self.preprocessor, raw).await {
            Ok(()) => {
                if self.notice.as_ref().is_some_and(|n| n.message == IMAGE_FAILED) {
                    self.notice = None;
                }
                Ok(())
            }
            Err(e) => {
                self.notice = Some(Notice::error(IMAGE_FAILED));
                Err(e)
            }
        }
    }

    /// Saves the form and reloads the table on success.
    ///
    /// Store failures raise the failure notice; validation failures only set
    /// field errors on the form.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Result<ProductId, ServiceError> {
        match self.form.submit(&self.repository).await {
            Ok(id) => {
                self.notice = Some(Notice::success(SUBMIT_SUCCEEDED));
                self.load().await;
                Ok(id)
            }
            Err(e) => {
                if !e.is_user_error() {
                    self.notice = Some(Notice::error(SUBMIT_FAILED));
                }
                Err(e)
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        self.form.cancel();
    }

    /// Runs a row action. Archive and delete ask the confirmer first.
    #[instrument(skip(self))]
    pub async fn dispatch(&mut self, action: ListAction) -> Result<ActionOutcome, ServiceError> {
        match action {
            ListAction::Edit(id) => {
                let record = self.record(&id).await?;
                self.form.begin_edit(&record);
                Ok(ActionOutcome::Applied)
            }
            ListAction::ToggleArchive(id) => {
                let record = self.record(&id).await?;
                let archived = !record.is_archived();
                if !self.confirm(ConfirmPrompt::for_archive(archived)).await {
                    return Ok(ActionOutcome::Declined);
                }
                if let Err(e) = self.repository.set_archived(&id, archived).await {
                    self.notice = Some(Notice::error(ARCHIVE_FAILED));
                    return Err(e);
                }
                self.load().await;
                Ok(ActionOutcome::Applied)
            }
            ListAction::Delete(id) => {
                if !self.confirm(ConfirmPrompt::Delete).await {
                    return Ok(ActionOutcome::Declined);
                }
                if let Err(e) = self.repository.remove(&id).await {
                    self.notice = Some(Notice::error(DELETE_FAILED));
                    return Err(e);
                }
                self.load().await;
                Ok(ActionOutcome::Applied)
            }
        }
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        ScreenSnapshot {
            greeting: self.user.as_ref().map(CurrentUser::greeting),
            form: self.form.snapshot(),
            list: self.list.snapshot(),
            notice: self.notice.clone(),
        }
    }

    async fn confirm(&self, prompt: ConfirmPrompt) -> bool {
        let confirmed = self.confirmer.confirm(prompt).await;
        if !confirmed {
            info!(?prompt, "action declined");
        }
        confirmed
    }

    /// Loaded row if present, otherwise a direct read.
    async fn record(&self, id: &ProductId) -> Result<InventoryRecord, ServiceError> {
        if let Some(record) = self.list.find(id) {
            return Ok(record.clone());
        }
        debug!(product_id = %id, "product not in loaded list, reading from store");
        self.repository
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id}")))
    }
}
