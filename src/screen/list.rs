use serde::Serialize;
use tracing::{error, instrument};

use crate::models::{InventoryRecord, ProductId};
use crate::repositories::InventoryRepository;

/// Row-level intents raised from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
    Edit(ProductId),
    ToggleArchive(ProductId),
    Delete(ProductId),
}

impl ListAction {
    pub fn id(&self) -> &ProductId {
        match self {
            Self::Edit(id) | Self::ToggleArchive(id) | Self::Delete(id) => id,
        }
    }
}

/// Applies the search box and the archived-last ordering.
///
/// The match is case-insensitive on name or description. The sort is stable,
/// so records with the same archive flag keep their fetch order.
pub fn filter_and_sort<'a>(records: &'a [InventoryRecord], query: &str) -> Vec<&'a InventoryRecord> {
    let needle = query.to_lowercase();
    let mut visible: Vec<&InventoryRecord> = records
        .iter()
        .filter(|record| record.product.matches_lowercase(&needle))
        .collect();
    visible.sort_by_key(|record| record.is_archived());
    visible
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub record: InventoryRecord,
    pub image_label: Option<&'static str>,
    pub archive_label: &'static str,
}

impl RowView {
    fn from_record(record: &InventoryRecord) -> Self {
        Self {
            record: record.clone(),
            image_label: record.image.is_none().then_some("No Image"),
            archive_label: if record.is_archived() {
                "Unarchive"
            } else {
                "Archive"
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListSnapshot {
    pub loading: bool,
    pub query: String,
    pub rows: Vec<RowView>,
}

/// Loaded records plus the current search text.
#[derive(Debug)]
pub struct InventoryListView {
    records: Vec<InventoryRecord>,
    loading: bool,
    query: String,
}

impl Default for InventoryListView {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            loading: true,
            query: String::new(),
        }
    }
}

impl InventoryListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    pub fn apply(&mut self, records: Vec<InventoryRecord>) {
        self.records = records;
        self.loading = false;
    }

    /// Refetches everything. A failed read is logged and shows as an empty table.
    #[instrument(skip_all)]
    pub async fn reload(&mut self, repository: &InventoryRepository) {
        self.mark_loading();
        match repository.list_all().await {
            Ok(records) => self.apply(records),
            Err(e) => {
                error!(error = %e, "Error fetching products");
                self.apply(Vec::new());
            }
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn find(&self, id: &ProductId) -> Option<&InventoryRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn visible(&self) -> Vec<&InventoryRecord> {
        filter_and_sort(&self.records, &self.query)
    }

    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            loading: self.loading,
            query: self.query.clone(),
            rows: self
                .visible()
                .into_iter()
                .map(RowView::from_record)
                .collect(),
        }
    }
}
