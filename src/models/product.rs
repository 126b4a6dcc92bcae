use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::lenient;
use crate::errors::ServiceError;
use crate::store::is_valid_key;

/// Last id handed out by [`ProductId::generate`], in epoch milliseconds.
static LAST_GENERATED: AtomicI64 = AtomicI64::new(0);

/// Shared key of a product and its image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Validates an externally supplied id.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ServiceError> {
        let raw = raw.into();
        if is_valid_key(&raw) {
            Ok(Self(raw))
        } else {
            Err(ServiceError::InvalidInput(format!(
                "invalid product id {raw:?}"
            )))
        }
    }

    /// Allocates a fresh id from the current time in milliseconds.
    ///
    /// Ids are strictly increasing within the process, so two creations in the
    /// same millisecond still get distinct keys.
    pub fn generate() -> Self {
        let now = Utc::now().timestamp_millis();
        let mut last = LAST_GENERATED.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match LAST_GENERATED.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return Self(next.to_string()),
                Err(actual) => last = actual,
            }
        }
    }

    pub(crate) fn from_store_key(key: &str) -> Self {
        Self(key.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Product document stored at `products/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    #[serde(rename = "uqid", alias = "uniqueId")]
    pub unique_id: ProductId,
    pub product_name: String,
    #[serde(deserialize_with = "lenient::decimal")]
    pub mrp: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub purchase_price: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub retail_sell_price: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub wholesale_sell_price: Decimal,
    #[serde(deserialize_with = "lenient::integer")]
    pub stock_total: i64,
    #[serde(deserialize_with = "lenient::integer")]
    pub rank: i64,
    pub category: String,
    /// Soft-delete marker; archived products stay listed but sort last
    pub archive: bool,
    pub brand: String,
    pub description: String,
    #[serde(deserialize_with = "lenient::integer")]
    pub total_sale: i64,
    #[serde(deserialize_with = "lenient::decimal")]
    pub discount: Decimal,
}

impl Product {
    /// Case-insensitive substring match on name or description.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.product_name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}
