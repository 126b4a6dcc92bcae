use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// Typed partial update of a product. Only `Some` fields reach the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mrp: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retail_sell_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wholesale_sell_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sale: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
}

impl ProductPatch {
    pub fn archive(archived: bool) -> Self {
        Self {
            archive: Some(archived),
            ..Default::default()
        }
    }

    /// Store field map for a partial update.
    pub fn into_fields(self) -> Result<Map<String, Value>, ServiceError> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => Err(ServiceError::SerializationError(format!(
                "patch serialized to {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn archive_patch_carries_a_single_field() {
        let fields = ProductPatch::archive(true).into_fields().unwrap();
        assert_eq!(Value::Object(fields), json!({ "archive": true }));
    }

    #[test]
    fn unset_fields_are_omitted() {
        let patch = ProductPatch {
            product_name: Some("Gizmo".into()),
            discount: Some(dec!(5)),
            ..Default::default()
        };
        let fields = patch.into_fields().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["productName"], "Gizmo");
        assert!(fields.contains_key("discount"));
    }
}
