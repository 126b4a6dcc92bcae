//! Product form state and submit workflow.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, instrument};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::ServiceError;
use crate::models::lenient::{parse_decimal, parse_integer};
use crate::models::{EncodedImage, InventoryRecord, Product, ProductId, SaveMode};
use crate::repositories::InventoryRepository;
use crate::services::{ImagePreprocessor, RawImage};

/// Form inputs, named as they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ProductField {
    ProductName,
    Mrp,
    PurchasePrice,
    RetailSellPrice,
    WholesaleSellPrice,
    StockTotal,
    Rank,
    Category,
    Brand,
    Description,
    Discount,
    TotalSale,
}

impl ProductField {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProductName => "Product Name",
            Self::Mrp => "MRP",
            Self::PurchasePrice => "Purchase Price",
            Self::RetailSellPrice => "Retail Sell Price",
            Self::WholesaleSellPrice => "Wholesale Sell Price",
            Self::StockTotal => "Stock Total",
            Self::Rank => "Rank",
            Self::Category => "Category",
            Self::Brand => "Brand",
            Self::Description => "Description",
            Self::Discount => "Discount",
            Self::TotalSale => "Total Sale",
        }
    }
}

/// Raw text of every input, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct FormFields {
    #[validate(custom = "required_text")]
    pub product_name: String,
    #[validate(custom = "required_amount")]
    pub mrp: String,
    #[validate(custom = "required_amount")]
    pub purchase_price: String,
    #[validate(custom = "required_amount")]
    pub retail_sell_price: String,
    #[validate(custom = "required_amount")]
    pub wholesale_sell_price: String,
    #[validate(custom = "required_whole_number")]
    pub stock_total: String,
    #[validate(custom = "required_whole_number")]
    pub rank: String,
    #[validate(custom = "required_text")]
    pub category: String,
    #[validate(custom = "required_text")]
    pub brand: String,
    #[validate(custom = "required_text")]
    pub description: String,
    #[validate(custom = "required_amount")]
    pub discount: String,
    #[validate(custom = "required_whole_number")]
    pub total_sale: String,
    /// Carried through edits; not a form input
    pub archive: bool,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            mrp: String::new(),
            purchase_price: String::new(),
            retail_sell_price: String::new(),
            wholesale_sell_price: String::new(),
            stock_total: String::new(),
            rank: String::new(),
            category: String::new(),
            brand: String::new(),
            description: String::new(),
            discount: "0".to_string(),
            total_sale: "0".to_string(),
            archive: false,
        }
    }
}

impl FormFields {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_name: product.product_name.clone(),
            mrp: product.mrp.to_string(),
            purchase_price: product.purchase_price.to_string(),
            retail_sell_price: product.retail_sell_price.to_string(),
            wholesale_sell_price: product.wholesale_sell_price.to_string(),
            stock_total: product.stock_total.to_string(),
            rank: product.rank.to_string(),
            category: product.category.clone(),
            brand: product.brand.clone(),
            description: product.description.clone(),
            discount: product.discount.to_string(),
            total_sale: product.total_sale.to_string(),
            archive: product.archive,
        }
    }

    pub fn get(&self, field: ProductField) -> &str {
        match field {
            ProductField::ProductName => &self.product_name,
            ProductField::Mrp => &self.mrp,
            ProductField::PurchasePrice => &self.purchase_price,
            ProductField::RetailSellPrice => &self.retail_sell_price,
            ProductField::WholesaleSellPrice => &self.wholesale_sell_price,
            ProductField::StockTotal => &self.stock_total,
            ProductField::Rank => &self.rank,
            ProductField::Category => &self.category,
            ProductField::Brand => &self.brand,
            ProductField::Description => &self.description,
            ProductField::Discount => &self.discount,
            ProductField::TotalSale => &self.total_sale,
        }
    }

    pub fn set(&mut self, field: ProductField, value: String) {
        let slot = match field {
            ProductField::ProductName => &mut self.product_name,
            ProductField::Mrp => &mut self.mrp,
            ProductField::PurchasePrice => &mut self.purchase_price,
            ProductField::RetailSellPrice => &mut self.retail_sell_price,
            ProductField::WholesaleSellPrice => &mut self.wholesale_sell_price,
            ProductField::StockTotal => &mut self.stock_total,
            ProductField::Rank => &mut self.rank,
            ProductField::Category => &mut self.category,
            ProductField::Brand => &mut self.brand,
            ProductField::Description => &mut self.description,
            ProductField::Discount => &mut self.discount,
            ProductField::TotalSale => &mut self.total_sale,
        };
        *slot = value;
    }

    /// Validates and converts to a product. The id is left for the repository.
    pub fn to_product(&self) -> Result<Product, Vec<FieldError>> {
        self.validate().map_err(|errors| field_errors(&errors))?;

        let amount = |field: ProductField| {
            parse_decimal(self.get(field)).ok_or_else(|| vec![FieldError::invalid(field)])
        };
        let whole = |field: ProductField| {
            parse_integer(self.get(field)).ok_or_else(|| vec![FieldError::invalid(field)])
        };

        Ok(Product {
            unique_id: ProductId::default(),
            product_name: self.product_name.clone(),
            mrp: amount(ProductField::Mrp)?,
            purchase_price: amount(ProductField::PurchasePrice)?,
            retail_sell_price: amount(ProductField::RetailSellPrice)?,
            wholesale_sell_price: amount(ProductField::WholesaleSellPrice)?,
            stock_total: whole(ProductField::StockTotal)?,
            rank: whole(ProductField::Rank)?,
            category: self.category.clone(),
            archive: self.archive,
            brand: self.brand.clone(),
            description: self.description.clone(),
            total_sale: whole(ProductField::TotalSale)?,
            discount: amount(ProductField::Discount)?,
        })
    }
}

/// A single failed check, keyed by the stored field name (or `image`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn invalid(field: ProductField) -> Self {
        Self {
            field: field.to_string(),
            message: format!("{} is invalid", field.label()),
        }
    }

    fn image_required() -> Self {
        Self {
            field: "image".to_string(),
            message: "Product image is required".to_string(),
        }
    }
}

fn required_text(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("is required".into());
        return Err(err);
    }
    Ok(())
}

fn required_amount(value: &str) -> Result<(), ValidationError> {
    required_text(value)?;
    if parse_decimal(value).is_none() {
        let mut err = ValidationError::new("number");
        err.message = Some("must be a number".into());
        return Err(err);
    }
    Ok(())
}

fn required_whole_number(value: &str) -> Result<(), ValidationError> {
    required_text(value)?;
    if parse_integer(value).is_none() {
        let mut err = ValidationError::new("whole_number");
        err.message = Some("must be a whole number".into());
        return Err(err);
    }
    Ok(())
}

/// Flattens validator output into form errors ordered like the inputs.
fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let by_field = errors.field_errors();
    ProductField::iter()
        .filter_map(|field| {
            let key = snake_case(field.as_ref());
            let first = by_field.get(key.as_str())?.first()?;
            let reason = first
                .message
                .as_deref()
                .unwrap_or("is invalid")
                .to_string();
            Some(FieldError {
                field: field.to_string(),
                message: format!("{} {reason}", field.label()),
            })
        })
        .collect()
}

fn snake_case(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for c in camel.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "id", rename_all = "snake_case")]
pub enum FormMode {
    #[default]
    Create,
    Edit(ProductId),
}

/// What the form renders from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub mode: FormMode,
    pub title: &'static str,
    pub submit_label: &'static str,
    pub fields: FormFields,
    pub image_preview: Option<String>,
    pub image_required: bool,
    pub errors: Vec<FieldError>,
}

/// Transient edit-session state for one product.
#[derive(Debug, Default)]
pub struct FormController {
    fields: FormFields,
    mode: FormMode,
    image: Option<EncodedImage>,
    errors: Vec<FieldError>,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn selected_image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    /// Last write wins; the field's previous error is cleared.
    pub fn set_field(&mut self, field: ProductField, value: impl Into<String>) {
        self.fields.set(field, value.into());
        let name = field.to_string();
        self.errors.retain(|e| e.field != name);
    }

    /// Replaces all inputs at once (used by the HTTP surface).
    pub fn set_fields(&mut self, fields: FormFields) {
        let archive = self.fields.archive;
        self.fields = FormFields { archive, ..fields };
        self.errors.clear();
    }

    /// Loads a record for editing. The stored image is kept unless a new one is chosen.
    pub fn begin_edit(&mut self, record: &InventoryRecord) {
        debug!(product_id = %record.id(), "editing product");
        self.fields = FormFields::from_product(&record.product);
        self.mode = FormMode::Edit(record.id().clone());
        self.image = None;
        self.errors.clear();
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Preprocesses and keeps the chosen photo. On failure nothing changes.
    pub async fn select_image(
        &mut self,
        preprocessor: &ImagePreprocessor,
        raw: Option<RawImage>,
    ) -> Result<(), ServiceError> {
        if let Some(encoded) = preprocessor.preprocess(raw).await? {
            self.image = Some(encoded);
            self.errors.retain(|e| e.field != "image");
        }
        Ok(())
    }

    /// Runs every required-field check without touching state.
    pub fn validate(&self) -> Result<Product, Vec<FieldError>> {
        let mut errors = match self.fields.to_product() {
            Ok(product) => {
                if self.requires_image() {
                    return Err(vec![FieldError::image_required()]);
                }
                return Ok(product);
            }
            Err(errors) => errors,
        };
        if self.requires_image() {
            errors.push(FieldError::image_required());
        }
        Err(errors)
    }

    /// Validates, saves, and on success resets to an empty create form.
    ///
    /// Validation failures never reach the store. Any failure leaves the
    /// entered values in place so the user can retry.
    #[instrument(skip_all, fields(mode = ?self.mode))]
    pub async fn submit(
        &mut self,
        repository: &InventoryRepository,
    ) -> Result<ProductId, ServiceError> {
        let product = match self.validate() {
            Ok(product) => product,
            Err(errors) => {
                let summary = summarize(&errors);
                self.errors = errors;
                return Err(ServiceError::ValidationError(summary));
            }
        };

        let mode = match &self.mode {
            FormMode::Create => SaveMode::Create,
            FormMode::Edit(id) => SaveMode::Update(id.clone()),
        };
        let id = repository.save(product, self.image.as_ref(), mode).await?;
        self.reset();
        Ok(id)
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let editing = matches!(self.mode, FormMode::Edit(_));
        FormSnapshot {
            mode: self.mode.clone(),
            title: if editing { "Edit Product" } else { "Add New Product" },
            submit_label: if editing { "Update Product" } else { "Submit Product" },
            fields: self.fields.clone(),
            image_preview: self.image.as_ref().map(|image| image.data_url.clone()),
            image_required: !editing,
            errors: self.errors.clone(),
        }
    }

    fn requires_image(&self) -> bool {
        self.mode == FormMode::Create && self.image.is_none()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
