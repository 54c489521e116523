//! Wire types for the storefront catalog API.
//!
//! Read types (`Remote*`) deserialize the API's responses; payload types
//! serialize only the fields being written (`skip_serializing_if` on
//! everything optional), so a partial update is exactly the JSON diff.
//! Monetary amounts stay `String` on the wire, as the API sends them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Read types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: i64,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    /// `"simple"` or `"variable"`.
    #[serde(rename = "type", default)]
    pub product_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub manage_stock: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub images: Vec<RemoteImage>,
    #[serde(default)]
    pub categories: Vec<RemoteCategory>,
    #[serde(default)]
    pub attributes: Vec<RemoteAttribute>,
}

impl RemoteProduct {
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.product_type == "variable"
    }

    /// Remote attributes as `(name, options)` pairs for canonical mapping.
    #[must_use]
    pub fn attribute_pairs(&self) -> Vec<(String, Vec<String>)> {
        self.attributes
            .iter()
            .map(|a| (a.name.clone(), a.options.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteImage {
    #[serde(default)]
    pub id: Option<i64>,
    pub src: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteAttribute {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub variation: bool,
    #[serde(default)]
    pub visible: bool,
}

/// Minimal projection returned by SKU lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteVariation {
    pub id: i64,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub attributes: Vec<VariationAttribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationAttribute {
    pub name: String,
    pub option: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOrder {
    pub id: i64,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub date_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOrderNote {
    pub id: i64,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Webhook {
    pub id: i64,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub delivery_url: String,
    #[serde(default)]
    pub status: String,
}

// ---------------------------------------------------------------------------
// Write payloads
// ---------------------------------------------------------------------------

/// Partial product create/update body. Unset fields are absent from the JSON,
/// so an empty payload means "nothing to write".
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manage_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImagePayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributePayload>>,
}

impl ProductPayload {
    /// `true` when nothing would be serialized — the caller can skip the call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.product_type.is_none()
            && self.sku.is_none()
            && self.status.is_none()
            && self.description.is_none()
            && self.short_description.is_none()
            && self.regular_price.is_none()
            && self.sale_price.is_none()
            && self.stock_quantity.is_none()
            && self.manage_stock.is_none()
            && self.stock_status.is_none()
            && self.categories.is_none()
            && self.images.is_none()
            && self.attributes.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRef {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagePayload {
    pub src: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributePayload {
    pub name: String,
    pub options: Vec<String>,
    pub variation: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VariationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<VariationAttribute>>,
}

/// One call creates, updates, and deletes variations together.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VariationBatch {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub create: Vec<VariationPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub update: Vec<VariationPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<i64>,
}

impl VariationBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariationBatchResponse {
    #[serde(default)]
    pub create: Vec<RemoteVariation>,
    #[serde(default)]
    pub update: Vec<RemoteVariation>,
    #[serde(default)]
    pub delete: Vec<RemoteVariation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_serializes_to_empty_object() {
        let payload = ProductPayload::default();
        assert!(payload.is_empty());
        assert_eq!(serde_json::to_string(&payload).unwrap(), "{}");
    }

    #[test]
    fn payload_serializes_only_set_fields() {
        let payload = ProductPayload {
            stock_quantity: Some(7),
            stock_status: Some("instock".to_owned()),
            ..ProductPayload::default()
        };
        assert!(!payload.is_empty());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"stock_quantity": 7, "stock_status": "instock"})
        );
    }

    #[test]
    fn product_type_serializes_as_type() {
        let payload = ProductPayload {
            product_type: Some("variable".to_owned()),
            ..ProductPayload::default()
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"type":"variable"}"#);
    }

    #[test]
    fn remote_product_tolerates_missing_optionals() {
        let product: RemoteProduct =
            serde_json::from_str(r#"{"id": 5, "name": "Home Shirt"}"#).unwrap();
        assert_eq!(product.id, 5);
        assert_eq!(product.sku, "");
        assert!(product.stock_quantity.is_none());
        assert!(!product.is_variable());
    }

    #[test]
    fn variation_batch_skips_empty_sections() {
        let batch = VariationBatch {
            delete: vec![11, 12],
            ..VariationBatch::default()
        };
        let json = serde_json::to_string(&batch).unwrap();
        assert_eq!(json, r#"{"delete":[11,12]}"#);
    }
}
