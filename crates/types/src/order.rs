//! Order event payload types
//!
//! Parsed from the webhook body only after the signature has been
//! verified against the raw bytes. Never persisted.

use serde::Deserialize;

/// A single purchased product entry within an order.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    /// Platform-assigned line item id. Absent in some test payloads.
    #[serde(default)]
    pub id: Option<i64>,
    pub sku: String,
    #[serde(default)]
    pub title: String,
}

/// An order as delivered by the commerce platform webhook.
///
/// Only the fields the fulfillment flow needs are deserialized; the
/// rest of the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEvent {
    /// Platform-assigned order id. Absent in some test payloads.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl OrderEvent {
    /// Stable identity of one order/line-item pair.
    ///
    /// This is the idempotency key for credential issuance: redelivered
    /// webhooks for the same order must map to the same reference so a
    /// second live credential is never created. Falls back to the SKU
    /// when the platform omits numeric ids.
    #[must_use]
    pub fn order_ref(&self, item: &LineItem) -> String {
        let order_part = self
            .id
            .map_or_else(|| "na".to_string(), |id| id.to_string());
        let item_part = item.id.map_or_else(|| item.sku.clone(), |id| id.to_string());
        format!("{order_part}-{item_part}")
    }
}
