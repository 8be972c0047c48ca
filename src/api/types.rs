//! Billbee API wire types
//!
//! The order payload is deserialized defensively: marketplaces differ in
//! which fields they populate, and quantities occasionally arrive as
//! strings. A malformed quantity counts as zero instead of failing the
//! whole batch.

use serde::{Deserialize, Deserializer};

/// Response envelope of the orders endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersResponse {
    #[serde(rename = "Data", default)]
    pub data: Vec<Order>,
}

/// One order as returned by the commerce API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Order {
    #[serde(rename = "OrderItems", default)]
    pub order_items: Vec<OrderItem>,

    #[serde(rename = "Seller", default)]
    pub seller: Option<Seller>,
}

impl Order {
    /// Marketplace label used for grouping; some channels omit the shop.
    pub fn platform(&self) -> &str {
        self.seller
            .as_ref()
            .and_then(|seller| seller.shop_name.as_deref())
            .unwrap_or("Unknown")
    }
}

/// A single order line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "Product", default)]
    pub product: Option<ProductRef>,

    #[serde(
        rename = "Quantity",
        default,
        deserialize_with = "deserialize_lenient_quantity"
    )]
    pub quantity: i64,
}

/// Product reference inside an order line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRef {
    #[serde(rename = "SKU", default)]
    pub sku: Option<String>,
}

/// Marketplace seller information on the order header
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seller {
    #[serde(rename = "ShopName", default)]
    pub shop_name: Option<String>,
}

/// Deserialize a quantity that may be a number, a numeric string, or
/// absent. Non-numeric values count as zero.
fn deserialize_lenient_quantity<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        String(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(value)) => value,
        Some(Raw::Float(value)) => value as i64,
        Some(Raw::String(value)) => value.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        None => 0,
    })
}
