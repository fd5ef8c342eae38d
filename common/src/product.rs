use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Description stored when a product is created without one.
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

/// Product identifier of the form `<PREFIX>-<N>`, e.g. `CF-12`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        ProductId(s.to_string())
    }
}

/// Product category. The set is closed; each category owns an ID prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductType {
    CatFood,
    DogFood,
    Accessories,
    HealthProducts,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized product type '{0}'")]
pub struct InvalidTypeError(pub String);

impl ProductType {
    pub fn all() -> &'static [ProductType] {
        &[
            ProductType::CatFood,
            ProductType::DogFood,
            ProductType::Accessories,
            ProductType::HealthProducts,
        ]
    }

    /// Name used on the wire and in the stored `type` field.
    pub fn label(self) -> &'static str {
        match self {
            ProductType::CatFood => "Cat Food",
            ProductType::DogFood => "Dog Food",
            ProductType::Accessories => "Accessories",
            ProductType::HealthProducts => "Health Products",
        }
    }

    /// Short code embedded in product IDs.
    pub fn prefix(self) -> &'static str {
        match self {
            ProductType::CatFood => "CF",
            ProductType::DogFood => "DF",
            ProductType::Accessories => "AC",
            ProductType::HealthProducts => "HP",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProductType {
    type Err = InvalidTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ProductType::all()
            .iter()
            .copied()
            .find(|t| t.label() == wanted)
            .ok_or_else(|| InvalidTypeError(s.to_string()))
    }
}

impl Serialize for ProductType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ProductType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A stored catalog record.
///
/// Fields the service does not model are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "type")]
    pub kind: ProductType,
    pub brand: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
    #[serde(default)]
    pub img: String,
    #[serde(default, deserialize_with = "deserialize_stock")]
    pub stock: bool,
    #[serde(default = "default_description")]
    pub desc: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

fn deserialize_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    coerce_price(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid price {raw}")))
}

fn deserialize_stock<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_stock(&raw))
}

/// One element of the stored catalog.
///
/// Elements that do not decode as a [`Product`] (no `type`, an unlisted
/// type, a missing brand...) are carried as raw JSON. They are listed and
/// written back unchanged, and their `id` still reserves its suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Product(Product),
    Raw(Value),
}

impl CatalogEntry {
    pub fn id(&self) -> Option<&str> {
        match self {
            CatalogEntry::Product(p) => Some(p.id.as_str()),
            CatalogEntry::Raw(v) => v.get("id").and_then(Value::as_str),
        }
    }

    pub fn as_product(&self) -> Option<&Product> {
        match self {
            CatalogEntry::Product(p) => Some(p),
            CatalogEntry::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, CatalogEntry::Raw(_))
    }

    /// Decode `value` as a product if it is one, else keep it raw.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<Product>(value.clone()) {
            Ok(product) => CatalogEntry::Product(product),
            Err(_) => CatalogEntry::Raw(value),
        }
    }
}

impl From<Product> for CatalogEntry {
    fn from(product: Product) -> Self {
        CatalogEntry::Product(product)
    }
}

/// Normalize an incoming `stock` value to a boolean.
///
/// Booleans pass through, `"true"`/`"false"` strings are matched without
/// regard to case or surrounding whitespace, numbers are true when non-zero.
/// Everything else is out of stock.
pub fn coerce_stock(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

/// Read a price from a JSON number or a numeric string.
///
/// Returns `None` for anything that is not a finite, non-negative number.
pub fn coerce_price(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Body of a create request. Every field is optional here so that missing
/// fields surface as validation failures rather than decode errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInput {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub stock: Option<Value>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of an update request: a shallow set of fields to overwrite.
///
/// A supplied `id` lands in `extra` and is discarded by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub stock: Option<Value>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
