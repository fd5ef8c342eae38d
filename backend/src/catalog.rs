//! Product catalog operations.
//!
//! Every mutation loads the whole collection, changes it in memory and
//! writes the whole collection back.

use animalandia_common::allocator::{next_product_id, AllocationError};
use animalandia_common::product::{
    coerce_price, coerce_stock, CatalogEntry, InvalidTypeError, Product, ProductId, ProductInput,
    ProductPatch, ProductType, DEFAULT_DESCRIPTION,
};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::store::CollectionStore;
use crate::write_gate::{WriteGate, WriteMode};

pub struct CatalogService {
    store: Box<dyn CollectionStore<CatalogEntry>>,
    gate: WriteGate,
}

impl From<InvalidTypeError> for ServiceError {
    fn from(err: InvalidTypeError) -> Self {
        let expected: Vec<&str> = ProductType::all().iter().map(|t| t.label()).collect();
        ServiceError::Validation(format!(
            "Invalid product type '{}'. Expected one of: {}",
            err.0,
            expected.join(", ")
        ))
    }
}

impl From<AllocationError> for ServiceError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::InvalidType(e) => e.into(),
            AllocationError::Exhausted(prefix) => ServiceError::IdsExhausted(prefix),
        }
    }
}

impl CatalogService {
    pub fn new(store: Box<dyn CollectionStore<CatalogEntry>>, mode: WriteMode) -> Self {
        Self {
            store,
            gate: WriteGate::new(mode),
        }
    }

    /// The stored collection, in stored order. Unreadable storage reads as
    /// empty. Records that are not valid products are returned as stored.
    pub fn list(&self) -> Vec<CatalogEntry> {
        let entries = self.store.load();
        let raw = entries.iter().filter(|e| e.is_raw()).count();
        if raw > 0 {
            warn!(raw, total = entries.len(), "Catalog holds records that are not valid products");
        }
        entries
    }

    pub fn create(&self, input: ProductInput) -> ServiceResult<Product> {
        let draft = Draft::from_input(input)?;

        let _guard = self.gate.enter();
        let mut entries = self.store.try_load()?;
        let id = next_product_id(&entries, draft.kind)?;
        let product = draft.into_product(id);
        entries.push(CatalogEntry::Product(product.clone()));
        self.store.save(&entries)?;

        info!(id = %product.id, kind = %product.kind, "Created product");
        Ok(product)
    }

    /// Shallow-merge `patch` onto the record with this ID. The ID itself
    /// never changes.
    ///
    /// An unknown ID is reported before the patch is looked at. A record that
    /// was not a valid product takes the patch field-wise and becomes a
    /// product again once it has everything a product needs.
    pub fn update(&self, id: &str, patch: ProductPatch) -> ServiceResult<CatalogEntry> {
        let _guard = self.gate.enter();
        let mut entries = self.store.try_load()?;
        let entry = entries
            .iter_mut()
            .find(|e| e.id() == Some(id))
            .ok_or_else(|| product_not_found(id))?;
        let changes = Changes::from_patch(patch)?;

        let merged = match entry {
            CatalogEntry::Product(product) => {
                changes.apply(product);
                None
            }
            CatalogEntry::Raw(value) => {
                let mut fields = match value.take() {
                    Value::Object(fields) => fields,
                    _ => Map::new(),
                };
                fields.extend(changes.into_fields());
                fields.insert("id".to_string(), Value::String(id.to_string()));
                Some(CatalogEntry::from_value(Value::Object(fields)))
            }
        };
        if let Some(merged) = merged {
            *entry = merged;
        }
        let updated = entry.clone();
        self.store.save(&entries)?;

        info!(id, raw = updated.is_raw(), "Updated product");
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        let _guard = self.gate.enter();
        let mut entries = self.store.try_load()?;
        let before = entries.len();
        entries.retain(|e| e.id() != Some(id));
        if entries.len() == before {
            return Err(product_not_found(id));
        }
        self.store.save(&entries)?;

        info!(id, "Deleted product");
        Ok(())
    }

    pub fn write_mode(&self) -> WriteMode {
        self.gate.mode()
    }
}

fn product_not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Product '{id}' not found"))
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn invalid_price() -> ServiceError {
    ServiceError::Validation("Price must be a non-negative number".to_string())
}

fn without_id(mut extra: Map<String, Value>) -> Map<String, Value> {
    extra.remove("id");
    extra
}

/// A validated create request, waiting for its ID.
struct Draft {
    kind: ProductType,
    brand: String,
    name: String,
    price: f64,
    img: String,
    stock: bool,
    desc: String,
    extra: Map<String, Value>,
}

impl Draft {
    fn from_input(input: ProductInput) -> ServiceResult<Self> {
        let kind_raw = non_empty(input.kind);
        let brand = non_empty(input.brand);
        let name = non_empty(input.name);
        let price_raw = input.price.filter(|v| !v.is_null());

        let missing: Vec<&str> = [
            ("type", kind_raw.is_none()),
            ("brand", brand.is_none()),
            ("name", name.is_none()),
            ("price", price_raw.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        let (Some(kind_raw), Some(brand), Some(name), Some(price_raw)) =
            (kind_raw, brand, name, price_raw)
        else {
            return Err(ServiceError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let kind: ProductType = kind_raw.parse()?;
        let price = coerce_price(&price_raw).ok_or_else(invalid_price)?;

        Ok(Draft {
            kind,
            brand,
            name,
            price,
            img: input.img.unwrap_or_default(),
            stock: input.stock.as_ref().is_some_and(coerce_stock),
            desc: non_empty(input.desc).unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            extra: without_id(input.extra),
        })
    }

    fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            kind: self.kind,
            brand: self.brand,
            name: self.name,
            price: self.price,
            img: self.img,
            stock: self.stock,
            desc: self.desc,
            extra: self.extra,
        }
    }
}

/// A validated update request.
#[derive(Default)]
struct Changes {
    kind: Option<ProductType>,
    brand: Option<String>,
    name: Option<String>,
    price: Option<f64>,
    img: Option<String>,
    stock: Option<bool>,
    desc: Option<String>,
    extra: Map<String, Value>,
}

impl Changes {
    fn from_patch(patch: ProductPatch) -> ServiceResult<Self> {
        let kind = patch.kind.map(|k| k.parse::<ProductType>()).transpose()?;
        let brand = match patch.brand {
            Some(b) => Some(non_empty(Some(b)).ok_or_else(|| {
                ServiceError::Validation("brand must not be empty".to_string())
            })?),
            None => None,
        };
        let name = match patch.name {
            Some(n) => Some(non_empty(Some(n)).ok_or_else(|| {
                ServiceError::Validation("name must not be empty".to_string())
            })?),
            None => None,
        };
        let price = patch
            .price
            .map(|p| coerce_price(&p).ok_or_else(invalid_price))
            .transpose()?;

        Ok(Changes {
            kind,
            brand,
            name,
            price,
            img: patch.img,
            stock: patch.stock.as_ref().map(coerce_stock),
            desc: patch.desc,
            extra: without_id(patch.extra),
        })
    }

    fn apply(self, product: &mut Product) {
        if let Some(kind) = self.kind {
            product.kind = kind;
        }
        if let Some(brand) = self.brand {
            product.brand = brand;
        }
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(img) = self.img {
            product.img = img;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(desc) = self.desc {
            product.desc = desc;
        }
        product.extra.extend(self.extra);
    }

    /// The changes as stored JSON fields, for records that are not products.
    fn into_fields(self) -> Map<String, Value> {
        let mut fields = self.extra;
        if let Some(kind) = self.kind {
            fields.insert("type".to_string(), Value::from(kind.label()));
        }
        if let Some(brand) = self.brand {
            fields.insert("brand".to_string(), Value::from(brand));
        }
        if let Some(name) = self.name {
            fields.insert("name".to_string(), Value::from(name));
        }
        if let Some(price) = self.price {
            fields.insert("price".to_string(), Value::from(price));
        }
        if let Some(img) = self.img {
            fields.insert("img".to_string(), Value::from(img));
        }
        if let Some(stock) = self.stock {
            fields.insert("stock".to_string(), Value::from(stock));
        }
        if let Some(desc) = self.desc {
            fields.insert("desc".to_string(), Value::from(desc));
        }
        fields
    }
}
