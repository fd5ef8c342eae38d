//! Type-scoped product identifier allocation.
//!
//! Each product type owns a prefix and its own counter. The next suffix is
//! one past the largest numeric suffix currently stored under that prefix,
//! so allocation depends only on the snapshot it is given.

use thiserror::Error;

use crate::product::{CatalogEntry, InvalidTypeError, ProductId, ProductType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error(transparent)]
    InvalidType(#[from] InvalidTypeError),
    #[error("no identifiers left under prefix '{0}'")]
    Exhausted(&'static str),
}

/// Next free ID for `kind` given the current catalog contents.
///
/// Every stored entry with an `id` counts, decodable or not. IDs under the
/// prefix whose suffix is not an integer count as 0.
pub fn next_product_id(
    catalog: &[CatalogEntry],
    kind: ProductType,
) -> Result<ProductId, AllocationError> {
    let prefix = kind.prefix();
    let highest = catalog
        .iter()
        .filter_map(|entry| suffix_under(entry.id()?, prefix))
        .max()
        .unwrap_or(0);
    let next = highest
        .checked_add(1)
        .ok_or(AllocationError::Exhausted(prefix))?;
    Ok(ProductId(format!("{prefix}-{next}")))
}

/// Resolve a requested type label and allocate the next ID for it.
pub fn allocate_product_id(
    catalog: &[CatalogEntry],
    requested_type: &str,
) -> Result<ProductId, AllocationError> {
    let kind: ProductType = requested_type.parse()?;
    next_product_id(catalog, kind)
}

fn suffix_under(id: &str, prefix: &str) -> Option<u64> {
    let rest = id.strip_prefix(prefix)?.strip_prefix('-')?;
    Some(rest.parse().unwrap_or(0))
}
