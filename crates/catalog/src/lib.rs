#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Product catalog for vendo
//!
//! The catalog is a static mapping from product SKU to the ordered list
//! of backing files that SKU unlocks. It is loaded once at startup from
//! a TOML file and passed explicitly to whoever needs it; nothing reads
//! it ambiently and nothing mutates it at runtime.
//!
//! ```toml
//! [products]
//! DUBPACK-1 = ["TRACK_ONE.wav", "TRACK_TWO.wav"]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use vendo_errors::{CatalogError, Error};
use vendo_types::LineItem;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: HashMap<String, Vec<String>>,
}

/// Immutable SKU -> file-list mapping.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: HashMap<String, Vec<String>>,
}

/// The first line item of an order that resolved to a configured
/// product, together with the items that were passed over to reach it.
#[derive(Debug)]
pub struct ResolvedOrder<'a> {
    pub item: &'a LineItem,
    pub files: &'a [String],
    /// SKUs of every line item other than the fulfilled one, whether
    /// unmapped or simply not first. The orchestrator logs these so
    /// multi-item orders are a visible limitation rather than a silent
    /// one.
    pub skipped: Vec<&'a str>,
}

impl Catalog {
    /// Load the catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, fails to parse, or
    /// configures a product with an empty file list. An issued
    /// credential must never stand behind zero files, so that is
    /// rejected here at the source.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|_| CatalogError::NotFound {
            path: path.display().to_string(),
        })?;
        let parsed: CatalogFile = toml::from_str(&raw).map_err(|e| CatalogError::ParseError {
            message: e.to_string(),
        })?;
        Self::from_map(parsed.products)
    }

    /// Build a catalog from an in-memory mapping. Validates the same
    /// invariants as [`Catalog::load`].
    ///
    /// # Errors
    ///
    /// Returns an error if any product has an empty file list.
    pub fn from_map(products: HashMap<String, Vec<String>>) -> Result<Self, Error> {
        for (sku, files) in &products {
            if files.is_empty() {
                return Err(CatalogError::EmptyFileList { sku: sku.clone() }.into());
            }
        }
        Ok(Self { products })
    }

    /// Exact SKU lookup.
    #[must_use]
    pub fn resolve(&self, sku: &str) -> Option<&[String]> {
        self.products.get(sku).map(Vec::as_slice)
    }

    /// Resolve an order to the first line item with a configured
    /// mapping. Returns `None` when no item resolves. All other line
    /// items land in `skipped`; none of them may disappear unreported.
    #[must_use]
    pub fn resolve_order<'a>(&'a self, line_items: &'a [LineItem]) -> Option<ResolvedOrder<'a>> {
        let position = line_items
            .iter()
            .position(|item| self.products.contains_key(&item.sku))?;
        let item = &line_items[position];
        let skipped = line_items
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != position)
            .map(|(_, other)| other.sku.as_str())
            .collect();
        Some(ResolvedOrder {
            item,
            files: self.resolve(&item.sku)?,
            skipped,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
