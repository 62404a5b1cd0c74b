//! The in-memory catalog and its reloadable handle.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use copydesk_shared::{CopydeskError, ProductRecord, Result};

use crate::loader::{self, LoadReport};
use crate::source::CatalogSource;

/// Columns listed in [`CatalogInfo`].
const INFO_COLUMN_LIMIT: usize = 10;

/// Canonical form used for index keys: trimmed, uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// File the catalog was read from.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// Summary printed by `catalog info`.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceFile>,
    pub total_products: usize,
    /// First few source headers, as exported.
    pub columns: Vec<String>,
    pub categories: BTreeMap<String, usize>,
    pub report: LoadReport,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Ordered product records with an O(1) code index.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<ProductRecord>,
    index: HashMap<String, usize>,
    columns: Vec<String>,
    source: Option<SourceFile>,
    report: LoadReport,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-extracted records (later duplicates win).
    pub fn from_records(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    pub(crate) fn with_metadata(
        mut self,
        columns: Vec<String>,
        source: Option<SourceFile>,
        report: LoadReport,
    ) -> Self {
        self.columns = columns;
        self.source = source;
        self.report = report;
        self
    }

    /// Insert a record. A record with the same code is replaced in place and
    /// returned.
    pub fn insert(&mut self, record: ProductRecord) -> Option<ProductRecord> {
        let key = normalize_code(&record.code);
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&ProductRecord> {
        self.index
            .get(&normalize_code(code))
            .map(|&pos| &self.records[pos])
    }

    /// Like [`get`](Self::get) but a missing code is a `NotFound` error.
    pub fn lookup(&self, code: &str) -> Result<&ProductRecord> {
        self.get(code)
            .ok_or_else(|| CopydeskError::not_found(code.trim()))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(&normalize_code(code))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.records.iter()
    }

    /// Records in `category` (ASCII case-insensitive), in catalog order.
    pub fn by_category<'a, 'c>(
        &'a self,
        category: &'c str,
    ) -> impl Iterator<Item = &'a ProductRecord> + use<'a, 'c> {
        self.records
            .iter()
            .filter(move |r| r.category.eq_ignore_ascii_case(category))
    }

    /// Up to `limit` other records in the same category, in catalog order.
    pub fn style_samples(&self, record: &ProductRecord, limit: usize) -> Vec<&ProductRecord> {
        let own = normalize_code(&record.code);
        self.records
            .iter()
            .filter(|r| r.category == record.category && normalize_code(&r.code) != own)
            .take(limit)
            .collect()
    }

    /// Product count per category.
    pub fn categories(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    pub fn info(&self) -> CatalogInfo {
        CatalogInfo {
            source: self.source.clone(),
            total_products: self.len(),
            columns: self.columns.iter().take(INFO_COLUMN_LIMIT).cloned().collect(),
            categories: self.categories(),
            report: self.report.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogHandle
// ---------------------------------------------------------------------------

/// Shared, reloadable catalog.
///
/// Readers take an `Arc<Catalog>` snapshot; [`reload`](Self::reload) builds a
/// complete new catalog before swapping it in, so a failed reload leaves the
/// current one untouched.
#[derive(Debug)]
pub struct CatalogHandle {
    source: CatalogSource,
    current: RwLock<Arc<Catalog>>,
}

impl CatalogHandle {
    /// Load the initial catalog. Fails if the source cannot be located.
    #[instrument(skip_all, fields(source = %source))]
    pub fn open(source: CatalogSource) -> Result<Self> {
        let path = source.resolve()?;
        let catalog = loader::load_catalog(&path)?;
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(catalog)),
        })
    }

    /// Current catalog.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-resolve the source (a newer export may have appeared) and swap.
    #[instrument(skip_all, fields(source = %self.source))]
    pub fn reload(&self) -> Result<Arc<Catalog>> {
        let path = self.source.resolve()?;
        let catalog = Arc::new(loader::load_catalog(&path)?);
        self.swap(catalog.clone());
        info!(products = catalog.len(), path = %path.display(), "catalog reloaded");
        Ok(catalog)
    }

    /// Swap in an already-built catalog.
    pub fn swap(&self, catalog: Arc<Catalog>) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = catalog;
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    fn product(code: &str, title: &str) -> ProductRecord {
        extract(ProductRecord {
            code: code.into(),
            title: title.into(),
            ..Default::default()
        })
    }

    #[test]
    fn duplicate_codes_last_wins_in_place() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(product("03/185", "Old Breaker")).is_none());
        catalog.insert(product("13/001", "Generator"));
        let replaced = catalog.insert(product("03/185", "Hilti TE1000 Breaker"));

        assert_eq!(replaced.map(|r| r.title), Some("Old Breaker".into()));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("03/185").unwrap().title, "Hilti TE1000 Breaker");
        assert_eq!(catalog.iter().next().unwrap().code, "03/185");
    }

    #[test]
    fn lookup_normalizes_and_reports_not_found() {
        let catalog = Catalog::from_records([product("ab/12", "Thing")]);
        assert!(catalog.lookup(" AB/12 ").is_ok());
        assert!(catalog.contains("ab/12"));

        let err = catalog.lookup("zz/99").unwrap_err();
        assert!(matches!(err, CopydeskError::NotFound { ref code } if code == "zz/99"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn style_samples_exclude_self_and_respect_limit() {
        let catalog = Catalog::from_records([
            product("13/001", "Honda EU10i Generator"),
            product("13/002", "Honda EU22i Generator"),
            product("13/003", "Honda EU30is Generator"),
            product("13/004", "Yanmar 6kVA Generator"),
            product("03/001", "Hilti TE500 Breaker"),
        ]);
        let target = catalog.get("13/002").unwrap();

        let samples = catalog.style_samples(target, 2);
        let codes: Vec<_> = samples.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["13/001", "13/003"]);

        assert_eq!(catalog.style_samples(target, 15).len(), 3);
        assert_eq!(catalog.categories().get("Generators"), Some(&4));
    }

    #[test]
    fn by_category_ignores_case() {
        let catalog = Catalog::from_records([
            product("13/001", "Honda EU10i Generator"),
            product("03/001", "Hilti TE500 Breaker"),
            product("13/004", "Yanmar 6kVA Generator"),
        ]);
        let codes: Vec<_> = catalog.by_category("generators").map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["13/001", "13/004"]);
        assert_eq!(catalog.by_category("Pumps").count(), 0);
    }

    #[test]
    fn handle_swaps_whole_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "SKU,Name\n01/001,Altrad Tower\n").expect("write");

        let handle = CatalogHandle::open(CatalogSource::File(path.clone())).expect("open");
        let before = handle.snapshot();
        assert_eq!(before.len(), 1);

        std::fs::write(&path, "SKU,Name\n01/001,Altrad Tower\n01/002,Belle Mixer\n")
            .expect("rewrite");
        let after = handle.reload().expect("reload");

        assert_eq!(after.len(), 2);
        assert_eq!(handle.snapshot().len(), 2);
        // Earlier snapshots are untouched.
        assert_eq!(before.len(), 1);
    }

    #[test]
    fn failed_reload_keeps_current_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "SKU,Name\n01/001,Altrad Tower\n").expect("write");

        let handle = CatalogHandle::open(CatalogSource::File(path.clone())).expect("open");
        std::fs::remove_file(&path).expect("remove");

        assert!(handle.reload().is_err());
        assert_eq!(handle.snapshot().len(), 1);
    }
}
