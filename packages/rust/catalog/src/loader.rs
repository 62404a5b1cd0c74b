//! CSV export → [`Catalog`].

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use copydesk_shared::{CopydeskError, ProductRecord, Result};

use crate::catalog::{Catalog, SourceFile};
use crate::extract;
use crate::schema::{CanonicalField, SchemaMap};

/// What happened while loading, for logging and `catalog info`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Data rows read from the file.
    pub rows_read: usize,
    /// Rows dropped for an empty code or title, or for text that is not UTF-8.
    pub rows_skipped: usize,
    /// Codes that appeared more than once (last row kept).
    pub duplicate_codes: Vec<String>,
    /// Required fields with no mapped column.
    pub missing_fields: Vec<String>,
    /// Headers with no known alias.
    pub ignored_headers: Vec<String>,
    /// Headers that appeared more than once (last column kept).
    pub duplicate_headers: Vec<String>,
}

/// Load a catalog from an export file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if !path.is_file() {
        return Err(CopydeskError::file_not_found(path));
    }

    let meta = std::fs::metadata(path).map_err(|e| CopydeskError::io(path, e))?;
    let source = SourceFile {
        path: path.to_path_buf(),
        size_bytes: meta.len(),
        modified: meta.modified().ok().map(DateTime::<Utc>::from),
    };

    let file = std::fs::File::open(path).map_err(|e| CopydeskError::io(path, e))?;
    load_from_reader(file, Some(source))
}

/// Load a catalog from any CSV byte stream.
pub fn load_from_reader<R: Read>(reader: R, source: Option<SourceFile>) -> Result<Catalog> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| CopydeskError::parse(format!("failed to read CSV headers: {e}")))?
        .clone();
    let columns: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let schema = SchemaMap::from_headers(headers.iter());

    let mut report = LoadReport {
        missing_fields: schema
            .missing_required()
            .iter()
            .map(|f| f.as_str().to_string())
            .collect(),
        ignored_headers: schema.ignored_headers().to_vec(),
        duplicate_headers: schema.duplicate_headers().to_vec(),
        ..Default::default()
    };

    for field in &report.missing_fields {
        warn!(field = %field, "required catalog column missing");
    }
    if !report.ignored_headers.is_empty() {
        debug!(headers = ?report.ignored_headers, "ignoring unmapped columns");
    }
    if !report.duplicate_headers.is_empty() {
        warn!(headers = ?report.duplicate_headers, "duplicate column headers, keeping last occurrence");
    }

    let mut catalog = Catalog::new();
    for (idx, row) in rdr.byte_records().enumerate() {
        let row = row.map_err(|e| {
            CopydeskError::parse(format!("CSV row {} unreadable: {e}", idx + 2))
        })?;
        report.rows_read += 1;

        let line = row.position().map_or(idx as u64 + 2, |pos| pos.line());
        let row = match csv::StringRecord::from_byte_record(row) {
            Ok(row) => row,
            Err(e) => {
                warn!(line, error = %e.utf8_error(), "skipping row with invalid UTF-8");
                report.rows_skipped += 1;
                continue;
            }
        };

        let Some(record) = record_from_row(&schema, &row) else {
            report.rows_skipped += 1;
            continue;
        };

        let code = record.code.clone();
        if catalog.insert(extract::extract(record)).is_some() {
            warn!(code = %code, "duplicate product code, later row replaces earlier");
            report.duplicate_codes.push(code);
        }
    }

    info!(
        products = catalog.len(),
        rows = report.rows_read,
        skipped = report.rows_skipped,
        duplicates = report.duplicate_codes.len(),
        "catalog loaded"
    );

    Ok(catalog.with_metadata(columns, source, report))
}

/// Map one CSV row to an unextracted record. `None` for rows without a code
/// or title.
fn record_from_row(schema: &SchemaMap, row: &csv::StringRecord) -> Option<ProductRecord> {
    let code = schema.value(CanonicalField::Code, row)?;
    let title = schema.value(CanonicalField::Title, row)?;

    Some(ProductRecord {
        code: code.to_string(),
        title: title.to_string(),
        description: schema.text(CanonicalField::Description, row),
        spec_text: schema.text(CanonicalField::SpecText, row),
        manufacturer_website: schema
            .value(CanonicalField::ManufacturerWebsite, row)
            .map(String::from),
        power_output: schema
            .value(CanonicalField::PowerOutput, row)
            .map(String::from),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::parse_spec_text;
    use copydesk_shared::{PowerType, UNKNOWN_BRAND};
    use std::io::Write;

    fn load_str(csv: &str) -> Catalog {
        load_from_reader(csv.as_bytes(), None).expect("load")
    }

    #[test]
    fn loads_wordpress_export_fixture() {
        let catalog = load_catalog(Path::new("../../../fixtures/csv/wordpress_export.csv"))
            .expect("load fixture");

        assert!(catalog.len() >= 5);
        let breaker = catalog.lookup("03/185").expect("03/185 present");
        assert_eq!(breaker.category, "Breaking & Drilling");
        assert!(breaker.title.contains(&breaker.brand));
        assert!(!parse_spec_text(&breaker.spec_text).is_empty());

        let info = catalog.info();
        assert!(info.source.is_some());
        assert!(info.columns.len() <= 10);
    }

    #[test]
    fn every_valid_code_indexed_once() {
        let catalog = load_str(
            "SKU,Name,Description\n\
             01/001,Altrad Tower,First\n\
             01/002,Belle Mixer,Second\n\
             01/001,Altrad Tower Mk2,Replacement\n\
             ,No Code,Skipped\n\
             01/003,,Skipped too\n",
        );

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("01/001").unwrap().title, "Altrad Tower Mk2");
        assert_eq!(catalog.report().rows_read, 5);
        assert_eq!(catalog.report().rows_skipped, 2);
        assert_eq!(catalog.report().duplicate_codes, ["01/001"]);
        assert_eq!(
            catalog.iter().filter(|r| r.code == "01/001").count(),
            1
        );
    }

    #[test]
    fn reports_missing_and_ignored_columns() {
        let catalog = load_str(
            "ID,sku,Post title,Regular price\n7,12/010,Stihl HS45 Hedge Trimmer,30\n",
        );
        let report = catalog.report();
        assert_eq!(report.missing_fields, ["description", "technical_specification"]);
        assert_eq!(report.ignored_headers, ["ID", "Regular price"]);

        let record = catalog.get("12/010").unwrap();
        assert_eq!(record.description, "");
        assert_eq!(record.brand, "Stihl");
        assert_eq!(record.model, "HS45");
    }

    #[test]
    fn tolerates_short_rows_and_duplicate_headers() {
        let catalog = load_str(
            "SKU,Name,Description,Description\n\
             13/001,Honda EU22i Generator,old,Quiet petrol inverter generator.\n\
             13/002,Yanmar Diesel Generator\n",
        );
        let honda = catalog.get("13/001").unwrap();
        assert_eq!(honda.description, "Quiet petrol inverter generator.");
        assert_eq!(honda.power_type, PowerType::Petrol);

        let yanmar = catalog.get("13/002").unwrap();
        assert_eq!(yanmar.description, "");
        assert_eq!(yanmar.power_type, PowerType::Diesel);
        assert_eq!(catalog.report().duplicate_headers, ["description"]);
    }

    #[test]
    fn optional_columns_are_carried() {
        let catalog = load_str(
            "SKU,Name,Manufacturer Website,Power Output\n\
             13/005,Kubota Diesel Generator,https://kubota.example,6kVA\n",
        );
        let record = catalog.get("13/005").unwrap();
        assert_eq!(record.manufacturer_website.as_deref(), Some("https://kubota.example"));
        assert_eq!(record.power_output.as_deref(), Some("6kVA"));
        assert_eq!(record.power_type, PowerType::Diesel);
    }

    #[test]
    fn export_brand_and_power_columns_are_replaced() {
        let catalog = load_str(
            "SKU,Name,Description,Brand,Power Type\n\
             12/004,Garden Shredder,Shreds branches.,Camon,Diesel\n",
        );
        let record = catalog.get("12/004").unwrap();
        assert_eq!(record.brand, UNKNOWN_BRAND);
        assert_eq!(record.model, "");
        assert_eq!(record.power_type, PowerType::Unspecified);
        assert_eq!(catalog.report().ignored_headers, ["Brand", "Power Type"]);
    }

    #[test]
    fn invalid_utf8_row_is_skipped() {
        let mut bytes = b"SKU,Name\n01/001,Altrad Tower\n01/002,Bad ".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b" Row\n01/003,Belle Mixer\n");

        let catalog = load_from_reader(bytes.as_slice(), None).expect("load");
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("01/001").is_some());
        assert!(catalog.get("01/002").is_none());
        assert!(catalog.get("01/003").is_some());
        assert_eq!(catalog.report().rows_read, 3);
        assert_eq!(catalog.report().rows_skipped, 1);
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = load_catalog(Path::new("/no/such/export.csv")).unwrap_err();
        assert!(matches!(err, CopydeskError::FileNotFound { .. }));
    }

    #[test]
    fn reads_bom_prefixed_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").expect("tempfile");
        file.write_all("\u{feff}SKU,Name\n05/010,Bomag BPR25 Plate\n".as_bytes())
            .expect("write");

        let catalog = load_catalog(file.path()).expect("load");
        let record = catalog.lookup("05/010").expect("present");
        assert_eq!(record.brand, "Bomag");
        assert_eq!(record.category, "Compaction Equipment");
        assert_eq!(catalog.info().columns[0], "SKU");
    }
}
