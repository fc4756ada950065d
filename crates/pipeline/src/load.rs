//! Turning source files into [`RawRecord`]s.

use std::collections::HashSet;

use log::{debug, info};

use crate::config::{ColumnMapping, SourceConfig, SourceFormat};
use crate::error::LeadError;
use crate::model::RawRecord;

/// Load one source's records per its config (format, column mapping, dedupe).
pub fn load_source(
    source_name: &str,
    data: &str,
    source_config: &SourceConfig,
) -> Result<Vec<RawRecord>, LeadError> {
    let records = match source_config.resolved_format() {
        SourceFormat::Csv => load_csv_records(source_name, data, &source_config.columns)?,
        SourceFormat::Json => load_json_records(source_name, data)?,
    };

    let loaded = records.len();
    let records = if source_config.dedupe {
        dedupe_records(records)
    } else {
        records
    };
    info!(
        "source '{source_name}' ({}): {} record(s), {} duplicate(s) dropped",
        source_config.kind,
        records.len(),
        loaded - records.len()
    );
    Ok(records)
}

/// Load CSV rows, applying the column mapping.
pub fn load_csv_records(
    source_name: &str,
    csv_data: &str,
    columns: &ColumnMapping,
) -> Result<Vec<RawRecord>, LeadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LeadError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let find = |name: &str| headers.iter().position(|h| h == name);
    let required = |name: &str| -> Result<usize, LeadError> {
        find(name).ok_or_else(|| LeadError::MissingColumn {
            source: source_name.into(),
            column: name.into(),
        })
    };
    // Explicit mapping must exist; otherwise fall back to the field's own name.
    let optional = |mapped: &Option<String>, field: &str| -> Result<Option<usize>, LeadError> {
        match mapped {
            Some(name) => required(name).map(Some),
            None => Ok(find(field)),
        }
    };

    let name_idx = required(&columns.business_name)?;
    let address_idx = optional(&columns.address, "address")?;
    let postal_idx = optional(&columns.postal_code, "postal_code")?;
    let lat_idx = optional(&columns.latitude, "latitude")?;
    let lng_idx = optional(&columns.longitude, "longitude")?;
    let link_idx = optional(&columns.maps_link, "maps_link")?;
    let description_idx = optional(&columns.license_description, "license_description")?;

    let mut records = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| LeadError::RecordParse {
            source: source_name.into(),
            message: e.to_string(),
        })?;
        let row_number = i + 1;

        let text = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        let coordinate = |idx: Option<usize>| -> Result<Option<f64>, LeadError> {
            match text(idx) {
                None => Ok(None),
                Some(value) => value.parse::<f64>().map(Some).map_err(|_| {
                    LeadError::CoordinateParse {
                        source: source_name.into(),
                        row: row_number,
                        value,
                    }
                }),
            }
        };

        records.push(RawRecord {
            business_name: row.get(name_idx).unwrap_or("").trim().to_string(),
            address: text(address_idx),
            postal_code: text(postal_idx),
            latitude: coordinate(lat_idx)?,
            longitude: coordinate(lng_idx)?,
            maps_link: text(link_idx),
            license_description: text(description_idx),
            source: source_name.into(),
        });
    }

    Ok(records)
}

/// Load a JSON array of record objects. Each record is tagged with `source_name`.
pub fn load_json_records(source_name: &str, json: &str) -> Result<Vec<RawRecord>, LeadError> {
    let mut records: Vec<RawRecord> =
        serde_json::from_str(json).map_err(|e| LeadError::RecordParse {
            source: source_name.into(),
            message: e.to_string(),
        })?;
    for record in &mut records {
        record.source = source_name.into();
    }
    Ok(records)
}

/// Keep the first record for each exact (business name, address) pair.
pub fn dedupe_records(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let fresh = seen.insert((r.business_name.clone(), r.address.clone()));
            if !fresh {
                debug!("dropping duplicate '{}'", r.business_name);
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceKind;

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            business_name: "name".into(),
            address: Some("formatted_address".into()),
            latitude: Some("lat".into()),
            longitude: Some("lng".into()),
            ..ColumnMapping::default()
        }
    }

    #[test]
    fn load_csv_basic() {
        let csv = "\
name,formatted_address,lat,lng,postal_code
Joe's Electric Ltd,\"123 4 St NE, Calgary\",51.08,-113.98,T1Y 4P2
Bow Welding,,,,
";
        let records = load_csv_records("places", csv, &mapping()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].business_name, "Joe's Electric Ltd");
        assert_eq!(records[0].address.as_deref(), Some("123 4 St NE, Calgary"));
        assert_eq!(records[0].latitude, Some(51.08));
        assert_eq!(records[0].longitude, Some(-113.98));
        // Unmapped, but header has the field's own name
        assert_eq!(records[0].postal_code.as_deref(), Some("T1Y 4P2"));
        assert_eq!(records[0].source, "places");

        assert_eq!(records[1].address, None);
        assert_eq!(records[1].latitude, None);
        assert_eq!(records[1].postal_code, None);
    }

    #[test]
    fn blank_name_kept_for_rejection_downstream() {
        let csv = "name,formatted_address,lat,lng\n,1 Main St,,\n";
        let records = load_csv_records("places", csv, &mapping()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].has_business_name());
    }

    #[test]
    fn missing_required_column() {
        let csv = "title,formatted_address,lat,lng\nAcme,,,\n";
        let err = load_csv_records("places", csv, &mapping()).unwrap_err();
        assert!(matches!(err, LeadError::MissingColumn { ref column, .. } if column == "name"));
    }

    #[test]
    fn missing_explicitly_mapped_optional_column() {
        let csv = "name,lat,lng\nAcme,,\n";
        let err = load_csv_records("places", csv, &mapping()).unwrap_err();
        assert!(err.to_string().contains("'formatted_address'"));
    }

    #[test]
    fn bad_coordinate() {
        let csv = "name,formatted_address,lat,lng\nAcme,,north,\n";
        let err = load_csv_records("places", csv, &mapping()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "source 'places', row 1: cannot parse coordinate 'north'"
        );
    }

    #[test]
    fn load_json_tags_source() {
        let json = r#"[
            {"business_name": "Prairie Meats", "postal_code": "T2A 1B1",
             "license_description": "FOOD PROCESSING", "source": "ignored"},
            {"address": "9 Industrial Way"}
        ]"#;
        let records = load_json_records("registry", json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, "registry");
        assert_eq!(records[0].license_description.as_deref(), Some("FOOD PROCESSING"));
        // Missing name parses as blank
        assert!(!records[1].has_business_name());
    }

    #[test]
    fn load_json_null_name_parses_as_blank() {
        let json = r#"[{"business_name": "Acme"}, {"business_name": null, "postal_code": "T2A 1B1"}]"#;
        let records = load_json_records("registry", json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].business_name, "Acme");
        assert!(!records[1].has_business_name());
        assert_eq!(records[1].postal_code.as_deref(), Some("T2A 1B1"));
    }

    #[test]
    fn load_json_malformed() {
        let err = load_json_records("registry", "{not json").unwrap_err();
        assert!(matches!(err, LeadError::RecordParse { .. }));
    }

    #[test]
    fn dedupe_keeps_first() {
        let mut a = RawRecord::new("registry", "Acme");
        a.address = Some("1 Main".into());
        let mut b = a.clone();
        b.postal_code = Some("T1Y".into());
        let mut c = a.clone();
        c.address = Some("2 Main".into());

        let out = dedupe_records(vec![a.clone(), b, c.clone()]);
        assert_eq!(out, vec![a, c]);
    }

    #[test]
    fn load_source_applies_dedupe() {
        let config = SourceConfig {
            kind: SourceKind::Registry,
            file: "registry.csv".into(),
            format: None,
            dedupe: true,
            columns: ColumnMapping::default(),
        };
        let csv = "business_name,address\nAcme,1 Main\nAcme,1 Main\nAcme,2 Main\n";
        let records = load_source("registry", csv, &config).unwrap();
        assert_eq!(records.len(), 2);
    }
}
