use crate::error::{AnalysisError, Result};
use crate::types::{CanonicalTable, RawRow, Record};
use crate::util::{parse_count_safe, parse_f64_safe, parse_i32_safe};
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

/// The only postulation status kept by default.
pub const ACCEPTED_STATUS: &str = "Asignados";

/// Normalized headers the loader cannot do without.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "ano_de_asignacion",
    "departamento",
    "municipio",
    "programa",
    "estado_de_postulacion",
    "valor_asignado",
    "hogares",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub status_rows: usize,
    pub parse_errors: usize,
    pub groups: usize,
}

/// Turn a raw header such as `Año de Asignación` into `ano_de_asignacion`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
        .nfkd()
        .filter(char::is_ascii)
        .collect()
}

type GroupKey = (i32, String, String, String, String);

/// Load the canonical table from a CSV file on disk.
pub fn load_canonical(path: &Path, accepted_status: &str) -> Result<(CanonicalTable, LoadReport)> {
    if !path.exists() {
        return Err(AnalysisError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    info!(path = %path.display(), "loading dataset");
    let file = std::fs::File::open(path)?;
    load_from_reader(file, accepted_status)
}

/// Load the canonical table from any CSV byte source.
///
/// Rows are kept only when their status equals `accepted_status`, then
/// summed per (year, region, sub-region, program, status). Groups come out
/// ordered by that key.
pub fn load_from_reader<R: Read>(
    reader: R,
    accepted_status: &str,
) -> Result<(CanonicalTable, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let normalized: StringRecord = rdr.headers()?.iter().map(normalize_header).collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !normalized.iter().any(|h| h == *c))
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::SchemaError(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }
    let duplicated: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| normalized.iter().filter(|h| h == c).count() > 1)
        .collect();
    if !duplicated.is_empty() {
        return Err(AnalysisError::SchemaError(format!(
            "columns repeated after header normalization: {}",
            duplicated.join(", ")
        )));
    }
    rdr.set_headers(normalized);

    let accepted = accepted_status.trim();
    let mut total_rows = 0usize;
    let mut status_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut groups: BTreeMap<GroupKey, (f64, u64)> = BTreeMap::new();

    for result in rdr.deserialize::<RawRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(line = total_rows, error = %e, "unreadable row");
                parse_errors += 1;
                continue;
            }
        };

        let status = match row.status.as_deref().map(str::trim) {
            Some(s) if s == accepted => s.to_string(),
            _ => continue,
        };
        status_rows += 1;

        let key_text = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let (Some(year), Some(region), Some(sub_region), Some(program)) = (
            parse_i32_safe(row.year.as_deref()),
            key_text(row.region),
            key_text(row.sub_region),
            key_text(row.program),
        ) else {
            parse_errors += 1;
            continue;
        };
        let value = match parse_f64_safe(row.total_value_assigned.as_deref()) {
            Some(v) if v >= 0.0 => v,
            _ => {
                parse_errors += 1;
                continue;
            }
        };
        let Some(households) = parse_count_safe(row.household_count.as_deref()) else {
            parse_errors += 1;
            continue;
        };

        let e = groups
            .entry((year, region, sub_region, program, status))
            .or_insert((0.0, 0));
        e.0 += value;
        e.1 = e.1.saturating_add(households);
    }

    let records: Vec<Record> = groups
        .into_iter()
        .map(|((year, region, sub_region, program, status), (value, households))| {
            Record::new(year, region, sub_region, program, status, value, households)
        })
        .collect();

    let report = LoadReport {
        total_rows,
        status_rows,
        parse_errors,
        groups: records.len(),
    };
    if parse_errors > 0 {
        warn!(parse_errors, "rows skipped due to parse/validation errors");
    }
    info!(
        total_rows,
        status_rows,
        groups = report.groups,
        "dataset loaded"
    );
    Ok((CanonicalTable::new(records), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
Departamento,Municipio,Programa,Año de Asignación,Estado de Postulación,Hogares,Valor Asignado
Antioquia,Medellín,MI CASA YA,2020,Asignados,3,\"30,000\"
Antioquia,Medellín,MI CASA YA,2020,Asignados,2,20000
Antioquia,Medellín,MI CASA YA,2020,Renuncia,9,90000
Bolívar,Cartagena,Bolsa Desplazados,2019,Asignados,0,0
Bolívar,Cartagena,Bolsa Desplazados,2019,Asignados,abc,100
";

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Año de Asignación"), "ano_de_asignacion");
        assert_eq!(normalize_header(" Estado de Postulación "), "estado_de_postulacion");
        assert_eq!(normalize_header("HOGARES"), "hogares");
        assert_eq!(normalize_header("\u{feff}Departamento"), "departamento");
    }

    #[test]
    fn test_filters_groups_and_derives() {
        let (table, report) = load_from_reader(SAMPLE.as_bytes(), ACCEPTED_STATUS).unwrap();
        assert_eq!(report.total_rows, 5);
        assert_eq!(report.status_rows, 4);
        assert_eq!(report.parse_errors, 1);
        assert_eq!(report.groups, 2);

        let rows = table.records();
        // BTreeMap ordering: 2019 first.
        assert_eq!(rows[0].year, 2019);
        assert_eq!(rows[0].household_count, 0);
        assert_eq!(rows[0].value_per_household, None);

        assert_eq!(rows[1].region, "Antioquia");
        assert_eq!(rows[1].household_count, 5);
        assert_eq!(rows[1].total_value_assigned, 50_000.0);
        assert_eq!(rows[1].value_per_household, Some(10_000.0));
        assert!(rows.iter().all(|r| r.status == ACCEPTED_STATUS));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let csv = "Departamento,Municipio,Programa\nA,B,C\n";
        let err = load_from_reader(csv.as_bytes(), ACCEPTED_STATUS).unwrap_err();
        match err {
            AnalysisError::SchemaError(msg) => {
                assert!(msg.contains("ano_de_asignacion"));
                assert!(msg.contains("hogares"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_colliding_headers_are_schema_error() {
        let csv = "\
Departamento,Municipio,Programa,Año de Asignación,Estado de Postulación,Hogares,Valor Asignado,HOGARES
A,A1,P,2020,Asignados,1,10,2
";
        let err = load_from_reader(csv.as_bytes(), ACCEPTED_STATUS).unwrap_err();
        match err {
            AnalysisError::SchemaError(msg) => {
                assert!(msg.contains("hogares"));
                assert!(!msg.contains("departamento"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_household_sums_saturate() {
        let csv = "\
Departamento,Municipio,Programa,Año de Asignación,Estado de Postulación,Hogares,Valor Asignado
A,A1,P,2020,Asignados,18446744073709551615,10
A,A1,P,2020,Asignados,18446744073709551615,10
";
        let (table, report) = load_from_reader(csv.as_bytes(), ACCEPTED_STATUS).unwrap();
        assert_eq!(report.parse_errors, 0);
        assert_eq!(table.records()[0].household_count, u64::MAX);
        assert_eq!(table.records()[0].total_value_assigned, 20.0);
    }

    #[test]
    fn test_missing_file_is_source_not_found() {
        let err = load_canonical(Path::new("/nonexistent/subsidios.csv"), ACCEPTED_STATUS)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SourceNotFound { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(SAMPLE.as_bytes()).unwrap();
        let (table, _) = load_canonical(tmp.path(), ACCEPTED_STATUS).unwrap();
        assert_eq!(table.len(), 2);
    }
}
