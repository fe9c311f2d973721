//! CSV ingestion - uploaded file → raw lead records
//!
//! Exports from the bank-marketing dataset use `;`, spreadsheet exports use
//! `,` and some tools emit tabs, so the delimiter is sniffed from the header
//! line. Row-level problems stay row-level: they become failed rows in the
//! batch instead of rejecting the upload.

use leadscore_core::{normalize_field_name, RawLeadRecord, RawValue, ScoringError};
use thiserror::Error;

const CANDIDATE_DELIMITERS: [u8; 3] = [b';', b',', b'\t'];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV file is empty")]
    Empty,

    #[error("CSV header could not be read: {0}")]
    Header(#[from] csv::Error),

    #[error("CSV header has duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// One entry per data row, in file order
pub type ParsedRows = Vec<Result<RawLeadRecord, ScoringError>>;

/// Delimiter with the most occurrences in the header line; ties go to the
/// earlier candidate
pub fn detect_delimiter(data: &[u8]) -> u8 {
    let header = data.split(|&b| b == b'\n').next().unwrap_or_default();
    let mut best = (b',', 0);
    for candidate in CANDIDATE_DELIMITERS {
        let count = header.iter().filter(|&&b| b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// `"Emp.Var.Rate "` → `emp.var.rate`
pub fn normalize_header(name: &str) -> String {
    normalize_field_name(name.trim_start_matches('\u{feff}'))
}

pub fn parse_csv(data: &[u8]) -> Result<ParsedRows, IngestError> {
    if data.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(IngestError::Empty);
    }

    let delimiter = detect_delimiter(data);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::Empty);
    }
    for (i, header) in headers.iter().enumerate() {
        if headers[..i].contains(header) {
            return Err(IngestError::DuplicateColumn(header.clone()));
        }
    }

    tracing::debug!(
        "Parsing CSV upload: delimiter={:?}, {} columns",
        delimiter as char,
        headers.len()
    );

    let rows: ParsedRows = reader
        .records()
        .map(|result| -> Result<RawLeadRecord, ScoringError> {
            let record = result.map_err(|e| ScoringError::malformed("row", e.to_string()))?;
            Ok(headers
                .iter()
                .zip(record.iter())
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, cell)| (name.clone(), RawValue::from_cell(cell)))
                .collect())
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter(b"age;job;marital\n1;a;b"), b';');
        assert_eq!(detect_delimiter(b"age,job,marital\n1,a,b"), b',');
        assert_eq!(detect_delimiter(b"age\tjob\tmarital\n1\ta\tb"), b'\t');
        // commas inside a semicolon header do not win
        assert_eq!(detect_delimiter(b"\"a,b\";c;d"), b';');
        assert_eq!(detect_delimiter(b"age"), b',');
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("\u{feff}Age"), "age");
        assert_eq!(normalize_header(" Day Of Week "), "day_of_week");
        assert_eq!(normalize_header("emp.var.rate"), "emp.var.rate");
    }

    #[test]
    fn test_parse_uci_style_file() {
        let data = b"\"age\";\"job\";\"pdays\";\"emp.var.rate\"\n56;\"housemaid\";999;1.1\n41;\"blue-collar\";;-1.8\n";
        let rows = parse_csv(data).unwrap();
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.get("age"), Some(&RawValue::Number(56.0)));
        assert_eq!(first.get("job"), Some(&RawValue::Text("housemaid".into())));
        assert_eq!(first.get("emp.var.rate"), Some(&RawValue::Number(1.1)));

        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.get("pdays"), Some(&RawValue::Null));
    }

    #[test]
    fn test_ragged_row_is_row_failure() {
        let data = b"age,job\n30,admin.\n31\n32,services\n";
        let rows = parse_csv(data).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(rows[1].as_ref().unwrap_err().is_malformed());
        assert!(rows[2].is_ok());
    }

    #[test]
    fn test_empty_and_duplicate_headers() {
        assert!(matches!(parse_csv(b""), Err(IngestError::Empty)));
        assert!(matches!(parse_csv(b"  \n"), Err(IngestError::Empty)));
        assert!(matches!(
            parse_csv(b"Age,age\n1,2\n"),
            Err(IngestError::DuplicateColumn(ref c)) if c == "age"
        ));
    }
}
