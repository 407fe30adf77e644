use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use wifi_sweep_abstract::{FieldKind, ResultSchema};

/// Column sums over the valid rows of one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Sum per tracked column, parallel to the tracked field list.
    pub sums: Vec<f64>,
    pub valid_rows: usize,
    pub skipped_rows: usize,
}

/// Read a headerless CSV output file and sum the tracked columns.
///
/// A row is valid when it has at least `schema.width()` columns and every
/// tracked column parses under its declared kind. Invalid rows are logged and
/// dropped; a file holding nothing but invalid rows yields zero valid rows
/// rather than an error, so the caller can tell "no data" from "no file".
pub fn extract_columns(
    path: &Path,
    schema: &ResultSchema,
    tracked: &[(usize, FieldKind)],
) -> Result<Extraction> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut sums = vec![0.0; tracked.len()];
    let mut valid_rows = 0usize;
    let mut skipped_rows = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read {}", path.display()))?;
        if record.len() < schema.width() {
            warn!(
                "{}:{}: row has {} columns, schema '{}' needs {}; skipping",
                path.display(),
                line + 1,
                record.len(),
                schema.name,
                schema.width()
            );
            skipped_rows += 1;
            continue;
        }

        let mut row = Vec::with_capacity(tracked.len());
        let mut bad_column = None;
        for &(index, kind) in tracked {
            match record.get(index).and_then(|raw| kind.parse(raw)) {
                Some(value) => row.push(value),
                None => {
                    bad_column = Some(index);
                    break;
                }
            }
        }
        if let Some(index) = bad_column {
            warn!(
                "{}:{}: column {} does not parse; skipping row",
                path.display(),
                line + 1,
                index
            );
            skipped_rows += 1;
            continue;
        }

        for (sum, value) in sums.iter_mut().zip(row) {
            *sum += value;
        }
        valid_rows += 1;
    }

    debug!(
        "{}: {} valid rows, {} skipped",
        path.display(),
        valid_rows,
        skipped_rows
    );
    Ok(Extraction {
        sums,
        valid_rows,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use wifi_sweep_abstract::FieldSpec;

    use super::*;

    fn five_column_schema() -> ResultSchema {
        ResultSchema {
            name: "tiny".into(),
            fields: (0..5).map(|i| FieldSpec::float(&format!("c{i}"))).collect(),
        }
    }

    #[test]
    fn sums_tracked_column_over_all_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dat");
        fs::write(&path, "1,2,3,4,5\n1,2,3,4,15\n1,2,3,4,25\n").unwrap();

        let schema = five_column_schema();
        let extraction =
            extract_columns(&path, &schema, &[(4, FieldKind::Float)]).unwrap();
        assert_eq!(extraction.valid_rows, 3);
        assert_eq!(extraction.skipped_rows, 0);
        assert_eq!(extraction.sums, vec![45.0]);
    }

    #[test]
    fn short_rows_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dat");
        fs::write(&path, "1,2\n1,2,3,4,5\n9,9,9\n").unwrap();

        let schema = five_column_schema();
        let extraction =
            extract_columns(&path, &schema, &[(0, FieldKind::Float)]).unwrap();
        assert_eq!(extraction.valid_rows, 1);
        assert_eq!(extraction.skipped_rows, 2);
        assert_eq!(extraction.sums, vec![1.0]);
    }

    #[test]
    fn non_numeric_tracked_column_skips_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dat");
        fs::write(&path, "1,2,3,4,oops\n1,2,3,4,5\n").unwrap();

        let schema = five_column_schema();
        let extraction =
            extract_columns(&path, &schema, &[(4, FieldKind::Float)]).unwrap();
        assert_eq!(extraction.valid_rows, 1);
        assert_eq!(extraction.skipped_rows, 1);
        assert_eq!(extraction.sums, vec![5.0]);
    }

    #[test]
    fn extra_columns_beyond_schema_width_are_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dat");
        fs::write(&path, "1,2,3,4,5,6,7\n").unwrap();

        let schema = five_column_schema();
        let extraction =
            extract_columns(&path, &schema, &[(4, FieldKind::Float)]).unwrap();
        assert_eq!(extraction.valid_rows, 1);
        assert_eq!(extraction.sums, vec![5.0]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.dat");
        let schema = five_column_schema();
        assert!(extract_columns(&path, &schema, &[(0, FieldKind::Float)]).is_err());
    }

    #[test]
    fn whitespace_around_fields_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dat");
        fs::write(&path, " 1 , 2 ,3, 4 , 5 \n").unwrap();

        let schema = five_column_schema();
        let extraction =
            extract_columns(&path, &schema, &[(1, FieldKind::Float), (4, FieldKind::Float)])
                .unwrap();
        assert_eq!(extraction.valid_rows, 1);
        assert_eq!(extraction.sums, vec![2.0, 5.0]);
    }
}
