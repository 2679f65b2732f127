use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{CampaignDataset, Dataset, ListeningDataset, TabularRecord};
use super::row::{Cell, Row};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the listening table (`spotify.csv` and friends).
pub fn load_listening(path: &Path) -> Result<ListeningDataset, LoadError> {
    load_table(path)
}

/// Load the marketing campaign table.
pub fn load_campaigns(path: &Path) -> Result<CampaignDataset, LoadError> {
    load_table(path)
}

/// Load any typed table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names (recommended)
/// * `.json`    – `[{ "artist_name": "...", "streams": 120, ... }, ...]`
/// * `.parquet` – flat Arrow schema with the same column names
///
/// The header is checked for every required column before any row is
/// decoded; then each row is validated into `R`.
pub fn load_table<R: TabularRecord>(path: &Path) -> Result<Dataset<R>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => read_csv(path, R::REQUIRED_COLUMNS)?,
        "json" => read_json(path, R::REQUIRED_COLUMNS)?,
        "parquet" | "pq" => read_parquet(path, R::REQUIRED_COLUMNS)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    let records = rows
        .iter()
        .map(R::from_row)
        .collect::<Result<Vec<R>, LoadError>>()?;

    log::info!("Loaded {} rows from {}", records.len(), path.display());
    Ok(Dataset::from_records(records))
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Fail with every required column that `present` lacks.
fn check_columns<'a>(
    present: impl IntoIterator<Item = &'a str>,
    required: &[&str],
) -> Result<(), LoadError> {
    let present: BTreeSet<&str> = present.into_iter().collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !present.contains(**col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns(missing))
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Cells stay text; typed validation happens in `from_row`.
fn read_csv(path: &Path, required: &[&str]) -> Result<Vec<Row>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(open(path)?);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    check_columns(headers.iter().map(String::as_str), required)?;

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let mut row = Row::new(i + 1);
        for (header, value) in headers.iter().zip(record.iter()) {
            row.insert(header.as_str(), Cell::from_text(value));
        }
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "artist_name": "Nova", "genre": "Pop", "streams": 1200, ... },
///   ...
/// ]
/// ```
///
/// A column counts as present when at least one record carries the key.
fn read_json(path: &Path, required: &[&str]) -> Result<Vec<Row>, LoadError> {
    let root: JsonValue = serde_json::from_reader(std::io::BufReader::new(open(path)?))?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::malformed("JSON", "expected a top-level array"))?;

    let mut rows = Vec::with_capacity(records.len());
    let mut columns: BTreeSet<String> = BTreeSet::new();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| {
            LoadError::malformed("JSON", format!("record {} is not an object", i + 1))
        })?;

        let mut row = Row::new(i + 1);
        for (key, val) in obj {
            columns.insert(key.trim().to_string());
            row.insert(key.trim(), json_to_cell(val));
        }
        rows.push(row);
    }

    if !rows.is_empty() {
        check_columns(columns.iter().map(String::as_str), required)?;
    }
    Ok(rows)
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::String(s.trim().to_string()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Integer columns of any width, float columns, booleans, strings and dates
/// are understood; anything else is cast to text by Arrow.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path, required: &[&str]) -> Result<Vec<Row>, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let schema = builder.schema().clone();
    check_columns(schema.fields().iter().map(|f| f.name().trim()), required)?;

    let reader = builder.build()?;
    let mut rows: Vec<Row> = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let offset = rows.len();
        rows.extend((0..batch.num_rows()).map(|i| Row::new(offset + i + 1)));

        for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
            let cells = column_cells(column)?;
            for (row, cell) in rows[offset..].iter_mut().zip(cells) {
                row.insert(field.name().trim(), cell);
            }
        }
    }
    Ok(rows)
}

/// Convert a whole Arrow column into cells.
fn column_cells(col: &ArrayRef) -> Result<Vec<Cell>, LoadError> {
    let data_type = col.data_type();

    if data_type.is_integer() {
        let ints = cast(col, &DataType::Int64)?;
        return Ok(ints
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map_or(Cell::Null, Cell::Integer))
            .collect());
    }

    if data_type.is_floating() {
        let floats = cast(col, &DataType::Float64)?;
        return Ok(floats
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.map_or(Cell::Null, Cell::Float))
            .collect());
    }

    if *data_type == DataType::Boolean {
        return Ok(col
            .as_boolean()
            .iter()
            .map(|v| v.map_or(Cell::Null, Cell::Bool))
            .collect());
    }

    // Dates render as YYYY-MM-DD; everything else goes through Arrow's
    // generic text cast.
    let is_date = matches!(data_type, DataType::Date32 | DataType::Date64);
    let source = if is_date {
        cast(col, &DataType::Date32)?
    } else {
        col.clone()
    };
    let text = cast(&source, &DataType::Utf8)?;
    Ok(text
        .as_string::<i32>()
        .iter()
        .map(|v| match v {
            None => Cell::Null,
            Some(s) if is_date => Cell::Date(s.to_string()),
            Some(s) => Cell::String(s.trim().to_string()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::{CampaignRecord, ListeningRecord, SubscriptionTier};

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const HEADER: &str =
        "artist_name,genre,region,country,subscription_type,month,streams,active_listeners,completion_rate";

    #[test]
    fn csv_rows_become_typed_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "spotify.csv",
            &format!(
                "{HEADER}\n\
                 Nova, Pop ,Europe,Germany,Premium,2024-01,1200,300,0.81\n\
                 Dune,Rock,LATAM,Brazil,free,2024-02,800,150,\n"
            ),
        );

        let ds = load_listening(&path).unwrap();
        assert_eq!(ds.len(), 2);
        let first = &ds.records[0];
        assert_eq!(first.artist, "Nova");
        assert_eq!(first.genre, "Pop");
        assert_eq!(first.tier, SubscriptionTier::Premium);
        assert_eq!(first.streams, 1200);
        assert_eq!(first.completion_rate, Some(0.81));
        assert_eq!(ds.records[1].tier, SubscriptionTier::Free);
        assert_eq!(ds.records[1].completion_rate, None);
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "lean.csv",
            "artist_name,genre,region,subscription_type,month,streams,active_listeners\n\
             Nova,Pop,Europe,Free,Mar,10,1\n",
        );
        let ds = load_listening(&path).unwrap();
        assert_eq!(ds.records[0].country, "");
        assert_eq!(ds.records[0].month.to_string(), "Mar");
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "bad.csv",
            "artist_name,region,subscription_type,month,active_listeners\nNova,EU,Free,2024-01,1\n",
        );
        match load_listening(&path) {
            Err(LoadError::MissingColumns(cols)) => assert_eq!(cols, ["genre", "streams"]),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn bad_cell_names_row_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "bad.csv",
            &format!("{HEADER}\nNova,Pop,EU,DE,Free,2024-01,12,1,\nDune,Pop,EU,DE,Free,2024-01,lots,1,\n"),
        );
        match load_listening(&path) {
            Err(LoadError::InvalidValue { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "streams");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn ragged_csv_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "ragged.csv", &format!("{HEADER}\nNova,Pop\n"));
        assert!(matches!(
            load_listening(&path),
            Err(LoadError::Malformed { format: "CSV", .. })
        ));
    }

    #[test]
    fn missing_file_and_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_listening(&dir.path().join("nope.csv")),
            Err(LoadError::Io { .. })
        ));
        let path = write_file(&dir, "data.xlsx", "");
        assert!(matches!(
            load_listening(&path),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn header_only_csv_is_an_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.csv", &format!("{HEADER}\n"));
        let ds = load_listening(&path).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.first_month(), None);
    }

    #[test]
    fn json_records_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "campaigns.json",
            r#"[
                {"campaign_name": "Wrapped", "target_region": "Europe", "target_genre": "Pop",
                 "month": "2024-12", "net_user_gain": -40, "user_growth_pct": 12.5,
                 "premium_growth_pct": 4}
            ]"#,
        );
        let ds = load_campaigns(&path).unwrap();
        let rec: &CampaignRecord = &ds.records[0];
        assert_eq!(rec.net_user_gain, -40);
        assert_eq!(rec.premium_growth_pct, 4.0);
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "obj.json", r#"{"artist_name": "Nova"}"#);
        assert!(matches!(
            load_listening(&path),
            Err(LoadError::Malformed { format: "JSON", .. })
        ));
        let path = write_file(&dir, "partial.json", r#"[{"artist_name": "Nova"}]"#);
        assert!(matches!(
            load_table::<ListeningRecord>(&path),
            Err(LoadError::MissingColumns(_))
        ));
    }

    #[test]
    fn csv_names_that_look_like_numbers_stay_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "numbers.csv",
            &format!(
                "{HEADER}\n\
                 +44,Pop,Europe,UK,Free,2024-01,10,1,\n\
                 007,Rock,Europe,UK,Free,2024-01,20,2,\n\
                 7,Rock,Europe,UK,Free,2024-01,30,3,\n\
                 1e3,Infinity,Europe,UK,Free,2024-01,40,4,\n"
            ),
        );
        let ds = load_listening(&path).unwrap();
        let names: Vec<(&str, &str)> = ds
            .records
            .iter()
            .map(|r| (r.artist.as_str(), r.genre.as_str()))
            .collect();
        assert_eq!(
            names,
            [("+44", "Pop"), ("007", "Rock"), ("7", "Rock"), ("1e3", "Infinity")]
        );
        assert_eq!(ds.values(crate::data::model::Dimension::Artist).count(), 4);
    }

    #[test]
    fn parquet_field_names_are_trimmed() {
        use std::sync::Arc;

        use arrow::array::{Int64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let text = |name: &str, value: &str| {
            (
                Field::new(name, DataType::Utf8, false),
                Arc::new(StringArray::from(vec![value])) as ArrayRef,
            )
        };
        let int = |name: &str, value: i64| {
            (
                Field::new(name, DataType::Int64, false),
                Arc::new(Int64Array::from(vec![value])) as ArrayRef,
            )
        };
        let (fields, columns): (Vec<Field>, Vec<ArrayRef>) = vec![
            text(" artist_name", "Nova"),
            text("genre ", "Pop"),
            text(" region ", "Europe"),
            text("subscription_type", "Premium"),
            text("month", "2024-03"),
            int(" streams", 500),
            int("active_listeners ", 50),
        ]
        .into_iter()
        .unzip();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padded.parquet");
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_listening(&path).unwrap();
        let rec = &ds.records[0];
        assert_eq!(rec.artist, "Nova");
        assert_eq!(rec.region, "Europe");
        assert_eq!(rec.streams, 500);
        assert_eq!(rec.active_listeners, 50);
    }
}
