//! CSV reading operations.

use std::{fs::File, path::Path, sync::Arc};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvEncoding, CsvReadOptions, DataType, Field, Schema}};

/// Reads a CSV file, keeping `id_col` as text so GEOIDs keep their leading
/// zeros. Invalid UTF-8 (the census publishes Latin-1 files) is replaced
/// rather than rejected.
pub(crate) fn read_csv_with_id(path: &Path, id_col: &str) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    let schema = Arc::new(Schema::from_iter([Field::new(id_col.into(), DataType::String)]));
    CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(schema))
        .map_parse_options(|po| po.with_encoding(CsvEncoding::LossyUtf8))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

/// Reads a CSV file, replacing invalid UTF-8 instead of rejecting it.
pub(crate) fn read_csv_lossy(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|po| po.with_encoding(CsvEncoding::LossyUtf8))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn id_column_keeps_leading_zeros() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GEOID,TOTPOP\n010010201001,12\n010010201002,7").unwrap();

        let df = read_csv_with_id(file.path(), "GEOID").unwrap();
        let ids = df.column("GEOID").unwrap().str().unwrap()
            .into_iter().flatten().collect::<Vec<_>>();
        assert_eq!(ids, vec!["010010201001", "010010201002"]);
        assert!(df.column("TOTPOP").unwrap().dtype().is_integer());
    }

    #[test]
    fn plain_read_infers_numbers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a,b\n1,2.5").unwrap();

        let df = read_csv_lossy(file.path()).unwrap();
        assert_eq!(df.shape(), (1, 2));
        assert_eq!(df.column("b").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"geoname,geoid\nPe\xf1a,15000US270530001001\n").unwrap();

        let df = read_csv_lossy(file.path()).unwrap();
        assert_eq!(df.height(), 1);
        assert!(df.column("geoname").unwrap().str().unwrap().get(0).unwrap().starts_with("Pe"));
    }
}
