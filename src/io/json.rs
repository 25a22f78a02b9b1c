use std::{fs::File, io::{BufReader, BufWriter}, path::Path};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Reads a JSON document from `path`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("[io::json] Failed to read JSON file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[io::json] Failed to parse JSON from {:?}", path))
}

/// Writes `value` to `path` as pretty-printed JSON.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::json] Failed to create JSON file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("[io::json] Failed to write JSON to {:?}", path))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn pretty_json_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        let value = BTreeMap::from([("2019".to_string(), 1u32)]);

        write_json(&path, &value).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains('\n'));
        assert_eq!(read_json::<BTreeMap<String, u32>>(&path).unwrap(), value);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_json::<BTreeMap<String, u32>>(Path::new("/nonexistent/book.json")).unwrap_err();
        assert!(err.to_string().contains("book.json"));
    }
}
