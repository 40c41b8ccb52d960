//! Product metadata loader (`parent_asin` → `title`).

use super::DatasetError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct MetadataRow {
    parent_asin: Option<String>,
    title: Option<String>,
}

/// Parse metadata JSON lines into a product id → title lookup.
///
/// Rows without an id or title contribute nothing. Later rows win on
/// duplicate ids.
pub fn parse_titles(path: &Path, content: &str) -> Result<HashMap<String, String>, DatasetError> {
    let mut titles = HashMap::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let row: MetadataRow =
            serde_json::from_str(line).map_err(|source| DatasetError::MalformedMetadata {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;

        if let (Some(id), Some(title)) = (row.parent_asin, row.title) {
            titles.insert(id, title);
        }
    }

    Ok(titles)
}

/// Load the title lookup from a metadata file.
pub fn load_titles(path: &Path) -> Result<HashMap<String, String>, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    let titles = parse_titles(path, &content)?;
    debug!("Loaded {} product titles from {}", titles.len(), path.display());
    Ok(titles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_titles() {
        let content = r#"{"parent_asin": "B001", "title": "Game A", "price": 19.99}
{"parent_asin": "B002", "title": null}
{"title": "Orphan"}
"#;
        let titles = parse_titles(Path::new("meta.jsonl"), content).unwrap();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles.get("B001").map(String::as_str), Some("Game A"));
    }

    #[test]
    fn test_parse_titles_invalid_json() {
        let content = "{\"parent_asin\": \"B001\"\n";
        let err = parse_titles(Path::new("meta.jsonl"), content).unwrap_err();
        assert!(matches!(err, DatasetError::MalformedMetadata { line: 1, .. }));
    }
}
