//! Loader for the aggregated review-count file (`KEY\tCOUNT` lines).

use super::DatasetError;
use crate::models::{CountKey, CountRecord};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Parse a single `KEY\tCOUNT` line.
pub fn parse_count_line(line: &str) -> Result<CountRecord, String> {
    let line = line.trim();
    let (key, count) = line
        .split_once('\t')
        .ok_or_else(|| "missing tab between key and count".to_string())?;

    if count.contains('\t') {
        return Err("more than one tab on the line".to_string());
    }

    let key: CountKey = key.parse()?;
    let count: u64 = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid count: {:?}", count))?;

    Ok(CountRecord::from_key(key, count))
}

/// Parse the full contents of a counts file.
///
/// Blank lines are ignored; any other malformed line fails the whole load.
pub fn parse_counts(path: &Path, content: &str) -> Result<Vec<CountRecord>, DatasetError> {
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_count_line(line).map_err(|reason| DatasetError::MalformedCount {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Load every record from a counts file.
pub fn load_counts(path: &Path) -> Result<Vec<CountRecord>, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    let records = parse_counts(path, &content)?;
    debug!("Loaded {} count records from {}", records.len(), path.display());
    Ok(records)
}

/// Left-join titles onto count records by product id.
///
/// Products missing from the lookup keep an absent title.
pub fn join_titles(records: &mut [CountRecord], titles: &HashMap<String, String>) {
    for record in records.iter_mut() {
        record.title = titles.get(&record.product_id).cloned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    #[test]
    fn test_parse_count_line() {
        let record = parse_count_line("2015-01-positive-5-B001\t10").unwrap();
        assert_eq!(record.year, 2015);
        assert_eq!(record.month, "01");
        assert_eq!(record.sentiment, Sentiment::Positive);
        assert_eq!(record.rating.get(), 5);
        assert_eq!(record.product_id, "B001");
        assert_eq!(record.count, 10);
        assert!(record.title.is_none());
        assert_eq!(record.key().to_string(), "2015-01-positive-5-B001");
    }

    #[test]
    fn test_parse_count_line_trims_line_endings() {
        let record = parse_count_line("2015-02-negative-3-B002\t5\r\n").unwrap();
        assert_eq!(record.count, 5);
    }

    #[test]
    fn test_parse_count_line_missing_tab() {
        assert!(parse_count_line("2015-01-positive-5-B001 10").is_err());
    }

    #[test]
    fn test_parse_counts_fails_whole_load() {
        let content = "2015-01-positive-5-B001\t10\nnot a record\n";
        let err = parse_counts(Path::new("part-r-00000"), content).unwrap_err();
        match err {
            DatasetError::MalformedCount { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_counts_skips_blank_lines() {
        let content = "2015-01-positive-5-B001\t10\n\n2015-02-negative-3-B002\t5\n";
        let records = parse_counts(Path::new("part-r-00000"), content).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_join_titles_is_total() {
        let mut records = vec![
            parse_count_line("2015-01-positive-5-B001\t10").unwrap(),
            parse_count_line("2015-02-negative-3-B002\t5").unwrap(),
        ];
        let titles: HashMap<String, String> =
            [("B001".to_string(), "Game A".to_string())].into_iter().collect();

        join_titles(&mut records, &titles);

        assert_eq!(records[0].title.as_deref(), Some("Game A"));
        assert_eq!(records[1].title, None);
    }

    #[test]
    fn test_load_counts_missing_file() {
        let err = load_counts(Path::new("/nonexistent/part-r-00000")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
