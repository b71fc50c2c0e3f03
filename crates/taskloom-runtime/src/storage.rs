//! Append-only JSONL helpers shared by the Streaming Writer (4.F) and the
//! Session Log (4.G).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::Result;

/// Appends a single JSON line to `path`, creating the file (and parent
/// directories) if absent.
pub fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(value)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Reads every line as `T`, strictly: the first malformed line is an error.
pub fn read_lines_strict<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

/// Reads every line as `T`, tolerantly: malformed lines are skipped rather
/// than aborting the whole load (spec §4.G, §8 invariant 9). Returns the
/// decoded entries alongside a count of skipped lines.
pub fn read_lines_tolerant<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, usize)> {
    if !path.exists() {
        return Ok((Vec::new(), 0));
    }
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    let mut skipped = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping malformed log line");
                skipped += 1;
            }
        }
    }
    Ok((entries, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        n: u32,
    }

    #[test]
    fn append_then_read_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sub/rows.jsonl");
        append_line(&path, &Row { n: 1 }).unwrap();
        append_line(&path, &Row { n: 2 }).unwrap();
        let rows: Vec<Row> = read_lines_strict(&path).unwrap();
        assert_eq!(rows, vec![Row { n: 1 }, Row { n: 2 }]);
    }

    #[test]
    fn tolerant_read_skips_malformed_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");
        std::fs::write(&path, "{\"n\":1}\nnot json\n{\"n\":2}\n\n").unwrap();
        let (rows, skipped): (Vec<Row>, usize) = read_lines_tolerant(&path).unwrap();
        assert_eq!(rows, vec![Row { n: 1 }, Row { n: 2 }]);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn tolerant_read_of_missing_file_is_empty() {
        let (rows, skipped): (Vec<Row>, usize) =
            read_lines_tolerant(Path::new("/nonexistent/rows.jsonl")).unwrap();
        assert!(rows.is_empty());
        assert_eq!(skipped, 0);
    }
}
