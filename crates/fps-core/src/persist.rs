// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — CSV Persistence
// ─────────────────────────────────────────────────────────────────────
//! Minimal CSV writing and numeric CSV reading for run logs and the
//! failure table. Fields containing separators are quoted.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use fps_types::{FpsError, FpsResult};

/// Quote a field when it contains a comma, quote or line break.
pub fn csv_field(raw: &str) -> Cow<'_, str> {
    if raw.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", raw.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Render a header plus rows into CSV text.
pub fn render_csv<I, R>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut out = header
        .iter()
        .map(|h| csv_field(h))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    for row in rows {
        let line = row
            .into_iter()
            .map(|field| csv_field(&field).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Write CSV text to `path`, creating parent directories.
pub fn write_text(path: &Path, contents: &str) -> FpsResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// A numeric CSV table: header names plus rows of f64.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl NumericTable {
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.header.iter().position(|h| h == name)?;
        self.rows.iter().map(|r| r.get(idx).copied()).collect()
    }
}

/// Parse CSV text whose body is entirely numeric.
pub fn parse_numeric_csv(text: &str) -> FpsResult<NumericTable> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header: Vec<String> = lines
        .next()
        .ok_or_else(|| FpsError::Serialization("empty CSV".into()))?
        .split(',')
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (lineno, line) in lines.enumerate() {
        let row = line
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FpsError::Serialization(format!("CSV row {}: {e}", lineno + 2)))?;
        if row.len() != header.len() {
            return Err(FpsError::Serialization(format!(
                "CSV row {} has {} fields, expected {}",
                lineno + 2,
                row.len(),
                header.len()
            )));
        }
        rows.push(row);
    }
    Ok(NumericTable { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_render_and_parse() {
        let text = render_csv(
            &["t", "C"],
            vec![
                vec!["0".to_string(), "1".to_string()],
                vec!["0.5".to_string(), "0.25".to_string()],
            ],
        );
        assert_eq!(text, "t,C\n0,1\n0.5,0.25\n");
        let table = parse_numeric_csv(&text).unwrap();
        assert_eq!(table.column("C"), Some(vec![1.0, 0.25]));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = parse_numeric_csv("t,C\n0,1\n0.5\n").unwrap_err();
        assert!(matches!(err, FpsError::Serialization(_)));
    }

    #[test]
    fn test_write_text_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        write_text(&path, "a\n1\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n1\n");
    }
}
