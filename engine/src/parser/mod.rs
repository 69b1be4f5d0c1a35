//! CSV loading and writing with encoding and delimiter auto-detection.
//!
//! Loading yields a [`Table`] of raw [`FieldValue`]s; nothing here knows
//! about employees or sales.

use std::fs;
use std::path::Path;

use crate::error::{LoadError, LoadResult, WriteError, WriteResult};
use crate::models::{FieldValue, Record, Table};

const DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// A loaded table with the settings used to read it.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Table,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with the given encoding.
///
/// Unknown encodings fall back to lossy UTF-8. A UTF-8 byte-order mark is
/// dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => match encoding_rs::Encoding::for_label(encoding.as_bytes()) {
            Some(enc) if enc != encoding_rs::UTF_8 => enc.decode(bytes).0.into_owned(),
            _ => String::from_utf8_lossy(bytes).into_owned(),
        },
    };
    decoded.trim_start_matches('\u{feff}').to_string()
}

/// Detect the delimiter by counting occurrences outside quotes in the first line.
///
/// Defaults to `,` when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut counts = [0usize; DELIMITERS.len()];
    let mut in_quotes = false;
    for c in first_line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(i) = DELIMITERS.iter().position(|d| *d == c) {
                counts[i] += 1;
            }
        }
    }

    let mut best = ',';
    let mut best_count = 0;
    for (sep, count) in DELIMITERS.iter().zip(counts) {
        if count > best_count {
            best_count = count;
            best = *sep;
        }
    }
    best
}

/// Parse CSV text with an explicit delimiter.
///
/// Quoted fields are supported; short rows are padded with empty values and
/// extra cells are ignored. Empty lines are skipped, but a row of empty cells
/// (`;;`) is kept so row indices match the source.
pub fn parse_str(content: &str, delimiter: char) -> LoadResult<Table> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let delimiter = u8::try_from(delimiter)
        .map_err(|_| LoadError::Encoding(format!("non-ASCII delimiter '{delimiter}'")))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(&e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(LoadError::NoHeaders);
    }

    let mut table = Table::new(headers);
    for result in reader.records() {
        let row = result.map_err(|e| parse_error(&e))?;
        let record: Record = table
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = row.get(i).map(FieldValue::from_raw).unwrap_or(FieldValue::Empty);
                (header.clone(), value)
            })
            .collect();
        table.push(record);
    }

    Ok(table)
}

fn parse_error(err: &csv::Error) -> LoadError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or_default();
    LoadError::Parse {
        line,
        message: err.to_string(),
    }
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> LoadResult<LoadedTable> {
    if bytes.is_empty() {
        return Err(LoadError::EmptyFile);
    }
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_str(&content, delimiter)?;

    Ok(LoadedTable {
        table,
        encoding,
        delimiter,
    })
}

/// Load a CSV file with auto-detection of encoding and delimiter.
pub fn load_table(path: impl AsRef<Path>) -> LoadResult<LoadedTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_bytes_auto(&bytes)
}

/// Write a table as comma-separated UTF-8, creating parent directories.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> WriteResult<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for record in &table.rows {
        writer.write_record(
            table
                .headers
                .iter()
                .map(|h| record.get(h).map(FieldValue::to_cell).unwrap_or_default()),
        )?;
    }
    writer.flush().map_err(|source| WriteError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> WriteResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| WriteError::Io {
                path: parent.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("name;age\nAlice;30\nBob;25", ';').unwrap();

        assert_eq!(table.headers, vec!["name", "age"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "name"), "Alice");
        assert_eq!(table.cell(1, "age"), "25");
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let table = parse_str("name,city\n\"Smith, John\",\"Paris\"", ',').unwrap();
        assert_eq!(table.cell(0, "name"), "Smith, John");
    }

    #[test]
    fn test_ragged_rows_tolerated() {
        let table = parse_str("a;b;c\n1;;3\n4\n5;6;7;8", ';').unwrap();

        assert_eq!(table.rows[0].get("b"), Some(&FieldValue::Empty));
        assert_eq!(table.rows[1].get("c"), Some(&FieldValue::Empty));
        assert_eq!(table.cell(2, "c"), "7");
    }

    #[test]
    fn test_empty_lines_skipped_empty_cells_kept() {
        let table = parse_str("a;b\n1;2\n\n;\n3;4\n", ';').unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1].get("a"), Some(&FieldValue::Empty));
        assert_eq!(table.cell(2, "a"), "3");
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ';'), Err(LoadError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(LoadError::EmptyFile)));
    }

    #[test]
    fn test_blank_headers_error() {
        assert!(matches!(parse_str(";;\n1;2;3", ';'), Err(LoadError::NoHeaders)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_detect_delimiter_ignores_quoted() {
        assert_eq!(detect_delimiter("\"a;b;c\",d,e"), ',');
    }

    #[test]
    fn test_auto_parse_strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Employee ID,Name\nE1,Ann\n");
        let loaded = parse_bytes_auto(&bytes).unwrap();

        assert_eq!(loaded.delimiter, ',');
        assert_eq!(loaded.table.headers, vec!["Employee ID", "Name"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert_eq!(decode_content(bytes, "iso-8859-1"), "Société");
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        let table = Table::from_rows(["id", "name"], [vec!["E1", "Smith, Ann"], vec!["E2", ""]]);

        write_table(&path, &table).unwrap();
        let loaded = load_table(&path).unwrap();

        assert_eq!(loaded.table, table);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_table(dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
